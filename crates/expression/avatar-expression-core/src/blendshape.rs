//! Blend-shape vocabularies and the per-tick weight mapper.
//!
//! Two key vocabularies are supported for the same concepts:
//!
//! | concept        | `expression` | `viseme`   |
//! |----------------|--------------|------------|
//! | neutral        | neutral      | neutral    |
//! | happy          | happy        | joy        |
//! | sad            | sad          | sorrow     |
//! | surprised      | surprised    | surprised  |
//! | thinking       | relaxed      | fun        |
//! | angry          | angry        | angry      |
//! | vowels a/i/u/e/o | aa/ih/ou/ee/oh | a/i/u/e/o |
//! | labial         | pp           | pp         |
//! | labiodental    | ff           | ff         |
//! | dental         | dd           | dd         |
//! | blink          | blink        | blink      |

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::controller::PresenceState;
use crate::emotion::Emotion;
use crate::lipsync::MouthChannel;

pub const BLINK: &str = "blink";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// Expression-name keys (`happy`, `aa`, `ih`, ...).
    #[default]
    Expression,
    /// Preset-style keys (`joy`, `a`, `i`, ...).
    Viseme,
}

/// Whether `Emotion::Neutral` writes the `neutral` key or nothing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutralWeight {
    #[default]
    Absent,
    Explicit,
}

impl Vocabulary {
    pub fn expression_key(self, emotion: Emotion) -> &'static str {
        match (self, emotion) {
            (_, Emotion::Neutral) => "neutral",
            (Vocabulary::Expression, Emotion::Happy) => "happy",
            (Vocabulary::Viseme, Emotion::Happy) => "joy",
            (Vocabulary::Expression, Emotion::Sad) => "sad",
            (Vocabulary::Viseme, Emotion::Sad) => "sorrow",
            (_, Emotion::Surprised) => "surprised",
            (Vocabulary::Expression, Emotion::Thinking) => "relaxed",
            (Vocabulary::Viseme, Emotion::Thinking) => "fun",
            (_, Emotion::Angry) => "angry",
        }
    }

    pub fn mouth_key(self, channel: MouthChannel) -> &'static str {
        match (self, channel) {
            (Vocabulary::Expression, MouthChannel::A) => "aa",
            (Vocabulary::Expression, MouthChannel::I) => "ih",
            (Vocabulary::Expression, MouthChannel::U) => "ou",
            (Vocabulary::Expression, MouthChannel::E) => "ee",
            (Vocabulary::Expression, MouthChannel::O) => "oh",
            (Vocabulary::Viseme, MouthChannel::A) => "a",
            (Vocabulary::Viseme, MouthChannel::I) => "i",
            (Vocabulary::Viseme, MouthChannel::U) => "u",
            (Vocabulary::Viseme, MouthChannel::E) => "e",
            (Vocabulary::Viseme, MouthChannel::O) => "o",
            (_, MouthChannel::Labial) => "pp",
            (_, MouthChannel::Labiodental) => "ff",
            (_, MouthChannel::Dental) => "dd",
        }
    }

    /// Primary-expression keys; at most one of them is non-zero per vector.
    pub fn expression_keys(self) -> impl Iterator<Item = &'static str> {
        Emotion::ALL.into_iter().map(move |e| self.expression_key(e))
    }

    /// Mouth keys; at most one of them is non-zero per vector.
    pub fn mouth_keys(self) -> impl Iterator<Item = &'static str> {
        MouthChannel::ALL.into_iter().map(move |c| self.mouth_key(c))
    }

    /// Every key a vector of this vocabulary carries.
    pub fn keys(self) -> impl Iterator<Item = &'static str> {
        self.expression_keys()
            .chain(self.mouth_keys())
            .chain(std::iter::once(BLINK))
    }
}

/// Shape name → weight in [0, 1]. The key set is fixed by the vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlendShapeVector {
    weights: HashMap<String, f32>,
}

impl BlendShapeVector {
    /// All vocabulary keys at 0.0.
    pub fn zeroed(vocabulary: Vocabulary) -> Self {
        Self {
            weights: vocabulary.keys().map(|k| (k.to_string(), 0.0)).collect(),
        }
    }

    /// Weight of `key`; unknown keys read as 0.0.
    pub fn get(&self, key: &str) -> f32 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.weights.contains_key(key)
    }

    /// Writes to unknown keys are ignored so the key set never grows.
    fn set(&mut self, key: &str, weight: f32) {
        if let Some(w) = self.weights.get_mut(key) {
            *w = weight.clamp(0.0, 1.0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.weights.iter().map(|(k, w)| (k.as_str(), *w))
    }

    /// Keys with a weight above zero.
    pub fn active_keys(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, w)| *w > 0.0).map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Pure mapping from controller state to a weight vector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlendShapeMapper {
    pub vocabulary: Vocabulary,
    pub neutral_weight: NeutralWeight,
}

impl BlendShapeMapper {
    pub fn new(vocabulary: Vocabulary, neutral_weight: NeutralWeight) -> Self {
        Self {
            vocabulary,
            neutral_weight,
        }
    }

    /// Fresh vector for the given inputs. Identical inputs give equal vectors.
    pub fn compute(
        &self,
        emotion: Emotion,
        presence: PresenceState,
        mouth: Option<MouthChannel>,
        blink: bool,
    ) -> BlendShapeVector {
        let mut out = BlendShapeVector::zeroed(self.vocabulary);

        if emotion != Emotion::Neutral || self.neutral_weight == NeutralWeight::Explicit {
            out.set(self.vocabulary.expression_key(emotion), 1.0);
        }

        if presence.speaking {
            if let Some(channel) = mouth {
                out.set(self.vocabulary.mouth_key(channel), 1.0);
            }
        }

        if blink {
            out.set(BLINK, 1.0);
        }

        out
    }
}
