//! Output contracts: per-tick frame snapshot and semantic events.
//!
//! A [`Frame`] owns all of its data; hosts may keep it for as long as they
//! like without affecting later ticks.

use serde::{Deserialize, Serialize};

use crate::blendshape::BlendShapeVector;
use crate::camera::CameraPose;
use crate::controller::CharacterState;
use crate::emotion::Emotion;
use crate::error::ExpressionError;
use crate::particles::{Particle, WeatherMode};

/// Discrete signals raised by commands or during stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum EngineEvent {
    EmotionChanged {
        from: Emotion,
        to: Emotion,
    },
    ListeningChanged {
        listening: bool,
    },
    SpeakingStarted {
        text: String,
        duration_ticks: u64,
    },
    /// Speech finished naturally or was stopped.
    SpeakingEnded {
        tick: u64,
    },
    BlinkStarted {
        tick: u64,
    },
    BlinkEnded {
        tick: u64,
    },
    WeatherChanged {
        mode: WeatherMode,
        particles: usize,
    },
    LightningFlash {
        tick: u64,
    },
    /// A command was rejected; state is unchanged.
    Rejected {
        error: ExpressionError,
    },
}

/// Everything the renderer needs for one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub state: CharacterState,
    pub blend_shapes: BlendShapeVector,
    pub particles: Vec<Particle>,
    pub camera: CameraPose,
    /// Full-scene brightness pulse in [0, 1].
    pub lightning: f32,
    #[serde(default)]
    pub events: Vec<EngineEvent>,
}

impl Frame {
    pub fn has_event(&self, pred: impl Fn(&EngineEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }
}
