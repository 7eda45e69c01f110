//! Text-walk lip-sync heuristic.
//!
//! The utterance text is walked proportionally to elapsed ticks and the
//! character under the cursor is classified into a mouth channel. This is a
//! timing approximation, not phoneme analysis. Everything here is pure given
//! `(utterance, tick)`.

use serde::{Deserialize, Serialize};

/// Ticks per open/closed phase when an utterance carries no text.
pub const BABBLE_TICKS: u64 = 8;

/// Single active mouth shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouthChannel {
    A,
    I,
    U,
    E,
    O,
    /// Lips pressed: b, m, p.
    Labial,
    /// Lower lip to teeth: f, v.
    Labiodental,
    /// Tongue behind teeth: d, l, n, s, t, z.
    Dental,
}

impl MouthChannel {
    pub const ALL: [MouthChannel; 8] = [
        MouthChannel::A,
        MouthChannel::I,
        MouthChannel::U,
        MouthChannel::E,
        MouthChannel::O,
        MouthChannel::Labial,
        MouthChannel::Labiodental,
        MouthChannel::Dental,
    ];

    /// Classify one character; `None` is a neutral (closed) mouth.
    pub fn classify(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(MouthChannel::A),
            'i' => Some(MouthChannel::I),
            'u' => Some(MouthChannel::U),
            'e' => Some(MouthChannel::E),
            'o' => Some(MouthChannel::O),
            'b' | 'm' | 'p' => Some(MouthChannel::Labial),
            'f' | 'v' => Some(MouthChannel::Labiodental),
            'd' | 'l' | 'n' | 's' | 't' | 'z' => Some(MouthChannel::Dental),
            _ => None,
        }
    }

    pub fn is_vowel(self) -> bool {
        matches!(
            self,
            MouthChannel::A | MouthChannel::I | MouthChannel::U | MouthChannel::E | MouthChannel::O
        )
    }
}

/// One speaking session. Empty `text` means "speaking without a transcript".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub start_tick: u64,
    pub duration_ticks: u64,
}

impl Utterance {
    pub fn new(text: impl Into<String>, start_tick: u64, duration_ticks: u64) -> Self {
        Self {
            text: text.into(),
            start_tick,
            duration_ticks: duration_ticks.max(1),
        }
    }

    #[inline]
    pub fn end_tick(&self) -> u64 {
        self.start_tick.saturating_add(self.duration_ticks)
    }

    #[inline]
    pub fn is_active_at(&self, tick: u64) -> bool {
        tick >= self.start_tick && tick < self.end_tick()
    }

    /// Index (in chars) of the character under the cursor at `tick`.
    /// `floor(progress * len)` computed in integers so it never runs backwards.
    pub fn char_index(&self, tick: u64) -> Option<usize> {
        if !self.is_active_at(tick) {
            return None;
        }
        let len = self.text.chars().count() as u64;
        if len == 0 {
            return None;
        }
        let elapsed = tick - self.start_tick;
        Some((elapsed * len / self.duration_ticks) as usize)
    }

    pub fn sample(&self, tick: u64) -> Option<MouthChannel> {
        if !self.is_active_at(tick) {
            return None;
        }
        if self.text.is_empty() {
            let phase = (tick - self.start_tick) / BABBLE_TICKS;
            return (phase % 2 == 0).then_some(MouthChannel::A);
        }
        let idx = self.char_index(tick)?;
        self.text.chars().nth(idx).and_then(MouthChannel::classify)
    }
}

/// Mouth channel for `utterance` at `tick`; `None` when silent.
pub fn sample(utterance: Option<&Utterance>, tick: u64) -> Option<MouthChannel> {
    utterance.and_then(|u| u.sample(tick))
}

/// Estimated utterance length: `max(min_ticks, chars * per_char_ticks)` for
/// non-empty text, `default_ticks` otherwise.
pub fn estimate_duration_ticks(
    text: Option<&str>,
    min_ticks: u64,
    per_char_ticks: u64,
    default_ticks: u64,
) -> u64 {
    match text {
        Some(t) if !t.is_empty() => {
            let chars = t.chars().count() as u64;
            min_ticks.max(chars.saturating_mul(per_char_ticks))
        }
        _ => default_ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_at_half_progress_is_dental_l() {
        let dur = estimate_duration_ticks(Some("hello"), 30, 10, 60);
        assert_eq!(dur, 50);
        let u = Utterance::new("hello", 100, dur);
        assert_eq!(u.char_index(125), Some(2));
        assert_eq!(u.sample(125), Some(MouthChannel::Dental));
        assert_eq!(u.sample(100), None); // 'h'
        assert_eq!(u.sample(110), Some(MouthChannel::E));
        assert_eq!(u.sample(145), Some(MouthChannel::O));
    }

    #[test]
    fn outside_window_is_silent() {
        let u = Utterance::new("abc", 10, 30);
        assert_eq!(u.sample(9), None);
        assert_eq!(u.sample(40), None);
        assert_eq!(sample(None, 15), None);
        assert_eq!(sample(Some(&u), 10), Some(MouthChannel::A));
    }

    #[test]
    fn minimum_duration_wins_for_short_text() {
        assert_eq!(estimate_duration_ticks(Some("hi"), 30, 4, 60), 30);
        assert_eq!(estimate_duration_ticks(Some(""), 30, 4, 60), 60);
        assert_eq!(estimate_duration_ticks(None, 30, 4, 60), 60);
    }

    #[test]
    fn text_walk_never_moves_backwards() {
        let u = Utterance::new("the quick brown fox jumps over the lazy dog", 7, 97);
        let mut last = 0;
        for tick in u.start_tick..u.end_tick() {
            let idx = u.char_index(tick).unwrap();
            assert!(idx >= last, "tick {tick}: {idx} < {last}");
            last = idx;
        }
        assert_eq!(last, u.text.chars().count() - 1);
    }

    #[test]
    fn textless_utterance_babbles() {
        let u = Utterance::new("", 0, 40);
        assert_eq!(u.sample(0), Some(MouthChannel::A));
        assert_eq!(u.sample(BABBLE_TICKS), None);
        assert_eq!(u.sample(2 * BABBLE_TICKS), Some(MouthChannel::A));
    }

    #[test]
    fn classification_table() {
        assert_eq!(MouthChannel::classify('M'), Some(MouthChannel::Labial));
        assert_eq!(MouthChannel::classify('v'), Some(MouthChannel::Labiodental));
        assert_eq!(MouthChannel::classify('?'), None);
        assert_eq!(MouthChannel::classify('k'), None);
        assert!(MouthChannel::U.is_vowel());
        assert!(!MouthChannel::Dental.is_vowel());
    }
}
