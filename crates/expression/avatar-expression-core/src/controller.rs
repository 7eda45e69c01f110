//! Authoritative character state and its transition rules.
//!
//! Owns emotion, presence flags, the blink pulse and the active utterance.
//! Delayed transitions (blink release, end of speech, next blink onset) are
//! entries in a [`DeferredTaskQueue`] rather than timers.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::deferred::DeferredTaskQueue;
use crate::emotion::Emotion;
use crate::error::ExpressionError;
use crate::lipsync::{estimate_duration_ticks, MouthChannel, Utterance};
use crate::outputs::EngineEvent;

/// Listening/speaking flags; independent of the emotion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresenceState {
    pub listening: bool,
    pub speaking: bool,
}

/// Snapshot of the controller-owned state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterState {
    pub emotion: Emotion,
    pub presence: PresenceState,
    pub blink: bool,
}

/// Deferred task kinds; each is also its own cancellation class.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Timer {
    BlinkOnset,
    BlinkRelease,
    SpeechStop,
}

#[derive(Debug)]
pub struct AnimationStateController {
    state: CharacterState,
    utterance: Option<Utterance>,
    speech_queue: VecDeque<String>,
    blink_enabled: bool,
    timers: DeferredTaskQueue<Timer, Timer>,
    events: Vec<EngineEvent>,

    blink_interval_ticks: u64,
    blink_duration_ticks: u64,
    min_speaking_ticks: u64,
    per_character_ticks: u64,
    default_speaking_ticks: u64,
}

impl AnimationStateController {
    /// Initial state: neutral, not listening, not speaking; first blink at
    /// `blink_interval_ticks`. Expects a sanitized config.
    pub fn new(cfg: &Config) -> Self {
        let mut ctl = Self {
            state: CharacterState::default(),
            utterance: None,
            speech_queue: VecDeque::new(),
            blink_enabled: true,
            timers: DeferredTaskQueue::new(),
            events: Vec::new(),
            blink_interval_ticks: cfg.blink_interval_ticks,
            blink_duration_ticks: cfg.blink_duration_ticks,
            min_speaking_ticks: cfg.min_speaking_ticks,
            per_character_ticks: cfg.per_character_ticks,
            default_speaking_ticks: cfg.default_speaking_ticks,
        };
        ctl.arm(Timer::BlinkOnset, cfg.blink_interval_ticks);
        ctl
    }

    #[inline]
    pub fn state(&self) -> CharacterState {
        self.state
    }

    #[inline]
    pub fn emotion(&self) -> Emotion {
        self.state.emotion
    }

    #[inline]
    pub fn presence(&self) -> PresenceState {
        self.state.presence
    }

    #[inline]
    pub fn blink_active(&self) -> bool {
        self.state.blink
    }

    pub fn blink_enabled(&self) -> bool {
        self.blink_enabled
    }

    pub fn utterance(&self) -> Option<&Utterance> {
        self.utterance.as_ref()
    }

    /// Texts waiting behind the current utterance.
    pub fn queued_speech(&self) -> impl Iterator<Item = &str> {
        self.speech_queue.iter().map(String::as_str)
    }

    /// Number of pending deferred transitions.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn arm(&mut self, timer: Timer, due: u64) {
        self.timers.schedule_exclusive(timer, due, timer);
    }

    fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    fn reject(&mut self, error: ExpressionError) -> ExpressionError {
        warn!("{error}; state unchanged");
        self.emit(EngineEvent::Rejected {
            error: error.clone(),
        });
        error
    }

    fn change_emotion(&mut self, to: Emotion) {
        let from = self.state.emotion;
        if from != to {
            debug!("emotion {from} -> {to}");
            self.state.emotion = to;
            self.emit(EngineEvent::EmotionChanged { from, to });
        }
    }

    /// Replace the emotion by name. Unknown names are rejected and logged.
    pub fn set_emotion(&mut self, name: &str) -> Result<(), ExpressionError> {
        match Emotion::parse(name) {
            Ok(e) => {
                self.change_emotion(e);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn set_emotion_value(&mut self, emotion: Emotion) {
        self.change_emotion(emotion);
    }

    /// Entering listening forces `surprised`, leaving it forces `neutral`.
    /// Repeating the current value is a no-op.
    pub fn set_listening(&mut self, listening: bool) {
        if self.state.presence.listening == listening {
            return;
        }
        self.state.presence.listening = listening;
        self.emit(EngineEvent::ListeningChanged { listening });
        self.change_emotion(if listening {
            Emotion::Surprised
        } else {
            Emotion::Neutral
        });
    }

    /// Begin a new utterance at `now`, replacing any current one. Non-empty
    /// text also switches the emotion to `happy`.
    pub fn start_speaking(&mut self, text: Option<&str>, now: u64) {
        let text = text.unwrap_or("");
        let duration = estimate_duration_ticks(
            Some(text),
            self.min_speaking_ticks,
            self.per_character_ticks,
            self.default_speaking_ticks,
        );
        let utterance = Utterance::new(text, now, duration);
        self.arm(Timer::SpeechStop, utterance.end_tick());
        debug!(
            "speaking {:?} for {} ticks (until {})",
            text,
            duration,
            utterance.end_tick()
        );
        self.utterance = Some(utterance);
        self.state.presence.speaking = true;
        self.emit(EngineEvent::SpeakingStarted {
            text: text.to_string(),
            duration_ticks: duration,
        });
        if !text.is_empty() {
            self.change_emotion(Emotion::Happy);
        }
    }

    /// Stop the current utterance and drop any queued follow-ups.
    pub fn stop_speaking(&mut self, now: u64) {
        self.speech_queue.clear();
        self.end_speech(now);
    }

    fn end_speech(&mut self, now: u64) -> bool {
        self.timers.cancel_class(Timer::SpeechStop);
        if !self.state.presence.speaking {
            return false;
        }
        self.state.presence.speaking = false;
        self.utterance = None;
        debug!("speaking ended at tick {now}");
        self.emit(EngineEvent::SpeakingEnded { tick: now });
        true
    }

    /// Speak `text` now when idle, otherwise after the queued utterances.
    pub fn enqueue_speech(&mut self, text: &str, now: u64) {
        if self.state.presence.speaking {
            self.speech_queue.push_back(text.to_string());
        } else {
            self.start_speaking(Some(text), now);
        }
    }

    pub fn set_blink_enabled(&mut self, enabled: bool, now: u64) {
        if self.blink_enabled == enabled {
            return;
        }
        self.blink_enabled = enabled;
        if enabled {
            self.arm(Timer::BlinkOnset, now + self.blink_interval_ticks);
        } else {
            self.timers.cancel_class(Timer::BlinkOnset);
            self.timers.cancel_class(Timer::BlinkRelease);
            if self.state.blink {
                self.state.blink = false;
                self.emit(EngineEvent::BlinkEnded { tick: now });
            }
        }
    }

    /// Fire every deferred transition due at or before `now`.
    pub fn advance(&mut self, now: u64) {
        for timer in self.timers.drain_due(now) {
            trace!("tick {now}: {timer:?}");
            match timer {
                Timer::BlinkOnset => {
                    self.state.blink = true;
                    self.emit(EngineEvent::BlinkStarted { tick: now });
                    self.arm(Timer::BlinkRelease, now + self.blink_duration_ticks);
                    self.arm(Timer::BlinkOnset, now + self.blink_interval_ticks);
                }
                Timer::BlinkRelease => {
                    self.state.blink = false;
                    self.emit(EngineEvent::BlinkEnded { tick: now });
                }
                Timer::SpeechStop => {
                    if self.end_speech(now) {
                        if let Some(next) = self.speech_queue.pop_front() {
                            self.start_speaking(Some(&next), now);
                        }
                    }
                }
            }
        }
    }

    /// Mouth channel for `now`; `None` unless speaking.
    pub fn mouth(&self, now: u64) -> Option<MouthChannel> {
        if !self.state.presence.speaking {
            return None;
        }
        crate::lipsync::sample(self.utterance.as_ref(), now)
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}
