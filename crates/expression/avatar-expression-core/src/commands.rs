//! Inbound command contract.
//!
//! Hosts either call the matching `Engine` methods directly or pass a batch of
//! commands to `Engine::step`, which applies them after deferred tasks fire
//! and before the blend-shape mapping of that tick.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SetEmotion {
        name: String,
    },
    SetListening {
        active: bool,
    },
    StartSpeaking {
        #[serde(default)]
        text: Option<String>,
    },
    StopSpeaking,
    /// Speak after the current utterance (immediately when idle).
    EnqueueSpeech {
        text: String,
    },
    SetWeatherMode {
        name: String,
    },
    SetAnimationEnabled {
        enabled: bool,
    },
    SetBlinkEnabled {
        enabled: bool,
    },
}
