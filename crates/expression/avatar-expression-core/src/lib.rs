//! Avatar Expression Core (engine-agnostic)
//!
//! Converts discrete semantic signals (emotion, listening/speaking status, spoken
//! text, weather mode) into per-tick animation state: a blend-shape weight
//! vector, a heuristic lip-sync channel, ambient weather particles and an idle
//! camera sway. Rendering, audio and asset loading stay with the host.
//!
//! Per-tick order: FrameClock → DeferredTaskQueue → controller commands →
//! BlendShapeMapper → ParticleSystem → CameraRig → [`Frame`] snapshot.

pub mod blendshape;
pub mod camera;
pub mod clock;
pub mod commands;
pub mod config;
pub mod controller;
pub mod deferred;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod lipsync;
pub mod outputs;
pub mod particles;

// Re-exports for consumers (adapters)
pub use blendshape::{BlendShapeMapper, BlendShapeVector, NeutralWeight, Vocabulary};
pub use camera::{CameraPose, CameraRig};
pub use clock::FrameClock;
pub use commands::Command;
pub use config::{CameraConfig, Config, LightningConfig, ParticleCounts};
pub use controller::{AnimationStateController, CharacterState, PresenceState};
pub use deferred::{DeferredTaskQueue, TaskId};
pub use emotion::Emotion;
pub use engine::Engine;
pub use error::ExpressionError;
pub use lipsync::{sample, MouthChannel, Utterance};
pub use outputs::{EngineEvent, Frame};
pub use particles::{Particle, ParticleSystem, WeatherMode};
