//! Engine: owns every component and runs the fixed per-tick pipeline.
//!
//! Tick order: clock advance → deferred transitions → queued commands →
//! blend-shape mapping → particles → camera → frame snapshot. Nothing in the
//! pipeline blocks; hosts drive it with `tick`/`step` or with wall time via
//! `update`.

use rand::RngCore;
use tracing::{debug, warn};

use crate::blendshape::{BlendShapeMapper, BlendShapeVector};
use crate::camera::{CameraPose, CameraRig};
use crate::clock::FrameClock;
use crate::commands::Command;
use crate::config::Config;
use crate::controller::{AnimationStateController, CharacterState};
use crate::error::ExpressionError;
use crate::outputs::{EngineEvent, Frame};
use crate::particles::{Particle, ParticleSystem, WeatherMode};

#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    clock: FrameClock,
    controller: AnimationStateController,
    mapper: BlendShapeMapper,
    particles: ParticleSystem,
    camera: CameraRig,

    /// Engine-level events (weather, lightning) not yet handed out.
    events: Vec<EngineEvent>,
    frame: Frame,
}

impl Engine {
    /// Create an engine; the config is sanitized first.
    pub fn new(cfg: Config) -> Self {
        let cfg = cfg.sanitized();
        let particles = ParticleSystem::new(&cfg);
        Self::assemble(cfg, particles)
    }

    /// Create an engine whose particles draw from `rng`.
    pub fn with_rng(cfg: Config, rng: impl RngCore + Send + 'static) -> Self {
        let cfg = cfg.sanitized();
        let particles = ParticleSystem::with_rng(&cfg, rng);
        Self::assemble(cfg, particles)
    }

    fn assemble(cfg: Config, particles: ParticleSystem) -> Self {
        let mut engine = Self {
            clock: FrameClock::new(cfg.tick_rate_hz, cfg.max_catch_up_ticks),
            controller: AnimationStateController::new(&cfg),
            mapper: BlendShapeMapper::new(cfg.blend_shape_vocabulary, cfg.neutral_weight),
            particles,
            camera: CameraRig::new(&cfg),
            events: Vec::new(),
            frame: Frame::default(),
            cfg,
        };
        engine.frame = Frame {
            tick: 0,
            state: engine.controller.state(),
            blend_shapes: engine.current_blend_shapes(),
            particles: Vec::new(),
            camera: engine.camera.pose(),
            lightning: 0.0,
            events: Vec::new(),
        };
        engine
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn controller(&self) -> &AnimationStateController {
        &self.controller
    }

    pub fn particle_system(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn state(&self) -> CharacterState {
        self.controller.state()
    }

    // --- inbound -----------------------------------------------------------

    pub fn set_emotion(&mut self, name: &str) -> Result<(), ExpressionError> {
        self.controller.set_emotion(name)
    }

    pub fn set_listening(&mut self, listening: bool) {
        self.controller.set_listening(listening);
    }

    pub fn start_speaking(&mut self, text: Option<&str>) {
        let now = self.clock.now();
        self.controller.start_speaking(text, now);
    }

    pub fn stop_speaking(&mut self) {
        let now = self.clock.now();
        self.controller.stop_speaking(now);
    }

    pub fn enqueue_speech(&mut self, text: &str) {
        let now = self.clock.now();
        self.controller.enqueue_speech(text, now);
    }

    /// Unknown names are reported and fall back to [`WeatherMode::None`].
    pub fn set_weather_mode(&mut self, name: &str) -> Result<(), ExpressionError> {
        let (mode, result) = match WeatherMode::parse(name) {
            Ok(mode) => (mode, Ok(())),
            Err(err) => {
                warn!("{err}; weather cleared");
                self.events.push(EngineEvent::Rejected { error: err.clone() });
                (WeatherMode::None, Err(err))
            }
        };
        let particles = self.particles.set_mode(mode);
        self.events
            .push(EngineEvent::WeatherChanged { mode, particles });
        result
    }

    pub fn set_animation_enabled(&mut self, enabled: bool) {
        debug!("camera animation enabled: {enabled}");
        self.camera.set_enabled(enabled);
    }

    pub fn set_blink_enabled(&mut self, enabled: bool) {
        let now = self.clock.now();
        self.controller.set_blink_enabled(enabled, now);
    }

    /// Apply one command immediately.
    pub fn apply(&mut self, command: Command) -> Result<(), ExpressionError> {
        match command {
            Command::SetEmotion { name } => self.set_emotion(&name)?,
            Command::SetListening { active } => self.set_listening(active),
            Command::StartSpeaking { text } => self.start_speaking(text.as_deref()),
            Command::StopSpeaking => self.stop_speaking(),
            Command::EnqueueSpeech { text } => self.enqueue_speech(&text),
            Command::SetWeatherMode { name } => self.set_weather_mode(&name)?,
            Command::SetAnimationEnabled { enabled } => self.set_animation_enabled(enabled),
            Command::SetBlinkEnabled { enabled } => self.set_blink_enabled(enabled),
        }
        Ok(())
    }

    // --- stepping ----------------------------------------------------------

    /// Advance one tick with no commands.
    pub fn tick(&mut self) -> &Frame {
        self.step(Vec::new())
    }

    /// Advance one tick, applying `commands` once deferred transitions for the
    /// new tick have fired. Rejected commands show up as `Rejected` events.
    pub fn step(&mut self, commands: Vec<Command>) -> &Frame {
        let now = self.clock.advance();

        self.controller.advance(now);
        for command in commands {
            // failures are already logged and reported as events
            let _ = self.apply(command);
        }

        let state = self.controller.state();
        let blend_shapes = self.mapper.compute(
            state.emotion,
            state.presence,
            self.controller.mouth(now),
            state.blink,
        );

        if self.particles.tick() {
            self.events.push(EngineEvent::LightningFlash { tick: now });
        }
        let camera = self.camera.tick();

        let events = self.drain_events();
        self.frame = Frame {
            tick: now,
            state,
            blend_shapes,
            particles: self.particles.particles().to_vec(),
            camera,
            lightning: self.particles.lightning_intensity(),
            events,
        };
        &self.frame
    }

    /// Run the ticks that `dt_seconds` of host time add up to. Returns the
    /// last frame produced, or `None` if no whole tick elapsed.
    pub fn update(&mut self, dt_seconds: f64) -> Option<&Frame> {
        let due = self.clock.accumulate(dt_seconds);
        if due == 0 {
            return None;
        }
        for _ in 0..due {
            self.step(Vec::new());
        }
        Some(&self.frame)
    }

    // --- outbound ----------------------------------------------------------

    /// Last frame produced by `tick`/`step`/`update`.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Weights for the current state at the current tick.
    pub fn current_blend_shapes(&self) -> BlendShapeVector {
        let now = self.clock.now();
        let state = self.controller.state();
        self.mapper.compute(
            state.emotion,
            state.presence,
            self.controller.mouth(now),
            state.blink,
        )
    }

    pub fn particles(&self) -> Vec<Particle> {
        self.particles.particles().to_vec()
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.camera.pose()
    }

    pub fn lightning_intensity(&self) -> f32 {
        self.particles.lightning_intensity()
    }

    /// Events raised since the last frame, in the order they occurred
    /// within each source (controller first, then weather/lightning).
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut events = self.controller.drain_events();
        events.append(&mut self.events);
        events
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Emotion;

    fn small() -> Config {
        Config {
            particle_counts: crate::config::ParticleCounts { rain: 20, snow: 10 },
            ..Config::default()
        }
    }

    #[test]
    fn initial_frame_is_neutral_and_empty() {
        let e = Engine::new(small());
        assert_eq!(e.frame().tick, 0);
        assert_eq!(e.frame().blend_shapes.active_keys().count(), 0);
        assert!(e.particles().is_empty());
    }

    #[test]
    fn weather_counts_are_immediate() {
        let mut e = Engine::new(small());
        e.set_weather_mode("rain").unwrap();
        assert_eq!(e.particles().len(), 20);
        e.set_weather_mode("none").unwrap();
        assert!(e.particles().is_empty());
    }

    #[test]
    fn unknown_weather_falls_back_to_none() {
        let mut e = Engine::new(small());
        e.set_weather_mode("snow").unwrap();
        let err = e.set_weather_mode("hail").unwrap_err();
        assert_eq!(err, ExpressionError::InvalidWeatherMode("hail".into()));
        assert_eq!(e.particle_system().mode(), WeatherMode::None);
        assert!(e.particles().is_empty());
    }

    #[test]
    fn commands_apply_within_the_step() {
        let mut e = Engine::new(small());
        let frame = e.step(vec![
            Command::SetEmotion {
                name: "angry".into(),
            },
            Command::SetEmotion {
                name: "bogus".into(),
            },
        ]);
        assert_eq!(frame.state.emotion, Emotion::Angry);
        assert_eq!(frame.blend_shapes.get("angry"), 1.0);
        assert!(frame.has_event(|ev| matches!(ev, EngineEvent::Rejected { .. })));
    }

    #[test]
    fn command_events_land_in_next_frame() {
        let mut e = Engine::new(small());
        e.set_listening(true);
        let frame = e.tick();
        assert!(frame.has_event(|ev| *ev == EngineEvent::ListeningChanged { listening: true }));
        assert!(e.tick().events.is_empty());
    }

    #[test]
    fn update_runs_whole_ticks() {
        let mut e = Engine::new(small());
        assert!(e.update(0.5 / 60.0).is_none());
        let tick = e.update(2.6 / 60.0).map(|f| f.tick);
        assert_eq!(tick, Some(3));
        assert_eq!(e.now(), 3);
    }

    #[test]
    fn animation_toggle_freezes_camera() {
        let mut e = Engine::new(small());
        e.set_animation_enabled(false);
        let base = e.camera_pose();
        for _ in 0..5 {
            assert_eq!(e.tick().camera, base);
        }
    }
}
