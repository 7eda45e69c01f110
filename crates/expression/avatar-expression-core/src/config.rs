//! Engine configuration. Fixed at construction; hosts pass it as a struct or JSON.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::blendshape::{NeutralWeight, Vocabulary};

/// Options recognized by [`crate::Engine::new`]. Missing JSON fields fall back
/// to the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed tick rate. All durations below are expressed in ticks of this rate.
    pub tick_rate_hz: u32,
    /// Upper bound of ticks run by a single `Engine::update(dt)` call.
    pub max_catch_up_ticks: u32,

    pub blink_interval_ticks: u64,
    pub blink_duration_ticks: u64,

    /// Lower bound for text-driven utterance duration.
    pub min_speaking_ticks: u64,
    pub per_character_ticks: u64,
    /// Duration of an utterance started without text.
    pub default_speaking_ticks: u64,

    pub particle_counts: ParticleCounts,
    /// Seed of the particle random source.
    pub particle_seed: u64,
    /// Particles falling below this height are recycled at the top of the volume.
    pub particle_floor_y: f32,
    pub lightning: LightningConfig,

    /// Camera sway in radians per tick.
    pub camera_animation_speed: f32,
    pub camera_animation_radius: f32,
    pub camera: CameraConfig,
    /// Initial value of the animation toggle (camera sway).
    pub animation_enabled: bool,

    pub blend_shape_vocabulary: Vocabulary,
    pub neutral_weight: NeutralWeight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleCounts {
    pub rain: usize,
    pub snow: usize,
}

impl Default for ParticleCounts {
    fn default() -> Self {
        Self {
            rain: 1000,
            snow: 500,
        }
    }
}

/// Timing of the thunderstorm brightness pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightningConfig {
    pub min_interval_ticks: u32,
    pub max_interval_ticks: u32,
    pub flash_ticks: u32,
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            min_interval_ticks: 180,
            max_interval_ticks: 600,
            flash_ticks: 12,
        }
    }
}

/// Fixed part of the camera pose.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.4, 2.5],
            target: [0.0, 1.3, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            max_catch_up_ticks: 8,
            blink_interval_ticks: 200,
            blink_duration_ticks: 9,
            min_speaking_ticks: 30,
            per_character_ticks: 4,
            default_speaking_ticks: 60,
            particle_counts: ParticleCounts::default(),
            particle_seed: 0,
            particle_floor_y: 0.0,
            lightning: LightningConfig::default(),
            // ~10.5 s per revolution at 60 Hz
            camera_animation_speed: 0.01,
            camera_animation_radius: 0.05,
            camera: CameraConfig::default(),
            animation_enabled: true,
            blend_shape_vocabulary: Vocabulary::default(),
            neutral_weight: NeutralWeight::default(),
        }
    }
}

impl Config {
    /// Copy of this config with out-of-range values corrected. Each correction
    /// is logged; the engine only ever runs on a sanitized config.
    pub fn sanitized(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.tick_rate_hz == 0 {
            warn!("tick_rate_hz must be positive; using 60");
            cfg.tick_rate_hz = 60;
        }
        if cfg.max_catch_up_ticks == 0 {
            warn!("max_catch_up_ticks must be positive; using 1");
            cfg.max_catch_up_ticks = 1;
        }
        if cfg.blink_interval_ticks < 2 {
            warn!(
                "blink_interval_ticks {} too small; using 2",
                cfg.blink_interval_ticks
            );
            cfg.blink_interval_ticks = 2;
        }
        // blink must release strictly before the next onset
        let max_blink = cfg.blink_interval_ticks - 1;
        if cfg.blink_duration_ticks == 0 || cfg.blink_duration_ticks > max_blink {
            let fixed = cfg.blink_duration_ticks.clamp(1, max_blink);
            warn!(
                "blink_duration_ticks {} outside [1, {}]; using {}",
                cfg.blink_duration_ticks, max_blink, fixed
            );
            cfg.blink_duration_ticks = fixed;
        }
        if cfg.min_speaking_ticks == 0 {
            warn!("min_speaking_ticks must be positive; using 1");
            cfg.min_speaking_ticks = 1;
        }
        if cfg.default_speaking_ticks == 0 {
            warn!("default_speaking_ticks must be positive; using 1");
            cfg.default_speaking_ticks = 1;
        }
        let l = &mut cfg.lightning;
        if l.flash_ticks == 0 {
            warn!("lightning.flash_ticks must be positive; using 1");
            l.flash_ticks = 1;
        }
        if l.min_interval_ticks == 0 {
            warn!("lightning.min_interval_ticks must be positive; using 1");
            l.min_interval_ticks = 1;
        }
        if l.max_interval_ticks < l.min_interval_ticks {
            warn!(
                "lightning.max_interval_ticks {} below min {}; using min",
                l.max_interval_ticks, l.min_interval_ticks
            );
            l.max_interval_ticks = l.min_interval_ticks;
        }
        if !cfg.camera_animation_speed.is_finite() {
            warn!("camera_animation_speed is not finite; using 0");
            cfg.camera_animation_speed = 0.0;
        }
        if !cfg.camera_animation_radius.is_finite() || cfg.camera_animation_radius < 0.0 {
            warn!(
                "camera_animation_radius {} invalid; using 0",
                cfg.camera_animation_radius
            );
            cfg.camera_animation_radius = 0.0;
        }
        cfg
    }
}
