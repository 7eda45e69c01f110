//! Weather particles and the thunderstorm lightning pulse.
//!
//! Particles live in a bounded volume (`x, z ∈ [-3, 3]`, `y ∈ [1, 4]`),
//! move by their velocity every tick and are recycled at the top of the
//! volume when they fall below the floor or run out of lifetime, so the
//! population stays constant for a given mode. All randomness comes from an
//! injected [`RngCore`], which makes trajectories reproducible.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, LightningConfig, ParticleCounts};
use crate::error::ExpressionError;

pub const VOLUME_XZ: f32 = 3.0;
pub const VOLUME_Y_MIN: f32 = 1.0;
pub const VOLUME_Y_MAX: f32 = 4.0;

/// Bound of the snow lateral drift speed; beyond it the drift is damped.
const SNOW_DRIFT_MAX: f32 = 0.005;
const SNOW_DRIFT_JITTER: f32 = 0.0005;
const SNOW_DRIFT_DAMPING: f32 = 0.9;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherMode {
    #[default]
    None,
    Rain,
    Snow,
    /// Rain particles plus the lightning pulse.
    Thunderstorm,
}

impl WeatherMode {
    /// Case-insensitive; accepts weather-feed condition names as aliases
    /// (`drizzle` → rain, `clear`/`clouds` → none).
    pub fn parse(name: &str) -> Result<Self, ExpressionError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "clear" | "clouds" => Ok(WeatherMode::None),
            "rain" | "drizzle" => Ok(WeatherMode::Rain),
            "snow" => Ok(WeatherMode::Snow),
            "thunderstorm" => Ok(WeatherMode::Thunderstorm),
            _ => Err(ExpressionError::InvalidWeatherMode(name.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherMode::None => "none",
            WeatherMode::Rain => "rain",
            WeatherMode::Snow => "snow",
            WeatherMode::Thunderstorm => "thunderstorm",
        }
    }

    pub fn particle_count(self, counts: &ParticleCounts) -> usize {
        match self {
            WeatherMode::None => 0,
            WeatherMode::Rain | WeatherMode::Thunderstorm => counts.rain,
            WeatherMode::Snow => counts.snow,
        }
    }
}

impl FromStr for WeatherMode {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeatherMode::parse(s)
    }
}

impl fmt::Display for WeatherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: [f32; 3],
    /// Units per tick.
    pub velocity: [f32; 3],
    pub size: f32,
    /// RGBA
    pub color: [f32; 4],
    pub remaining_lifetime_ticks: u32,
}

/// Spawn ranges of one particle kind.
#[derive(Copy, Clone, Debug)]
struct Profile {
    size: (f32, f32),
    fall_speed: (f32, f32),
    drift: f32,
    lifetime: (u32, u32),
    color: [f32; 4],
}

const RAIN: Profile = Profile {
    size: (0.01, 0.03),
    fall_speed: (0.06, 0.12),
    drift: 0.0,
    lifetime: (90, 180),
    color: [0.70, 0.75, 0.85, 0.6],
};

const SNOW: Profile = Profile {
    size: (0.02, 0.06),
    fall_speed: (0.008, 0.02),
    drift: SNOW_DRIFT_MAX,
    lifetime: (300, 600),
    color: [1.0, 1.0, 1.0, 0.9],
};

fn profile(mode: WeatherMode) -> Option<&'static Profile> {
    match mode {
        WeatherMode::None => None,
        WeatherMode::Rain | WeatherMode::Thunderstorm => Some(&RAIN),
        WeatherMode::Snow => Some(&SNOW),
    }
}

fn spawn(rng: &mut dyn RngCore, p: &Profile, at_top: bool) -> Particle {
    let x = rng.gen_range(-VOLUME_XZ..=VOLUME_XZ);
    let z = rng.gen_range(-VOLUME_XZ..=VOLUME_XZ);
    let y = if at_top {
        VOLUME_Y_MAX
    } else {
        rng.gen_range(VOLUME_Y_MIN..=VOLUME_Y_MAX)
    };
    let vx = if p.drift > 0.0 {
        rng.gen_range(-p.drift..=p.drift)
    } else {
        0.0
    };
    let vy = -rng.gen_range(p.fall_speed.0..=p.fall_speed.1);
    Particle {
        position: [x, y, z],
        velocity: [vx, vy, 0.0],
        size: rng.gen_range(p.size.0..=p.size.1),
        color: p.color,
        remaining_lifetime_ticks: rng.gen_range(p.lifetime.0..=p.lifetime.1),
    }
}

/// Timed full-scene brightness pulse, independent of the particles.
#[derive(Clone, Debug)]
struct Lightning {
    cfg: LightningConfig,
    armed: bool,
    countdown: u32,
    flash_remaining: u32,
}

impl Lightning {
    fn new(cfg: LightningConfig) -> Self {
        Self {
            cfg,
            armed: false,
            countdown: 0,
            flash_remaining: 0,
        }
    }

    fn next_interval(&self, rng: &mut dyn RngCore) -> u32 {
        rng.gen_range(self.cfg.min_interval_ticks..=self.cfg.max_interval_ticks)
    }

    fn arm(&mut self, rng: &mut dyn RngCore) {
        self.armed = true;
        self.flash_remaining = 0;
        self.countdown = self.next_interval(rng);
    }

    fn disarm(&mut self) {
        self.armed = false;
        self.countdown = 0;
        self.flash_remaining = 0;
    }

    /// True on the tick a flash begins.
    fn tick(&mut self, rng: &mut dyn RngCore) -> bool {
        if !self.armed {
            return false;
        }
        if self.flash_remaining > 0 {
            self.flash_remaining -= 1;
            return false;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.flash_remaining = self.cfg.flash_ticks;
            self.countdown = self.next_interval(rng);
            return true;
        }
        false
    }

    fn intensity(&self) -> f32 {
        if self.flash_remaining == 0 {
            0.0
        } else {
            self.flash_remaining as f32 / self.cfg.flash_ticks as f32
        }
    }
}

pub struct ParticleSystem {
    mode: WeatherMode,
    particles: Vec<Particle>,
    counts: ParticleCounts,
    floor_y: f32,
    lightning: Lightning,
    rng: Box<dyn RngCore + Send>,
}

impl fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("mode", &self.mode)
            .field("particles", &self.particles.len())
            .field("lightning", &self.lightning)
            .finish_non_exhaustive()
    }
}

impl ParticleSystem {
    /// Random source seeded from `cfg.particle_seed`.
    pub fn new(cfg: &Config) -> Self {
        Self::with_rng(cfg, StdRng::seed_from_u64(cfg.particle_seed))
    }

    pub fn with_rng(cfg: &Config, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            mode: WeatherMode::None,
            particles: Vec::new(),
            counts: cfg.particle_counts,
            floor_y: cfg.particle_floor_y,
            lightning: Lightning::new(cfg.lightning),
            rng: Box::new(rng),
        }
    }

    #[inline]
    pub fn mode(&self) -> WeatherMode {
        self.mode
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn lightning_armed(&self) -> bool {
        self.lightning.armed
    }

    /// Current flash brightness in [0, 1].
    pub fn lightning_intensity(&self) -> f32 {
        self.lightning.intensity()
    }

    /// Tear down the current set and spawn the population of `mode`.
    /// Returns the new particle count.
    pub fn set_mode(&mut self, mode: WeatherMode) -> usize {
        self.mode = mode;
        self.particles.clear();
        if let Some(p) = profile(mode) {
            let n = mode.particle_count(&self.counts);
            self.particles.reserve(n);
            for _ in 0..n {
                self.particles.push(spawn(&mut *self.rng, p, false));
            }
        }
        if mode == WeatherMode::Thunderstorm {
            self.lightning.arm(&mut *self.rng);
        } else {
            self.lightning.disarm();
        }
        debug!("weather {mode}: {} particles", self.particles.len());
        self.particles.len()
    }

    /// Advance every particle one tick. Returns true when a lightning flash
    /// begins on this tick.
    pub fn tick(&mut self) -> bool {
        let rng = &mut *self.rng;
        if let Some(p) = profile(self.mode) {
            let drifting = p.drift > 0.0;
            for particle in &mut self.particles {
                if drifting {
                    let v = &mut particle.velocity[0];
                    *v += rng.gen_range(-SNOW_DRIFT_JITTER..=SNOW_DRIFT_JITTER);
                    if v.abs() > SNOW_DRIFT_MAX {
                        *v *= SNOW_DRIFT_DAMPING;
                    }
                }
                for axis in 0..3 {
                    particle.position[axis] += particle.velocity[axis];
                }
                particle.remaining_lifetime_ticks =
                    particle.remaining_lifetime_ticks.saturating_sub(1);
                if particle.position[1] < self.floor_y || particle.remaining_lifetime_ticks == 0 {
                    *particle = spawn(rng, p, true);
                }
            }
        }
        self.lightning.tick(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(seed: u64) -> ParticleSystem {
        let cfg = Config {
            particle_counts: ParticleCounts { rain: 64, snow: 32 },
            particle_seed: seed,
            ..Config::default()
        };
        ParticleSystem::new(&cfg)
    }

    #[test]
    fn parse_accepts_aliases_and_rejects_unknown() {
        assert_eq!(WeatherMode::parse("Rain"), Ok(WeatherMode::Rain));
        assert_eq!(WeatherMode::parse("drizzle"), Ok(WeatherMode::Rain));
        assert_eq!(WeatherMode::parse("clear"), Ok(WeatherMode::None));
        assert_eq!("thunderstorm".parse::<WeatherMode>(), Ok(WeatherMode::Thunderstorm));
        assert_eq!(
            WeatherMode::parse("hail"),
            Err(ExpressionError::InvalidWeatherMode("hail".into()))
        );
    }

    #[test]
    fn set_mode_spawns_configured_count_inside_volume() {
        let mut ps = system(1);
        assert_eq!(ps.set_mode(WeatherMode::Rain), 64);
        assert_eq!(ps.set_mode(WeatherMode::Snow), 32);
        for p in ps.particles() {
            assert!(p.position[0].abs() <= VOLUME_XZ && p.position[2].abs() <= VOLUME_XZ);
            assert!((VOLUME_Y_MIN..=VOLUME_Y_MAX).contains(&p.position[1]));
            assert!(p.velocity[1] < 0.0);
        }
        assert_eq!(ps.set_mode(WeatherMode::None), 0);
        assert!(ps.is_empty());
    }

    #[test]
    fn population_is_stable_while_ticking() {
        let mut ps = system(2);
        ps.set_mode(WeatherMode::Rain);
        for _ in 0..500 {
            ps.tick();
            assert_eq!(ps.len(), 64);
            assert!(ps.particles().iter().all(|p| p.position[1] >= 0.0 - 0.2));
        }
    }

    #[test]
    fn same_seed_same_trajectories() {
        let mut a = system(42);
        let mut b = system(42);
        a.set_mode(WeatherMode::Snow);
        b.set_mode(WeatherMode::Snow);
        for _ in 0..120 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.particles(), b.particles());

        let mut c = system(43);
        c.set_mode(WeatherMode::Snow);
        assert_ne!(a.particles()[0], c.particles()[0]);
    }

    #[test]
    fn rain_falls_faster_than_snow() {
        let mut ps = system(3);
        ps.set_mode(WeatherMode::Rain);
        let rain = ps.particles().iter().map(|p| -p.velocity[1]).fold(f32::MAX, f32::min);
        ps.set_mode(WeatherMode::Snow);
        let snow = ps.particles().iter().map(|p| -p.velocity[1]).fold(0.0, f32::max);
        assert!(rain > snow, "slowest rain {rain} vs fastest snow {snow}");
    }

    #[test]
    fn snow_drift_stays_bounded() {
        let mut ps = system(4);
        ps.set_mode(WeatherMode::Snow);
        for _ in 0..300 {
            ps.tick();
        }
        let bound = SNOW_DRIFT_MAX + SNOW_DRIFT_JITTER;
        assert!(ps.particles().iter().all(|p| p.velocity[0].abs() <= bound));
    }

    #[test]
    fn lightning_only_in_thunderstorm_and_decays() {
        let mut ps = system(5);
        ps.set_mode(WeatherMode::Rain);
        assert!(!ps.lightning_armed());
        ps.set_mode(WeatherMode::Thunderstorm);
        assert!(ps.lightning_armed());
        assert_eq!(ps.len(), 64);

        let max = LightningConfig::default().max_interval_ticks;
        assert!((0..=max).any(|_| ps.tick()), "no flash within max interval");
        assert_eq!(ps.lightning_intensity(), 1.0);
        let mut last = 1.0;
        for _ in 0..LightningConfig::default().flash_ticks {
            ps.tick();
            let now = ps.lightning_intensity();
            assert!(now < last);
            last = now;
        }
        assert_eq!(last, 0.0);

        ps.set_mode(WeatherMode::None);
        assert!(!ps.lightning_armed());
        assert_eq!(ps.lightning_intensity(), 0.0);
    }
}
