//! Idle camera sway: a slow circle of small radius around the base position.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::config::{CameraConfig, Config};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Sway angle in radians, kept in [0, 2π).
    pub phase: f32,
}

#[derive(Clone, Debug)]
pub struct CameraRig {
    base: CameraConfig,
    phase: f32,
    speed: f32,
    radius: f32,
    enabled: bool,
}

impl CameraRig {
    pub fn new(cfg: &Config) -> Self {
        Self {
            base: cfg.camera,
            phase: 0.0,
            speed: cfg.camera_animation_speed,
            radius: cfg.camera_animation_radius,
            enabled: cfg.animation_enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling freezes the phase; re-enabling resumes from it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn base_pose(&self) -> CameraPose {
        CameraPose {
            position: self.base.position,
            target: self.base.target,
            up: self.base.up,
            phase: self.phase,
        }
    }

    /// Pose at the current phase without advancing.
    pub fn pose(&self) -> CameraPose {
        let mut pose = self.base_pose();
        if self.enabled {
            let (s, c) = self.phase.sin_cos();
            pose.position[0] += self.radius * s;
            pose.position[2] += self.radius * c;
        }
        pose
    }

    /// Advance the sway by one tick and return the new pose.
    pub fn tick(&mut self) -> CameraPose {
        if self.enabled {
            self.phase = (self.phase + self.speed).rem_euclid(TAU);
        }
        self.pose()
    }
}
