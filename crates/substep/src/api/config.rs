use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_SUB_STEPS: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// Stepping configuration, usually loaded once from JSON at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Fixed sub-step size in seconds (default: 1/60).
    pub fixed_dt: f64,
    /// Upper bound on sub-steps per frame (default: 10).
    /// Steps beyond this are dropped rather than carried over.
    pub max_sub_steps: NonZeroU32,
    /// World gravity, read by `DynamicsWorld::from_config` and applied once
    /// per stepping frame. Default: zero.
    /// For Y-down coordinate systems, use positive Y for downward gravity.
    pub gravity: [f32; 2],
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_sub_steps: DEFAULT_MAX_SUB_STEPS,
            gravity: [0.0, 0.0],
        }
    }
}

impl StepConfig {
    /// Parse a configuration from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_fixed_dt(mut self, fixed_dt: f64) -> Self {
        self.fixed_dt = fixed_dt;
        self
    }

    pub fn with_max_sub_steps(mut self, max_sub_steps: NonZeroU32) -> Self {
        self.max_sub_steps = max_sub_steps;
        self
    }

    pub fn with_gravity(mut self, gravity: glam::Vec2) -> Self {
        self.gravity = gravity.to_array();
        self
    }

    pub fn gravity_vec(&self) -> glam::Vec2 {
        glam::Vec2::from_array(self.gravity)
    }
}
