use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide lighting knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Blend lights and ambient cubes across frames
    pub light_average: bool,
    /// Interpolation rate in 1/seconds. 0 turns interpolation off (values snap).
    pub light_lerp_speed: f64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_average: true,
            light_lerp_speed: 5.0,
        }
    }
}

impl LightingConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fraction of the previous value kept after `dt` seconds.
    /// A non-positive rate disables smoothing: nothing of the old value is kept.
    pub fn decay_factor(&self, dt: f64) -> f32 {
        if self.light_lerp_speed <= 0.0 {
            return 0.0;
        }
        (-self.light_lerp_speed * dt.max(0.0)).exp() as f32
    }
}
