//! Per-vertex color derived from field values

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Coloring strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Same RGB for every vertex
    Constant([f32; 3]),

    /// Field value replicated to all channels
    Grayscale,

    /// Blue (low) through green to red (high) over `[0, 1]`
    Heat,
}

impl Default for ColorMode {
    fn default() -> Self {
        Self::Constant([1.0, 1.0, 1.0])
    }
}

impl ColorMode {
    /// Color of a grid vertex holding `value`, channels clamped to `[0, 1]`
    pub fn color_at(&self, value: f32) -> Vec3 {
        let color = match *self {
            Self::Constant(rgb) => Vec3::from_array(rgb),
            Self::Grayscale => Vec3::splat(value),
            Self::Heat => heat(value),
        };
        color.clamp(Vec3::ZERO, Vec3::ONE)
    }
}

fn heat(value: f32) -> Vec3 {
    let v = value.clamp(0.0, 1.0);
    if v < 0.5 {
        let t = v * 2.0;
        Vec3::new(0.0, t, 1.0 - t)
    } else {
        let t = (v - 0.5) * 2.0;
        Vec3::new(t, 1.0 - t, 0.0)
    }
}
