use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TreeError;

/// How a leaf's `t = 0.6 + 0.2 * index` is mapped onto its branch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafPlacement {
    /// Plain Bézier parameter. Indices >= 2 extrapolate past the tip.
    #[default]
    Parametric,
    /// Fraction of arc length, clamped to the tip.
    ArcLength,
}

/// Canvas and layout constants.
///
/// `Default` reproduces the fixed logical canvas of the dashboard widget.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Distance from the bottom edge to the trunk base.
    pub ground_offset: f32,
    pub trunk_height: f32,
    pub trunk_width: f32,
    /// Half-range of the uniform leaf jitter on each axis.
    pub leaf_jitter: f32,
    pub leaf_placement: LeafPlacement,
    /// Samples used for arc-length lookup and host flattening.
    pub curve_samples: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 1020.0,
            canvas_height: 850.0,
            ground_offset: 85.0,
            trunk_height: 204.0,
            trunk_width: 42.5,
            leaf_jitter: 7.5,
            leaf_placement: LeafPlacement::Parametric,
            curve_samples: 64,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, TreeError> {
        let json = std::fs::read_to_string(path).map_err(|source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Center of the trunk base.
    pub fn trunk_base(&self) -> Vec2 {
        Vec2::new(
            self.canvas_width / 2.0,
            self.canvas_height - self.ground_offset,
        )
    }

    /// Shared origin of every branch, a little below the trunk top.
    pub fn branch_origin(&self) -> Vec2 {
        let base = self.trunk_base();
        Vec2::new(base.x, base.y - self.trunk_height + 34.0)
    }

    pub fn canvas_size(&self) -> Vec2 {
        Vec2::new(self.canvas_width, self.canvas_height)
    }
}
