//! Render settings read by the integrator and frame driver every frame.

use serde::{Deserialize, Serialize};

use crate::texture::FilterMode;

/// Weight given to BSDF-sampled hits on area lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MisWeight {
    /// Power heuristic against the light's own sampling density.
    #[default]
    Power,
    /// Constant 1.
    Unit,
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of bounces after the primary hit
    pub max_bounces: u32,

    /// Stop accumulating after this many passes (0 = unbounded)
    pub max_paths_per_pixel: u32,

    /// Render resolution divisor
    pub subsampling: u32,

    /// Thin-lens aperture radius (0 = pinhole)
    pub aperture: f32,

    /// Distance to the plane of perfect focus along the view axis
    pub focal_distance: f32,

    /// Whether escaped rays pick up environment radiance
    pub environment_light: bool,

    /// Texture filtering for materials and the environment
    pub filter: FilterMode,

    /// BSDF-side MIS weight for direct hits on area lights
    pub bsdf_mis: MisWeight,

    /// Worker threads (0 = rayon default)
    pub threads: usize,

    /// Base seed for the per-pixel random streams
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_bounces: 8,
            max_paths_per_pixel: 0,
            subsampling: 1,
            aperture: 0.0,
            focal_distance: 10.0,
            environment_light: true,
            filter: FilterMode::Bilinear,
            bsdf_mis: MisWeight::Power,
            threads: 0,
            seed: 0,
        }
    }
}

impl Settings {
    /// Whether the sample cap has been reached after `samples` passes.
    pub fn cap_reached(&self, samples: u32) -> bool {
        self.max_paths_per_pixel != 0 && samples >= self.max_paths_per_pixel
    }
}
