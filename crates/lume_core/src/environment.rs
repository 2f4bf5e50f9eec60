//! Background radiance seen by rays that leave the scene.

use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;

use lume_math::{Vec2, Vec3};

use crate::error::TextureResult;
use crate::texture::{Encoding, FilterMode, Texture};

/// A latitude-longitude environment map scaled by a multiplier.
///
/// `+Y` is up: the top image row is the zenith and `u` runs around the
/// horizon starting at `+X` towards `+Z`.
#[derive(Clone, Debug)]
pub struct Environment {
    pub map: Arc<Texture>,
    pub multiplier: f32,
}

impl Environment {
    /// Wrap an already loaded map.
    pub fn new(map: Arc<Texture>, multiplier: f32) -> Self {
        Self { map, multiplier }
    }

    /// Uniform background colour.
    pub fn constant(color: Vec3) -> Self {
        Self::new(Arc::new(Texture::solid_color(color)), 1.0)
    }

    /// Load a lat-long map (HDR files stay linear, LDR is decoded from sRGB).
    pub fn load(path: impl AsRef<Path>, multiplier: f32) -> TextureResult<Self> {
        let map = Texture::load(path, Encoding::Srgb)?;
        log::info!(
            "Loaded environment map {} ({}x{})",
            map.path,
            map.width,
            map.height
        );
        Ok(Self::new(Arc::new(map), multiplier))
    }

    /// Map coordinates for a world direction.
    pub fn lookup_uv(direction: Vec3) -> Vec2 {
        let theta = direction.y.clamp(-1.0, 1.0).acos();
        let mut phi = direction.z.atan2(direction.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }

    /// Radiance arriving from `direction`.
    pub fn radiance(&self, direction: Vec3, filter: FilterMode) -> Vec3 {
        self.multiplier * self.map.sample(Self::lookup_uv(direction), filter)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::constant(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_uv_axes() {
        let up = Environment::lookup_uv(Vec3::Y);
        assert!(up.y.abs() < 0.001);

        let down = Environment::lookup_uv(-Vec3::Y);
        assert!((down.y - 1.0).abs() < 0.001);

        let x = Environment::lookup_uv(Vec3::X);
        assert!(x.x.abs() < 0.001);
        assert!((x.y - 0.5).abs() < 0.001);

        let z = Environment::lookup_uv(Vec3::Z);
        assert!((z.x - 0.25).abs() < 0.001);

        // Negative phi wraps into [0, 1)
        let neg_z = Environment::lookup_uv(-Vec3::Z);
        assert!((neg_z.x - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_lookup_clamps_slightly_denormalized_input() {
        let uv = Environment::lookup_uv(Vec3::new(0.0, 1.000_001, 0.0));
        assert!(uv.y.is_finite());
    }

    #[test]
    fn test_constant_environment() {
        let mut env = Environment::constant(Vec3::new(0.2, 0.4, 0.6));
        env.multiplier = 2.0;
        let l = env.radiance(Vec3::new(0.3, -0.2, 0.9).normalize(), FilterMode::Bilinear);
        assert!((l - Vec3::new(0.4, 0.8, 1.2)).length() < 0.001);
    }
}
