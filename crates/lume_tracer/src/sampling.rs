//! Random number helpers and direction samplers.
//!
//! Hemisphere and cone samplers return directions in a local frame with the
//! axis on +Z; use [`lume_math::Frame`] to move them to world space.

use lume_math::{Vec2, Vec3};
use rand::{Rng, RngCore};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Uniform float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniform point on the unit disk (Shirley-Chiu concentric mapping).
pub fn concentric_sample_disk(rng: &mut dyn RngCore) -> Vec2 {
    let u = Vec2::new(gen_f32(rng), gen_f32(rng)) * 2.0 - Vec2::ONE;
    if u.x == 0.0 && u.y == 0.0 {
        return Vec2::ZERO;
    }

    let (r, theta) = if u.x.abs() > u.y.abs() {
        (u.x, FRAC_PI_4 * (u.y / u.x))
    } else {
        (u.y, FRAC_PI_2 - FRAC_PI_4 * (u.x / u.y))
    };
    r * Vec2::new(theta.cos(), theta.sin())
}

/// Cosine-weighted direction on the +Z hemisphere. Density is `cos θ / π`.
pub fn cosine_sample_hemisphere(rng: &mut dyn RngCore) -> Vec3 {
    let d = concentric_sample_disk(rng);
    let z = (1.0 - d.length_squared()).max(0.0).sqrt();
    Vec3::new(d.x, d.y, z)
}

/// Uniform direction on the unit sphere. Density is `1 / 4π`.
pub fn uniform_sample_sphere(rng: &mut dyn RngCore) -> Vec3 {
    let z = 1.0 - 2.0 * gen_f32(rng);
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform direction inside the cone around +Z with half-angle `acos(cos_max)`.
/// Density is `1 / (2π (1 - cos_max))`.
pub fn uniform_sample_cone(rng: &mut dyn RngCore, cos_max: f32) -> Vec3 {
    let cos_theta = 1.0 - gen_f32(rng) * (1.0 - cos_max);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Power heuristic (β = 2) weight for a sample drawn from strategy `a`
/// competing with strategy `b`.
///
/// Always in `[0, 1]`; exactly 1 when `pdf_b` is 0, and 0 when `pdf_a` is 0.
pub fn power_heuristic(pdf_a: f32, pdf_b: f32) -> f32 {
    if pdf_a <= 0.0 {
        return 0.0;
    }
    // Ratio form stays finite for very peaked densities
    let r = pdf_b.max(0.0) / pdf_a;
    1.0 / (1.0 + r * r)
}
