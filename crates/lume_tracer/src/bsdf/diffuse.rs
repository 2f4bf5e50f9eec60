use lume_core::Color;
use lume_math::{Frame, Vec3};
use rand::RngCore;
use std::f32::consts::FRAC_1_PI;

use super::microfacet::same_hemisphere;
use super::BsdfSample;
use crate::sampling::cosine_sample_hemisphere;

/// Lambertian reflection.
#[derive(Debug, Clone, Copy)]
pub struct Diffuse {
    pub color: Color,
}

impl Diffuse {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    pub fn f(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        if wi.dot(n) <= 0.0 || !same_hemisphere(wi, wo, n) {
            return Color::ZERO;
        }
        self.color * FRAC_1_PI
    }

    pub fn pdf(&self, wi: Vec3, _wo: Vec3, n: Vec3) -> f32 {
        wi.dot(n).max(0.0) * FRAC_1_PI
    }

    pub fn sample_wi(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let wi = Frame::from_normal(n)
            .to_world(cosine_sample_hemisphere(rng))
            .normalize();
        let pdf = self.pdf(wi, wo, n);
        if pdf <= 0.0 {
            return BsdfSample::FAILED;
        }
        BsdfSample {
            wi,
            pdf,
            f: self.f(wi, wo, n),
        }
    }
}
