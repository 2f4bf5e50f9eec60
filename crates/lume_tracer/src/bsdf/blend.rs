use lume_core::Color;
use lume_math::Vec3;
use rand::RngCore;

use super::{Bsdf, BsdfSample};
use crate::sampling::gen_f32;

/// `w · bsdf0 + (1 - w) · bsdf1`.
///
/// Sampling picks `bsdf0` with probability `w`; the reported density is the
/// mixture of both children so that `f / pdf` stays unbiased.
#[derive(Debug, Clone, Copy)]
pub struct LinearBlend<'a> {
    pub w: f32,
    pub bsdf0: &'a Bsdf<'a>,
    pub bsdf1: &'a Bsdf<'a>,
}

impl<'a> LinearBlend<'a> {
    pub fn new(w: f32, bsdf0: &'a Bsdf<'a>, bsdf1: &'a Bsdf<'a>) -> Self {
        Self {
            w: w.clamp(0.0, 1.0),
            bsdf0,
            bsdf1,
        }
    }

    pub fn f(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        let mut f = Color::ZERO;
        // Zero-weight children are skipped, not evaluated
        if self.w > 0.0 {
            f += self.w * self.bsdf0.f(wi, wo, n);
        }
        if self.w < 1.0 {
            f += (1.0 - self.w) * self.bsdf1.f(wi, wo, n);
        }
        f
    }

    pub fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        let mut pdf = 0.0;
        if self.w > 0.0 {
            pdf += self.w * self.bsdf0.pdf(wi, wo, n);
        }
        if self.w < 1.0 {
            pdf += (1.0 - self.w) * self.bsdf1.pdf(wi, wo, n);
        }
        pdf
    }

    pub fn sample_wi(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let child = if gen_f32(rng) < self.w {
            self.bsdf0
        } else {
            self.bsdf1
        };
        let s = child.sample_wi(wo, n, rng);
        if !s.is_valid() {
            return BsdfSample::FAILED;
        }
        BsdfSample::evaluate(s.wi, self.f(s.wi, wo, n), self.pdf(s.wi, wo, n))
    }
}
