use lume_core::Color;
use lume_math::Vec3;
use rand::RngCore;

use super::microfacet::{same_hemisphere, GlossyLobe};
use super::{Bsdf, BsdfSample};
use crate::sampling::gen_f32;

/// Glossy dielectric coating over an optional base layer.
///
/// Light not reflected by the coating (`1 - F`) reaches the base. With a
/// base present, sampling picks the coating or the base with equal odds.
#[derive(Debug, Clone, Copy)]
pub struct Dielectric<'a> {
    pub lobe: GlossyLobe,
    pub base: Option<&'a Bsdf<'a>>,
}

impl<'a> Dielectric<'a> {
    pub fn new(roughness: f32, r0: f32, base: Option<&'a Bsdf<'a>>) -> Self {
        Self {
            lobe: GlossyLobe::new(roughness, r0),
            base,
        }
    }

    pub fn f(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        if wi.dot(n) <= 0.0 || !same_hemisphere(wi, wo, n) {
            return Color::ZERO;
        }
        let coat = Color::splat(self.lobe.eval(wi, wo, n));
        match self.base {
            Some(base) => coat + (1.0 - self.lobe.fresnel(wi, wo)) * base.f(wi, wo, n),
            None => coat,
        }
    }

    pub fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        let coat = self.lobe.pdf(wi, wo, n);
        match self.base {
            Some(base) => 0.5 * coat + 0.5 * base.pdf(wi, wo, n),
            None => coat,
        }
    }

    pub fn sample_wi(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let wi = match self.base {
            Some(base) if gen_f32(rng) >= 0.5 => {
                let s = base.sample_wi(wo, n, rng);
                if !s.is_valid() {
                    return BsdfSample::FAILED;
                }
                s.wi
            }
            _ => match self.lobe.sample(wo, n, rng) {
                Some(wi) => wi,
                None => return BsdfSample::FAILED,
            },
        };
        BsdfSample::evaluate(wi, self.f(wi, wo, n), self.pdf(wi, wo, n))
    }
}
