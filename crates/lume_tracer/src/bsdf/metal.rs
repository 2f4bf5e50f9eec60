use lume_core::Color;
use lume_math::Vec3;
use rand::RngCore;

use super::microfacet::GlossyLobe;
use super::BsdfSample;

/// Glossy reflection tinted by the base color. No transmission.
#[derive(Debug, Clone, Copy)]
pub struct Metal {
    pub color: Color,
    pub lobe: GlossyLobe,
}

impl Metal {
    pub fn new(color: Color, roughness: f32, r0: f32) -> Self {
        Self {
            color,
            lobe: GlossyLobe::new(roughness, r0),
        }
    }

    pub fn f(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        self.lobe.eval_tinted(wi, wo, n, self.color)
    }

    pub fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        self.lobe.pdf(wi, wo, n)
    }

    pub fn sample_wi(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        match self.lobe.sample(wo, n, rng) {
            Some(wi) => BsdfSample::evaluate(wi, self.f(wi, wo, n), self.pdf(wi, wo, n)),
            None => BsdfSample::FAILED,
        }
    }
}
