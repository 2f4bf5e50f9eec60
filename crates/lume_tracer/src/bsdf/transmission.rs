use lume_core::Color;
use lume_math::Vec3;
use rand::RngCore;

use super::microfacet::{fresnel_dielectric, reflect, refract, Ggx};
use super::BsdfSample;
use crate::sampling::gen_f32;

/// Rough dielectric interface (glass), reflecting and refracting.
///
/// `n` is the outward normal: when `wo` is below it the path is travelling
/// inside the medium and the index ratio flips. Sampling chooses reflection
/// with probability equal to the Fresnel reflectance of the sampled
/// microfacet. Refracted radiance is tinted by `tint`.
#[derive(Debug, Clone, Copy)]
pub struct Transmission {
    pub ggx: Ggx,
    pub ior: f32,
    pub tint: Color,
}

impl Transmission {
    pub fn new(ior: f32, roughness: f32, tint: Color) -> Self {
        Self {
            ggx: Ggx::new(roughness),
            ior,
            tint,
        }
    }

    /// Far-side index over `wo`-side index.
    fn eta(&self, wo: Vec3, n: Vec3) -> f32 {
        if wo.dot(n) > 0.0 {
            self.ior
        } else {
            1.0 / self.ior
        }
    }

    /// Half vector of a refraction pair, oriented along `n`.
    ///
    /// `None` if the pair cannot come from one microfacet.
    fn refraction_half_vector(&self, wi: Vec3, wo: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
        let mut wh = (wo + eta * wi).normalize_or_zero();
        if wh == Vec3::ZERO {
            return None;
        }
        if wh.dot(n) < 0.0 {
            wh = -wh;
        }
        (wo.dot(wh) * wi.dot(wh) < 0.0).then_some(wh)
    }

    fn reflection_half_vector(wi: Vec3, wo: Vec3, n: Vec3) -> Option<Vec3> {
        let wh = (wi + wo).normalize_or_zero();
        if wh == Vec3::ZERO {
            return None;
        }
        Some(if wh.dot(n) < 0.0 { -wh } else { wh })
    }

    pub fn f(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        let cos_i = wi.dot(n);
        let cos_o = wo.dot(n);
        if cos_i == 0.0 || cos_o == 0.0 {
            return Color::ZERO;
        }
        let eta = self.eta(wo, n);

        if cos_i * cos_o > 0.0 {
            let Some(wh) = Self::reflection_half_vector(wi, wo, n) else {
                return Color::ZERO;
            };
            let f = fresnel_dielectric(wo.dot(wh), eta);
            let value = f * self.ggx.d(wh, n) * self.ggx.g(wi, wo, wh, n)
                / (4.0 * (cos_i * cos_o).abs());
            return Color::splat(value);
        }

        let Some(wh) = self.refraction_half_vector(wi, wo, n, eta) else {
            return Color::ZERO;
        };
        let wo_wh = wo.dot(wh);
        let wi_wh = wi.dot(wh);
        let denom = wo_wh + eta * wi_wh;
        if denom == 0.0 {
            return Color::ZERO;
        }
        let f = fresnel_dielectric(wo_wh, eta);
        // Radiance transport: the eta² of the Jacobian cancels against 1/eta²
        let value = (1.0 - f) * self.ggx.d(wh, n) * self.ggx.g(wi, wo, wh, n) * (wi_wh * wo_wh).abs()
            / ((cos_i * cos_o).abs() * denom * denom);
        self.tint * value
    }

    pub fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        let cos_i = wi.dot(n);
        let cos_o = wo.dot(n);
        if cos_i == 0.0 || cos_o == 0.0 {
            return 0.0;
        }
        let eta = self.eta(wo, n);

        if cos_i * cos_o > 0.0 {
            let Some(wh) = Self::reflection_half_vector(wi, wo, n) else {
                return 0.0;
            };
            let wo_wh = wo.dot(wh).abs();
            if wo_wh == 0.0 {
                return 0.0;
            }
            let f = fresnel_dielectric(wo_wh, eta);
            return f * self.ggx.pdf_wh(wh, n) / (4.0 * wo_wh);
        }

        let Some(wh) = self.refraction_half_vector(wi, wo, n, eta) else {
            return 0.0;
        };
        let wi_wh = wi.dot(wh);
        let denom = wo.dot(wh) + eta * wi_wh;
        if denom == 0.0 {
            return 0.0;
        }
        let dwh_dwi = (eta * eta * wi_wh).abs() / (denom * denom);
        let f = fresnel_dielectric(wo.dot(wh), eta);
        (1.0 - f) * self.ggx.pdf_wh(wh, n) * dwh_dwi
    }

    pub fn sample_wi(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let cos_o = wo.dot(n);
        if cos_o == 0.0 {
            return BsdfSample::FAILED;
        }
        let eta = self.eta(wo, n);
        let wh = self.ggx.sample_wh(n, rng);
        let fresnel = fresnel_dielectric(wo.dot(wh), eta);

        let wi = if gen_f32(rng) < fresnel {
            let wi = reflect(wo, wh);
            if wi.dot(n) * cos_o <= 0.0 {
                return BsdfSample::FAILED;
            }
            wi
        } else {
            let facing = if wo.dot(wh) < 0.0 { -wh } else { wh };
            let Some(wi) = refract(wo, facing, 1.0 / eta) else {
                return BsdfSample::FAILED;
            };
            if wi.dot(n) * cos_o >= 0.0 {
                return BsdfSample::FAILED;
            }
            wi
        };

        BsdfSample::evaluate(wi, self.f(wi, wo, n), self.pdf(wi, wo, n))
    }
}
