//! Shared microfacet machinery: the GGX-style distribution with its Smith
//! shadowing term, Fresnel approximations, and a reflection lobe used by both
//! the dielectric coating and the metal.

use lume_core::Color;
use lume_math::{Frame, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

use crate::sampling::gen_f32;

/// Microfacet normal distribution parameterised by roughness `alpha`.
///
/// All functions take the macro-surface normal `n` explicitly and treat
/// half vectors below it as having zero density.
#[derive(Debug, Clone, Copy)]
pub struct Ggx {
    pub alpha: f32,
}

impl Ggx {
    pub fn new(alpha: f32) -> Self {
        Self { alpha }
    }

    /// Distribution of microfacet normals `D(wh)`.
    pub fn d(&self, wh: Vec3, n: Vec3) -> f32 {
        let cos = wh.dot(n);
        if cos <= 0.0 {
            return 0.0;
        }
        let a2 = self.alpha * self.alpha;
        let cos2 = cos * cos;
        // Clamp for half vectors numerically just past the horizon
        let tan2 = (1.0 - cos2).max(0.0) / cos2;
        let denom = a2 + tan2;
        if denom <= 0.0 {
            return 0.0;
        }
        a2 / (PI * cos2 * cos2 * denom * denom)
    }

    /// Smith masking for one direction `v` against microfacet `wh`.
    pub fn g1(&self, v: Vec3, wh: Vec3, n: Vec3) -> f32 {
        let v_n = v.dot(n);
        if v_n == 0.0 || v.dot(wh) / v_n <= 0.0 {
            return 0.0;
        }
        let tan2 = (1.0 - v_n * v_n).max(0.0) / (v_n * v_n);
        2.0 / (1.0 + (1.0 + self.alpha * self.alpha * tan2).sqrt())
    }

    /// Separable shadowing-masking `G(wi, wo)`.
    pub fn g(&self, wi: Vec3, wo: Vec3, wh: Vec3, n: Vec3) -> f32 {
        self.g1(wo, wh, n) * self.g1(wi, wh, n)
    }

    /// Draw a microfacet normal in the hemisphere of `n`, distributed by
    /// `D(wh) |wh·n|`.
    pub fn sample_wh(&self, n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let r = gen_f32(rng);
        let phi = 2.0 * PI * gen_f32(rng);
        let cos_theta = 1.0 / (1.0 + self.alpha * self.alpha * r / (1.0 - r)).sqrt();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
        Frame::from_normal(n).to_world(local).normalize()
    }

    /// Density of [`Ggx::sample_wh`] with respect to solid angle of `wh`.
    pub fn pdf_wh(&self, wh: Vec3, n: Vec3) -> f32 {
        self.d(wh, n) * wh.dot(n).abs()
    }
}

/// Schlick's approximation for reflectance at normal incidence `r0`.
pub fn schlick(r0: f32, cos: f32) -> f32 {
    r0 + (1.0 - r0) * (1.0 - cos.abs()).max(0.0).powi(5)
}

/// Exact unpolarised Fresnel reflectance of a dielectric boundary.
///
/// `eta` is the ratio of the index on the far side to the index on the side
/// `cos` is measured from. Total internal reflection yields 1.
pub fn fresnel_dielectric(cos: f32, eta: f32) -> f32 {
    let c = cos.abs();
    let g2 = eta * eta - 1.0 + c * c;
    if g2 < 0.0 {
        return 1.0;
    }
    let g = g2.sqrt();
    let g_m_c = g - c;
    let g_p_c = g + c;
    if g_p_c == 0.0 {
        return 1.0;
    }
    let num = c * g_p_c - 1.0;
    let den = c * g_m_c + 1.0;
    let f = 0.5 * (g_m_c * g_m_c) / (g_p_c * g_p_c) * (1.0 + (num * num) / (den * den));
    f.clamp(0.0, 1.0)
}

/// Mirror `wo` about `wh`. Both point away from the surface.
#[inline]
pub fn reflect(wo: Vec3, wh: Vec3) -> Vec3 {
    2.0 * wo.dot(wh) * wh - wo
}

/// Refract `wo` through a microfacet `wh` that faces `wo`'s side.
///
/// `eta` is the index on `wo`'s side over the index on the far side.
/// Returns `None` on total internal reflection.
pub fn refract(wo: Vec3, wh: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = wo.dot(wh);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some((-eta * wo + (eta * cos_i - cos_t) * wh).normalize())
}

/// Whether `a` and `b` lie strictly on the same side of the plane through `n`.
#[inline]
pub fn same_hemisphere(a: Vec3, b: Vec3, n: Vec3) -> bool {
    a.dot(n) * b.dot(n) > 0.0
}

/// Microfacet reflection with a Schlick Fresnel term.
#[derive(Debug, Clone, Copy)]
pub struct GlossyLobe {
    pub ggx: Ggx,
    pub r0: f32,
}

impl GlossyLobe {
    pub fn new(roughness: f32, r0: f32) -> Self {
        Self {
            ggx: Ggx::new(roughness),
            r0,
        }
    }

    /// Fresnel term for the half vector between `wi` and `wo`.
    pub fn fresnel(&self, wi: Vec3, wo: Vec3) -> f32 {
        let wh = (wi + wo).normalize_or_zero();
        schlick(self.r0, wh.dot(wi))
    }

    /// Reflected value, zero unless both directions are above `n`.
    pub fn eval(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        let cos_i = wi.dot(n);
        let cos_o = wo.dot(n);
        if cos_i <= 0.0 || cos_o <= 0.0 {
            return 0.0;
        }
        let wh = (wi + wo).normalize_or_zero();
        if wh == Vec3::ZERO {
            return 0.0;
        }
        let f = schlick(self.r0, wh.dot(wi));
        f * self.ggx.d(wh, n) * self.ggx.g(wi, wo, wh, n) / (4.0 * cos_i * cos_o)
    }

    /// Density of [`GlossyLobe::sample`] proposing `wi`.
    pub fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        if wi.dot(n) <= 0.0 || wo.dot(n) <= 0.0 {
            return 0.0;
        }
        let wh = (wi + wo).normalize_or_zero();
        let wo_wh = wo.dot(wh).abs();
        if wo_wh == 0.0 {
            return 0.0;
        }
        self.ggx.pdf_wh(wh, n) / (4.0 * wo_wh)
    }

    /// Propose a reflected direction, or `None` if it ends up below `n`.
    pub fn sample(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Option<Vec3> {
        if wo.dot(n) <= 0.0 {
            return None;
        }
        let wh = self.ggx.sample_wh(n, rng);
        let wi = reflect(wo, wh);
        (wi.dot(n) > 0.0).then_some(wi)
    }

    /// Reflected value tinted by `color`.
    pub fn eval_tinted(&self, wi: Vec3, wo: Vec3, n: Vec3, color: Color) -> Color {
        self.eval(wi, wo, n) * color
    }
}
