//! Scattering functions.
//!
//! A [`Bsdf`] is a small tree built fresh at every intersection from the
//! resolved material parameters and dropped before the next bounce. Composite
//! nodes borrow their children, which live on the stack of the scope that
//! builds the tree (see [`with_surface_bsdf`]).
//!
//! All directions are world space unit vectors pointing away from the
//! surface. `n` is the shading normal.

mod blend;
mod dielectric;
mod diffuse;
mod metal;
pub mod microfacet;
mod transmission;

pub use blend::LinearBlend;
pub use dielectric::Dielectric;
pub use diffuse::Diffuse;
pub use metal::Metal;
pub use transmission::Transmission;

use lume_core::{Color, SurfaceParams};
use lume_math::Vec3;
use rand::RngCore;

/// Index of refraction used for transmissive materials.
pub const GLASS_IOR: f32 = 1.5;

/// A direction proposed by [`Bsdf::sample_wi`].
///
/// `f` is the node's value for `wi` and `pdf` the solid angle density with
/// which the node proposes it. A `pdf` of zero means sampling failed; callers
/// must stop rather than divide by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    pub wi: Vec3,
    pub pdf: f32,
    pub f: Color,
}

impl BsdfSample {
    pub const FAILED: BsdfSample = BsdfSample {
        wi: Vec3::ZERO,
        pdf: 0.0,
        f: Color::ZERO,
    };

    /// Package an evaluated direction, collapsing zero density to failure.
    pub fn evaluate(wi: Vec3, f: Color, pdf: f32) -> Self {
        if pdf > 0.0 {
            Self { wi, pdf, f }
        } else {
            Self::FAILED
        }
    }

    pub fn is_valid(&self) -> bool {
        self.pdf > 0.0
    }
}

/// A node of the per-intersection scattering tree.
#[derive(Debug, Clone, Copy)]
pub enum Bsdf<'a> {
    Diffuse(Diffuse),
    Dielectric(Dielectric<'a>),
    Metal(Metal),
    Transmission(Transmission),
    Blend(LinearBlend<'a>),
}

impl<'a> Bsdf<'a> {
    /// Value for the direction pair. Zero outside the node's valid hemispheres.
    pub fn f(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        match self {
            Bsdf::Diffuse(b) => b.f(wi, wo, n),
            Bsdf::Dielectric(b) => b.f(wi, wo, n),
            Bsdf::Metal(b) => b.f(wi, wo, n),
            Bsdf::Transmission(b) => b.f(wi, wo, n),
            Bsdf::Blend(b) => b.f(wi, wo, n),
        }
    }

    /// Solid angle density with which [`Bsdf::sample_wi`] proposes `wi`.
    pub fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        match self {
            Bsdf::Diffuse(b) => b.pdf(wi, wo, n),
            Bsdf::Dielectric(b) => b.pdf(wi, wo, n),
            Bsdf::Metal(b) => b.pdf(wi, wo, n),
            Bsdf::Transmission(b) => b.pdf(wi, wo, n),
            Bsdf::Blend(b) => b.pdf(wi, wo, n),
        }
    }

    /// Importance sample an incoming direction.
    pub fn sample_wi(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        match self {
            Bsdf::Diffuse(b) => b.sample_wi(wo, n, rng),
            Bsdf::Dielectric(b) => b.sample_wi(wo, n, rng),
            Bsdf::Metal(b) => b.sample_wi(wo, n, rng),
            Bsdf::Transmission(b) => b.sample_wi(wo, n, rng),
            Bsdf::Blend(b) => b.sample_wi(wo, n, rng),
        }
    }
}

/// Build the surface scattering tree for `params` and hand it to `body`.
///
/// Topology:
/// ```text
/// blend(opacity,
///       blend(reflectivity,
///             blend(metalness, metal, dielectric(coat over diffuse)),
///             diffuse),
///       transmission)
/// ```
pub fn with_surface_bsdf<R>(params: &SurfaceParams, body: impl FnOnce(&Bsdf<'_>) -> R) -> R {
    let diffuse = Bsdf::Diffuse(Diffuse::new(params.color));
    let dielectric = Bsdf::Dielectric(Dielectric::new(
        params.roughness,
        params.fresnel,
        Some(&diffuse),
    ));
    let transmission = Bsdf::Transmission(Transmission::new(
        GLASS_IOR,
        params.roughness,
        params.color,
    ));
    let metal = Bsdf::Metal(Metal::new(params.color, params.roughness, params.fresnel));

    let metal_blend = Bsdf::Blend(LinearBlend::new(params.metalness, &metal, &dielectric));
    let reflectivity_blend = Bsdf::Blend(LinearBlend::new(
        params.reflectivity,
        &metal_blend,
        &diffuse,
    ));
    let surface = Bsdf::Blend(LinearBlend::new(
        params.opacity,
        &reflectivity_blend,
        &transmission,
    ));

    body(&surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::uniform_sample_sphere;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    const N: Vec3 = Vec3::Y;

    fn wo() -> Vec3 {
        Vec3::new(0.3, 0.8, -0.2).normalize()
    }

    /// Run `check` against every node type, including a full surface tree.
    fn for_each_node(mut check: impl FnMut(&str, &Bsdf<'_>)) {
        let diffuse = Bsdf::Diffuse(Diffuse::new(Color::new(0.8, 0.5, 0.2)));
        check("diffuse", &diffuse);
        check(
            "dielectric",
            &Bsdf::Dielectric(Dielectric::new(0.3, 0.04, Some(&diffuse))),
        );
        check("coat", &Bsdf::Dielectric(Dielectric::new(0.2, 0.04, None)));
        check(
            "metal",
            &Bsdf::Metal(Metal::new(Color::new(1.0, 0.8, 0.3), 0.25, 0.9)),
        );
        check(
            "transmission",
            &Bsdf::Transmission(Transmission::new(GLASS_IOR, 0.3, Color::ONE)),
        );

        let params = SurfaceParams {
            color: Color::new(0.7, 0.6, 0.5),
            opacity: 0.6,
            metalness: 0.3,
            fresnel: 0.04,
            roughness: 0.35,
            reflectivity: 0.5,
            emission: 0.0,
        };
        with_surface_bsdf(&params, |bsdf| check("surface", bsdf));
    }

    #[test]
    fn test_f_is_non_negative() {
        let mut rng = StdRng::seed_from_u64(42);
        for_each_node(|name, bsdf| {
            for _ in 0..2000 {
                let wi = uniform_sample_sphere(&mut rng);
                let wo = uniform_sample_sphere(&mut rng);
                let f = bsdf.f(wi, wo, N);
                assert!(f.min_element() >= 0.0, "{name}: f = {f}");
                assert!(f.is_finite(), "{name}: f = {f}");
                assert!(bsdf.pdf(wi, wo, N) >= 0.0, "{name}");
            }
        });
    }

    #[test]
    fn test_diffuse_hemisphere_consistency() {
        let d = Diffuse::new(Color::ONE);
        let above = Vec3::new(0.0, 1.0, 0.0);
        let other = Vec3::new(0.5, 0.5, 0.0).normalize();

        assert!(d.f(other, above, N).x > 0.0);
        // wi below the surface
        assert_eq!(d.f(-other, above, N), Color::ZERO);
        // wi grazing
        assert_eq!(d.f(Vec3::X, above, N), Color::ZERO);
        // wo on the other side
        assert_eq!(d.f(other, -above, N), Color::ZERO);
    }

    #[test]
    fn test_sample_matches_f_and_pdf() {
        let mut rng = StdRng::seed_from_u64(7);
        for_each_node(|name, bsdf| {
            let mut valid = 0;
            for _ in 0..2000 {
                let s = bsdf.sample_wi(wo(), N, &mut rng);
                if !s.is_valid() {
                    assert_eq!(s.f, Color::ZERO, "{name}: failed sample carries weight");
                    continue;
                }
                valid += 1;
                let f = bsdf.f(s.wi, wo(), N);
                let pdf = bsdf.pdf(s.wi, wo(), N);
                assert!((s.f - f).length() <= 1e-4 * f.length().max(1.0), "{name}");
                assert!((s.pdf - pdf).abs() <= 1e-4 * pdf.max(1.0), "{name}");
            }
            assert!(valid > 1000, "{name}: only {valid} valid samples");
        });
    }

    #[test]
    fn test_diffuse_estimator_converges_to_albedo() {
        let mut rng = StdRng::seed_from_u64(42);
        let color = Color::new(0.9, 0.5, 0.1);
        let d = Diffuse::new(color);
        let samples = 20_000;
        let mut sum = Color::ZERO;
        for _ in 0..samples {
            let s = d.sample_wi(wo(), N, &mut rng);
            if s.is_valid() {
                sum += s.f * s.wi.dot(N).abs() / s.pdf;
            }
        }
        let estimate = sum / samples as f32;
        assert!((estimate - color).abs().max_element() < 0.01, "{estimate}");
    }

    #[test]
    fn test_blend_estimator_is_unbiased() {
        // Two diffuse lobes: ∫ f cos = w·c0 + (1-w)·c1
        let mut rng = StdRng::seed_from_u64(3);
        let c0 = Color::new(1.0, 0.0, 0.2);
        let c1 = Color::new(0.0, 0.6, 0.2);
        let a = Bsdf::Diffuse(Diffuse::new(c0));
        let b = Bsdf::Diffuse(Diffuse::new(c1));
        let w = 0.3;
        let blend = LinearBlend::new(w, &a, &b);

        let samples = 20_000;
        let mut sum = Color::ZERO;
        for _ in 0..samples {
            let s = blend.sample_wi(wo(), N, &mut rng);
            if s.is_valid() {
                sum += s.f * s.wi.dot(N).abs() / s.pdf;
            }
        }
        let expected = w * c0 + (1.0 - w) * c1;
        let estimate = sum / samples as f32;
        assert!((estimate - expected).abs().max_element() < 0.01, "{estimate}");

        // Closed form of f at a fixed direction
        let wi = Vec3::new(-0.2, 0.9, 0.1).normalize();
        let f = blend.f(wi, wo(), N);
        assert!((f - expected / PI).length() < 1e-5);
    }

    #[test]
    fn test_blend_mixture_pdf_integrates_to_one() {
        let mut rng = StdRng::seed_from_u64(9);
        let diffuse = Bsdf::Diffuse(Diffuse::new(Color::ONE));
        let coat = Bsdf::Dielectric(Dielectric::new(0.3, 0.04, None));
        let blend = Bsdf::Blend(LinearBlend::new(0.5, &coat, &diffuse));
        let n_up = Vec3::Y;

        let samples = 200_000;
        let mut sum = 0.0;
        for _ in 0..samples {
            let wi = uniform_sample_sphere(&mut rng);
            sum += blend.pdf(wi, n_up, n_up) * 4.0 * PI;
        }
        // Reflections escaping below the horizon lose about 8% of the coat
        let total = sum / samples as f32;
        assert!(total < 1.02 && total > 0.9, "{total}");
    }

    #[test]
    fn test_energy_conservation() {
        let mut rng = StdRng::seed_from_u64(11);
        for_each_node(|name, bsdf| {
            let samples = 20_000;
            let mut sum = Color::ZERO;
            for _ in 0..samples {
                let s = bsdf.sample_wi(wo(), N, &mut rng);
                if s.is_valid() {
                    sum += s.f * s.wi.dot(N).abs() / s.pdf;
                }
            }
            let albedo = sum / samples as f32;
            assert!(albedo.max_element() < 1.05, "{name}: albedo {albedo}");
        });
    }

    #[test]
    fn test_transmission_crosses_surface() {
        let mut rng = StdRng::seed_from_u64(5);
        let glass = Transmission::new(GLASS_IOR, 0.05, Color::ONE);
        let mut refracted = 0;
        for _ in 0..1000 {
            let s = glass.sample_wi(N, N, &mut rng);
            if s.is_valid() && s.wi.dot(N) < 0.0 {
                refracted += 1;
                // Nearly straight through at normal incidence
                assert!(s.wi.dot(-N) > 0.9);
            }
        }
        // Fresnel reflectance at normal incidence is ~4%
        assert!(refracted > 900, "{refracted}");

        // From inside at a grazing angle everything reflects
        let inside = Vec3::new(0.95, -0.1, 0.0).normalize();
        for _ in 0..200 {
            let s = glass.sample_wi(inside, N, &mut rng);
            if s.is_valid() {
                assert!(s.wi.dot(N) < 0.0);
            }
        }
    }

    #[test]
    fn test_opaque_surface_skips_transmission() {
        let params = SurfaceParams {
            color: Color::ONE,
            opacity: 1.0,
            metalness: 0.0,
            fresnel: 0.04,
            roughness: 0.5,
            reflectivity: 0.0,
            emission: 0.0,
        };
        with_surface_bsdf(&params, |bsdf| {
            // Pure diffuse: exactly color / π above, zero below
            let wi = Vec3::new(0.1, 0.9, 0.3).normalize();
            assert!((bsdf.f(wi, wo(), N) - Color::splat(1.0 / PI)).length() < 1e-6);
            assert_eq!(bsdf.f(-wi, wo(), N), Color::ZERO);
        });
    }
}
