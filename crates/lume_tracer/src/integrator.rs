//! Unidirectional path tracing with next-event estimation.
//!
//! At every vertex each light is sampled directly and, for lights with
//! area, the BSDF is sampled towards it as well; the two strategies are
//! combined with multiple importance sampling. The path then continues in a
//! BSDF-sampled direction until the bounce budget runs out.

use lume_core::{Color, MisWeight, Settings};
use lume_math::{Ray, Vec3};
use rand::RngCore;

use crate::bsdf::{with_surface_bsdf, Bsdf};
use crate::light::Light;
use crate::sampling::power_heuristic;
use crate::scene::Scene;

/// Contributions and throughputs below this in every channel are dropped.
const THROUGHPUT_EPSILON: f32 = 1e-6;

/// Shadow rays stop this fraction short of the sampled light point.
const SHADOW_EPSILON: f32 = 1e-3;

/// Estimates the radiance arriving along a camera ray.
pub trait Integrator: Sync {
    fn li(&self, ray: &Ray, settings: &Settings, rng: &mut dyn RngCore) -> Color;
}

/// Path tracer over a [`Scene`].
pub struct PathTracer<'a> {
    pub scene: &'a Scene,
}

fn negligible(c: Color) -> bool {
    c.max_element() < THROUGHPUT_EPSILON
}

impl<'a> PathTracer<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// MIS-weighted direct light from `light` scattered towards `wo`.
    #[allow(clippy::too_many_arguments)]
    fn direct_light(
        &self,
        light: &Light,
        bsdf: &Bsdf<'_>,
        position: Vec3,
        geometric_normal: Vec3,
        shading_normal: Vec3,
        wo: Vec3,
        settings: &Settings,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mut direct = Color::ZERO;

        // Light sampling
        let ls = light.sample_li(position, rng);
        if ls.pdf > 0.0 && !negligible(ls.radiance) {
            let f = bsdf.f(ls.wi, wo, shading_normal);
            if !negligible(f) {
                let mut shadow = Ray::spawn(position, geometric_normal, ls.wi);
                shadow.t_far = ls.distance * (1.0 - SHADOW_EPSILON);
                if !self.scene.occluded(&shadow) {
                    let weight = if light.is_delta() {
                        1.0
                    } else {
                        power_heuristic(ls.pdf, bsdf.pdf(ls.wi, wo, shading_normal))
                    };
                    let cos = ls.wi.dot(shading_normal).abs();
                    direct += f * ls.radiance * (cos * weight / ls.pdf);
                }
            }
        }

        if light.is_delta() {
            return direct;
        }

        // BSDF sampling towards the light
        let bs = bsdf.sample_wi(wo, shading_normal, rng);
        if !bs.is_valid() || negligible(bs.f) {
            return direct;
        }
        let mut ray = Ray::spawn(position, geometric_normal, bs.wi);
        let Some(hit) = light.check_intersection(&mut ray) else {
            return direct;
        };
        let le = light.le(&hit, bs.wi);
        if negligible(le) || self.scene.occluded(&ray) {
            return direct;
        }
        let weight = match settings.bsdf_mis {
            MisWeight::Power => power_heuristic(bs.pdf, light.pdf_li(&hit, position, bs.wi)),
            MisWeight::Unit => 1.0,
        };
        let cos = bs.wi.dot(shading_normal).abs();
        direct + bs.f * le * (cos * weight / bs.pdf)
    }
}

impl Integrator for PathTracer<'_> {
    fn li(&self, ray: &Ray, settings: &Settings, rng: &mut dyn RngCore) -> Color {
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut ray = *ray;

        for bounces in 0..=settings.max_bounces {
            let Some(hit) = self.scene.intersect(&mut ray) else {
                radiance += throughput * self.scene.environment_radiance(ray.direction, settings);
                return radiance;
            };

            let params = hit.material.resolve(hit.uv, settings.filter);
            let wo = hit.wo;
            // Opaque surfaces shade from whichever side they are seen; anything
            // that transmits keeps its outward normals to tell inside from out
            let (geometric_normal, shading_normal) = if params.opacity >= 1.0 {
                hit.facing_normals()
            } else {
                (hit.geometric_normal, hit.shading_normal)
            };

            let next = with_surface_bsdf(&params, |bsdf| {
                for light in &self.scene.lights {
                    radiance += throughput
                        * self.direct_light(
                            light,
                            bsdf,
                            hit.position,
                            geometric_normal,
                            shading_normal,
                            wo,
                            settings,
                            rng,
                        );
                }

                radiance += throughput * params.emission * params.color;

                if bounces == settings.max_bounces {
                    return None;
                }
                let sample = bsdf.sample_wi(wo, shading_normal, rng);
                if !sample.is_valid() || negligible(sample.f) {
                    return None;
                }
                Some(sample)
            });

            let Some(sample) = next else {
                return radiance;
            };

            throughput *= sample.f * (sample.wi.dot(shading_normal).abs() / sample.pdf);
            if negligible(throughput) {
                return radiance;
            }
            ray = Ray::spawn(hit.position, geometric_normal, sample.wi);
        }

        radiance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{self, Primitive, Sphere};
    use crate::light::{ParallelogramLight, PointLight};
    use lume_core::{Environment, Material};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;
    use std::sync::Arc;

    fn ground(material: Material, lights: Vec<Light>, environment: Environment) -> Scene {
        let floor = geometry::quad(
            Vec3::new(-50.0, 0.0, 50.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -100.0),
            0,
        );
        Scene::new(floor.to_vec(), vec![Arc::new(material)], lights, environment).unwrap()
    }

    fn white_diffuse() -> Material {
        Material::new("white", Color::ONE).with_roughness(1.0)
    }

    #[test]
    fn test_miss_returns_environment() {
        let scene = ground(white_diffuse(), vec![], Environment::constant(Color::new(0.3, 0.5, 0.7)));
        let tracer = PathTracer::new(&scene);
        let mut rng = StdRng::seed_from_u64(0);
        let up = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);

        let mut settings = Settings::default();
        assert_eq!(
            tracer.li(&up, &settings, &mut rng),
            scene.environment_radiance(Vec3::Y, &settings)
        );

        settings.environment_light = false;
        assert_eq!(tracer.li(&up, &settings, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_point_light_over_diffuse_plane() {
        let intensity = 10.0;
        let h = 2.0;
        let light = Light::Point(PointLight::new(Vec3::new(0.0, h, 0.0), Color::ONE, intensity));
        let scene = ground(white_diffuse(), vec![light], Environment::default());
        let tracer = PathTracer::new(&scene);
        let settings = Settings {
            max_bounces: 0,
            environment_light: false,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);

        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        let expected = intensity / (h * h) / PI;
        for _ in 0..8 {
            let l = tracer.li(&ray, &settings, &mut rng);
            assert!((l - Color::splat(expected)).abs().max_element() < 1e-4, "{l}");
        }
    }

    #[test]
    fn test_zero_bounces_ignores_indirect_light() {
        // Bright sky, no lights: only a continuation could pick it up
        let scene = ground(white_diffuse(), vec![], Environment::constant(Color::ONE));
        let tracer = PathTracer::new(&scene);
        let mut rng = StdRng::seed_from_u64(2);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);

        let settings = Settings {
            max_bounces: 0,
            ..Default::default()
        };
        assert_eq!(tracer.li(&ray, &settings, &mut rng), Color::ZERO);

        // One bounce of a white Lambertian plane under a white sky sees the sky
        let settings = Settings {
            max_bounces: 1,
            ..Default::default()
        };
        let n = 4000;
        let mean = (0..n)
            .map(|_| tracer.li(&ray, &settings, &mut rng))
            .sum::<Color>()
            / n as f32;
        assert!((mean - Color::ONE).abs().max_element() < 0.05, "{mean}");
    }

    #[test]
    fn test_emission_is_added() {
        let material = white_diffuse().with_emission(2.0);
        let scene = ground(material, vec![], Environment::default());
        let tracer = PathTracer::new(&scene);
        let settings = Settings {
            max_bounces: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        assert_eq!(tracer.li(&ray, &settings, &mut rng), Color::splat(2.0));
    }

    #[test]
    fn test_area_light_mis_is_unbiased() {
        // Small square light facing down over a diffuse floor: compare the
        // MIS estimate against a dense light-only estimate.
        let light = Light::Parallelogram(ParallelogramLight::new(
            Vec3::new(-0.5, 2.0, -0.5),
            Vec3::X,
            Vec3::Z,
            Color::ONE,
            5.0,
        ));
        let scene = ground(white_diffuse(), vec![light.clone()], Environment::default());
        let tracer = PathTracer::new(&scene);
        let settings = Settings {
            max_bounces: 0,
            environment_light: false,
            ..Default::default()
        };
        let ray = Ray::new(Vec3::new(0.3, 1.0, 0.1), -Vec3::Y);
        let mut rng = StdRng::seed_from_u64(4);

        let n = 20_000;
        let mis = (0..n)
            .map(|_| tracer.li(&ray, &settings, &mut rng))
            .sum::<Color>()
            / n as f32;

        // Reference: irradiance by pure area sampling, times 1/π
        let p = Vec3::new(0.3, 0.0, 0.1);
        let reference = (0..n)
            .map(|_| {
                let s = light.sample_li(p, &mut rng);
                if s.pdf == 0.0 {
                    return 0.0;
                }
                s.radiance.x * s.wi.y.max(0.0) / s.pdf / PI
            })
            .sum::<f32>()
            / n as f32;

        assert!(reference > 0.0);
        assert!(
            (mis.x - reference).abs() < 0.03 * reference,
            "mis {} vs reference {reference}",
            mis.x
        );
    }

    #[test]
    fn test_unit_bsdf_weight_overcounts() {
        // With a constant BSDF-side weight both strategies count the light in
        // full, so the estimate exceeds the power-heuristic one.
        let light = Light::Parallelogram(ParallelogramLight::new(
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::X * 2.0,
            Vec3::Z * 2.0,
            Color::ONE,
            1.0,
        ));
        let scene = ground(white_diffuse(), vec![light], Environment::default());
        let tracer = PathTracer::new(&scene);
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), -Vec3::Y);
        let mut rng = StdRng::seed_from_u64(5);

        let mean = |settings: &Settings, rng: &mut StdRng| {
            (0..5000).map(|_| tracer.li(&ray, settings, rng).x).sum::<f32>() / 5000.0
        };
        let power = Settings {
            max_bounces: 0,
            ..Default::default()
        };
        let unit = Settings {
            bsdf_mis: MisWeight::Unit,
            ..power.clone()
        };
        assert!(mean(&unit, &mut rng) > mean(&power, &mut rng) * 1.1);
    }

    #[test]
    fn test_occluded_point_light() {
        let light = Light::Point(PointLight::new(Vec3::new(0.0, 4.0, 0.0), Color::ONE, 10.0));
        let mut prims = geometry::quad(
            Vec3::new(-50.0, 0.0, 50.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -100.0),
            0,
        )
        .to_vec();
        prims.push(Primitive::Sphere(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5, 0)));
        let scene = Scene::new(
            prims,
            vec![Arc::new(white_diffuse())],
            vec![light],
            Environment::default(),
        )
        .unwrap();
        let tracer = PathTracer::new(&scene);
        let settings = Settings {
            max_bounces: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(6);

        let shadowed = Ray::new(Vec3::new(0.0, 0.2, 0.0), -Vec3::Y);
        assert_eq!(tracer.li(&shadowed, &settings, &mut rng), Color::ZERO);

        let lit = Ray::new(Vec3::new(3.0, 0.2, 0.0), -Vec3::Y);
        assert!(tracer.li(&lit, &settings, &mut rng).x > 0.0);
    }
}
