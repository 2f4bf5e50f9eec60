//! Light sources for next-event estimation.
//!
//! Every light can be sampled from a reference point ([`Light::sample_li`]),
//! and every non-delta light can be hit by a BSDF-sampled ray
//! ([`Light::check_intersection`]) and report the density with which it
//! would have sampled that direction ([`Light::pdf_li`]).
//!
//! Lights are plain data; callers that edit them must restart accumulation.

use lume_core::{Color, LightDesc};
use lume_math::{perpendicular, Frame, Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

use crate::sampling::{concentric_sample_disk, gen_f32, uniform_sample_cone, uniform_sample_sphere};

/// Result of sampling a light from a reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit direction from the reference point towards the light
    pub wi: Vec3,
    /// Solid angle density (1 for delta lights)
    pub pdf: f32,
    /// Incident radiance (delta lights: irradiance scale) along `wi`
    pub radiance: Color,
    /// Distance to the sampled point
    pub distance: f32,
}

impl LightSample {
    pub const NONE: LightSample = LightSample {
        wi: Vec3::ZERO,
        pdf: 0.0,
        radiance: Color::ZERO,
        distance: 0.0,
    };
}

/// Point on a light found by [`Light::check_intersection`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightHit {
    pub point: Vec3,
    pub normal: Vec3,
}

/// Isotropic point light with inverse-square falloff.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
}

/// One-sided disk emitter. Emits towards `normal`, which need not be unit
/// length.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskLight {
    pub center: Vec3,
    pub normal: Vec3,
    pub radius: f32,
    pub color: Color,
    pub intensity: f32,
}

/// One-sided parallelogram emitter spanned by `side1` and `side2` from
/// `corner`. Emits towards `side1 × side2`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelogramLight {
    pub corner: Vec3,
    pub side1: Vec3,
    pub side2: Vec3,
    pub color: Color,
    pub intensity: f32,
}

/// Spherical emitter radiating from its whole surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereLight {
    pub center: Vec3,
    pub radius: f32,
    pub color: Color,
    pub intensity: f32,
}

/// A scene light.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Point(PointLight),
    Disk(DiskLight),
    Parallelogram(ParallelogramLight),
    Sphere(SphereLight),
}

impl PointLight {
    pub fn new(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
        }
    }

    fn sample_li(&self, reference: Vec3) -> LightSample {
        let to_light = self.position - reference;
        let d2 = to_light.length_squared();
        if d2 == 0.0 {
            return LightSample::NONE;
        }
        let distance = d2.sqrt();
        LightSample {
            wi: to_light / distance,
            pdf: 1.0,
            radiance: self.intensity * self.color / d2,
            distance,
        }
    }
}

impl DiskLight {
    pub fn new(center: Vec3, normal: Vec3, radius: f32, color: Color, intensity: f32) -> Self {
        let normal = match normal.try_normalize() {
            Some(n) => n,
            None => {
                log::warn!("Disk light at {center} has a zero normal; facing +Y");
                Vec3::Y
            }
        };
        if radius <= 0.0 {
            log::warn!("Disk light at {center} has non-positive radius {radius}");
        }
        Self {
            center,
            normal,
            radius,
            color,
            intensity,
        }
    }

    /// Unit emitting direction, +Y if `normal` has been zeroed.
    pub fn unit_normal(&self) -> Vec3 {
        self.normal.try_normalize().unwrap_or(Vec3::Y)
    }

    pub fn area(&self) -> f32 {
        PI * self.radius * self.radius
    }

    fn sample_point(&self, normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let d = concentric_sample_disk(rng) * self.radius;
        let frame = Frame::from_normal(normal);
        self.center + frame.s * d.x + frame.t * d.y
    }

    fn check_intersection(&self, ray: &mut Ray) -> Option<LightHit> {
        let normal = self.unit_normal();
        let point = intersect_plane(ray, self.center, normal, |p| {
            (p - self.center).length_squared() <= self.radius * self.radius
        })?;
        Some(LightHit { point, normal })
    }
}

impl ParallelogramLight {
    /// Create a parallelogram light.
    ///
    /// Non-orthogonal or degenerate edges are reported once here; the light
    /// still works with a best-effort normal.
    pub fn new(corner: Vec3, side1: Vec3, side2: Vec3, color: Color, intensity: f32) -> Self {
        if side1.cross(side2).try_normalize().is_none() {
            log::warn!("Parallelogram light at {corner} has degenerate edges {side1}, {side2}");
        }
        let scale = side1.length() * side2.length();
        if scale > 0.0 && side1.dot(side2).abs() > 1e-4 * scale {
            log::warn!(
                "Parallelogram light at {corner}: edges {side1} and {side2} are not orthogonal"
            );
        }
        Self {
            corner,
            side1,
            side2,
            color,
            intensity,
        }
    }

    /// Unit `side1 × side2`, recomputed from the current edges. Degenerate
    /// edges fall back to some unit vector perpendicular to them.
    pub fn normal(&self) -> Vec3 {
        self.side1.cross(self.side2).try_normalize().unwrap_or_else(|| {
            self.side1
                .try_normalize()
                .or_else(|| self.side2.try_normalize())
                .map(perpendicular)
                .unwrap_or(Vec3::Y)
        })
    }

    pub fn area(&self) -> f32 {
        self.side1.cross(self.side2).length()
    }

    fn sample_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.corner + gen_f32(rng) * self.side1 + gen_f32(rng) * self.side2
    }

    /// Inside test against the four edges, walked counter-clockwise about
    /// the normal.
    fn contains(&self, normal: Vec3, p: Vec3) -> bool {
        let a = self.corner;
        let b = a + self.side1;
        let c = b + self.side2;
        let d = a + self.side2;
        [(a, b), (b, c), (c, d), (d, a)]
            .iter()
            .all(|&(from, to)| normal.dot((to - from).cross(p - from)) >= 0.0)
    }

    fn check_intersection(&self, ray: &mut Ray) -> Option<LightHit> {
        let normal = self.normal();
        let point = intersect_plane(ray, self.corner, normal, |p| self.contains(normal, p))?;
        Some(LightHit { point, normal })
    }
}

impl SphereLight {
    pub fn new(center: Vec3, radius: f32, color: Color, intensity: f32) -> Self {
        if radius <= 0.0 {
            log::warn!("Sphere light at {center} has non-positive radius {radius}");
        }
        Self {
            center,
            radius,
            color,
            intensity,
        }
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    /// Whether `reference` is inside (or on) the sphere, where the light
    /// falls back to uniform area sampling.
    pub fn encloses(&self, reference: Vec3) -> bool {
        (reference - self.center).length_squared() <= self.radius * self.radius
    }

    /// `1 - cos θmax` of the cone subtended from outside, computed without
    /// cancellation for small spheres.
    fn cone_width(&self, reference: Vec3) -> f32 {
        let d2 = (reference - self.center).length_squared();
        let sin2 = (self.radius * self.radius / d2).min(1.0);
        let cos = (1.0 - sin2).max(0.0).sqrt();
        sin2 / (1.0 + cos)
    }

    fn sample_li(&self, reference: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let radiance = self.intensity * self.color;

        if self.encloses(reference) {
            let normal = uniform_sample_sphere(rng);
            let point = self.center + self.radius * normal;
            let to_light = point - reference;
            let distance = to_light.length();
            if distance == 0.0 {
                return LightSample::NONE;
            }
            let wi = to_light / distance;
            let pdf = area_to_solid_angle(distance, normal.dot(wi), self.area());
            if pdf == 0.0 {
                return LightSample::NONE;
            }
            return LightSample {
                wi,
                pdf,
                radiance,
                distance,
            };
        }

        let axis = self.center - reference;
        let d = axis.length();
        let width = self.cone_width(reference);
        if width <= 0.0 {
            return LightSample::NONE;
        }
        let local = uniform_sample_cone(rng, 1.0 - width);
        let wi = Frame::from_normal(axis / d).to_world(local).normalize();

        // Distance to the near side of the sphere along wi
        let cos_theta = local.z;
        let sin2_theta = (1.0 - cos_theta * cos_theta).max(0.0);
        let distance =
            d * cos_theta - (self.radius * self.radius - d * d * sin2_theta).max(0.0).sqrt();

        LightSample {
            wi,
            pdf: 1.0 / (2.0 * PI * width),
            radiance,
            distance: distance.max(0.0),
        }
    }

    fn pdf_li(&self, hit: &LightHit, reference: Vec3, wi: Vec3) -> f32 {
        if self.encloses(reference) {
            let distance = (hit.point - reference).length();
            return area_to_solid_angle(distance, hit.normal.dot(wi), self.area());
        }
        let width = self.cone_width(reference);
        if width <= 0.0 {
            return 0.0;
        }
        1.0 / (2.0 * PI * width)
    }

    fn check_intersection(&self, ray: &mut Ray) -> Option<LightHit> {
        let oc = self.center - ray.origin;
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = h * h - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // From inside only the exit root lies ahead
        let t = if c <= 0.0 { h + sqrtd } else { h - sqrtd };
        if !ray.narrow(t) {
            return None;
        }
        let point = ray.at(t);
        Some(LightHit {
            point,
            normal: (point - self.center) / self.radius,
        })
    }
}

/// Intersect `ray` with the plane through `origin` and narrow it on a hit
/// accepted by `inside`.
fn intersect_plane(
    ray: &mut Ray,
    origin: Vec3,
    normal: Vec3,
    inside: impl Fn(Vec3) -> bool,
) -> Option<Vec3> {
    let denom = ray.direction.dot(normal);
    if denom == 0.0 {
        return None;
    }
    let t = (origin - ray.origin).dot(normal) / denom;
    if !ray.contains(t) {
        return None;
    }
    let point = ray.at(t);
    if !inside(point) {
        return None;
    }
    ray.narrow(t);
    Some(point)
}

/// Convert a uniform area density to solid angle: `d² / (|cos| · area)`.
fn area_to_solid_angle(distance: f32, cos: f32, area: f32) -> f32 {
    let denom = cos.abs() * area;
    if denom <= 0.0 {
        return 0.0;
    }
    distance * distance / denom
}

/// Sample a one-sided planar emitter given a point already drawn on it.
fn sample_planar(
    point: Vec3,
    normal: Vec3,
    area: f32,
    radiance: Color,
    reference: Vec3,
) -> LightSample {
    let to_light = point - reference;
    let distance = to_light.length();
    if distance == 0.0 {
        return LightSample::NONE;
    }
    let wi = to_light / distance;
    let cos = wi.dot(normal);
    let pdf = area_to_solid_angle(distance, cos, area);
    if pdf == 0.0 {
        return LightSample::NONE;
    }
    LightSample {
        wi,
        pdf,
        // Reference point behind the emitting face
        radiance: if cos > 0.0 { Color::ZERO } else { radiance },
        distance,
    }
}

impl Light {
    /// Build a light from its scene description.
    pub fn from_desc(desc: &LightDesc) -> Self {
        match *desc {
            LightDesc::Point {
                position,
                color,
                intensity,
            } => Light::Point(PointLight::new(position, color, intensity)),
            LightDesc::Disk {
                center,
                normal,
                radius,
                color,
                intensity,
            } => Light::Disk(DiskLight::new(center, normal, radius, color, intensity)),
            LightDesc::Parallelogram {
                corner,
                side1,
                side2,
                color,
                intensity,
            } => Light::Parallelogram(ParallelogramLight::new(
                corner, side1, side2, color, intensity,
            )),
            LightDesc::Sphere {
                center,
                radius,
                color,
                intensity,
            } => Light::Sphere(SphereLight::new(center, radius, color, intensity)),
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Light::Point(l) => l.color,
            Light::Disk(l) => l.color,
            Light::Parallelogram(l) => l.color,
            Light::Sphere(l) => l.color,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Point(l) => l.intensity,
            Light::Disk(l) => l.intensity,
            Light::Parallelogram(l) => l.intensity,
            Light::Sphere(l) => l.intensity,
        }
    }

    /// Delta lights cannot be hit by chance and skip BSDF-side sampling.
    pub fn is_delta(&self) -> bool {
        matches!(self, Light::Point(_))
    }

    /// Sample a direction towards the light from `reference`.
    ///
    /// A zero `pdf` means no usable sample.
    pub fn sample_li(&self, reference: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let emitted = self.intensity() * self.color();
        match self {
            Light::Point(l) => l.sample_li(reference),
            Light::Disk(l) => {
                let normal = l.unit_normal();
                sample_planar(l.sample_point(normal, rng), normal, l.area(), emitted, reference)
            }
            Light::Parallelogram(l) => {
                sample_planar(l.sample_point(rng), l.normal(), l.area(), emitted, reference)
            }
            Light::Sphere(l) => l.sample_li(reference, rng),
        }
    }

    /// Solid angle density with which [`Light::sample_li`] from `reference`
    /// would produce `wi`, given that `wi` hits the light at `hit`.
    pub fn pdf_li(&self, hit: &LightHit, reference: Vec3, wi: Vec3) -> f32 {
        match self {
            Light::Point(_) => 0.0,
            Light::Disk(l) => {
                area_to_solid_angle((hit.point - reference).length(), hit.normal.dot(wi), l.area())
            }
            Light::Parallelogram(l) => {
                area_to_solid_angle((hit.point - reference).length(), hit.normal.dot(wi), l.area())
            }
            Light::Sphere(l) => l.pdf_li(hit, reference, wi),
        }
    }

    /// Test `ray` against the light's geometry, narrowing `t_far` on a hit.
    pub fn check_intersection(&self, ray: &mut Ray) -> Option<LightHit> {
        match self {
            Light::Point(_) => None,
            Light::Disk(l) => l.check_intersection(ray),
            Light::Parallelogram(l) => l.check_intersection(ray),
            Light::Sphere(l) => l.check_intersection(ray),
        }
    }

    /// Radiance leaving the light at `hit` towards the origin of a ray
    /// travelling along `wi`.
    pub fn le(&self, hit: &LightHit, wi: Vec3) -> Color {
        let emitted = self.intensity() * self.color();
        match self {
            Light::Point(_) => Color::ZERO,
            Light::Disk(_) | Light::Parallelogram(_) => {
                if hit.normal.dot(wi) > 0.0 {
                    Color::ZERO
                } else {
                    emitted
                }
            }
            Light::Sphere(_) => emitted,
        }
    }
}
