//! Primary ray generation from view and projection matrices.

use lume_core::Settings;
use lume_math::{Mat4, Ray, Vec2, Vec3};
use rand::RngCore;

use crate::sampling::{concentric_sample_disk, gen_f32};

/// Turns pixel coordinates into world-space rays for one frame.
///
/// Built once per frame from the matrices the driver was handed.
#[derive(Debug, Clone, Copy)]
pub struct RayGenerator {
    inv_view_proj: Mat4,
    origin: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    width: f32,
    height: f32,
    aperture: f32,
    focal_distance: f32,
}

impl RayGenerator {
    pub fn new(view: Mat4, proj: Mat4, width: u32, height: u32, settings: &Settings) -> Self {
        let cam_to_world = view.inverse();
        Self {
            inv_view_proj: (proj * view).inverse(),
            origin: cam_to_world.w_axis.truncate(),
            right: cam_to_world.x_axis.truncate().normalize_or_zero(),
            up: cam_to_world.y_axis.truncate().normalize_or_zero(),
            forward: -cam_to_world.z_axis.truncate().normalize_or_zero(),
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            aperture: settings.aperture.max(0.0),
            focal_distance: settings.focal_distance,
        }
    }

    /// Pinhole ray through `(x, y) + jitter`, with row 0 at the top.
    pub fn pinhole(&self, x: u32, y: u32, jitter: Vec2) -> Ray {
        let ndc = Vec3::new(
            2.0 * (x as f32 + jitter.x) / self.width - 1.0,
            1.0 - 2.0 * (y as f32 + jitter.y) / self.height,
            1.0,
        );
        let far = self.inv_view_proj.project_point3(ndc);
        Ray::new(self.origin, far - self.origin)
    }

    /// Jittered primary ray for pixel `(x, y)`, through a thin lens when
    /// the aperture is open.
    pub fn generate(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Ray {
        let jitter = Vec2::new(gen_f32(rng), gen_f32(rng));
        let ray = self.pinhole(x, y, jitter);
        if self.aperture <= 0.0 || self.focal_distance <= 0.0 {
            return ray;
        }

        // Every lens ray through this pixel meets the pinhole ray on the focal plane
        let along = ray.direction.dot(self.forward);
        if along <= 0.0 {
            return ray;
        }
        let focus = ray.at(self.focal_distance / along);

        let lens = concentric_sample_disk(rng) * self.aperture;
        let origin = self.origin + self.right * lens.x + self.up * lens.y;
        Ray::new(origin, focus - origin)
    }
}
