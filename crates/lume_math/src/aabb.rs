use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box for the scene BVH.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// A box that contains nothing; the identity for `surrounding`.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from two corner points (in any order).
    ///
    /// Flat boxes are padded so that slab tests stay well defined.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let delta = Vec3::splat(0.0001);
        let min = a.min(b);
        let max = a.max(b);
        let pad = (delta - (max - min)).max(Vec3::ZERO) * 0.5;
        Self {
            min: min - pad,
            max: max + pad,
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Test if a ray hits this box inside the ray's `[t_near, t_far]` range.
    ///
    /// Slab method.
    pub fn hit(&self, ray: &Ray) -> bool {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;

        let t_min = t0.min(t1).max_element().max(ray.t_near);
        let t_max = t0.max(t1).min_element().min(ray.t_far);
        t_min <= t_max
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.max - self.min;
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}
