// Transform helpers for placing scene objects.
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and
// inverse(); these cover the two cases it leaves out.

use crate::Aabb;
use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 used when baking object transforms.
pub trait Mat4Ext {
    /// Transform a surface normal (inverse transpose of the upper 3x3),
    /// renormalized.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        let m = Mat3::from_mat4(*self).inverse().transpose();
        (m * normal).normalize_or_zero()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let mut result = Aabb::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { aabb.min.x } else { aabb.max.x },
                if i & 2 == 0 { aabb.min.y } else { aabb.max.y },
                if i & 4 == 0 { aabb.min.z } else { aabb.max.z },
            );
            let p = self.transform_point3(corner);
            result.min = result.min.min(p);
            result.max = result.max.max(p);
        }
        Aabb::from_points(result.min, result.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_normal_under_scale() {
        // Non-uniform scale: normals must not follow the geometry scale
        let mat = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let n = Vec3::new(1.0, 1.0, 0.0).normalize();
        let transformed = mat.transform_normal3(n);

        let tangent = mat.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        assert!(transformed.dot(tangent).abs() < 0.001);
        assert!((transformed.length() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min - Vec3::splat(5.0)).length() < 0.001);
        assert!((transformed.max - Vec3::splat(6.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_rotation_grows_box() {
        use std::f32::consts::PI;

        let mat = Mat4::from_rotation_y(PI / 4.0);
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.max.x - 2.0_f32.sqrt()).abs() < 0.001);
        assert!((transformed.max.y - 1.0).abs() < 0.001);
    }
}
