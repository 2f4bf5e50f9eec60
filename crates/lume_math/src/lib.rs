//! Lume math types.
//!
//! Thin layer over glam with the few geometric types the path tracer
//! shares between crates.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod frame;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use frame::{perpendicular, Frame};
pub use ray::Ray;
pub use transform::Mat4Ext;

/// Small offset used to push secondary ray origins off a surface.
pub const RAY_EPSILON: f32 = 1e-4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
    }
}
