use crate::Vec3;

/// Orthonormal basis around a normal.
///
/// Local coordinates put the normal on +Z, so `cos_theta(w) == w.z`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub s: Vec3,
    pub t: Vec3,
    pub n: Vec3,
}

impl Frame {
    /// Build a frame from a unit normal.
    pub fn from_normal(n: Vec3) -> Self {
        let s = perpendicular(n);
        let t = n.cross(s);
        Self { s, t, n }
    }

    /// World to local.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.s), v.dot(self.t), v.dot(self.n))
    }

    /// Local to world.
    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.s * v.x + self.t * v.y + self.n * v.z
    }
}

/// A unit vector perpendicular to the unit vector `v`.
pub fn perpendicular(v: Vec3) -> Vec3 {
    // Drop the smallest component to avoid a degenerate cross product
    if v.x.abs() > v.y.abs() {
        Vec3::new(-v.z, 0.0, v.x) / (v.x * v.x + v.z * v.z).sqrt()
    } else {
        Vec3::new(0.0, v.z, -v.y) / (v.y * v.y + v.z * v.z).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_is_orthonormal() {
        for n in [Vec3::X, Vec3::Y, -Vec3::Z, Vec3::new(1.0, 2.0, -3.0).normalize()] {
            let f = Frame::from_normal(n);
            assert!(f.s.dot(f.t).abs() < 1e-5);
            assert!(f.s.dot(f.n).abs() < 1e-5);
            assert!(f.t.dot(f.n).abs() < 1e-5);
            assert!((f.s.length() - 1.0).abs() < 1e-5);
            assert!((f.t.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_local_world_inverse() {
        let f = Frame::from_normal(Vec3::new(0.3, 0.9, 0.1).normalize());
        let v = Vec3::new(0.2, -0.5, 0.7);
        let back = f.to_world(f.to_local(v));
        assert!((back - v).length() < 1e-5);
        assert!((f.to_local(f.n).z - 1.0).abs() < 1e-5);
    }
}
