use crate::Vec3;

/// A ray with a parametric validity range.
///
/// `t_far` is a monotonically decreasing bound: every intersection test that
/// finds a closer hit narrows it, so after a query it holds the distance to
/// the nearest hit found so far. Pass rays by value or by exclusive `&mut`;
/// never share one ray between concurrent queries.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction (normalized by the constructors).
    pub direction: Vec3,
    pub t_near: f32,
    pub t_far: f32,
}

impl Ray {
    /// Create a ray covering `[0, inf)`. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_bounds(origin, direction, 0.0, f32::INFINITY)
    }

    /// Create a ray with explicit bounds. The direction is normalized.
    pub fn with_bounds(origin: Vec3, direction: Vec3, t_near: f32, t_far: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            t_near,
            t_far,
        }
    }

    /// Ray leaving a surface point, offset along the geometric normal towards
    /// the side `direction` points to.
    pub fn spawn(position: Vec3, geometric_normal: Vec3, direction: Vec3) -> Self {
        let side = if direction.dot(geometric_normal) < 0.0 { -1.0 } else { 1.0 };
        Self::new(position + geometric_normal * (side * crate::RAY_EPSILON), direction)
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Whether `t` lies strictly inside the current range.
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        self.t_near < t && t < self.t_far
    }

    /// Narrow `t_far` to `t` if it is a valid closer hit.
    ///
    /// Returns false (and leaves the ray untouched) otherwise.
    pub fn narrow(&mut self, t: f32) -> bool {
        if self.contains(t) {
            self.t_far = t;
            true
        } else {
            false
        }
    }
}
