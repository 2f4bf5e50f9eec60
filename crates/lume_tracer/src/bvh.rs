//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary tree over [`Primitive`]s, built with a median split on the longest
//! centroid axis.

use lume_math::{Aabb, Ray};

use crate::geometry::{Primitive, SurfaceHit};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Scene traversal oracle used by the integrator.
///
/// Implementations are queried concurrently from every render thread and
/// must not mutate shared state.
pub trait Intersector: Send + Sync {
    /// Closest hit within the ray's range. Narrows `t_far` to the hit.
    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceHit>;

    /// Whether anything blocks the ray within its range.
    fn occluded(&self, ray: &Ray) -> bool;
}

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of primitives.
    Leaf { primitives: Vec<Primitive>, bbox: Aabb },
    /// Empty node (for edge cases).
    Empty,
}

impl BvhNode {
    /// Create a BVH from a list of primitives.
    pub fn new(primitives: Vec<Primitive>) -> Self {
        if primitives.is_empty() {
            return BvhNode::Empty;
        }
        let count = primitives.len();
        let bvh = Self::build(primitives);
        log::debug!("Built BVH over {count} primitives, depth {}", bvh.depth());
        bvh
    }

    fn build(mut primitives: Vec<Primitive>) -> Self {
        let bounds = primitives
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bounding_box()));

        if primitives.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                primitives,
                bbox: bounds,
            };
        }

        // Split along the axis where centroids spread the most
        let centroid_bounds = primitives.iter().fold(Aabb::EMPTY, |acc, p| {
            let c = p.bounding_box().centroid();
            Aabb::surrounding(&acc, &Aabb { min: c, max: c })
        });
        let axis = centroid_bounds.longest_axis();

        primitives.sort_unstable_by(|a, b| {
            let a = a.bounding_box().centroid()[axis];
            let b = b.bounding_box().centroid()[axis];
            a.total_cmp(&b)
        });

        let right = primitives.split_off(primitives.len() / 2);
        BvhNode::Branch {
            left: Box::new(Self::build(primitives)),
            right: Box::new(Self::build(right)),
            bbox: bounds,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } | BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BvhNode::Empty)
    }
}

impl Intersector for BvhNode {
    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceHit> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { primitives, bbox } => {
                if !bbox.hit(ray) {
                    return None;
                }
                // Each hit narrows t_far, so the last one found is the closest
                let mut closest = None;
                for primitive in primitives {
                    if let Some(hit) = primitive.hit(ray) {
                        closest = Some(hit);
                    }
                }
                closest
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray) {
                    return None;
                }
                let hit_left = left.intersect(ray);
                let hit_right = right.intersect(ray);
                hit_right.or(hit_left)
            }
        }
    }

    fn occluded(&self, ray: &Ray) -> bool {
        match self {
            BvhNode::Empty => false,
            BvhNode::Leaf { primitives, bbox } => {
                bbox.hit(ray)
                    && primitives.iter().any(|p| {
                        let mut scratch = *ray;
                        p.hit(&mut scratch).is_some()
                    })
            }
            BvhNode::Branch { left, right, bbox } => {
                bbox.hit(ray) && (left.occluded(ray) || right.occluded(ray))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Sphere, Triangle};
    use lume_math::Vec3;

    fn spheres(n: usize) -> Vec<Primitive> {
        (0..n)
            .map(|i| Primitive::Sphere(Sphere::new(Vec3::new(i as f32, 0.0, -5.0), 0.4, i)))
            .collect()
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = BvhNode::new(vec![]);
        assert!(bvh.is_empty());
        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(bvh.intersect(&mut ray).is_none());
        assert!(!bvh.occluded(&ray));
    }

    #[test]
    fn test_bvh_single_sphere() {
        let bvh = BvhNode::new(spheres(1));
        assert!(matches!(bvh, BvhNode::Leaf { .. }));

        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(bvh.intersect(&mut ray).is_some());
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let bvh = BvhNode::new(spheres(10));
        assert!(matches!(bvh, BvhNode::Branch { .. }));

        let mut ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), -Vec3::Z);
        let hit = bvh.intersect(&mut ray).unwrap();
        assert_eq!(hit.material, 5);
        assert!((hit.position.z - -4.6).abs() < 1e-4);
        assert_eq!(ray.t_far, hit.t);
    }

    #[test]
    fn test_bvh_returns_closest_of_overlapping() {
        // Walls at increasing depth, inserted far to near
        let prims: Vec<Primitive> = (0..8)
            .rev()
            .map(|i| {
                let z = -1.0 - i as f32;
                Primitive::Triangle(Triangle::new(
                    Vec3::new(-1.0, -1.0, z),
                    Vec3::new(1.0, -1.0, z),
                    Vec3::new(0.0, 1.0, z),
                    i,
                ))
            })
            .collect();
        let bvh = BvhNode::new(prims);

        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let hit = bvh.intersect(&mut ray).unwrap();
        assert_eq!(hit.material, 0);
        assert!((hit.t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_occluded_respects_range() {
        let bvh = BvhNode::new(spheres(10));
        let blocked = Ray::new(Vec3::new(3.0, 0.0, 0.0), -Vec3::Z);
        assert!(bvh.occluded(&blocked));

        let short = Ray::with_bounds(Vec3::new(3.0, 0.0, 0.0), -Vec3::Z, 0.0, 2.0);
        assert!(!bvh.occluded(&short));

        let clear = Ray::new(Vec3::new(3.0, 2.0, 0.0), -Vec3::Z);
        assert!(!bvh.occluded(&clear));
    }
}
