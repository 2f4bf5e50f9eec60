//! Intersectable primitives.
//!
//! Spheres and triangles report a geometric normal (true surface
//! orientation) and a shading normal (interpolated vertex normal when the
//! mesh carries one). Both are outward facing; the integrator decides which
//! side it is on.

use lume_core::{SceneError, SceneResult};
use lume_math::{Aabb, Mat4, Mat4Ext, Ray, Vec2, Vec3};
use std::f32::consts::PI;

/// Closest-hit record produced by primitive and BVH intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub t: f32,
    pub position: Vec3,
    pub geometric_normal: Vec3,
    pub shading_normal: Vec3,
    pub uv: Vec2,
    /// Index into the scene's material table
    pub material: usize,
}

/// An analytic sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: usize,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: usize) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            material,
        }
    }

    /// Spherical UV for a point on the unit sphere: u around +Y, v = 0 at
    /// the top.
    fn uv(p: Vec3) -> Vec2 {
        let theta = p.y.clamp(-1.0, 1.0).acos();
        let phi = p.z.atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }

    pub fn hit(&self, ray: &mut Ray) -> Option<SurfaceHit> {
        let oc = self.center - ray.origin;
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = h * h - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = h - sqrtd;
        if !ray.contains(root) {
            root = h + sqrtd;
            if !ray.contains(root) {
                return None;
            }
        }
        ray.narrow(root);

        let position = ray.at(root);
        let normal = (position - self.center) / self.radius;
        Some(SurfaceHit {
            t: root,
            position,
            geometric_normal: normal,
            shading_normal: normal,
            uv: Self::uv(normal),
            material: self.material,
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::from_points(self.center - r, self.center + r)
    }
}

/// A triangle with optional per-vertex shading normals and UVs.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub normals: Option<[Vec3; 3]>,
    pub uvs: [Vec2; 3],
    pub material: usize,
    /// Unit face normal following the winding order
    normal: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: usize) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            vertices: [v0, v1, v2],
            normals: None,
            uvs: [Vec2::ZERO, Vec2::X, Vec2::Y],
            material,
            normal,
        }
    }

    /// Attach per-vertex normals for smooth shading.
    pub fn with_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.normals = Some(normals.map(Vec3::normalize_or_zero));
        self
    }

    pub fn with_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn face_normal(&self) -> Vec3 {
        self.normal
    }

    /// Möller-Trumbore ray-triangle intersection.
    pub fn hit(&self, ray: &mut Ray) -> Option<SurfaceHit> {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray.narrow(t) {
            return None;
        }

        let w = 1.0 - u - v;
        let shading_normal = match self.normals {
            Some([n0, n1, n2]) => (w * n0 + u * n1 + v * n2)
                .try_normalize()
                .unwrap_or(self.normal),
            None => self.normal,
        };
        let [t0, t1, t2] = self.uvs;
        Some(SurfaceHit {
            t,
            position: ray.at(t),
            geometric_normal: self.normal,
            shading_normal,
            uv: w * t0 + u * t1 + v * t2,
            material: self.material,
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        let [v0, v1, v2] = self.vertices;
        Aabb::from_points(v0.min(v1).min(v2), v0.max(v1).max(v2))
    }
}

/// Any intersectable primitive stored in the BVH.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Primitive {
    /// Closest hit within the ray's range, narrowing `t_far`.
    #[inline]
    pub fn hit(&self, ray: &mut Ray) -> Option<SurfaceHit> {
        match self {
            Primitive::Sphere(s) => s.hit(ray),
            Primitive::Triangle(t) => t.hit(ray),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Sphere(s) => s.bounding_box(),
            Primitive::Triangle(t) => t.bounding_box(),
        }
    }
}

/// Parallelogram from `corner` spanned by `side1` and `side2`, as two
/// triangles facing `side1 × side2` with UVs covering `[0, 1]²`.
pub fn quad(corner: Vec3, side1: Vec3, side2: Vec3, material: usize) -> [Primitive; 2] {
    let a = corner;
    let b = corner + side1;
    let c = corner + side1 + side2;
    let d = corner + side2;
    [
        Primitive::Triangle(Triangle::new(a, b, c, material).with_uvs([
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ])),
        Primitive::Triangle(Triangle::new(a, c, d, material).with_uvs([
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])),
    ]
}

/// Bake an indexed mesh into world-space triangles.
///
/// `object` is the index of the mesh in the scene description, used only for
/// error reporting.
pub fn mesh(
    object: usize,
    positions: &[Vec3],
    indices: &[[u32; 3]],
    normals: Option<&[Vec3]>,
    uvs: Option<&[Vec2]>,
    transform: Mat4,
    material: usize,
) -> SceneResult<Vec<Primitive>> {
    let bad = |reason: String| SceneError::BadMesh { object, reason };

    if let Some(n) = normals {
        if n.len() != positions.len() {
            return Err(bad(format!(
                "{} normals for {} positions",
                n.len(),
                positions.len()
            )));
        }
    }
    if let Some(uv) = uvs {
        if uv.len() != positions.len() {
            return Err(bad(format!("{} uvs for {} positions", uv.len(), positions.len())));
        }
    }

    let world: Vec<Vec3> = positions
        .iter()
        .map(|&p| transform.transform_point3(p))
        .collect();
    let world_normals: Option<Vec<Vec3>> =
        normals.map(|n| n.iter().map(|&n| transform.transform_normal3(n)).collect());

    let mut triangles = Vec::with_capacity(indices.len());
    let mut degenerate = 0usize;
    for (face, idx) in indices.iter().enumerate() {
        let [i0, i1, i2] = idx.map(|i| i as usize);
        if let Some(&bad_index) = [i0, i1, i2].iter().find(|&&i| i >= world.len()) {
            return Err(bad(format!(
                "face {face} references vertex {bad_index} of {}",
                world.len()
            )));
        }

        let mut tri = Triangle::new(world[i0], world[i1], world[i2], material);
        if tri.face_normal() == Vec3::ZERO {
            degenerate += 1;
            continue;
        }
        if let Some(n) = &world_normals {
            tri = tri.with_normals([n[i0], n[i1], n[i2]]);
        }
        if let Some(uv) = uvs {
            tri = tri.with_uvs([uv[i0], uv[i1], uv[i2]]);
        }
        triangles.push(Primitive::Triangle(tri));
    }

    if degenerate > 0 {
        log::warn!("Mesh {object}: skipped {degenerate} degenerate triangles");
    }
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_hit_front_and_inside() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, 0);
        let mut ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let hit = sphere.hit(&mut ray).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.geometric_normal - -Vec3::Z).length() < 1e-5);
        assert_eq!(ray.t_far, hit.t);

        // From the centre the exit point is found
        let mut ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = sphere.hit(&mut ray).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.geometric_normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss_and_bounds() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, 0);
        let mut ray = Ray::new(Vec3::new(0.0, 2.0, -5.0), Vec3::Z);
        assert!(sphere.hit(&mut ray).is_none());

        let mut short = Ray::with_bounds(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.0, 3.0);
        assert!(sphere.hit(&mut short).is_none());
        assert_eq!(short.t_far, 3.0);
    }

    #[test]
    fn test_triangle_hit() {
        let tri = Triangle::new(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
            3,
        );
        assert!((tri.face_normal() - -Vec3::Y).length() < 1e-5);

        let mut ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y);
        let hit = tri.hit(&mut ray).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert_eq!(hit.material, 3);

        let mut ray = Ray::new(Vec3::new(5.0, 2.0, 0.0), -Vec3::Y);
        assert!(tri.hit(&mut ray).is_none());
    }

    #[test]
    fn test_triangle_interpolates_normals_and_uvs() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Z, 0)
            .with_normals([Vec3::Y, Vec3::new(1.0, 1.0, 0.0), Vec3::Y])
            .with_uvs([Vec2::ZERO, Vec2::X, Vec2::Y]);
        let mut ray = Ray::new(Vec3::new(0.5, 1.0, 0.0), -Vec3::Y);
        let hit = tri.hit(&mut ray).unwrap();

        // Geometric normal is the face normal, shading normal leans towards +X
        assert!((hit.geometric_normal.length() - 1.0).abs() < 1e-5);
        assert!(hit.shading_normal.x > 0.0);
        assert!((hit.shading_normal.length() - 1.0).abs() < 1e-5);
        assert!((hit.uv - Vec2::new(0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_quad_covers_parallelogram() {
        let [a, b] = quad(Vec3::ZERO, Vec3::X * 2.0, Vec3::Z * 2.0, 1);
        let hits = |p: Vec3| {
            let mut ray = Ray::new(p + Vec3::Y, -Vec3::Y);
            a.hit(&mut ray).or_else(|| b.hit(&mut ray))
        };
        let hit = hits(Vec3::new(1.5, 0.0, 0.5)).unwrap();
        assert!((hit.uv - Vec2::new(0.75, 0.25)).length() < 1e-5);
        assert!(hits(Vec3::new(0.5, 0.0, 1.5)).is_some());
        assert!(hits(Vec3::new(2.5, 0.0, 0.5)).is_none());
    }

    #[test]
    fn test_mesh_transform_and_validation() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Z];
        let transform = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let tris = mesh(0, &positions, &[[0, 2, 1]], None, None, transform, 0).unwrap();
        assert_eq!(tris.len(), 1);
        assert!((tris[0].bounding_box().min.y - 1.0).abs() < 1e-3);

        let err = mesh(4, &positions, &[[0, 1, 7]], None, None, Mat4::IDENTITY, 0).unwrap_err();
        assert!(matches!(err, SceneError::BadMesh { object: 4, .. }));

        let normals = [Vec3::Y];
        let err = mesh(0, &positions, &[[0, 1, 2]], Some(&normals[..]), None, Mat4::IDENTITY, 0);
        assert!(err.is_err());
    }

    #[test]
    fn test_mesh_skips_degenerate_faces() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::Z];
        let tris = mesh(0, &positions, &[[0, 1, 2], [0, 1, 3]], None, None, Mat4::IDENTITY, 0)
            .unwrap();
        assert_eq!(tris.len(), 1);
    }
}
