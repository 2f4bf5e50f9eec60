//! Render-ready scene: materials, lights, environment and an intersector.

use std::sync::Arc;

use lume_core::{
    Color, Environment, Material, ObjectDesc, SceneDescription, SceneError, SceneResult, Settings,
};
use lume_math::{Ray, Vec2, Vec3};

use crate::bvh::{BvhNode, Intersector};
use crate::geometry::{self, Primitive, Sphere, SurfaceHit};
use crate::light::Light;

/// Surface point handed to the integrator.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    pub t: f32,
    pub position: Vec3,
    /// Outward facing, used to offset secondary rays
    pub geometric_normal: Vec3,
    /// Outward facing, used for shading
    pub shading_normal: Vec3,
    pub uv: Vec2,
    /// Direction back towards the ray origin
    pub wo: Vec3,
    pub material: &'a Material,
}

impl Intersection<'_> {
    /// Both normals flipped to the side of `wo`.
    pub fn facing_normals(&self) -> (Vec3, Vec3) {
        let flip = |n: Vec3| if n.dot(self.wo) < 0.0 { -n } else { n };
        let geometric = flip(self.geometric_normal);
        let mut shading = self.shading_normal;
        if shading.dot(geometric) < 0.0 {
            shading = -shading;
        }
        (geometric, shading)
    }
}

/// Everything the integrator reads while tracing.
///
/// Lights are public so a driver can edit them between frames; restart
/// accumulation afterwards.
pub struct Scene {
    pub materials: Vec<Arc<Material>>,
    pub lights: Vec<Light>,
    pub environment: Environment,
    intersector: Box<dyn Intersector>,
}

impl Scene {
    /// Assemble a scene around a ready intersector.
    pub fn with_intersector(
        intersector: Box<dyn Intersector>,
        materials: Vec<Arc<Material>>,
        lights: Vec<Light>,
        environment: Environment,
    ) -> Self {
        Self {
            materials,
            lights,
            environment,
            intersector,
        }
    }

    /// Build a scene with a BVH over `primitives`.
    ///
    /// Primitive material indices must address `materials`.
    pub fn new(
        primitives: Vec<Primitive>,
        materials: Vec<Arc<Material>>,
        lights: Vec<Light>,
        environment: Environment,
    ) -> SceneResult<Self> {
        if primitives.is_empty() {
            return Err(SceneError::EmptyScene);
        }
        let bvh = BvhNode::new(primitives);
        Ok(Self::with_intersector(
            Box::new(bvh),
            materials,
            lights,
            environment,
        ))
    }

    /// Build materials, geometry, lights and environment from a description.
    pub fn from_description(desc: &SceneDescription) -> SceneResult<Self> {
        let (materials, names) = desc.build_materials()?;

        let mut primitives = Vec::new();
        for (index, object) in desc.objects.iter().enumerate() {
            let material =
                *names
                    .get(object.material())
                    .ok_or_else(|| SceneError::UnknownMaterial {
                        object: index,
                        material: object.material().to_string(),
                    })?;

            match object {
                ObjectDesc::Sphere { center, radius, .. } => {
                    primitives.push(Primitive::Sphere(Sphere::new(*center, *radius, material)));
                }
                ObjectDesc::Quad {
                    corner,
                    side1,
                    side2,
                    ..
                } => {
                    primitives.extend(geometry::quad(*corner, *side1, *side2, material));
                }
                ObjectDesc::Mesh {
                    positions,
                    indices,
                    normals,
                    uvs,
                    transform,
                    ..
                } => {
                    primitives.extend(geometry::mesh(
                        index,
                        positions,
                        indices,
                        normals.as_deref(),
                        uvs.as_deref(),
                        transform.matrix(),
                        material,
                    )?);
                }
            }
        }

        let lights: Vec<Light> = desc.lights.iter().map(Light::from_desc).collect();
        let environment = desc.build_environment()?;

        log::info!(
            "Scene ready: {} primitives, {} materials, {} lights",
            primitives.len(),
            materials.len(),
            lights.len()
        );
        if lights.is_empty() && !materials.iter().any(|m| m.is_emissive()) {
            log::debug!("Scene has no lights or emitters; only the environment illuminates it");
        }

        Self::new(primitives, materials, lights, environment)
    }

    /// Closest surface along `ray`, narrowing its `t_far`.
    pub fn intersect(&self, ray: &mut Ray) -> Option<Intersection<'_>> {
        let SurfaceHit {
            t,
            position,
            geometric_normal,
            shading_normal,
            uv,
            material,
        } = self.intersector.intersect(ray)?;

        let Some(material) = self.materials.get(material) else {
            log::error!("Primitive references missing material {material}");
            return None;
        };

        Some(Intersection {
            t,
            position,
            geometric_normal,
            shading_normal,
            uv,
            wo: -ray.direction,
            material,
        })
    }

    /// Any-hit shadow test within the ray's range.
    pub fn occluded(&self, ray: &Ray) -> bool {
        self.intersector.occluded(ray)
    }

    /// Radiance arriving along an escaped ray with direction `direction`.
    pub fn environment_radiance(&self, direction: Vec3, settings: &Settings) -> Color {
        if !settings.environment_light {
            return Color::ZERO;
        }
        self.environment.radiance(direction, settings.filter)
    }
}
