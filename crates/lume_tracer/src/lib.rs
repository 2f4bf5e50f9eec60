//! Lume Tracer - progressive CPU path tracer.
//!
//! - **BSDF model**: diffuse, coated dielectric, metal, rough glass and
//!   linear blends, built per hit from resolved material parameters
//! - **Lights**: point, disk, parallelogram and sphere emitters with
//!   next-event estimation and multiple importance sampling
//! - **Scene**: BVH over spheres and triangles behind the [`Intersector`] trait
//! - **Frame driver**: one jittered path per pixel per pass, folded into a
//!   running mean
//!
//! # Example
//!
//! ```ignore
//! use lume_core::SceneDescription;
//! use lume_tracer::{PathTracer, Renderer, Scene};
//!
//! let desc = SceneDescription::load("scenes/spheres.json")?;
//! let scene = Scene::from_description(&desc)?;
//! let mut renderer = Renderer::new(640, 480, desc.settings.clone());
//! let tracer = PathTracer::new(&scene);
//! while renderer.trace_paths(&tracer, desc.camera.view_matrix(), desc.camera.projection_matrix()) {}
//! ```

pub mod bsdf;
pub mod bvh;
pub mod camera;
pub mod geometry;
pub mod integrator;
pub mod light;
pub mod renderer;
pub mod sampling;
pub mod scene;

// Re-export commonly used types
pub use bsdf::{with_surface_bsdf, Bsdf, BsdfSample};
pub use bvh::{BvhNode, Intersector};
pub use camera::RayGenerator;
pub use geometry::{Primitive, Sphere, SurfaceHit, Triangle};
pub use integrator::{Integrator, PathTracer};
pub use light::{DiskLight, Light, LightHit, LightSample, ParallelogramLight, PointLight, SphereLight};
pub use renderer::{Image, Renderer};
pub use scene::{Intersection, Scene};
