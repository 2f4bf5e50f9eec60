//! Surface materials.
//!
//! A material is a flat record of scalar parameters. Any of them can be
//! overridden by a texture; [`Material::resolve`] performs the lookups for a
//! hit point and returns plain values for the BSDF builder.

use std::sync::Arc;

use lume_math::{Vec2, Vec3};

use crate::texture::{FilterMode, Texture};

/// Smallest roughness handed to the microfacet lobes.
pub const MIN_ROUGHNESS: f32 = 0.001;

/// A material definition.
#[derive(Clone, Debug)]
pub struct Material {
    /// Material name (for diagnostics and scene lookup)
    pub name: String,

    /// Base color (linear RGB, 0-1)
    pub color: Vec3,

    /// Transparency (0=opaque, 1=fully transmissive)
    pub transparency: f32,

    /// Metallic factor (0=dielectric, 1=metal)
    pub metalness: f32,

    /// Fresnel reflectance at normal incidence (R0)
    pub fresnel: f32,

    /// Roughness factor (0=smooth, 1=rough)
    pub roughness: f32,

    /// Weight of the glossy lobes against plain diffuse
    pub reflectivity: f32,

    /// Emission strength, multiplied by the base color
    pub emission: f32,

    /// RGB overrides `color`; alpha overrides opacity
    pub color_texture: Option<Arc<Texture>>,
    pub metalness_texture: Option<Arc<Texture>>,
    pub fresnel_texture: Option<Arc<Texture>>,
    pub roughness_texture: Option<Arc<Texture>>,
    pub reflectivity_texture: Option<Arc<Texture>>,
    pub emission_texture: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Vec3::splat(0.5), // Grey default
            transparency: 0.0,
            metalness: 0.0,
            fresnel: 0.04,
            roughness: 0.5,
            reflectivity: 0.0,
            emission: 0.0,
            color_texture: None,
            metalness_texture: None,
            fresnel_texture: None,
            roughness_texture: None,
            reflectivity_texture: None,
            emission_texture: None,
        }
    }
}

impl Material {
    /// Create a new material with just a name and base color.
    pub fn new(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            color,
            ..Default::default()
        }
    }

    /// Set metalness.
    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    /// Set roughness.
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Set reflectivity.
    pub fn with_reflectivity(mut self, reflectivity: f32) -> Self {
        self.reflectivity = reflectivity;
        self
    }

    /// Set reflectance at normal incidence (R0).
    pub fn with_fresnel(mut self, fresnel: f32) -> Self {
        self.fresnel = fresnel;
        self
    }

    /// Set transparency.
    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = transparency;
        self
    }

    /// Set emission strength.
    pub fn with_emission(mut self, emission: f32) -> Self {
        self.emission = emission;
        self
    }

    /// Whether this material emits light.
    pub fn is_emissive(&self) -> bool {
        self.emission > 0.0 || self.emission_texture.is_some()
    }

    /// Evaluate every parameter at `uv`, applying texture overrides.
    pub fn resolve(&self, uv: Vec2, filter: FilterMode) -> SurfaceParams {
        let scalar = |texture: &Option<Arc<Texture>>, value: f32| match texture {
            Some(t) => t.channel(uv, 0, filter),
            None => value,
        };

        let (color, opacity) = match &self.color_texture {
            Some(t) => {
                let c = t.sample4(uv, filter);
                (c.truncate(), c.w)
            }
            None => (self.color, 1.0 - self.transparency),
        };

        SurfaceParams {
            color,
            opacity: opacity.clamp(0.0, 1.0),
            metalness: scalar(&self.metalness_texture, self.metalness).clamp(0.0, 1.0),
            fresnel: scalar(&self.fresnel_texture, self.fresnel).clamp(0.0, 1.0),
            roughness: scalar(&self.roughness_texture, self.roughness).clamp(MIN_ROUGHNESS, 1.0),
            reflectivity: scalar(&self.reflectivity_texture, self.reflectivity).clamp(0.0, 1.0),
            emission: scalar(&self.emission_texture, self.emission).max(0.0),
        }
    }
}

/// Material parameters resolved at one surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    pub color: Vec3,
    /// 1 - transparency
    pub opacity: f32,
    pub metalness: f32,
    pub fresnel: f32,
    pub roughness: f32,
    pub reflectivity: f32,
    pub emission: f32,
}
