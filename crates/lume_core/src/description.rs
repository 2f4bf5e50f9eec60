//! JSON scene description.
//!
//! The description is plain data: it names materials, lights and objects.
//! Turning lights and objects into traceable geometry is the tracer's job;
//! this module resolves the parts that only need `lume_core` (materials,
//! textures and the environment).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lume_math::{EulerRot, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::environment::Environment;
use crate::error::{SceneError, SceneResult};
use crate::material::Material;
use crate::settings::Settings;
use crate::texture::{Encoding, Texture, TextureCache};

/// A complete scene file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub camera: Camera,
    pub settings: Settings,
    pub environment: EnvironmentDesc,
    pub materials: Vec<MaterialDesc>,
    pub lights: Vec<LightDesc>,
    pub objects: Vec<ObjectDesc>,

    /// Directory relative texture paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Background description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EnvironmentDesc {
    Constant {
        color: Vec3,
    },
    Map {
        path: String,
        #[serde(default = "one")]
        multiplier: f32,
    },
}

impl Default for EnvironmentDesc {
    fn default() -> Self {
        EnvironmentDesc::Constant { color: Vec3::ZERO }
    }
}

/// Named material with optional texture paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub name: String,
    pub color: Vec3,
    pub transparency: f32,
    pub metalness: f32,
    pub fresnel: f32,
    pub roughness: f32,
    pub reflectivity: f32,
    pub emission: f32,
    pub color_texture: Option<String>,
    pub metalness_texture: Option<String>,
    pub fresnel_texture: Option<String>,
    pub roughness_texture: Option<String>,
    pub reflectivity_texture: Option<String>,
    pub emission_texture: Option<String>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        let m = Material::default();
        Self {
            name: m.name,
            color: m.color,
            transparency: m.transparency,
            metalness: m.metalness,
            fresnel: m.fresnel,
            roughness: m.roughness,
            reflectivity: m.reflectivity,
            emission: m.emission,
            color_texture: None,
            metalness_texture: None,
            fresnel_texture: None,
            roughness_texture: None,
            reflectivity_texture: None,
            emission_texture: None,
        }
    }
}

/// Light description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LightDesc {
    Point {
        position: Vec3,
        #[serde(default = "white")]
        color: Vec3,
        #[serde(default = "one")]
        intensity: f32,
    },
    Disk {
        center: Vec3,
        /// Emitting side
        normal: Vec3,
        radius: f32,
        #[serde(default = "white")]
        color: Vec3,
        #[serde(default = "one")]
        intensity: f32,
    },
    Parallelogram {
        corner: Vec3,
        side1: Vec3,
        side2: Vec3,
        #[serde(default = "white")]
        color: Vec3,
        #[serde(default = "one")]
        intensity: f32,
    },
    Sphere {
        center: Vec3,
        radius: f32,
        #[serde(default = "white")]
        color: Vec3,
        #[serde(default = "one")]
        intensity: f32,
    },
}

/// Geometry description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectDesc {
    Sphere {
        center: Vec3,
        radius: f32,
        material: String,
    },
    /// Parallelogram made of two triangles
    Quad {
        corner: Vec3,
        side1: Vec3,
        side2: Vec3,
        material: String,
    },
    /// Indexed triangle mesh
    Mesh {
        positions: Vec<Vec3>,
        indices: Vec<[u32; 3]>,
        #[serde(default)]
        normals: Option<Vec<Vec3>>,
        #[serde(default)]
        uvs: Option<Vec<Vec2>>,
        #[serde(default)]
        transform: TransformDesc,
        material: String,
    },
}

impl ObjectDesc {
    /// Name of the material this object uses.
    pub fn material(&self) -> &str {
        match self {
            ObjectDesc::Sphere { material, .. }
            | ObjectDesc::Quad { material, .. }
            | ObjectDesc::Mesh { material, .. } => material,
        }
    }
}

/// Scale, then rotate (XYZ Euler, degrees), then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDesc {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl TransformDesc {
    /// Object-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation * (std::f32::consts::PI / 180.0);
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            self.translation,
        )
    }
}

fn one() -> f32 {
    1.0
}

fn white() -> Vec3 {
    Vec3::ONE
}

impl SceneDescription {
    /// Read and parse a scene file. Relative texture paths resolve against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut desc = Self::from_json(&text)?;
        desc.base_dir = path.parent().map(Path::to_path_buf);
        log::info!(
            "Loaded scene {}: {} materials, {} lights, {} objects",
            path.display(),
            desc.materials.len(),
            desc.lights.len(),
            desc.objects.len()
        );
        Ok(desc)
    }

    /// Parse a scene from a JSON string.
    pub fn from_json(text: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build every material, loading textures through a shared cache.
    ///
    /// Returns the materials and a name → index map for object lookup.
    pub fn build_materials(&self) -> SceneResult<(Vec<Arc<Material>>, HashMap<String, usize>)> {
        let mut cache = match &self.base_dir {
            Some(dir) => TextureCache::with_base_dir(dir),
            None => TextureCache::new(),
        };

        let mut materials = Vec::with_capacity(self.materials.len());
        let mut names = HashMap::new();
        for desc in &self.materials {
            let mut load = |path: &Option<String>, encoding| -> SceneResult<Option<Arc<Texture>>> {
                match path {
                    Some(p) => Ok(Some(cache.load(p, encoding)?)),
                    None => Ok(None),
                }
            };

            let material = Material {
                name: desc.name.clone(),
                color: desc.color,
                transparency: desc.transparency,
                metalness: desc.metalness,
                fresnel: desc.fresnel,
                roughness: desc.roughness,
                reflectivity: desc.reflectivity,
                emission: desc.emission,
                color_texture: load(&desc.color_texture, Encoding::Srgb)?,
                metalness_texture: load(&desc.metalness_texture, Encoding::Linear)?,
                fresnel_texture: load(&desc.fresnel_texture, Encoding::Linear)?,
                roughness_texture: load(&desc.roughness_texture, Encoding::Linear)?,
                reflectivity_texture: load(&desc.reflectivity_texture, Encoding::Linear)?,
                emission_texture: load(&desc.emission_texture, Encoding::Linear)?,
            };

            if names.insert(desc.name.clone(), materials.len()).is_some() {
                log::warn!("Material '{}' defined twice; the last one wins", desc.name);
            }
            materials.push(Arc::new(material));
        }

        if !cache.is_empty() {
            log::debug!(
                "Texture cache: {} textures, {:.1} MB",
                cache.len(),
                cache.total_size_bytes() as f32 / (1024.0 * 1024.0)
            );
        }

        Ok((materials, names))
    }

    /// Build the environment.
    pub fn build_environment(&self) -> SceneResult<Environment> {
        match &self.environment {
            EnvironmentDesc::Constant { color } => Ok(Environment::constant(*color)),
            EnvironmentDesc::Map { path, multiplier } => {
                let full = match &self.base_dir {
                    Some(dir) if !Path::new(path).is_absolute() => dir.join(path),
                    _ => PathBuf::from(path),
                };
                Ok(Environment::load(full, *multiplier)?)
            }
        }
    }
}
