//! Lume Core - scene data shared by the path tracer and its drivers.
//!
//! This crate provides:
//!
//! - **Materials**: flat parameter records with optional texture overrides
//! - **Textures**: linear RGBA texel storage with nearest/bilinear lookups
//! - **Environment**: lat-long or constant background radiance
//! - **Settings**: render configuration read every frame
//! - **Scene description**: the JSON format loaded by the headless driver
//!
//! # Example
//!
//! ```ignore
//! use lume_core::SceneDescription;
//!
//! let desc = SceneDescription::load("scenes/spheres.json")?;
//! println!("{} objects, {} lights", desc.objects.len(), desc.lights.len());
//! ```

pub mod camera;
pub mod description;
pub mod environment;
pub mod error;
pub mod material;
pub mod settings;
pub mod texture;

// Re-export commonly used types
pub use camera::Camera;
pub use description::{LightDesc, MaterialDesc, ObjectDesc, SceneDescription};
pub use environment::Environment;
pub use error::{SceneError, SceneResult, TextureError, TextureResult};
pub use material::{Material, SurfaceParams};
pub use settings::{MisWeight, Settings};
pub use texture::{Encoding, FilterMode, Texture, TextureCache};

/// Linear RGB radiance / reflectance.
pub type Color = lume_math::Vec3;
