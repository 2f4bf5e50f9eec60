//! Error types for resource loading.

use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Errors that can occur while loading or building a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("Object {object} references unknown material '{material}'")]
    UnknownMaterial { object: usize, material: String },

    #[error("Mesh {object} is malformed: {reason}")]
    BadMesh { object: usize, reason: String },

    #[error("Scene has no geometry")]
    EmptyScene,
}

pub type SceneResult<T> = Result<T, SceneError>;
