//! Texture loading and lookups for materials and environment maps.
//!
//! Texels are stored as linear RGBA floats. Texture coordinates wrap with
//! repeat semantics; `(0, 0)` is the top-left texel, `v` grows downwards
//! (image row order), which is also the lat-long environment convention.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use lume_math::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{TextureError, TextureResult};

/// Texel lookup policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Nearest,
    #[default]
    Bilinear,
}

/// Colour space of an LDR file on disk. HDR formats are always linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Colour data (base colour, emission colour): decoded from sRGB.
    Srgb,
    /// Scalar data (roughness, metalness, ...): used as stored.
    Linear,
}

/// A loaded texture with pixel data.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Linear [R, G, B, A] per pixel, row-major, row 0 at the top
    pub pixels: Vec<[f32; 4]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    ///
    /// Fails if the buffer is empty or does not match the dimensions.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<[f32; 4]>,
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 || pixels.len() != (width * height) as usize {
            return Err(TextureError::Empty(path));
        }
        Ok(Self {
            width,
            height,
            pixels,
            path,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z, 1.0]],
            path: "<solid>".to_string(),
        }
    }

    /// Load a texture from disk.
    pub fn load(path: impl AsRef<Path>, encoding: Encoding) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| TextureError::Load {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_image(img, encoding, path.to_string_lossy())
    }

    /// Convert a decoded image to linear float texels.
    pub fn from_image(
        img: DynamicImage,
        encoding: Encoding,
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let (width, height, pixels) = match img {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                let rgba = img.to_rgba32f();
                let (w, h) = rgba.dimensions();
                (w, h, rgba.pixels().map(|p| p.0).collect())
            }
            _ => {
                let rgba = img.to_rgba8();
                let (w, h) = rgba.dimensions();
                let decode = |c: u8| match encoding {
                    Encoding::Srgb => srgb_to_linear(c),
                    Encoding::Linear => c as f32 / 255.0,
                };
                let pixels = rgba
                    .pixels()
                    .map(|p| {
                        [
                            decode(p[0]),
                            decode(p[1]),
                            decode(p[2]),
                            p[3] as f32 / 255.0, // Alpha is linear
                        ]
                    })
                    .collect();
                (w, h, pixels)
            }
        };
        Self::new(width, height, pixels, path)
    }

    /// Nearest-texel RGBA lookup.
    pub fn nearest4(&self, uv: Vec2) -> Vec4 {
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.rem_euclid(1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.texel(x as i64, y as i64)
    }

    /// Nearest-texel RGB lookup.
    pub fn nearest(&self, uv: Vec2) -> Vec3 {
        self.nearest4(uv).truncate()
    }

    /// Bilinearly filtered RGBA lookup between the four closest texel centres.
    pub fn bilinear4(&self, uv: Vec2) -> Vec4 {
        let x = uv.x.rem_euclid(1.0) * self.width as f32 - 0.5;
        let y = uv.y.rem_euclid(1.0) * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    /// Bilinearly filtered RGB lookup.
    pub fn bilinear(&self, uv: Vec2) -> Vec3 {
        self.bilinear4(uv).truncate()
    }

    /// RGBA lookup with the given filter.
    pub fn sample4(&self, uv: Vec2, filter: FilterMode) -> Vec4 {
        match filter {
            FilterMode::Nearest => self.nearest4(uv),
            FilterMode::Bilinear => self.bilinear4(uv),
        }
    }

    /// RGB lookup with the given filter.
    pub fn sample(&self, uv: Vec2, filter: FilterMode) -> Vec3 {
        self.sample4(uv, filter).truncate()
    }

    /// Single channel lookup (for roughness/metalness maps).
    pub fn channel(&self, uv: Vec2, channel: usize, filter: FilterMode) -> f32 {
        self.sample4(uv, filter)[channel.min(3)]
    }

    /// Texel at integer coordinates, wrapping out-of-range indices.
    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        Vec4::from_array(self.pixels[y * self.width as usize + x])
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}

/// Cache for loaded textures.
///
/// Several materials may point at the same file; each file is decoded once
/// per encoding and shared.
pub struct TextureCache {
    /// Cached textures by file path and encoding
    textures: HashMap<(String, Encoding), Arc<Texture>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, using cache if available.
    pub fn load(&mut self, path: &str, encoding: Encoding) -> TextureResult<Arc<Texture>> {
        let key = (path.to_string(), encoding);
        if let Some(texture) = self.textures.get(&key) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(path);
        let texture = Arc::new(Texture::load(&full_path, encoding)?);
        self.textures.insert(key, texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            path,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Get total memory usage of cached textures.
    pub fn total_size_bytes(&self) -> usize {
        self.textures.values().map(|t| t.size_bytes()).sum()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        match &self.base_dir {
            Some(base) if !path.is_absolute() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        // 2x2: black, white / white, black
        Texture::new(
            2,
            2,
            vec![
                [0.0, 0.0, 0.0, 1.0],
                [1.0, 1.0, 1.0, 1.0],
                [1.0, 1.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ],
            "<checker>",
        )
        .unwrap()
    }

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(tex.width, 1);
        assert_eq!(tex.height, 1);

        for filter in [FilterMode::Nearest, FilterMode::Bilinear] {
            let sample = tex.sample(Vec2::new(0.3, 0.9), filter);
            assert!((sample.x - 1.0).abs() < 0.001);
            assert!((sample.y - 0.5).abs() < 0.001);
            assert!((sample.z - 0.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_new_rejects_mismatched_buffer() {
        assert!(matches!(
            Texture::new(2, 2, vec![[0.0; 4]; 3], "bad"),
            Err(TextureError::Empty(_))
        ));
        assert!(Texture::new(0, 0, Vec::new(), "empty").is_err());
    }

    #[test]
    fn test_nearest_picks_texel() {
        let tex = checker();
        assert_eq!(tex.nearest(Vec2::new(0.25, 0.25)), Vec3::ZERO);
        assert_eq!(tex.nearest(Vec2::new(0.75, 0.25)), Vec3::ONE);
        assert_eq!(tex.nearest4(Vec2::new(0.25, 0.75)).w, 0.0);
        // Repeat wrapping
        assert_eq!(tex.nearest(Vec2::new(1.75, -0.75)), Vec3::ONE);
    }

    #[test]
    fn test_bilinear_interpolates() {
        let tex = checker();
        // Texel centres reproduce the texel exactly
        assert!((tex.bilinear(Vec2::new(0.75, 0.25)) - Vec3::ONE).length() < 0.001);
        // The shared corner averages all four
        let mid = tex.bilinear(Vec2::new(0.5, 0.5));
        assert!((mid - Vec3::splat(0.5)).length() < 0.001);
        assert!((tex.channel(Vec2::new(0.5, 0.5), 3, FilterMode::Bilinear) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_texture_cache() {
        let mut cache = TextureCache::new();
        assert!(cache.is_empty());
        // Missing files surface as a load error carrying the path
        assert!(matches!(
            cache.load("/nonexistent/texture.png", Encoding::Srgb),
            Err(TextureError::Load { .. })
        ));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_from_image_decodes_srgb() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([128, 128, 128, 255]),
        ));
        let srgb = Texture::from_image(img.clone(), Encoding::Srgb, "a").unwrap();
        let linear = Texture::from_image(img, Encoding::Linear, "b").unwrap();
        assert!(srgb.pixels[0][0] < linear.pixels[0][0]);
        assert!((linear.pixels[0][0] - 128.0 / 255.0).abs() < 0.001);
    }

    #[test]
    fn test_srgb_to_linear() {
        // Black stays black
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);

        // White stays white
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
