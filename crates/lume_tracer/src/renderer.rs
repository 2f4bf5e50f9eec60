//! Progressive frame driver.
//!
//! Each call to [`Renderer::trace_paths`] traces one jittered path per
//! pixel and folds it into the running mean:
//!
//! ```text
//! new = old * (n / (n + 1)) + color / (n + 1)
//! ```
//!
//! Every pixel draws from its own random stream seeded by (seed, frame,
//! pixel), so results do not depend on how rows are spread over threads.

use std::sync::atomic::{AtomicUsize, Ordering};

use lume_core::{Color, Settings};
use lume_math::Mat4;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

use crate::camera::RayGenerator;
use crate::integrator::Integrator;

/// Accumulated radiance, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Passes folded into every pixel
    pub number_of_samples: u32,
    pub data: Vec<Color>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            number_of_samples: 0,
            data: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Raw `f32` RGB triples, for uploading to a display texture.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// 8-bit RGBA with gamma 2.2 and clamping.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let encode = |c: f32| (255.0 * c.max(0.0).powf(1.0 / 2.2).min(1.0)).round() as u8;
        let mut bytes = Vec::with_capacity(self.data.len() * 4);
        for color in &self.data {
            bytes.extend_from_slice(&[encode(color.x), encode(color.y), encode(color.z), 255]);
        }
        bytes
    }
}

/// Owns the accumulation buffer and the worker pool.
pub struct Renderer {
    pub settings: Settings,
    image: Image,
    pool: Option<rayon::ThreadPool>,
    pool_threads: usize,
    frame: u64,
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    if threads == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("Could not build a {threads}-thread pool ({e}); using the global pool");
            None
        }
    }
}

/// Independent stream per (seed, frame, pixel).
fn pixel_rng(seed: u64, frame: u64, pixel: usize) -> Xoshiro256PlusPlus {
    let mixed = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ frame.wrapping_mul(0xBF58_476D_1CE4_E5B9)
        ^ (pixel as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
    Xoshiro256PlusPlus::seed_from_u64(mixed)
}

impl Renderer {
    /// Create a renderer for a `width × height` viewport.
    pub fn new(width: u32, height: u32, settings: Settings) -> Self {
        let pool_threads = settings.threads;
        let mut renderer = Self {
            pool: build_pool(pool_threads),
            pool_threads,
            settings,
            image: Image::new(0, 0),
            frame: 0,
        };
        renderer.resize(width, height);
        renderer
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn number_of_samples(&self) -> u32 {
        self.image.number_of_samples
    }

    /// Reallocate for a new viewport size, divided by the subsampling
    /// factor. Always restarts accumulation.
    pub fn resize(&mut self, width: u32, height: u32) {
        let sub = self.settings.subsampling.max(1);
        self.image = Image::new(width / sub, height / sub);
        log::info!(
            "Render buffer {}x{} (viewport {width}x{height}, subsampling {sub})",
            self.image.width,
            self.image.height
        );
    }

    /// Start accumulating from scratch. Pixel values are left in place; the
    /// next pass overwrites them.
    pub fn restart(&mut self) {
        log::debug!("Restart after {} samples", self.image.number_of_samples);
        self.image.number_of_samples = 0;
    }

    /// Trace and fold one pass over the whole image.
    ///
    /// Returns false when nothing was traced (sample cap reached or empty
    /// buffer).
    pub fn trace_paths(&mut self, integrator: &dyn Integrator, view: Mat4, proj: Mat4) -> bool {
        let n = self.image.number_of_samples;
        if self.settings.cap_reached(n) || self.image.data.is_empty() {
            return false;
        }
        if self.settings.threads != self.pool_threads {
            self.pool_threads = self.settings.threads;
            self.pool = build_pool(self.pool_threads);
        }

        let width = self.image.width;
        let generator = RayGenerator::new(view, proj, width, self.image.height, &self.settings);
        let settings = &self.settings;
        let frame = self.frame;
        let keep = n as f32 / (n + 1) as f32;
        let add = 1.0 / (n + 1) as f32;
        let dropped = AtomicUsize::new(0);

        let pass = |data: &mut [Color]| {
            data.par_chunks_mut(width as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, pixel) in row.iter_mut().enumerate() {
                        let index = y * width as usize + x;
                        let mut rng = pixel_rng(settings.seed, frame, index);
                        let ray = generator.generate(x as u32, y as u32, &mut rng);
                        let mut color = integrator.li(&ray, settings, &mut rng);
                        if !color.is_finite() {
                            dropped.fetch_add(1, Ordering::Relaxed);
                            color = Color::ZERO;
                        }
                        *pixel = *pixel * keep + color * add;
                    }
                });
        };
        let data = &mut self.image.data;
        match &self.pool {
            Some(pool) => pool.install(|| pass(data)),
            None => pass(data),
        }

        let dropped = dropped.into_inner();
        if dropped > 0 {
            log::warn!("Frame {frame}: dropped {dropped} non-finite samples");
        }

        self.image.number_of_samples += 1;
        self.frame += 1;
        true
    }
}
