//! Image decoding with optional downsampling.
//!
//! ### Stable Abstraction
//! - The `Decoder` trait keeps the loader independent of the image backend.
//!
//! ### Downsampling
//! - With a target size, the longest edge is bounded by
//!   `ceil(max(width, height) * scale)` pixels, aspect ratio preserved.
//! - Images already within the bound are returned as decoded; nothing is upscaled.
//! - Decoder allocation limits bound memory for hostile or huge inputs.

use image::{DynamicImage, ImageReader, Limits};
use loupe_core::Error;
use std::io::Cursor;

/// Logical size a decoded resource will be displayed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Longest-edge pixel bound at `scale`.
    pub fn max_pixels(&self, scale: f32) -> u32 {
        let edge = self.width.max(self.height) as f32 * scale;
        edge.ceil().clamp(1.0, u32::MAX as f32) as u32
    }
}

/// Turns cached bytes into a usable resource.
///
/// Decoding is CPU-bound; the loader runs it on the blocking pool.
pub trait Decoder: Send + Sync + 'static {
    type Output: Send + 'static;

    fn decode(&self, bytes: &[u8], target: Option<TargetSize>, scale: f32) -> Result<Self::Output, Error>;
}

/// `image`-crate decoder producing [`DynamicImage`]s.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: Limits,
}

impl ImageDecoder {
    pub fn new() -> Self {
        Self { limits: Limits::default() }
    }

    /// Override the decoder's allocation and dimension limits.
    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ImageDecoder {
    type Output = DynamicImage;

    fn decode(&self, bytes: &[u8], target: Option<TargetSize>, scale: f32) -> Result<DynamicImage, Error> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| Error::DataConversionFailed(format!("failed to sniff format: {}", e)))?;

        if reader.format().is_none() {
            return Err(Error::DataConversionFailed("unrecognized image format".into()));
        }

        reader.limits(self.limits.clone());
        let image = reader
            .decode()
            .map_err(|e| Error::DataConversionFailed(format!("failed to decode image: {}", e)))?;

        let Some(target) = target else {
            return Ok(image);
        };

        let bound = target.max_pixels(scale);
        if image.width() <= bound && image.height() <= bound {
            return Ok(image);
        }

        Ok(image.thumbnail(bound, bound))
    }
}
