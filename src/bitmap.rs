//! 16-bit RGB565 bitmaps.
//!
//! Downloaded images are decoded at native size into 5-6-5 packed pixels,
//! dropping alpha. Row-major, top-left origin.

use crate::error::{Result, WallpaperError};
use image::RgbImage;

/// Decoded image at reduced color depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgb565Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

/// Pack an 8-bit-per-channel color into RGB565.
#[must_use]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

impl Rgb565Bitmap {
    /// Convert an 8-bit RGB image.
    #[must_use]
    pub fn from_rgb8(rgb: &RgbImage) -> Self {
        let pixels = rgb
            .pixels()
            .map(|p| pack_rgb565(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self {
            width: rgb.width(),
            height: rgb.height(),
            pixels,
        }
    }

    /// Decode any supported encoded image (JPEG, PNG) at native size.
    ///
    /// # Errors
    ///
    /// Returns [`WallpaperError::Decode`] if the bytes are not a decodable image.
    pub fn decode(encoded: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(encoded)
            .map_err(|e| WallpaperError::Decode(format!("cannot decode image: {e}")))?;
        Ok(Self::from_rgb8(&decoded.to_rgb8()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = usize::try_from(u64::from(y) * u64::from(self.width) + u64::from(x)).ok()?;
        self.pixels.get(index).copied()
    }
}
