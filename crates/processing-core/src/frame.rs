//! In-memory RGBA frames.
//!
//! Backed by [`image::RgbaImage`]. Used for per-frame effect math and still
//! previews; video encodes hand filter fragments to the media engine instead.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::{EffectError, EffectResult};

/// Resampling filter for resize and zoom.
const RESAMPLE: FilterType = FilterType::Triangle;

/// An RGBA8 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbaImage,
}

impl Frame {
    /// Wrap an RGBA buffer of exactly `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> EffectResult<Self> {
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        if actual != expected {
            return Err(EffectError::BufferMismatch { expected, actual });
        }
        RgbaImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or(EffectError::BufferMismatch { expected, actual })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// A frame filled with one colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_image(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn data(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// RGBA at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|px| px.0)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(px) = self.image.get_pixel_mut_checked(x, y) {
            *px = Rgba(rgba);
        }
    }

    /// Bilinear resize to `width x height`.
    pub fn resize(&self, width: u32, height: u32) -> EffectResult<Frame> {
        if width == 0 || height == 0 || self.is_empty() {
            return Err(EffectError::DegenerateFrame {
                effect: "resize",
                width,
                height,
            });
        }
        if (width, height) == self.image.dimensions() {
            return Ok(self.clone());
        }
        Ok(Self::from_image(imageops::resize(
            &self.image,
            width,
            height,
            RESAMPLE,
        )))
    }

    /// Copy out the `width x height` region at `(x, y)`.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> EffectResult<Frame> {
        let fits = x as u64 + width as u64 <= self.width() as u64
            && y as u64 + height as u64 <= self.height() as u64;
        if width == 0 || height == 0 || !fits {
            return Err(EffectError::DegenerateFrame {
                effect: "crop",
                width,
                height,
            });
        }
        Ok(Self::from_image(
            imageops::crop_imm(&self.image, x, y, width, height).to_image(),
        ))
    }

    /// Multiply every alpha value by `opacity` (clamped to [0, 1]).
    pub fn scale_alpha(&mut self, opacity: f64) {
        let opacity = unit_or_one(opacity);
        for px in self.image.pixels_mut() {
            px.0[3] = (px.0[3] as f64 * opacity).round() as u8;
        }
    }

    /// Blend colour channels toward black by `1 - level`.
    pub fn scale_brightness(&mut self, level: f64) {
        let level = unit_or_one(level);
        for px in self.image.pixels_mut() {
            for c in &mut px.0[..3] {
                *c = (*c as f64 * level).round() as u8;
            }
        }
    }
}

fn unit_or_one(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        1.0
    }
}
