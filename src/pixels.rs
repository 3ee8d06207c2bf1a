//! Raw page pixels and the black/white inversion applied to them.

use crate::error::{InvertError, Result};
use image::DynamicImage;

/// Largest value a channel byte can hold (white).
pub const CHANNEL_MAX: u8 = u8::MAX;
/// Smallest value a channel byte can hold (black).
pub const CHANNEL_MIN: u8 = u8::MIN;

/// A rasterized page: `width * height` pixels of `channels` bytes each.
///
/// The first three channels of a pixel are red, green and blue. A fourth
/// channel, when present, is carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, checking that they match the declared geometry.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        if channels < 3 {
            return Err(InvertError::Image(format!(
                "Pixel buffers need at least 3 channels, got {}",
                channels
            )));
        }

        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(InvertError::Image(format!(
                "Pixel data size mismatch: got {} expected {} ({}x{}x{})",
                data.len(),
                expected,
                width,
                height,
                channels
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A buffer of the given size with every channel set to `value`.
    pub fn filled(width: u32, height: u32, channels: usize, value: u8) -> Result<Self> {
        let len = width as usize * height as usize * channels;
        Self::new(width, height, channels, vec![value; len])
    }

    /// Flatten a decoded image onto a white background as 8-bit RGB.
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);

        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            data.push(over_white(r, a));
            data.push(over_white(g, a));
            data.push(over_white(b, a));
        }

        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Map pure white to black and every other color to white, in place.
    pub fn invert_binary(&mut self) {
        for pixel in self.data.chunks_exact_mut(self.channels) {
            let rgb = &mut pixel[..3];
            let value = if rgb.iter().all(|&c| c == CHANNEL_MAX) {
                CHANNEL_MIN
            } else {
                CHANNEL_MAX
            };
            rgb.fill(value);
        }
    }

    /// Only the RGB samples, dropping any extra channel.
    pub fn rgb_bytes(&self) -> Vec<u8> {
        if self.channels == 3 {
            return self.data.clone();
        }

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for pixel in self.data.chunks_exact(self.channels) {
            rgb.extend_from_slice(&pixel[..3]);
        }
        rgb
    }
}

/// Composite one channel with coverage `alpha` over white.
fn over_white(value: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    let v = (value as u32 * a + CHANNEL_MAX as u32 * (255 - a) + 127) / 255;
    v as u8
}
