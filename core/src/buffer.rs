//! Raster buffer
//!
//! [`RawBuffer`] is the authoritative pixel matrix: 8 bits per channel,
//! tightly packed rows, tagged with the [`ChannelLayout`] its bytes are in.
//! An empty buffer (no pixels) is a valid value, checked with
//! [`RawBuffer::is_empty`].

use crate::{Error, Result};
use image::GrayImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed-point BT.601 luma weights, scaled by `1 << LUMA_SHIFT`.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// Single luminance channel.
    Gray,
    /// Three channels, blue first. Images decoded from disk use this order.
    Bgr,
    /// Three channels, red first.
    Rgb,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::Bgr | ChannelLayout::Rgb => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBuffer {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    data: Vec<u8>,
}

impl Default for RawBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl RawBuffer {
    /// A buffer holding no pixels.
    pub fn empty() -> Self {
        Self::empty_with(ChannelLayout::Bgr)
    }

    pub fn empty_with(layout: ChannelLayout) -> Self {
        Self {
            width: 0,
            height: 0,
            layout,
            data: Vec::new(),
        }
    }

    /// Zero-filled buffer.
    pub fn new(width: u32, height: u32, layout: ChannelLayout) -> Self {
        let len = width as usize * height as usize * layout.channels();
        Self {
            width,
            height,
            layout,
            data: vec![0; len],
        }
    }

    /// Buffer with every pixel set to `pixel`, which must have one byte per channel.
    pub fn from_pixel(width: u32, height: u32, layout: ChannelLayout, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != layout.channels() {
            return Err(Error::DimensionMismatch(format!(
                "pixel has {} components, {:?} needs {}",
                pixel.len(),
                layout,
                layout.channels()
            )));
        }
        let mut buffer = Self::new(width, height, layout);
        buffer
            .data
            .par_chunks_exact_mut(layout.channels())
            .for_each(|px| px.copy_from_slice(pixel));
        Ok(buffer)
    }

    pub fn from_raw(width: u32, height: u32, layout: ChannelLayout, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(layout.channels()))
            .ok_or_else(|| Error::DimensionMismatch(format!("{width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(Error::DimensionMismatch(format!(
                "{width}x{height} {:?} needs {expected} bytes, got {}",
                layout,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn from_gray(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            layout: ChannelLayout::Gray,
            data: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Channel bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let idx = self.offset(x, y);
        &self.data[idx..idx + self.channels()]
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let idx = self.offset(x, y);
        let channels = self.channels();
        &mut self.data[idx..idx + channels]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{} buffer",
            self.width,
            self.height
        );
        y as usize * self.stride() + x as usize * self.channels()
    }

    pub fn to_gray_image(&self) -> Result<GrayImage> {
        self.require(ChannelLayout::Gray)?;
        GrayImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| Error::DimensionMismatch("gray buffer size".into()))
    }

    pub fn into_gray_image(self) -> Result<GrayImage> {
        self.require(ChannelLayout::Gray)?;
        let (width, height) = self.dimensions();
        GrayImage::from_raw(width, height, self.data)
            .ok_or_else(|| Error::DimensionMismatch("gray buffer size".into()))
    }

    /// Fails with [`Error::ChannelMismatch`] unless the buffer is in `layout`.
    pub fn require(&self, layout: ChannelLayout) -> Result<()> {
        if self.layout != layout {
            return Err(Error::channel_mismatch(layout, self.layout));
        }
        Ok(())
    }
}

/// Remap `buffer` from `source` to `target` channel layout.
///
/// The input is never modified; the result is a fresh allocation even when
/// `source == target`. Fails with [`Error::ChannelMismatch`] if the buffer is
/// not actually in `source` layout. Empty buffers convert to empty buffers.
pub fn convert(buffer: &RawBuffer, source: ChannelLayout, target: ChannelLayout) -> Result<RawBuffer> {
    if buffer.is_empty() {
        return Ok(RawBuffer::empty_with(target));
    }
    buffer.require(source)?;

    let (width, height) = buffer.dimensions();
    let src = buffer.as_raw();
    let count = width as usize * height as usize;

    let data = match (source, target) {
        (ChannelLayout::Gray, ChannelLayout::Gray)
        | (ChannelLayout::Bgr, ChannelLayout::Bgr)
        | (ChannelLayout::Rgb, ChannelLayout::Rgb) => src.to_vec(),
        (ChannelLayout::Bgr, ChannelLayout::Rgb) | (ChannelLayout::Rgb, ChannelLayout::Bgr) => {
            let mut out = vec![0u8; count * 3];
            out.par_chunks_exact_mut(3)
                .zip(src.par_chunks_exact(3))
                .for_each(|(dst, px)| {
                    dst[0] = px[2];
                    dst[1] = px[1];
                    dst[2] = px[0];
                });
            out
        }
        (ChannelLayout::Bgr, ChannelLayout::Gray) => luma(src, count, 2, 1, 0),
        (ChannelLayout::Rgb, ChannelLayout::Gray) => luma(src, count, 0, 1, 2),
        (ChannelLayout::Gray, ChannelLayout::Bgr | ChannelLayout::Rgb) => {
            let mut out = vec![0u8; count * 3];
            out.par_chunks_exact_mut(3)
                .zip(src.par_iter())
                .for_each(|(dst, &g)| dst.fill(g));
            out
        }
    };

    RawBuffer::from_raw(width, height, target, data)
}

fn luma(src: &[u8], count: usize, r: usize, g: usize, b: usize) -> Vec<u8> {
    let mut out = vec![0u8; count];
    out.par_iter_mut()
        .zip(src.par_chunks_exact(3))
        .for_each(|(dst, px)| {
            let y = px[r] as u32 * LUMA_R
                + px[g] as u32 * LUMA_G
                + px[b] as u32 * LUMA_B
                + (1 << (LUMA_SHIFT - 1));
            *dst = (y >> LUMA_SHIFT) as u8;
        });
    out
}
