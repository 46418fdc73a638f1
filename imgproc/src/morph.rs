use crate::{ImgprocError, Result};
use cv_core::RawBuffer;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphType {
    Erode,
    Dilate,
}

/// Rectangular structuring element. Samples outside the image are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuringElement {
    pub width: u32,
    pub height: u32,
    /// Position of the output pixel inside the element; centred by default.
    pub anchor: (u32, u32),
}

impl StructuringElement {
    pub fn rect(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ImgprocError::invalid(format!(
                "structuring element must be at least 1x1, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            anchor: (width / 2, height / 2),
        })
    }

    pub fn with_anchor(mut self, x: u32, y: u32) -> Result<Self> {
        if x >= self.width || y >= self.height {
            return Err(ImgprocError::invalid(format!(
                "anchor ({x}, {y}) outside {}x{} element",
                self.width, self.height
            )));
        }
        self.anchor = (x, y);
        Ok(self)
    }
}

pub fn erode(src: &RawBuffer, element: &StructuringElement, iterations: u32) -> RawBuffer {
    morph(src, MorphType::Erode, element, iterations)
}

pub fn dilate(src: &RawBuffer, element: &StructuringElement, iterations: u32) -> RawBuffer {
    morph(src, MorphType::Dilate, element, iterations)
}

/// Apply `morph_type` channel-wise, `iterations` times.
pub fn morph(src: &RawBuffer, morph_type: MorphType, element: &StructuringElement, iterations: u32) -> RawBuffer {
    let mut output = src.clone();
    if src.is_empty() {
        return output;
    }

    for _ in 0..iterations {
        output = morph_once(&output, morph_type, element);
    }

    output
}

// A rectangle is separable: the row pass and the column pass each reduce over
// one side of the element.
fn morph_once(src: &RawBuffer, morph_type: MorphType, element: &StructuringElement) -> RawBuffer {
    let reduce: fn(u8, u8) -> u8 = match morph_type {
        MorphType::Erode => u8::min,
        MorphType::Dilate => u8::max,
    };
    let identity = match morph_type {
        MorphType::Erode => u8::MAX,
        MorphType::Dilate => u8::MIN,
    };

    let width = src.width() as isize;
    let height = src.height() as isize;
    let channels = src.channels();
    let stride = src.stride();
    let data = src.as_raw();
    let (ax, ay) = (element.anchor.0 as isize, element.anchor.1 as isize);
    let (ew, eh) = (element.width as isize, element.height as isize);

    let mut rows = vec![0u8; data.len()];
    rows.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row = &data[y * stride..(y + 1) * stride];
            for x in 0..width {
                let x0 = (x - ax).max(0);
                let x1 = (x - ax + ew - 1).min(width - 1);
                for c in 0..channels {
                    let mut acc = identity;
                    for sx in x0..=x1 {
                        acc = reduce(acc, row[sx as usize * channels + c]);
                    }
                    row_out[x as usize * channels + c] = acc;
                }
            }
        });

    let mut out = vec![0u8; data.len()];
    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let y = y as isize;
            let y0 = (y - ay).max(0);
            let y1 = (y - ay + eh - 1).min(height - 1);
            for (i, px) in row_out.iter_mut().enumerate() {
                let mut acc = identity;
                for sy in y0..=y1 {
                    acc = reduce(acc, rows[sy as usize * stride + i]);
                }
                *px = acc;
            }
        });

    let mut result = src.clone();
    result.as_raw_mut().copy_from_slice(&out);
    result
}
