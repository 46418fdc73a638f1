use crate::{ImgprocError, Result};
use cv_core::RawBuffer;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    Constant(u8),
    Replicate,
    Reflect,
    Reflect101,
}

/// Map an out-of-range coordinate back into `0..len`. `None` means the
/// sample comes from the constant border.
pub fn map_coord(coord: isize, len: usize, mode: BorderMode) -> Option<usize> {
    let n = len as isize;
    if n <= 0 {
        return None;
    }
    if (0..n).contains(&coord) {
        return Some(coord as usize);
    }

    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Replicate => Some(coord.clamp(0, n - 1) as usize),
        BorderMode::Reflect => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n;
            let mut c = coord % period;
            if c < 0 {
                c += period;
            }
            if c >= n {
                c = period - c - 1;
            }
            Some(c as usize)
        }
        BorderMode::Reflect101 => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n - 2;
            let mut c = coord % period;
            if c < 0 {
                c += period;
            }
            if c >= n {
                c = period - c;
            }
            Some(c as usize)
        }
    }
}

/// Sigma used when a Gaussian is requested by kernel size alone.
pub fn auto_sigma(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn gaussian_kernel_1d(sigma: f32, size: usize) -> Vec<f32> {
    assert!(!size.is_multiple_of(2), "gaussian kernel size must be odd");
    let mut kernel = Vec::with_capacity(size);
    let center = (size / 2) as isize;
    let sigma2 = sigma * sigma;
    let mut sum = 0.0f32;

    for i in 0..size {
        let x = (i as isize - center) as f32;
        let v = (-(x * x) / (2.0 * sigma2)).exp();
        kernel.push(v);
        sum += v;
    }

    if sum != 0.0 {
        for v in &mut kernel {
            *v /= sum;
        }
    }

    kernel
}

/// Gaussian blur of every channel of `src` with a `ksize`×`ksize` kernel.
///
/// A non-positive `sigma` is derived from `ksize` with [`auto_sigma`]. The
/// output has the same dimensions and layout as the input.
pub fn gaussian_blur(src: &RawBuffer, ksize: usize, sigma: f32, border: BorderMode) -> Result<RawBuffer> {
    if ksize == 0 || ksize.is_multiple_of(2) {
        return Err(ImgprocError::invalid(format!(
            "gaussian kernel size must be odd and positive, got {ksize}"
        )));
    }
    if src.is_empty() {
        return Ok(src.clone());
    }
    let sigma = if sigma > 0.0 { sigma } else { auto_sigma(ksize) };
    let kernel = gaussian_kernel_1d(sigma, ksize);
    separable_filter(src, &kernel, &kernel, border)
}

/// Separable convolution over interleaved channels, rounded back to 8 bits.
pub fn separable_filter(src: &RawBuffer, kx: &[f32], ky: &[f32], border: BorderMode) -> Result<RawBuffer> {
    if kx.len().is_multiple_of(2) || ky.len().is_multiple_of(2) {
        return Err(ImgprocError::invalid("separable kernels must have odd length"));
    }

    let width = src.width() as usize;
    let height = src.height() as usize;
    let channels = src.channels();
    let stride = src.stride();
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;
    let data = src.as_raw();
    let constant = match border {
        BorderMode::Constant(v) => v as f32,
        _ => 0.0,
    };

    let mut tmp = vec![0.0f32; stride * height];
    tmp.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row = &data[y * stride..(y + 1) * stride];
            for x in 0..width {
                for c in 0..channels {
                    let mut sum = 0.0f32;
                    for (k, &w) in kx.iter().enumerate() {
                        let sx = x as isize + k as isize - rx;
                        let v = match map_coord(sx, width, border) {
                            Some(ix) => row[ix * channels + c] as f32,
                            None => constant,
                        };
                        sum += v * w;
                    }
                    row_out[x * channels + c] = sum;
                }
            }
        });

    let mut out = vec![0u8; stride * height];
    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            for (i, px) in row_out.iter_mut().enumerate() {
                let mut sum = 0.0f32;
                for (k, &w) in ky.iter().enumerate() {
                    let sy = y as isize + k as isize - ry;
                    let v = match map_coord(sy, height, border) {
                        Some(iy) => tmp[iy * stride + i],
                        None => constant,
                    };
                    sum += v * w;
                }
                *px = sum.round().clamp(0.0, 255.0) as u8;
            }
        });

    Ok(RawBuffer::from_raw(src.width(), src.height(), src.layout(), out)?)
}
