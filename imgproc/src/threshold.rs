use crate::convolve::{auto_sigma, gaussian_kernel_1d, map_coord, separable_filter, BorderMode};
use crate::{ImgprocError, Result};
use cv_core::RawBuffer;
use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    Binary,
    BinaryInv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    MeanC,
    GaussianC,
}

/// Threshold each pixel against the mean of its `block_size` neighbourhood
/// minus `c`.
///
/// With `Binary` a pixel becomes `max_value` when it exceeds the local
/// threshold, otherwise 0; `BinaryInv` swaps the two.
pub fn adaptive_threshold(
    src: &GrayImage,
    max_value: u8,
    method: AdaptiveMethod,
    typ: ThresholdType,
    block_size: u32,
    c: f32,
) -> Result<GrayImage> {
    if block_size < 3 || block_size.is_multiple_of(2) {
        return Err(ImgprocError::invalid(format!(
            "adaptive threshold block size must be odd and >= 3, got {block_size}"
        )));
    }

    let (width, height) = src.dimensions();
    let local = match method {
        AdaptiveMethod::MeanC => local_mean(src, block_size as usize),
        AdaptiveMethod::GaussianC => {
            let k = gaussian_kernel_1d(auto_sigma(block_size as usize), block_size as usize);
            let buffer = RawBuffer::from_gray(src.clone());
            separable_filter(&buffer, &k, &k, BorderMode::Replicate)?.into_raw()
        }
    };

    // Integer offset, rounded towards keeping more pixels for Binary.
    let delta = match typ {
        ThresholdType::Binary => c.ceil() as i32,
        ThresholdType::BinaryInv => c.floor() as i32,
    };

    let mut dst = vec![0u8; src.as_raw().len()];
    dst.par_iter_mut()
        .zip(src.as_raw().par_iter().zip(local.par_iter()))
        .for_each(|(out, (&value, &mean))| {
            let above = value as i32 - mean as i32 > -delta;
            *out = match (typ, above) {
                (ThresholdType::Binary, true) | (ThresholdType::BinaryInv, false) => max_value,
                _ => 0,
            };
        });

    GrayImage::from_raw(width, height, dst)
        .ok_or_else(|| ImgprocError::invalid("threshold output size"))
}

/// Rounded box mean with replicated borders.
fn local_mean(src: &GrayImage, block: usize) -> Vec<u8> {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let radius = (block / 2) as isize;
    let data = src.as_raw();
    let area = (block * block) as u64;

    let mut rows = vec![0u64; width * height];
    rows.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row_out)| {
            let row = &data[y * width..(y + 1) * width];
            for (x, out) in row_out.iter_mut().enumerate() {
                *out = (-radius..=radius)
                    .filter_map(|d| map_coord(x as isize + d, width, BorderMode::Replicate))
                    .map(|ix| row[ix] as u64)
                    .sum();
            }
        });

    let mut means = vec![0u8; width * height];
    means
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row_out)| {
            for (x, out) in row_out.iter_mut().enumerate() {
                let sum: u64 = (-radius..=radius)
                    .filter_map(|d| map_coord(y as isize + d, height, BorderMode::Replicate))
                    .map(|iy| rows[iy * width + x])
                    .sum();
                *out = ((sum + area / 2) / area) as u8;
            }
        });
    means
}
