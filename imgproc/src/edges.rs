use crate::convolve::{map_coord, BorderMode};
use crate::{ImgprocError, Result};
use image::GrayImage;
use rayon::prelude::*;

/// tan(22.5°) in Q15 fixed point.
const TG22: i64 = 13573;
const CANNY_SHIFT: u32 = 15;

const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// 16-bit signed single-channel image, the output of derivative filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<i16>,
}

impl SignedImage {
    pub fn get(&self, x: u32, y: u32) -> i16 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

fn sobel_kernels_1d(ksize: usize) -> Option<(Vec<i32>, Vec<i32>)> {
    match ksize {
        3 => Some((vec![-1, 0, 1], vec![1, 2, 1])),
        5 => Some((vec![-1, -2, 0, 2, 1], vec![1, 4, 6, 4, 1])),
        7 => Some((
            vec![-1, -4, -5, 0, 5, 4, 1],
            vec![1, 6, 15, 20, 15, 6, 1],
        )),
        _ => None,
    }
}

/// Correlate `src` with the outer product `ky ⊗ kx`, keeping full precision.
fn separable_i32(src: &GrayImage, kx: &[i32], ky: &[i32], border: BorderMode) -> Vec<i32> {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;
    let data = src.as_raw();
    let constant = match border {
        BorderMode::Constant(v) => v as i32,
        _ => 0,
    };

    let mut tmp = vec![0i32; width * height];
    tmp.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row_out)| {
            let row = &data[y * width..(y + 1) * width];
            for (x, out) in row_out.iter_mut().enumerate() {
                *out = kx
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let v = map_coord(x as isize + k as isize - rx, width, border)
                            .map_or(constant, |ix| row[ix] as i32);
                        v * w
                    })
                    .sum();
            }
        });

    let mut out = vec![0i32; width * height];
    out.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row_out)| {
            for (x, px) in row_out.iter_mut().enumerate() {
                *px = ky
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let v = map_coord(y as isize + k as isize - ry, height, border)
                            .map_or(constant, |iy| tmp[iy * width + x]);
                        v * w
                    })
                    .sum();
            }
        });
    out
}

/// First derivatives `(dx, dy)` with a Sobel aperture of 3, 5 or 7.
pub fn sobel_derivatives(src: &GrayImage, aperture: usize, border: BorderMode) -> Result<(Vec<i32>, Vec<i32>)> {
    let (deriv, smooth) = sobel_kernels_1d(aperture)
        .ok_or_else(|| ImgprocError::invalid(format!("sobel aperture must be 3, 5 or 7, got {aperture}")))?;
    let dx = separable_i32(src, &deriv, &smooth, border);
    let dy = separable_i32(src, &smooth, &deriv, border);
    Ok((dx, dy))
}

/// Laplacian with aperture 1 (4-neighbour) or 3 (`[2 0 2; 0 -8 0; 2 0 2]`).
pub fn laplacian(src: &GrayImage, ksize: usize, border: BorderMode) -> Result<SignedImage> {
    let (second, smooth): (&[i32], &[i32]) = match ksize {
        1 => (&[1, -2, 1][..], &[1][..]),
        3 => (&[1, -2, 1][..], &[1, 2, 1][..]),
        _ => {
            return Err(ImgprocError::invalid(format!(
                "laplacian kernel size must be 1 or 3, got {ksize}"
            )))
        }
    };

    let d2x = separable_i32(src, second, smooth, border);
    let d2y = separable_i32(src, smooth, second, border);
    let data = d2x
        .par_iter()
        .zip(d2y.par_iter())
        .map(|(&a, &b)| (a + b).clamp(i16::MIN as i32, i16::MAX as i32) as i16)
        .collect();

    Ok(SignedImage {
        width: src.width(),
        height: src.height(),
        data,
    })
}

/// `|v * alpha + beta|`, rounded and saturated to 8 bits.
pub fn convert_scale_abs(src: &SignedImage, alpha: f32, beta: f32) -> GrayImage {
    let data = src
        .data
        .par_iter()
        .map(|&v| (v as f32 * alpha + beta).abs().round().min(255.0) as u8)
        .collect();
    GrayImage::from_raw(src.width, src.height, data)
        .unwrap_or_else(|| GrayImage::new(src.width, src.height))
}

/// Canny edge detector over an 8-bit image.
///
/// Gradients come from a Sobel filter of the given `aperture` with replicated
/// borders, magnitude is `|dx| + |dy|`. Edge pixels are 255, the rest 0.
pub fn canny(src: &GrayImage, low_threshold: f32, high_threshold: f32, aperture: usize) -> Result<GrayImage> {
    let (low, high) = if low_threshold > high_threshold {
        (high_threshold, low_threshold)
    } else {
        (low_threshold, high_threshold)
    };

    let width = src.width() as usize;
    let height = src.height() as usize;
    if width == 0 || height == 0 {
        return Ok(src.clone());
    }

    let (dx, dy) = sobel_derivatives(src, aperture, BorderMode::Replicate)?;
    let mag: Vec<i32> = dx
        .par_iter()
        .zip(dy.par_iter())
        .map(|(a, b)| a.abs() + b.abs())
        .collect();

    let state = non_max_suppression(width, height, &dx, &dy, &mag, low, high);
    let edges = hysteresis(width, height, state);

    GrayImage::from_raw(width as u32, height as u32, edges)
        .ok_or_else(|| ImgprocError::invalid("canny output size"))
}

fn non_max_suppression(
    width: usize,
    height: usize,
    dx: &[i32],
    dy: &[i32],
    mag: &[i32],
    low: f32,
    high: f32,
) -> Vec<u8> {
    let at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0
        } else {
            mag[y as usize * width + x as usize]
        }
    };

    let mut state = vec![NONE; width * height];
    state
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as isize;
            for (x, out) in row.iter_mut().enumerate() {
                let idx = y as usize * width + x;
                let m = mag[idx];
                if m as f32 <= low {
                    continue;
                }
                let x = x as isize;
                let xs = dx[idx].abs() as i64;
                let ys = (dy[idx].abs() as i64) << CANNY_SHIFT;
                let tg22x = xs * TG22;

                let is_max = if ys < tg22x {
                    m > at(x - 1, y) && m >= at(x + 1, y)
                } else {
                    let tg67x = tg22x + (xs << (CANNY_SHIFT + 1));
                    if ys > tg67x {
                        m > at(x, y - 1) && m >= at(x, y + 1)
                    } else {
                        let s = if (dx[idx] ^ dy[idx]) < 0 { -1 } else { 1 };
                        m > at(x - s, y - 1) && m > at(x + s, y + 1)
                    }
                };

                if is_max {
                    *out = if m as f32 > high { STRONG } else { WEAK };
                }
            }
        });
    state
}

fn hysteresis(width: usize, height: usize, mut state: Vec<u8>) -> Vec<u8> {
    let mut stack: Vec<(usize, usize)> = state
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == STRONG)
        .map(|(i, _)| (i % width, i / width))
        .collect();

    while let Some((x, y)) = stack.pop() {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(height - 1);
        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(width - 1);
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                let nidx = ny * width + nx;
                if state[nidx] == WEAK {
                    state[nidx] = STRONG;
                    stack.push((nx, ny));
                }
            }
        }
    }

    state
        .into_par_iter()
        .map(|s| if s == STRONG { 255 } else { 0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn step_image(width: u32, height: u32, split: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([if x < split { 0 } else { 255 }]))
    }

    #[test]
    fn sobel_constant_image_is_zero() {
        let img = GrayImage::from_pixel(16, 16, Luma([100]));
        let (gx, gy) = sobel_derivatives(&img, 3, BorderMode::Reflect101).unwrap();
        assert!(gx.iter().all(|&v| v == 0));
        assert!(gy.iter().all(|&v| v == 0));
    }

    #[test]
    fn sobel_vertical_edge() {
        let img = step_image(16, 16, 8);
        let (gx, gy) = sobel_derivatives(&img, 3, BorderMode::Replicate).unwrap();
        assert_eq!(gx[8 * 16 + 8], 4 * 255);
        assert_eq!(gx[8 * 16 + 7], 4 * 255);
        assert_eq!(gy[8 * 16 + 8], 0);
    }

    #[test]
    fn sobel_rejects_unknown_aperture() {
        let img = GrayImage::new(8, 8);
        assert!(sobel_derivatives(&img, 4, BorderMode::Replicate).is_err());
    }

    #[test]
    fn canny_marks_single_pixel_step() {
        let img = step_image(20, 10, 10);
        let edges = canny(&img, 0.0, 150.0, 3).unwrap();
        for y in 0..10 {
            let lit: Vec<u32> = (0..20).filter(|&x| edges.get_pixel(x, y)[0] == 255).collect();
            assert_eq!(lit, vec![9], "row {y}");
        }
    }

    #[test]
    fn canny_flat_image_has_no_edges() {
        let img = GrayImage::from_pixel(12, 12, Luma([90]));
        let edges = canny(&img, 0.0, 150.0, 3).unwrap();
        assert!(edges.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn canny_high_threshold_drops_weak_edges() {
        let img = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 100 } else { 110 }]));
        // |dx| = 40 at the step
        assert!(canny(&img, 0.0, 150.0, 3).unwrap().as_raw().iter().all(|&v| v == 0));
        assert!(canny(&img, 0.0, 30.0, 3).unwrap().as_raw().contains(&255));
    }

    #[test]
    fn laplacian_of_flat_image_is_zero() {
        let img = GrayImage::from_pixel(10, 10, Luma([200]));
        let lap = laplacian(&img, 3, BorderMode::Reflect101).unwrap();
        assert!(lap.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn laplacian_of_impulse_uses_aperture_three_kernel() {
        let mut img = GrayImage::new(7, 7);
        img.put_pixel(3, 3, Luma([10]));
        let lap = laplacian(&img, 3, BorderMode::Reflect101).unwrap();
        assert_eq!(lap.get(3, 3), -80);
        assert_eq!(lap.get(2, 2), 20);
        assert_eq!(lap.get(3, 2), 0);

        let lap1 = laplacian(&img, 1, BorderMode::Reflect101).unwrap();
        assert_eq!(lap1.get(3, 3), -40);
        assert_eq!(lap1.get(3, 2), 10);
        assert_eq!(lap1.get(2, 2), 0);
    }

    #[test]
    fn convert_scale_abs_saturates() {
        let img = SignedImage {
            width: 3,
            height: 1,
            data: vec![-80, 300, 12],
        };
        let out = convert_scale_abs(&img, 1.0, 0.0);
        assert_eq!(out.as_raw(), &[80, 255, 12]);
    }
}
