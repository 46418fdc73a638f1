use crate::display::DisplayImage;
use cv_core::Error;
use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingPolicy {
    /// Stretch to the viewport, nearest-neighbour sampling.
    #[default]
    Nearest,
    /// Fit inside the viewport keeping the aspect ratio, centred on black.
    AspectPreserving,
}

impl FromStr for ScalingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(ScalingPolicy::Nearest),
            "aspect" | "aspect_preserving" => Ok(ScalingPolicy::AspectPreserving),
            other => Err(Error::Config(format!(
                "unknown scaling policy '{other}', expected 'nearest' or 'aspect'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub scaling: ScalingPolicy,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            scaling: ScalingPolicy::Nearest,
        }
    }
}

/// Fixed-size presentation surface for a [`DisplayImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    config: ViewportConfig,
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Scale `display` onto a viewport-sized canvas.
    ///
    /// An empty display renders as an all-black viewport.
    pub fn render(&self, display: &DisplayImage) -> RgbImage {
        let ViewportConfig { width, height, scaling } = self.config;
        let mut out = RgbImage::new(width, height);
        if display.is_empty() || width == 0 || height == 0 {
            return out;
        }

        let target = match scaling {
            ScalingPolicy::Nearest => Placement {
                x: 0,
                y: 0,
                width,
                height,
            },
            ScalingPolicy::AspectPreserving => fit(display.dimensions(), (width, height)),
        };
        sample_nearest(display.image(), &mut out, target);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

fn fit(src: (u32, u32), viewport: (u32, u32)) -> Placement {
    let (sw, sh) = (src.0 as u64, src.1 as u64);
    let (vw, vh) = (viewport.0 as u64, viewport.1 as u64);
    // Width-limited when sw/sh >= vw/vh.
    let (width, height) = if sw * vh >= sh * vw {
        (vw, (sh * vw / sw).max(1))
    } else {
        ((sw * vh / sh).max(1), vh)
    };
    Placement {
        x: ((vw - width) / 2) as u32,
        y: ((vh - height) / 2) as u32,
        width: width as u32,
        height: height as u32,
    }
}

fn sample_nearest(src: &RgbImage, dst: &mut RgbImage, target: Placement) {
    let (sw, sh) = (src.width() as u64, src.height() as u64);
    let stride = dst.width() as usize * 3;
    let src_data = src.as_raw();
    let src_stride = src.width() as usize * 3;
    let data: &mut [u8] = dst;

    data.par_chunks_mut(stride)
        .enumerate()
        .skip(target.y as usize)
        .take(target.height as usize)
        .for_each(|(y, row)| {
            let ty = (y - target.y as usize) as u64;
            let sy = ((ty * sh / target.height as u64) as usize).min(sh as usize - 1);
            let src_row = &src_data[sy * src_stride..(sy + 1) * src_stride];
            for tx in 0..target.width as usize {
                let sx = ((tx as u64 * sw / target.width as u64) as usize).min(sw as usize - 1);
                let dx = (target.x as usize + tx) * 3;
                row[dx..dx + 3].copy_from_slice(&src_row[sx * 3..sx * 3 + 3]);
            }
        });
}
