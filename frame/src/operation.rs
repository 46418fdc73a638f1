use crate::config::TransformParams;
use crate::{FrameError, Result};
use cv_core::{ChannelLayout, RawBuffer};
use cv_imgproc::{
    adaptive_threshold, canny, convert_scale_abs, dilate, draw_contours, erode, find_contours,
    gaussian_blur, laplacian, to_gray, AdaptiveMethod, BorderMode, ChainApprox, RetrievalMode,
    StructuringElement, ThresholdType,
};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the frame's operation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Smooth,
    Erode,
    Dilate,
    Canny,
    HorizontalLines,
    VerticalLines,
    Laplacian,
    Contours,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Smooth,
        Operation::Erode,
        Operation::Dilate,
        Operation::Canny,
        Operation::HorizontalLines,
        Operation::VerticalLines,
        Operation::Laplacian,
        Operation::Contours,
    ];

    /// Name of the matching [`Frame`](crate::Frame) method.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Smooth => "smooth_image",
            Operation::Erode => "erode_image",
            Operation::Dilate => "dilate_image",
            Operation::Canny => "apply_canny",
            Operation::HorizontalLines => "find_horizontal_lines",
            Operation::VerticalLines => "find_vertical_lines",
            Operation::Laplacian => "laplacian_filter",
            Operation::Contours => "find_image_contours",
        }
    }

    /// Layout of the buffer this operation produces from an `input` buffer.
    pub fn output_layout(self, input: ChannelLayout) -> ChannelLayout {
        match self {
            Operation::Smooth | Operation::Erode | Operation::Dilate => input,
            Operation::Canny
            | Operation::HorizontalLines
            | Operation::VerticalLines
            | Operation::Laplacian => ChannelLayout::Gray,
            Operation::Contours => ChannelLayout::Bgr,
        }
    }

    /// Apply with the default menu parameters.
    pub fn apply(self, src: &RawBuffer) -> Result<RawBuffer> {
        self.apply_with(src, &TransformParams::default())
    }

    /// Run the operation on `src`, returning a new buffer. `src` is untouched.
    pub fn apply_with(self, src: &RawBuffer, params: &TransformParams) -> Result<RawBuffer> {
        if src.is_empty() {
            return Err(FrameError::EmptyBuffer { operation: self });
        }

        let output = match self {
            Operation::Smooth => {
                gaussian_blur(src, params.blur_kernel as usize, 0.0, BorderMode::Reflect101)?
            }
            Operation::Erode => {
                let (w, h) = params.erode_kernel;
                erode(src, &StructuringElement::rect(w, h)?, 1)
            }
            Operation::Dilate => {
                let (w, h) = params.dilate_kernel;
                dilate(src, &StructuringElement::rect(w, h)?, 1)
            }
            Operation::Canny => RawBuffer::from_gray(edges(src, params)?),
            Operation::HorizontalLines => {
                let (w, h) = horizontal_line_element(src.width(), params.line_scale);
                extract_lines(src, params, w, h)?
            }
            Operation::VerticalLines => {
                let (w, h) = vertical_line_element(src.height(), params.line_scale);
                extract_lines(src, params, w, h)?
            }
            Operation::Laplacian => {
                let gray = to_gray(src)?;
                let response = laplacian(&gray, params.laplacian_kernel as usize, BorderMode::Reflect101)?;
                RawBuffer::from_gray(convert_scale_abs(&response, 1.0, 0.0))
            }
            Operation::Contours => {
                let edges = edges(src, params)?;
                let contours = find_contours(&edges, RetrievalMode::Tree, ChainApprox::Simple);
                let mut canvas = RawBuffer::new(src.width(), src.height(), ChannelLayout::Bgr);
                draw_contours(
                    &mut canvas,
                    &contours,
                    &params.contour_color,
                    params.contour_thickness,
                )?;
                canvas
            }
        };

        debug_assert_eq!(output.layout(), self.output_layout(src.layout()));
        Ok(output)
    }
}

/// Element used to keep horizontal runs of an image `width` pixels wide.
pub fn horizontal_line_element(width: u32, scale: u32) -> (u32, u32) {
    ((width / scale.max(1)).max(1), 1)
}

/// Element used to keep vertical runs of an image `height` pixels tall.
pub fn vertical_line_element(height: u32, scale: u32) -> (u32, u32) {
    (1, (height / scale.max(1)).max(1))
}

fn edges(src: &RawBuffer, params: &TransformParams) -> Result<GrayImage> {
    let gray = to_gray(src)?;
    Ok(canny(
        &gray,
        params.canny_low,
        params.canny_high,
        params.canny_aperture as usize,
    )?)
}

// Binarize, then open with a one-pixel-thick line so only runs at least as
// long as the element survive.
fn extract_lines(src: &RawBuffer, params: &TransformParams, width: u32, height: u32) -> Result<RawBuffer> {
    let gray = to_gray(src)?;
    let binary = adaptive_threshold(
        &gray,
        params.threshold_max,
        AdaptiveMethod::MeanC,
        ThresholdType::Binary,
        params.threshold_block,
        params.threshold_c,
    )?;
    let element = StructuringElement::rect(width, height)?;
    let binary = RawBuffer::from_gray(binary);
    Ok(dilate(&erode(&binary, &element, 1), &element, 1))
}
