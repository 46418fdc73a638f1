//! Frame configuration
//!
//! [`FrameConfig`] groups the viewport the frame is presented in and the
//! parameters of every menu operation. It deserializes from JSON with every
//! field optional, and two environment variables override the viewport:
//!
//! - `CVFRAME_VIEWPORT`: `"<width>x<height>"`, both >= 1
//! - `CVFRAME_SCALING`: `nearest` or `aspect`

use crate::viewport::{ScalingPolicy, ViewportConfig};
use cv_core::{Error, Result};
use serde::{Deserialize, Serialize};

pub const VIEWPORT_ENV: &str = "CVFRAME_VIEWPORT";
pub const SCALING_ENV: &str = "CVFRAME_SCALING";

/// Parameters of the operation menu. Defaults reproduce the fixed menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformParams {
    /// Gaussian kernel side, odd. Sigma is derived from it.
    pub blur_kernel: u32,
    pub erode_kernel: (u32, u32),
    pub dilate_kernel: (u32, u32),
    pub canny_low: f32,
    pub canny_high: f32,
    pub canny_aperture: u32,
    pub threshold_max: u8,
    pub threshold_block: u32,
    pub threshold_c: f32,
    /// Line elements are `image side / line_scale` long.
    pub line_scale: u32,
    pub laplacian_kernel: u32,
    /// BGR. `(256, 27, 120)` saturated to 8 bits.
    pub contour_color: [u8; 3],
    pub contour_thickness: u32,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            blur_kernel: 31,
            erode_kernel: (16, 16),
            dilate_kernel: (6, 6),
            canny_low: 0.0,
            canny_high: 150.0,
            canny_aperture: 3,
            threshold_max: 255,
            threshold_block: 15,
            threshold_c: -2.0,
            line_scale: 30,
            laplacian_kernel: 3,
            contour_color: [255, 27, 120],
            contour_thickness: 2,
        }
    }
}

impl TransformParams {
    pub fn validate(&self) -> Result<()> {
        if self.blur_kernel == 0 || self.blur_kernel.is_multiple_of(2) {
            return Err(invalid(format!("blur_kernel must be odd, got {}", self.blur_kernel)));
        }
        for (name, (w, h)) in [("erode_kernel", self.erode_kernel), ("dilate_kernel", self.dilate_kernel)] {
            if w == 0 || h == 0 {
                return Err(invalid(format!("{name} must be at least 1x1, got {w}x{h}")));
            }
        }
        if !matches!(self.canny_aperture, 3 | 5 | 7) {
            return Err(invalid(format!(
                "canny_aperture must be 3, 5 or 7, got {}",
                self.canny_aperture
            )));
        }
        if self.threshold_block < 3 || self.threshold_block.is_multiple_of(2) {
            return Err(invalid(format!(
                "threshold_block must be odd and >= 3, got {}",
                self.threshold_block
            )));
        }
        if self.line_scale == 0 {
            return Err(invalid("line_scale must be >= 1"));
        }
        if !matches!(self.laplacian_kernel, 1 | 3) {
            return Err(invalid(format!(
                "laplacian_kernel must be 1 or 3, got {}",
                self.laplacian_kernel
            )));
        }
        if self.contour_thickness == 0 {
            return Err(invalid("contour_thickness must be >= 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub viewport: ViewportConfig,
    pub params: TransformParams,
}

impl FrameConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| invalid(format!("invalid frame config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| invalid(e.to_string()))
    }

    /// Defaults with the process environment applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, which maps a variable name to
    /// its value.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(VIEWPORT_ENV) {
            let (width, height) = parse_viewport(&raw)?;
            self.viewport.width = width;
            self.viewport.height = height;
        }
        if let Some(raw) = lookup(SCALING_ENV) {
            self.viewport.scaling = raw.parse::<ScalingPolicy>()?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(invalid(format!(
                "viewport must be at least 1x1, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        self.params.validate()
    }
}

/// Parse `"<width>x<height>"`.
pub fn parse_viewport(raw: &str) -> Result<(u32, u32)> {
    let bad = || invalid(format!("{VIEWPORT_ENV} must look like 640x480, got '{raw}'"));
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(bad)?;
    let width: u32 = w.trim().parse().map_err(|_| bad())?;
    let height: u32 = h.trim().parse().map_err(|_| bad())?;
    if width == 0 || height == 0 {
        return Err(bad());
    }
    Ok((width, height))
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::Config(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = FrameConfig::default();
        config.validate().unwrap();
        assert_eq!(config.viewport.width, 640);
        assert_eq!(config.viewport.height, 480);
        assert_eq!(config.params.contour_color, [255, 27, 120]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FrameConfig::from_json(
            r#"{ "viewport": { "scaling": "aspect_preserving" }, "params": { "blur_kernel": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.viewport.scaling, ScalingPolicy::AspectPreserving);
        assert_eq!(config.viewport.width, 640);
        assert_eq!(config.params.blur_kernel, 5);
        assert_eq!(config.params.erode_kernel, (16, 16));
    }

    #[test]
    fn json_round_trips() {
        let config = FrameConfig::default();
        let back = FrameConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn rejects_invalid_params() {
        assert!(FrameConfig::from_json(r#"{ "params": { "blur_kernel": 4 } }"#).is_err());
        assert!(FrameConfig::from_json(r#"{ "params": { "laplacian_kernel": 5 } }"#).is_err());
        assert!(FrameConfig::from_json(r#"{ "params": { "line_scale": 0 } }"#).is_err());
        assert!(FrameConfig::from_json("not json").is_err());
    }

    #[test]
    fn env_overrides_viewport() {
        let config = FrameConfig::default()
            .with_overrides_from(lookup(&[(VIEWPORT_ENV, "800x600"), (SCALING_ENV, "aspect")]))
            .unwrap();
        assert_eq!((config.viewport.width, config.viewport.height), (800, 600));
        assert_eq!(config.viewport.scaling, ScalingPolicy::AspectPreserving);
    }

    #[test]
    fn env_without_overrides_is_default() {
        let config = FrameConfig::default().with_overrides_from(lookup(&[])).unwrap();
        assert_eq!(config, FrameConfig::default());
    }

    #[test]
    fn rejects_malformed_viewport() {
        for raw in ["800", "0x600", "axb", "800x"] {
            assert!(parse_viewport(raw).is_err(), "{raw}");
        }
        assert_eq!(parse_viewport(" 320 X 200 ").unwrap(), (320, 200));
        let err = FrameConfig::default()
            .with_overrides_from(lookup(&[(SCALING_ENV, "cubic")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
