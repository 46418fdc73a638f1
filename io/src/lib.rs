//! Image file input
//!
//! Decodes image files into [`RawBuffer`]s in the library-native `Bgr`
//! layout. Locations may carry a `file://` prefix; remote schemes are not
//! supported.

use rayon::prelude::*;
use std::path::Path;

pub use cv_core::{ChannelLayout, Error, RawBuffer, Result};

const FILE_SCHEME: &str = "file://";

/// Strip a leading `file://` from `url`.
///
/// Any other `scheme://` prefix is rejected with [`Error::UnsupportedScheme`].
pub fn strip_scheme(url: &str) -> Result<&str> {
    if let Some(rest) = url.strip_prefix(FILE_SCHEME) {
        return Ok(rest);
    }
    if let Some((scheme, _)) = url.split_once("://") {
        let is_scheme = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if is_scheme {
            return Err(Error::UnsupportedScheme(scheme.to_string()));
        }
    }
    Ok(url)
}

/// Decode the image at `url` into a 3-channel `Bgr` buffer.
pub fn try_load(url: &str) -> Result<RawBuffer> {
    let path = Path::new(strip_scheme(url)?);
    let decoded = image::open(path).map_err(|e| Error::unreadable(path, e))?;

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut data = rgb.into_raw();
    data.par_chunks_exact_mut(3).for_each(|px| px.swap(0, 2));

    RawBuffer::from_raw(width, height, ChannelLayout::Bgr, data)
}

/// Like [`try_load`], but an unreadable location yields an empty buffer.
pub fn load(url: &str) -> RawBuffer {
    match try_load(url) {
        Ok(buffer) => buffer,
        Err(e) => {
            tracing::warn!(url, error = %e, "image load failed, returning empty buffer");
            RawBuffer::empty()
        }
    }
}
