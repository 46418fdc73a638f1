use cv_core::{convert, ChannelLayout, Error, RawBuffer};
use image::RgbImage;
use std::sync::Arc;

/// Packed RGB rendering of a raw buffer, shared immutably with the
/// presentation layer.
///
/// Cloning is cheap and never copies pixels. The pixels are always a separate
/// allocation from the [`RawBuffer`] they were produced from.
#[derive(Debug, Clone)]
pub struct DisplayImage {
    image: Arc<RgbImage>,
}

impl Default for DisplayImage {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for DisplayImage {
    fn eq(&self, other: &Self) -> bool {
        self.image.dimensions() == other.image.dimensions()
            && self.image.as_raw() == other.image.as_raw()
    }
}

impl Eq for DisplayImage {}

impl DisplayImage {
    pub fn empty() -> Self {
        Self {
            image: Arc::new(RgbImage::new(0, 0)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn stride(&self) -> usize {
        self.image.width() as usize * 3
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Whether both handles share the same pixel allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Channel-order-corrected copy of `raw` in packed RGB.
///
/// `Bgr` is swapped, `Gray` is replicated to three channels and `Rgb` is
/// copied. An empty buffer gives an empty image.
pub fn to_display(raw: &RawBuffer) -> cv_core::Result<DisplayImage> {
    let rgb = convert(raw, raw.layout(), ChannelLayout::Rgb)?;
    let (width, height) = rgb.dimensions();
    let image = RgbImage::from_raw(width, height, rgb.into_raw()).ok_or_else(|| {
        Error::DimensionMismatch(format!("display buffer does not fit {width}x{height}"))
    })?;
    Ok(DisplayImage {
        image: Arc::new(image),
    })
}
