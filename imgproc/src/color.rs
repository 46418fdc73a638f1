use crate::Result;
use cv_core::{convert, ChannelLayout, RawBuffer};
use image::GrayImage;

/// Luminance of `src` as a gray image.
///
/// Colour buffers are reduced with BT.601 weights in their own channel order;
/// a buffer that is already `Gray` is copied unchanged.
pub fn to_gray(src: &RawBuffer) -> Result<GrayImage> {
    let gray = convert(src, src.layout(), ChannelLayout::Gray)?;
    Ok(gray.into_gray_image()?)
}

/// Copy of `src` in `layout`, whatever layout it currently has.
pub fn to_layout(src: &RawBuffer, layout: ChannelLayout) -> Result<RawBuffer> {
    Ok(convert(src, src.layout(), layout)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_gray_accepts_every_layout() {
        let bgr = RawBuffer::from_pixel(4, 4, ChannelLayout::Bgr, &[255, 255, 255]).unwrap();
        let gray = to_gray(&bgr).unwrap();
        assert!(gray.as_raw().iter().all(|&v| v == 255));

        let already = RawBuffer::from_pixel(4, 4, ChannelLayout::Gray, &[42]).unwrap();
        let gray = to_gray(&already).unwrap();
        assert_eq!(gray.dimensions(), (4, 4));
        assert!(gray.as_raw().iter().all(|&v| v == 42));
    }

    #[test]
    fn to_layout_normalizes_gray_to_color() {
        let gray = RawBuffer::from_pixel(2, 2, ChannelLayout::Gray, &[9]).unwrap();
        let bgr = to_layout(&gray, ChannelLayout::Bgr).unwrap();
        assert_eq!(bgr.layout(), ChannelLayout::Bgr);
        assert_eq!(bgr.pixel(0, 0), &[9, 9, 9]);
    }
}
