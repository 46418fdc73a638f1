use cv_io::{load, try_load, ChannelLayout, Error};
use image::{Rgb, RgbImage};
use tempfile::tempdir;

#[test]
fn loads_png_in_bgr_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("swatch.png");
    let mut img = RgbImage::from_pixel(12, 7, Rgb([200, 100, 50]));
    img.put_pixel(3, 4, Rgb([1, 2, 3]));
    img.save(&path).unwrap();

    let buffer = load(path.to_str().unwrap());
    assert_eq!(buffer.dimensions(), (12, 7));
    assert_eq!(buffer.layout(), ChannelLayout::Bgr);
    assert_eq!(buffer.pixel(0, 0), &[50, 100, 200]);
    assert_eq!(buffer.pixel(3, 4), &[3, 2, 1]);
}

#[test]
fn file_uri_prefix_is_accepted() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("uri.png");
    RgbImage::from_pixel(5, 9, Rgb([9, 9, 9])).save(&path).unwrap();

    let url = format!("file://{}", path.display());
    let buffer = try_load(&url).unwrap();
    assert_eq!(buffer.dimensions(), (5, 9));
}

#[test]
fn gray_png_is_widened_to_three_channels() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("gray.png");
    image::GrayImage::from_pixel(4, 4, image::Luma([60])).save(&path).unwrap();

    let buffer = load(path.to_str().unwrap());
    assert_eq!(buffer.channels(), 3);
    assert!(buffer.as_raw().iter().all(|&v| v == 60));
}

#[test]
fn corrupt_file_is_unreadable() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not a png at all").unwrap();

    assert!(load(path.to_str().unwrap()).is_empty());
    assert!(matches!(
        try_load(path.to_str().unwrap()),
        Err(Error::UnreadablePath { .. })
    ));
}
