use image::{Rgb, RgbImage};
use rust_cv_frame::core::ChannelLayout;
use rust_cv_frame::frame::{ScalingPolicy, ViewportConfig};
use rust_cv_frame::{init_thread_pool, Frame, FrameConfig, FrameState, Operation};
use tempfile::tempdir;

fn write_scene(path: &std::path::Path) {
    // white page with a dark ruled line and a dark box
    let img = RgbImage::from_fn(240, 120, |x, y| {
        let on_rule = y == 30 && (20..220).contains(&x);
        let in_box = (140..200).contains(&x) && (60..100).contains(&y);
        if on_rule || in_box {
            Rgb([10, 10, 10])
        } else {
            Rgb([245, 245, 245])
        }
    });
    img.save(path).unwrap();
}

#[test]
fn test_thread_pool_init_is_idempotent() {
    let first = init_thread_pool(Some(2)).is_ok();
    let second = init_thread_pool(Some(8)).is_ok();
    assert_eq!(first, second);
    assert!(rust_cv_frame::core::current_cpu_threads() >= 1);
}

#[test]
fn test_menu_session_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("page.png");
    write_scene(&path);

    let mut frame = Frame::new();
    assert!(!frame.smooth_image());
    assert!(frame.open_image(&format!("file://{}", path.display())));
    assert_eq!(frame.state(), &FrameState::Loaded);
    assert_eq!(frame.raw().dimensions(), (240, 120));

    for op in Operation::ALL {
        let mut session = Frame::from(frame.raw().clone());
        let input_layout = session.raw().layout();
        session.try_apply(op).unwrap();
        assert_eq!(session.raw().layout(), op.output_layout(input_layout), "{op}");
        assert_eq!(session.raw().dimensions(), (240, 120), "{op}");
        assert_eq!(session.display().dimensions(), (240, 120), "{op}");
    }

    assert!(frame.smooth_image());
    assert!(frame.erode_image());
    assert!(frame.dilate_image());
    assert!(frame.find_image_contours());
    assert_eq!(frame.raw().layout(), ChannelLayout::Bgr);
}

#[test]
fn test_render_letterboxes_wide_image() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("page.png");
    write_scene(&path);

    let config = FrameConfig {
        viewport: ViewportConfig {
            width: 120,
            height: 120,
            scaling: ScalingPolicy::AspectPreserving,
        },
        ..FrameConfig::default()
    };
    let mut frame = Frame::with_config(config).unwrap();
    assert!(frame.render().as_raw().iter().all(|&v| v == 0));

    assert!(frame.open_image(path.to_str().unwrap()));
    let view = frame.render();
    assert_eq!(view.dimensions(), (120, 120));
    // 240x120 fits as 120x60 starting at y = 30
    assert_eq!(view.get_pixel(0, 10), &Rgb([0, 0, 0]));
    assert_eq!(view.get_pixel(0, 40), &Rgb([245, 245, 245]));
    assert_eq!(view.get_pixel(0, 100), &Rgb([0, 0, 0]));
}

#[test]
fn test_config_from_json_drives_frame() {
    let config = FrameConfig::from_json(
        r#"{ "viewport": { "width": 64, "height": 32 }, "params": { "blur_kernel": 3, "contour_thickness": 1 } }"#,
    )
    .unwrap();
    let mut frame = Frame::with_config(config).unwrap();
    assert_eq!(frame.render().dimensions(), (64, 32));

    let mut raw = rust_cv_frame::core::RawBuffer::new(16, 16, ChannelLayout::Gray);
    raw.pixel_mut(8, 8)[0] = 255;
    frame.set_raw(raw);
    assert!(frame.smooth_image());
    // a 3x3 blur only reaches one pixel out
    assert!(frame.raw().pixel(7, 7)[0] > 0);
    assert_eq!(frame.raw().pixel(6, 6)[0], 0);
}
