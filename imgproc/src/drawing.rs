use crate::contours::Contour;
use crate::{ImgprocError, Result};
use cv_core::RawBuffer;

/// Draw a straight 8-connected line of `thickness` pixels, clipped to the canvas.
pub fn draw_line(canvas: &mut RawBuffer, from: (i32, i32), to: (i32, i32), color: &[u8], thickness: u32) -> Result<()> {
    check_color(canvas, color)?;
    line_points(from, to, |x, y| stamp(canvas, x, y, color, thickness));
    Ok(())
}

/// Stroke every contour as a closed polyline.
pub fn draw_contours(canvas: &mut RawBuffer, contours: &[Contour], color: &[u8], thickness: u32) -> Result<()> {
    check_color(canvas, color)?;
    for contour in contours {
        let points = &contour.points;
        match points.len() {
            0 => {}
            1 => stamp(canvas, points[0].0, points[0].1, color, thickness),
            n => {
                for i in 0..n {
                    let a = points[i];
                    let b = points[(i + 1) % n];
                    line_points(a, b, |x, y| stamp(canvas, x, y, color, thickness));
                }
            }
        }
    }
    Ok(())
}

fn check_color(canvas: &RawBuffer, color: &[u8]) -> Result<()> {
    if color.len() != canvas.channels() {
        return Err(ImgprocError::invalid(format!(
            "colour has {} components, canvas has {} channels",
            color.len(),
            canvas.channels()
        )));
    }
    Ok(())
}

// Bresenham, all octants.
fn line_points(from: (i32, i32), to: (i32, i32), mut plot: impl FnMut(i32, i32)) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(x, y);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn stamp(canvas: &mut RawBuffer, x: i32, y: i32, color: &[u8], thickness: u32) {
    let t = thickness.max(1) as i32;
    let lo = -(t / 2);
    let hi = (t - 1) / 2;
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    for oy in lo..=hi {
        for ox in lo..=hi {
            let (px, py) = (x + ox, y + oy);
            if px >= 0 && py >= 0 && px < w && py < h {
                canvas.pixel_mut(px as u32, py as u32).copy_from_slice(color);
            }
        }
    }
}
