//! Bitmap backend: paints a laid-out frame into an RGB image.
//!
//! Text runs are not rasterized here; the PDF writer draws them as vectors over
//! the bitmap.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use tracing::warn;

use crate::layout::{Frame, Paint, Rect, Rgba};
use crate::render::qr::{QrBlock, QUIET_ZONE};

/// Rasterizes `frame` at `scale` device pixels per CSS pixel on a white page.
pub fn rasterize(frame: &Frame, scale: f32) -> RgbImage {
    let width = ((frame.width * scale).ceil() as u32).max(1);
    let height = ((frame.height * scale).ceil() as u32).max(1);
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for op in &frame.ops {
        match op {
            Paint::Fill {
                rect,
                color,
                radius,
            } => fill(&mut canvas, scale, rect, *radius, |_, _| Some(*color)),
            Paint::Stroke {
                rect,
                width,
                color,
                radius,
            } => {
                let inner = rect.inset(*width);
                let inner_radius = (radius - width).max(0.0);
                fill(&mut canvas, scale, rect, *radius, |x, y| {
                    (!inner.contains_rounded(x, y, inner_radius)).then_some(*color)
                })
            }
            Paint::Image {
                rect,
                source,
                radius,
            } => draw_image(&mut canvas, scale, rect, source, *radius),
            Paint::Qr { rect, block } => draw_qr(&mut canvas, scale, rect, block),
            Paint::Text { .. } => {}
        }
    }

    canvas
}

/// Device-pixel span covered by `rect`, clipped to the canvas.
fn pixel_bounds(canvas: &RgbImage, scale: f32, rect: &Rect) -> (u32, u32, u32, u32) {
    let clamp_x = |v: f32| (v.max(0.0) as u32).min(canvas.width());
    let clamp_y = |v: f32| (v.max(0.0) as u32).min(canvas.height());
    (
        clamp_x((rect.x * scale).floor()),
        clamp_y((rect.y * scale).floor()),
        clamp_x((rect.right() * scale).ceil()),
        clamp_y((rect.bottom() * scale).ceil()),
    )
}

/// Blends the color returned by `shade` into every pixel whose center lies
/// inside the rounded `rect`. `shade` receives CSS-pixel coordinates.
fn fill<F>(canvas: &mut RgbImage, scale: f32, rect: &Rect, radius: f32, shade: F)
where
    F: Fn(f32, f32) -> Option<Rgba>,
{
    let (x0, y0, x1, y1) = pixel_bounds(canvas, scale, rect);
    for py in y0..y1 {
        for px in x0..x1 {
            let (cx, cy) = ((px as f32 + 0.5) / scale, (py as f32 + 0.5) / scale);
            if !rect.contains_rounded(cx, cy, radius) {
                continue;
            }
            if let Some(color) = shade(cx, cy) {
                let pixel = canvas.get_pixel_mut(px, py);
                pixel.0 = color.over(pixel.0);
            }
        }
    }
}

/// Payload bytes of a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(source: &str) -> Option<Vec<u8>> {
    let rest = source.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}

fn draw_image(canvas: &mut RgbImage, scale: f32, rect: &Rect, source: &str, radius: f32) {
    let decoded = decode_data_uri(source).and_then(|bytes| image::load_from_memory(&bytes).ok());
    let Some(decoded) = decoded else {
        warn!("Skipping undecodable image in snapshot");
        return;
    };

    let target_w = ((rect.w * scale).round() as u32).max(1);
    let target_h = ((rect.h * scale).round() as u32).max(1);
    let covered = DynamicImage::resize_to_fill(&decoded, target_w, target_h, FilterType::Lanczos3)
        .to_rgba8();

    let (x0, y0, x1, y1) = pixel_bounds(canvas, scale, rect);
    let origin_x = (rect.x * scale).round() as i64;
    let origin_y = (rect.y * scale).round() as i64;
    for py in y0..y1 {
        for px in x0..x1 {
            let (cx, cy) = ((px as f32 + 0.5) / scale, (py as f32 + 0.5) / scale);
            if !rect.contains_rounded(cx, cy, radius) {
                continue;
            }
            let sx = px as i64 - origin_x;
            let sy = py as i64 - origin_y;
            if sx < 0 || sy < 0 || sx >= target_w as i64 || sy >= target_h as i64 {
                continue;
            }
            let [r, g, b, a] = covered.get_pixel(sx as u32, sy as u32).0;
            let pixel = canvas.get_pixel_mut(px, py);
            pixel.0 = Rgba { r, g, b, a }.over(pixel.0);
        }
    }
}

fn draw_qr(canvas: &mut RgbImage, scale: f32, rect: &Rect, block: &QrBlock) {
    let fg = Rgba::parse_hex(&block.fg_color).unwrap_or(Rgba::BLACK);
    let module = rect.w / block.total_modules() as f32;
    fill(canvas, scale, rect, 0.0, |x, y| {
        let mx = ((x - rect.x) / module).floor() as i64 - QUIET_ZONE as i64;
        let my = ((y - rect.y) / module).floor() as i64 - QUIET_ZONE as i64;
        let dark = mx >= 0 && my >= 0 && block.is_dark(mx as usize, my as usize);
        Some(if dark { fg } else { Rgba::WHITE })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::qr::QrLevel;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn frame(ops: Vec<Paint>) -> Frame {
        Frame {
            width: 100.0,
            height: 50.0,
            ops,
        }
    }

    #[test]
    fn test_canvas_is_scaled_and_white() {
        let bitmap = rasterize(&frame(vec![]), 2.0);
        assert_eq!(bitmap.dimensions(), (200, 100));
        assert_eq!(bitmap.get_pixel(10, 10).0, [255, 255, 255]);
    }

    #[test]
    fn test_fill_paints_inside_rect_only() {
        let red = Rgba::rgb(255, 0, 0);
        let bitmap = rasterize(
            &frame(vec![Paint::Fill {
                rect: Rect::new(10.0, 10.0, 20.0, 20.0),
                color: red,
                radius: 0.0,
            }]),
            2.0,
        );
        assert_eq!(bitmap.get_pixel(40, 40).0, [255, 0, 0]);
        assert_eq!(bitmap.get_pixel(5, 5).0, [255, 255, 255]);
    }

    #[test]
    fn test_stroke_leaves_interior_untouched() {
        let bitmap = rasterize(
            &frame(vec![Paint::Stroke {
                rect: Rect::new(0.0, 0.0, 40.0, 40.0),
                width: 2.0,
                color: Rgba::BLACK,
                radius: 0.0,
            }]),
            1.0,
        );
        assert_eq!(bitmap.get_pixel(0, 20).0, [0, 0, 0]);
        assert_eq!(bitmap.get_pixel(20, 20).0, [255, 255, 255]);
    }

    #[test]
    fn test_qr_draws_dark_finder_corner() {
        let block = QrBlock::encode("https://x/a", 40.0, "#000000", QrLevel::M).unwrap();
        let rect = Rect::new(0.0, 0.0, 40.0, 40.0);
        let module = 40.0 / block.total_modules() as f32;
        let bitmap = rasterize(&frame(vec![Paint::Qr { rect, block }]), 4.0);
        let inside_finder = ((QUIET_ZONE as f32 + 0.5) * module * 4.0) as u32;
        assert_eq!(bitmap.get_pixel(inside_finder, inside_finder).0, [0, 0, 0]);
        assert_eq!(bitmap.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_image_from_data_uri_is_drawn() {
        let mut png = Vec::new();
        RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let source = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let bitmap = rasterize(
            &frame(vec![Paint::Image {
                rect: Rect::new(0.0, 0.0, 20.0, 20.0),
                source,
                radius: 0.0,
            }]),
            1.0,
        );
        assert_eq!(bitmap.get_pixel(10, 10).0, [0, 0, 255]);
    }

    #[test]
    fn test_undecodable_image_is_skipped() {
        let bitmap = rasterize(
            &frame(vec![Paint::Image {
                rect: Rect::new(0.0, 0.0, 20.0, 20.0),
                source: "data:image/png;base64,!!!".into(),
                radius: 0.0,
            }]),
            1.0,
        );
        assert_eq!(bitmap.get_pixel(10, 10).0, [255, 255, 255]);
    }

    #[test]
    fn test_decode_data_uri_requires_base64() {
        assert!(decode_data_uri("data:image/png,abc").is_none());
        assert!(decode_data_uri("https://x/y.png").is_none());
        assert_eq!(decode_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
    }
}
