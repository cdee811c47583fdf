//! Positioned paint operations produced by the flow pass.
//!
//! Coordinates are CSS pixels with the origin at the top-left of the frame.
//! Backends multiply by their own scale factor.

use crate::render::qr::QrBlock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// True when `(px, py)` falls inside the rect with corners rounded by `radius`.
    pub fn contains_rounded(&self, px: f32, py: f32, radius: f32) -> bool {
        if px < self.x || py < self.y || px >= self.right() || py >= self.bottom() {
            return false;
        }
        let r = radius.min(self.w / 2.0).min(self.h / 2.0).max(0.0);
        if r == 0.0 {
            return true;
        }
        let cx = px.clamp(self.x + r, self.right() - r);
        let cy = py.clamp(self.y + r, self.bottom() - r);
        let (dx, dy) = (px - cx, py - cy);
        dx * dx + dy * dy <= r * r
    }

    pub fn inset(&self, by: f32) -> Self {
        Self::new(
            self.x + by,
            self.y + by,
            (self.w - 2.0 * by).max(0.0),
            (self.h - 2.0 * by).max(0.0),
        )
    }
}

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Rgba::rgb(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Rgba::rgb(
                byte(hex.get(0..2)?)?,
                byte(hex.get(2..4)?)?,
                byte(hex.get(4..6)?)?,
            )),
            8 => Some(Rgba {
                r: byte(hex.get(0..2)?)?,
                g: byte(hex.get(2..4)?)?,
                b: byte(hex.get(4..6)?)?,
                a: byte(hex.get(6..8)?)?,
            }),
            _ => None,
        }
    }

    /// Source-over blend onto an opaque backdrop.
    pub fn over(&self, backdrop: [u8; 3]) -> [u8; 3] {
        let alpha = self.a as f32 / 255.0;
        let mix = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8;
        [
            mix(self.r, backdrop[0]),
            mix(self.g, backdrop[1]),
            mix(self.b, backdrop[2]),
        ]
    }

    /// Components in 0..=1 for PDF color operators, flattened onto white.
    pub fn to_unit_rgb(&self) -> [f32; 3] {
        let [r, g, b] = self.over([255, 255, 255]);
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Fill {
        rect: Rect,
        color: Rgba,
        radius: f32,
    },
    Stroke {
        rect: Rect,
        width: f32,
        color: Rgba,
        radius: f32,
    },
    /// Text run; `baseline` is the y of the glyph baseline.
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        bold: bool,
        color: Rgba,
        text: String,
    },
    /// Image from a data URI, scaled to cover `rect`.
    Image {
        rect: Rect,
        source: String,
        radius: f32,
    },
    Qr {
        rect: Rect,
        block: QrBlock,
    },
}

/// The laid-out page: a fixed viewport width and the content height.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<Paint>,
}

impl Frame {
    pub fn text_runs(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            Paint::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Rgba::parse_hex("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse_hex("#3b82f6"), Some(Rgba::rgb(0x3b, 0x82, 0xf6)));
        assert_eq!(
            Rgba::parse_hex("#3b82f620"),
            Some(Rgba {
                r: 0x3b,
                g: 0x82,
                b: 0xf6,
                a: 0x20
            })
        );
        assert_eq!(Rgba::parse_hex("blue"), None);
        assert_eq!(Rgba::parse_hex("#12345"), None);
    }

    #[test]
    fn test_over_blends_alpha() {
        let half = Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 128,
        };
        let [r, g, b] = half.over([255, 255, 255]);
        assert!(r > 120 && r < 135 && r == g && g == b);
        assert_eq!(Rgba::BLACK.over([255, 255, 255]), [0, 0, 0]);
    }

    #[test]
    fn test_contains_rounded_excludes_corners() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect.contains_rounded(50.0, 50.0, 50.0));
        assert!(!rect.contains_rounded(1.0, 1.0, 50.0));
        assert!(rect.contains_rounded(1.0, 1.0, 0.0));
        assert!(!rect.contains_rounded(100.0, 50.0, 0.0));
    }
}
