//! QR code block embedded by every layout.

use std::fmt::Write as _;

use qrcode::{Color, EcLevel, QrCode};

/// Quiet-zone width in modules on each side.
pub const QUIET_ZONE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrLevel {
    M,
    H,
}

impl From<QrLevel> for EcLevel {
    fn from(level: QrLevel) -> Self {
        match level {
            QrLevel::M => EcLevel::M,
            QrLevel::H => EcLevel::H,
        }
    }
}

/// An encoded QR matrix plus its display parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QrBlock {
    pub value: String,
    /// Rendered edge length in CSS pixels, quiet zone included.
    pub size: f32,
    pub fg_color: String,
    /// Modules per side, quiet zone excluded.
    pub width: usize,
    /// Row-major dark flags, `width * width` entries.
    pub modules: Vec<bool>,
}

impl QrBlock {
    pub fn encode(
        value: &str,
        size: f32,
        fg_color: &str,
        level: QrLevel,
    ) -> Result<Self, qrcode::types::QrError> {
        let code = QrCode::with_error_correction_level(value.as_bytes(), level.into())?;
        let width = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self {
            value: value.to_string(),
            size,
            fg_color: fg_color.to_string(),
            width,
            modules,
        })
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Modules per side including the quiet zone.
    pub fn total_modules(&self) -> usize {
        self.width + 2 * QUIET_ZONE
    }

    pub fn to_svg(&self) -> String {
        let total = self.total_modules();
        let mut path = String::new();
        for y in 0..self.width {
            for x in 0..self.width {
                if self.is_dark(x, y) {
                    let _ = write!(path, "M{},{}h1v1h-1z", x + QUIET_ZONE, y + QUIET_ZONE);
                }
            }
        }
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {total} {total}\" \
             width=\"{size}\" height=\"{size}\" shape-rendering=\"crispEdges\" \
             data-qr-value=\"{value}\">\
             <rect width=\"{total}\" height=\"{total}\" fill=\"#ffffff\"/>\
             <path fill=\"{fg}\" d=\"{path}\"/></svg>",
            size = self.size,
            value = crate::render::node::escape_html(&self.value),
            fg = crate::render::node::escape_html(&self.fg_color),
        )
    }
}
