//! Document export: rasterized single-page PDF and zipped static HTML bundle.
//!
//! Both pipelines render the record, then do their CPU-bound work inside
//! `spawn_blocking`. Nothing is retained once the artifact bytes are returned.

pub mod bundle;
pub mod handlers;
pub mod pdf;
pub mod raster;

use thiserror::Error;
use tracing::{info, warn};

use crate::layout::{flow, Frame, VIEWPORT_WIDTH};
use crate::portfolio::model::{file_stem, PortfolioData};
use crate::render::{render_portfolio, RenderContext};

pub const MIN_SCALE: f32 = 2.0;
pub const MAX_SCALE: f32 = 3.0;

/// Largest page side PDF readers accept, in default user-space units. One
/// unit maps to one bitmap pixel.
pub const MAX_PAGE_SIDE: u64 = 14_400;
/// Snapshot pixel budget (RGB, 3 bytes each).
pub const MAX_BITMAP_PIXELS: u64 = 24_000_000;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("document too large: {width}x{height} px snapshot")]
    TooLarge { width: u64, height: u64 },
}

/// A finished download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn pdf_filename(full_name: &str) -> String {
    format!("{}_portfolio.pdf", file_stem(full_name))
}

pub fn bundle_filename(full_name: &str) -> String {
    format!("{}_portfolio_source.zip", file_stem(full_name))
}

/// Snapshot scale within `MIN_SCALE..=MAX_SCALE`.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        MIN_SCALE
    }
}

/// Rejects frames whose snapshot would exceed the page or pixel budget.
/// Runs before any bitmap is allocated.
pub fn check_snapshot_size(frame: &Frame, scale: f32) -> Result<(), ExportError> {
    let width = (f64::from(frame.width) * f64::from(scale)).ceil().max(1.0) as u64;
    let height = (f64::from(frame.height) * f64::from(scale)).ceil().max(1.0) as u64;
    if width > MAX_PAGE_SIDE
        || height > MAX_PAGE_SIDE
        || width.saturating_mul(height) > MAX_BITMAP_PIXELS
    {
        warn!("Refusing {width}x{height} px snapshot");
        return Err(ExportError::TooLarge { width, height });
    }
    Ok(())
}

pub async fn export_pdf(
    data: PortfolioData,
    ctx: RenderContext,
    scale: f32,
) -> Result<ExportArtifact, ExportError> {
    let scale = clamp_scale(scale);
    let filename = pdf_filename(&data.full_name);

    let bytes = tokio::task::spawn_blocking(move || {
        let tree = render_portfolio(&data, &ctx);
        let frame = flow(&tree, VIEWPORT_WIDTH);
        check_snapshot_size(&frame, scale)?;
        let bitmap = raster::rasterize(&frame, scale);
        pdf::write_pdf(&frame, &bitmap, scale)
    })
    .await??;

    info!("Exported {filename} ({} bytes)", bytes.len());
    Ok(ExportArtifact {
        filename,
        content_type: "application/pdf",
        bytes,
    })
}

pub async fn export_bundle(
    data: PortfolioData,
    ctx: RenderContext,
) -> Result<ExportArtifact, ExportError> {
    let filename = bundle_filename(&data.full_name);

    let bytes = tokio::task::spawn_blocking(move || {
        let tree = render_portfolio(&data, &ctx);
        bundle::write_bundle(&data, &tree)
    })
    .await??;

    info!("Exported {filename} ({} bytes)", bytes.len());
    Ok(ExportArtifact {
        filename,
        content_type: "application/zip",
        bytes,
    })
}
