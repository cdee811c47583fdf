// Snapshot layout: static font metrics + a block/inline flow pass that turns the
// visual tree into paint operations consumed by the raster and PDF backends.
// CPU-bound; run inside tokio::task::spawn_blocking.

pub mod flow;
pub mod font_metrics;
pub mod paint;

pub use flow::{flow, VIEWPORT_WIDTH};
pub use paint::{Frame, Paint, Rect, Rgba};
