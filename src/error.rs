use thiserror::Error;

/// Failure taxonomy for the request-to-artifact pipeline.
///
/// The resolver deliberately does not produce most of these: unrecognized
/// colors, formats and missing heights resolve to documented fallbacks
/// instead of erroring. What remains are the hard failures of the raster
/// stage plus `InvalidDimension`, which only the strict resolver entry
/// point raises.
#[derive(Debug, Error)]
pub enum Error {
    /// Size token contained no parseable numeric width.
    #[error("invalid dimension token: {0:?}")]
    InvalidDimension(String),

    /// The generated markup failed to parse back for rasterization.
    #[error("svg parse failed: {0}")]
    Svg(#[from] usvg::Error),

    /// Pixel buffer allocation failed (dimensions are pre-clamped, so
    /// this indicates memory pressure rather than bad input).
    #[error("failed to allocate {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },

    /// Raster encoder error.
    #[error("image encode failed: {0}")]
    Encode(#[from] image::error::ImageError),

    /// The blocking encode task was cancelled or panicked.
    #[error("raster task failed: {0}")]
    RasterTask(#[from] tokio::task::JoinError),

    /// The permit pool was closed while waiting for a raster slot.
    /// Unreachable in normal operation; the pool lives as long as the
    /// pipeline.
    #[error("raster permit pool closed")]
    PermitPoolClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
