//! Error types for compositing
//!
//! Geometry never fails; only the raster side has caller-visible errors.
//! I/O paths use `anyhow` with context on top of these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The base image cannot be composited onto
    #[error("base image unavailable: {0}")]
    ResourceUnavailable(String),
    /// The base image could not be decoded
    #[error("failed to decode base image")]
    Decode(#[from] image::ImageError),
}
