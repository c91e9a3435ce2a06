//! Annotation rendering module
//!
//! This module contains:
//! - Geometry calculations shared between interaction and rasterization
//! - Text measurement and glyph outlines
//! - Pixelation for redactions and its preview cache
//! - Image rendering using tiny-skia (for saving to file)

pub mod blur_cache;
pub mod geometry;
pub mod image;
pub mod pixelate;
pub mod text;

pub use blur_cache::BlurCache;
pub use image::rasterize;
