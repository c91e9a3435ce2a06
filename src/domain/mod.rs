//! Pure domain types with minimal dependencies
//!
//! This module contains the object model: geometry primitives, the drawable
//! sum type, handles and selection, and the base image.

pub mod base_image;
pub mod drawable;
pub mod geometry;
pub mod selection;

pub use base_image::*;
pub use drawable::*;
pub use geometry::*;
pub use selection::*;
