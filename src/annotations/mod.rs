//! Annotation interaction
//!
//! This module provides:
//! - Pointer-down resolution and marquee selection
//! - Group move limits
//! - Rotate-handle snapping
//! - Gesture handlers that create and edit drawables

pub mod group_move;
pub mod handlers;
pub mod rotation;
