//! Editor session management module
//!
//! This module contains:
//! - Session state and the editing commands
//! - Input types for pointer interactions
//! - Undo/redo history
//! - Pointer throttling

pub mod history;
pub mod messages;
pub mod state;
pub mod throttle;
