//! Screenshot annotation engine
//!
//! Drawables live in author space over a base image. The session turns
//! pointer gestures into drawable edits with undo, and the renderer flattens
//! everything into the base image's native pixels.

pub mod annotations;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod render;
pub mod session;
pub mod transform;

pub use domain::BaseImage;
pub use error::RenderError;
pub use render::rasterize;
pub use session::state::EditorSession;
