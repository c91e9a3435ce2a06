//! Input types for the editor session
//!
//! This module contains:
//! - Pointer events with modifier state and click count
//! - The viewport a pointer event was produced in
//! - The tool context used when creating drawables

use std::time::Instant;

use crate::config::{DisplayConfig, EditorConfig, ShapeColor, Tool};
use crate::domain::{Point, Size, StrokeStyle};
use crate::transform;

// ============================================================================
// Pointer Events
// ============================================================================

/// Stage of a pointer gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Drag,
    Up,
}

/// Modifier keys held during a pointer event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }
}

/// One pointer event in view coordinates
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    /// Position relative to the view, before removing the canvas origin
    pub position: Point,
    pub modifiers: Modifiers,
    /// 1 for single clicks, 2 for double clicks
    pub click_count: u8,
    pub timestamp: Instant,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, position: Point) -> Self {
        Self {
            phase,
            position,
            modifiers: Modifiers::NONE,
            click_count: 1,
            timestamp: Instant::now(),
        }
    }

    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Down, Point::new(x, y))
    }

    pub fn drag(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Drag, Point::new(x, y))
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Up, Point::new(x, y))
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_click_count(mut self, click_count: u8) -> Self {
        self.click_count = click_count;
        self
    }

    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_double_click(&self) -> bool {
        self.click_count >= 2
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// Where the canvas sits on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Offset of the fitted canvas inside the view
    pub origin: Point,
    pub fitted_size: Size,
    pub author_size: Size,
}

impl Viewport {
    /// Canvas shown at actual size with no offset
    pub fn identity(author_size: Size) -> Self {
        Self {
            origin: Point::ORIGIN,
            fitted_size: author_size,
            author_size,
        }
    }

    /// Canvas shown in a view of `available` size, centered when smaller
    pub fn fitted(author_size: Size, available: Size, display: &DisplayConfig) -> Self {
        let fitted_size = transform::fitted_size(author_size, available, display);
        Self {
            origin: Point::new(
                ((available.width - fitted_size.width) * 0.5).max(0.0),
                ((available.height - fitted_size.height) * 0.5).max(0.0),
            ),
            fitted_size,
            author_size,
        }
    }

    /// Map a view position into author space
    pub fn to_author(&self, position: Point) -> Point {
        let fitted = Point::new(position.x - self.origin.x, position.y - self.origin.y);
        transform::to_author(fitted, self.author_size, self.fitted_size)
    }
}

// ============================================================================
// Tool Context
// ============================================================================

/// Active tool and styles applied to newly created drawables
#[derive(Debug, Clone, PartialEq)]
pub struct ToolContext {
    pub tool: Tool,
    pub stroke: StrokeStyle,
    pub fill: Option<ShapeColor>,
    pub arrow_head: bool,
    pub font_size: f32,
    pub text_color: ShapeColor,
    pub text_background: Option<ShapeColor>,
    pub default_text: String,
    pub badge_color: ShapeColor,
    pub badge_text_color: ShapeColor,
    pub highlight_color: ShapeColor,
    pub blur_block_size: u32,
}

impl ToolContext {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            tool: config.tool,
            stroke: StrokeStyle {
                color: config.stroke_color,
                width: config.stroke_width,
                shadow: config.shape_shadow,
            },
            fill: config.fill_color,
            arrow_head: config.line_arrow_head,
            font_size: config.font_size,
            text_color: config.text_color,
            text_background: config.text_background,
            default_text: config.default_text.clone(),
            badge_color: config.badge_color,
            badge_text_color: ShapeColor::WHITE,
            highlight_color: config.highlight_color,
            blur_block_size: config.blur_block_size.clamp(1, 64),
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}
