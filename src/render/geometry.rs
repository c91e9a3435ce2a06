//! Shared geometry calculations for drawables
//!
//! This module contains constants and math shared between the interactive
//! measurement of drawables and the rasterizer.

/// Arrow geometry constants
pub mod arrow {
    use crate::domain::Point;

    /// Arrowhead size relative to the stroke width
    pub const HEAD_SCALE: f32 = 4.0;
    /// Smallest arrowhead in author units
    pub const MIN_HEAD_SIZE: f32 = 10.0;
    /// Shadow/outline thickness offset in author units
    pub const OUTLINE: f32 = 2.0;
    /// Arrowhead angle from shaft in radians (35 degrees)
    pub const HEAD_ANGLE: f32 = 0.610_865_2; // 35.0_f32.to_radians()
    /// Minimum arrow length to get a head
    pub const MIN_LENGTH: f32 = 5.0;

    /// Head size for a given stroke width
    pub fn head_size(stroke_width: f32) -> f32 {
        (stroke_width * HEAD_SCALE).max(MIN_HEAD_SIZE)
    }

    /// Ends of the two head strokes of an arrow pointing at `tip`
    ///
    /// Both strokes run back along the shaft from the tip, turned by
    /// [`HEAD_ANGLE`] to either side. Arrows shorter than [`MIN_LENGTH`] get
    /// no head.
    pub fn head_points(tail: Point, tip: Point, head_size: f32) -> Option<[Point; 2]> {
        let shaft = tip - tail;
        let length = shaft.length();
        if length < MIN_LENGTH {
            return None;
        }
        let back = shaft * (-head_size / length);
        Some([tip + back.rotated(HEAD_ANGLE), tip + back.rotated(-HEAD_ANGLE)])
    }
}

/// Shape (rectangle/oval) geometry constants
pub mod shape {
    /// Extra width of the shadow stroke on each side, in author units
    pub const SHADOW_SPREAD: f32 = 1.0;
    /// Shadow alpha (0-255)
    pub const SHADOW_ALPHA: u8 = 220;

    /// Ellipse bezier approximation constant: 4/3 * (sqrt(2) - 1)
    pub const BEZIER_K: f32 = 0.552_284_8;
}

/// Text box geometry
pub mod text {
    /// Padding between the text frame and the glyphs, in author units
    pub const PADDING: f32 = 4.0;
    /// Line height as a multiple of the font size
    pub const LINE_HEIGHT: f32 = 1.25;
    /// Average advance as a multiple of the font size, used without a font
    pub const FALLBACK_ADVANCE: f32 = 0.6;
}

/// Badge geometry
pub mod badge {
    /// Diameter of a badge created with a click
    pub const DEFAULT_DIAMETER: f32 = 32.0;
    /// Number height relative to the diameter
    pub const NUMBER_SCALE: f32 = 0.55;
}

/// Default sizes for drawables created with a click instead of a drag
pub mod defaults {
    use crate::domain::Size;

    pub const SHAPE: Size = Size::new(40.0, 40.0);
    pub const BADGE: Size = Size::new(super::badge::DEFAULT_DIAMETER, super::badge::DEFAULT_DIAMETER);
    pub const BLUR: Size = Size::new(80.0, 80.0);
}

/// Calculate ellipse center and radii from bounds
#[inline]
pub fn ellipse_from_bounds(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (f32, f32, f32, f32) {
    let cx = (min_x + max_x) * 0.5;
    let cy = (min_y + max_y) * 0.5;
    let rx = ((max_x - min_x) * 0.5).max(1.0);
    let ry = ((max_y - min_y) * 0.5).max(1.0);
    (cx, cy, rx, ry)
}
