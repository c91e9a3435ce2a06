//! Conversions between author, fitted and pixel space
//!
//! - Author space: where drawables live. Top-left origin, Y-down, zoom independent.
//! - Fitted space: author space scaled for display.
//! - Pixel space: the base image's native pixel grid. Bottom-left origin, Y-up.
//!
//! Every function here is total. Clamping never fails; it trims or translates.

use crate::config::DisplayConfig;
use crate::domain::{Point, Rect, Size, Vector};

/// Smallest width/height a rect-like drawable may have, in author units
pub const MIN_RECT_SIZE: f32 = 2.0;

/// Slack for float comparisons in bounds tests
const BOUNDS_EPSILON: f32 = 1e-3;

fn axis_scale(to: f32, from: f32) -> f32 {
    if from > 0.0 { to / from } else { 1.0 }
}

/// Map an author point into fitted space
pub fn to_fitted(p: Point, author_size: Size, fitted_size: Size) -> Point {
    Point::new(
        p.x * axis_scale(fitted_size.width, author_size.width),
        p.y * axis_scale(fitted_size.height, author_size.height),
    )
}

/// Map a fitted point back into author space
pub fn to_author(p: Point, author_size: Size, fitted_size: Size) -> Point {
    Point::new(
        p.x * axis_scale(author_size.width, fitted_size.width),
        p.y * axis_scale(author_size.height, fitted_size.height),
    )
}

/// Map a top-left/Y-down rect expressed in a space of `source_size` into
/// bottom-left/Y-up pixel space of `pixel_size`
pub fn author_rect_to_pixel_rect(rect: Rect, source_size: Size, pixel_size: Size) -> Rect {
    let sx = axis_scale(pixel_size.width, source_size.width);
    let sy = axis_scale(pixel_size.height, source_size.height);
    let y_top = rect.y * sy;
    let height = rect.height * sy;
    Rect::new(
        rect.x * sx,
        pixel_size.height - (y_top + height),
        rect.width * sx,
        height,
    )
}

/// Point counterpart of [`author_rect_to_pixel_rect`]
pub fn author_point_to_pixel(p: Point, source_size: Size, pixel_size: Size) -> Point {
    Point::new(
        p.x * axis_scale(pixel_size.width, source_size.width),
        pixel_size.height - p.y * axis_scale(pixel_size.height, source_size.height),
    )
}

/// Rotation to apply in pixel space for an author-space rotation
///
/// The Y axis flips between the spaces, which mirrors the sense of rotation.
pub fn to_pixel_rotation(author_angle: f32) -> f32 {
    -author_angle
}

/// Restrict a point to `[0, size]` on each axis
pub fn clamp_point(p: Point, size: Size) -> Point {
    Point::new(
        p.x.clamp(0.0, size.width.max(0.0)),
        p.y.clamp(0.0, size.height.max(0.0)),
    )
}

/// Clamp one axis of a rect, returning the new (origin, length)
fn clamp_axis(origin: f32, length: f32, bound: f32) -> (f32, f32) {
    let bound = bound.max(0.0);
    let (mut origin, mut length) = if origin < 0.0 && origin + length > bound {
        // Hangs over both edges: oversized, trim rather than slide
        (0.0, bound)
    } else if length > bound {
        (0.0, bound)
    } else if origin < 0.0 {
        (0.0, length)
    } else if origin + length > bound {
        (bound - length, length)
    } else {
        (origin, length)
    };

    if length < MIN_RECT_SIZE {
        length = MIN_RECT_SIZE;
        if origin + length > bound {
            origin = (bound - length).max(0.0);
        }
    }
    (origin, length)
}

/// Restrict a rect to the `[0, size]` canvas, trimming oversized dimensions
/// and translating the rest; minimum size is enforced last
pub fn clamp_rect(r: Rect, size: Size) -> Rect {
    let (x, width) = clamp_axis(r.x, r.width, size.width);
    let (y, height) = clamp_axis(r.y, r.height, size.height);
    Rect::new(x, y, width, height)
}

/// Whether `r` lies inside the `[0, size]` canvas
pub fn rect_in_bounds(r: &Rect, size: Size) -> bool {
    r.min_x() >= -BOUNDS_EPSILON
        && r.min_y() >= -BOUNDS_EPSILON
        && r.max_x() <= size.width + BOUNDS_EPSILON
        && r.max_y() <= size.height + BOUNDS_EPSILON
}

/// Whether the rotated rect's AABB lies inside the canvas
pub fn rotated_rect_in_bounds(r: &Rect, angle: f32, size: Size) -> bool {
    rect_in_bounds(&r.rotated_aabb(angle), size)
}

/// Offset that brings `bounds` inside the canvas by translation only
///
/// A bounds box larger than the canvas is aligned to the minimum edge.
fn translation_into(bounds: &Rect, size: Size) -> Vector {
    fn axis(min: f32, max: f32, bound: f32) -> f32 {
        if min < 0.0 || max - min > bound {
            -min
        } else if max > bound {
            bound - max
        } else {
            0.0
        }
    }
    Vector::new(
        axis(bounds.min_x(), bounds.max_x(), size.width),
        axis(bounds.min_y(), bounds.max_y(), size.height),
    )
}

/// Translate a rotated rect so its AABB lies within the canvas
///
/// The offset is computed on the AABB and applied to the unrotated rect.
pub fn clamp_rotated_rect(r: Rect, angle: f32, size: Size) -> Rect {
    let offset = translation_into(&r.rotated_aabb(angle), size);
    r.translated(offset)
}

/// Translate a line so both endpoints fall inside the canvas
pub fn clamp_segment(start: Point, end: Point, size: Size) -> (Point, Point) {
    let span = Rect::from_points(start, end);
    let offset = translation_into(&span, size);
    let (start, end) = (start + offset, end + offset);
    (clamp_point(start, size), clamp_point(end, size))
}

/// Per-axis range of deltas that keep `bounds` inside the canvas
///
/// The range always contains zero so an object already touching (or past) an
/// edge is never pushed further out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeltaLimits {
    pub min_dx: f32,
    pub max_dx: f32,
    pub min_dy: f32,
    pub max_dy: f32,
}

impl DeltaLimits {
    pub fn for_bounds(bounds: &Rect, size: Size) -> Self {
        Self {
            min_dx: (-bounds.min_x()).min(0.0),
            max_dx: (size.width - bounds.max_x()).max(0.0),
            min_dy: (-bounds.min_y()).min(0.0),
            max_dy: (size.height - bounds.max_y()).max(0.0),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            min_dx: f32::NEG_INFINITY,
            max_dx: f32::INFINITY,
            min_dy: f32::NEG_INFINITY,
            max_dy: f32::INFINITY,
        }
    }

    /// Narrow to the intersection of both ranges
    pub fn intersect(self, other: DeltaLimits) -> Self {
        Self {
            min_dx: self.min_dx.max(other.min_dx),
            max_dx: self.max_dx.min(other.max_dx),
            min_dy: self.min_dy.max(other.min_dy),
            max_dy: self.max_dy.min(other.max_dy),
        }
    }

    /// Closest delta to `requested` that satisfies the limits
    pub fn apply(&self, requested: Vector) -> Vector {
        fn axis(v: f32, lo: f32, hi: f32) -> f32 {
            if lo > hi { 0.0 } else { v.clamp(lo, hi) }
        }
        Vector::new(
            axis(requested.dx, self.min_dx, self.max_dx),
            axis(requested.dy, self.min_dy, self.max_dy),
        )
    }
}

/// Size of the fitted (display) space for the given author canvas
///
/// Fit-to-window keeps the aspect ratio and never upscales; actual size shows
/// author units one to one.
pub fn fitted_size(author_size: Size, available: Size, display: &DisplayConfig) -> Size {
    if !display.fit_to_window || !author_size.is_positive() || !available.is_positive() {
        return author_size;
    }
    let scale = (available.width / author_size.width)
        .min(available.height / author_size.height)
        .min(1.0);
    Size::new(author_size.width * scale, author_size.height * scale)
}
