//! Drawable annotation objects
//!
//! All geometry is stored in author space. Rect-like drawables keep an
//! unrotated frame plus a rotation scalar applied about the frame's center;
//! lines keep two endpoints and ignore rotation.

use std::sync::Arc;

use image::RgbaImage;

use super::geometry::{Point, Rect, Size, Vector, bounding_box, distance_to_segment};
use super::selection::Handle;
use crate::config::ShapeColor;
use crate::transform::{self, DeltaLimits};

pub type DrawableId = u64;

/// Radius around a control point that counts as grabbing it
pub const HANDLE_RADIUS: f32 = 8.0;
/// Offset of the rotate grip from the top-right corner, per axis
pub const ROTATE_HANDLE_OFFSET: f32 = 20.0;
/// Extra slack around thin strokes when hit testing
pub const HIT_TOLERANCE: f32 = 4.0;
/// Smallest font size text can be resized to
pub const MIN_FONT_SIZE: f32 = 4.0;

/// tan(22.5°): below this |dy|/|dx| a line snaps horizontal
pub const SNAP_HORIZONTAL_RATIO: f32 = 0.414_213_56;
/// tan(67.5°): above this |dy|/|dx| a line snaps vertical
pub const SNAP_VERTICAL_RATIO: f32 = 2.414_213_6;

/// Stroke appearance shared by lines, rectangles and ovals
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: ShapeColor,
    /// Width in author units
    pub width: f32,
    /// Whether to draw shadow/border under the stroke
    pub shadow: bool,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: ShapeColor::default(),
            width: 3.0,
            shadow: false,
        }
    }
}

/// Straight line, optionally ending in an arrow head
#[derive(Clone, Debug, PartialEq)]
pub struct LineDrawable {
    pub id: DrawableId,
    pub start: Point,
    pub end: Point,
    pub stroke: StrokeStyle,
    pub arrow_head: bool,
}

/// Rectangle or oval outline with optional fill
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeDrawable {
    pub id: DrawableId,
    pub frame: Rect,
    pub rotation: f32,
    pub stroke: StrokeStyle,
    pub fill: Option<ShapeColor>,
}

/// Text box; the frame includes the background padding
#[derive(Clone, Debug, PartialEq)]
pub struct TextDrawable {
    pub id: DrawableId,
    pub frame: Rect,
    pub rotation: f32,
    pub content: String,
    pub font_size: f32,
    pub color: ShapeColor,
    pub background: Option<ShapeColor>,
}

/// Numbered circular marker
#[derive(Clone, Debug, PartialEq)]
pub struct BadgeDrawable {
    pub id: DrawableId,
    /// Square frame; the diameter is its width
    pub frame: Rect,
    pub rotation: f32,
    pub number: u32,
    pub color: ShapeColor,
    pub text_color: ShapeColor,
}

/// Translucent marker box
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightDrawable {
    pub id: DrawableId,
    pub frame: Rect,
    pub rotation: f32,
    pub color: ShapeColor,
}

/// Raster image pasted onto the canvas
#[derive(Clone, Debug, PartialEq)]
pub struct ImageDrawable {
    pub id: DrawableId,
    pub frame: Rect,
    pub rotation: f32,
    pub pixels: Arc<RgbaImage>,
}

/// Pixelated redaction region
///
/// Holds no pixel data; the compositor and the preview cache produce it.
#[derive(Clone, Debug, PartialEq)]
pub struct BlurDrawable {
    pub id: DrawableId,
    pub frame: Rect,
    pub rotation: f32,
    /// Edge length of averaged blocks, in image pixels
    pub block_size: u32,
}

/// Unified annotation type for ordered drawing and undo/redo
#[derive(Clone, Debug, PartialEq)]
pub enum Drawable {
    Line(LineDrawable),
    Rect(ShapeDrawable),
    Oval(ShapeDrawable),
    Text(TextDrawable),
    Badge(BadgeDrawable),
    Highlight(HighlightDrawable),
    Image(ImageDrawable),
    Blur(BlurDrawable),
}

impl Drawable {
    pub fn id(&self) -> DrawableId {
        match self {
            Drawable::Line(d) => d.id,
            Drawable::Rect(d) | Drawable::Oval(d) => d.id,
            Drawable::Text(d) => d.id,
            Drawable::Badge(d) => d.id,
            Drawable::Highlight(d) => d.id,
            Drawable::Image(d) => d.id,
            Drawable::Blur(d) => d.id,
        }
    }

    /// Short name used in log output
    pub fn kind_name(&self) -> &'static str {
        match self {
            Drawable::Line(_) => "line",
            Drawable::Rect(_) => "rect",
            Drawable::Oval(_) => "oval",
            Drawable::Text(_) => "text",
            Drawable::Badge(_) => "badge",
            Drawable::Highlight(_) => "highlight",
            Drawable::Image(_) => "image",
            Drawable::Blur(_) => "blur",
        }
    }

    /// Check if this is a redaction drawable (composited in the second pass)
    pub fn is_redaction(&self) -> bool {
        matches!(self, Drawable::Blur(_))
    }

    /// Unrotated frame of rect-like drawables; `None` for lines
    pub fn frame(&self) -> Option<Rect> {
        match self {
            Drawable::Line(_) => None,
            Drawable::Rect(d) | Drawable::Oval(d) => Some(d.frame),
            Drawable::Text(d) => Some(d.frame),
            Drawable::Badge(d) => Some(d.frame),
            Drawable::Highlight(d) => Some(d.frame),
            Drawable::Image(d) => Some(d.frame),
            Drawable::Blur(d) => Some(d.frame),
        }
    }

    fn frame_mut(&mut self) -> Option<&mut Rect> {
        match self {
            Drawable::Line(_) => None,
            Drawable::Rect(d) | Drawable::Oval(d) => Some(&mut d.frame),
            Drawable::Text(d) => Some(&mut d.frame),
            Drawable::Badge(d) => Some(&mut d.frame),
            Drawable::Highlight(d) => Some(&mut d.frame),
            Drawable::Image(d) => Some(&mut d.frame),
            Drawable::Blur(d) => Some(&mut d.frame),
        }
    }

    /// Rotation in radians about the frame center; always 0 for lines
    pub fn rotation(&self) -> f32 {
        match self {
            Drawable::Line(_) => 0.0,
            Drawable::Rect(d) | Drawable::Oval(d) => d.rotation,
            Drawable::Text(d) => d.rotation,
            Drawable::Badge(d) => d.rotation,
            Drawable::Highlight(d) => d.rotation,
            Drawable::Image(d) => d.rotation,
            Drawable::Blur(d) => d.rotation,
        }
    }

    pub fn set_rotation(&mut self, angle: f32) {
        match self {
            Drawable::Line(_) => {}
            Drawable::Rect(d) | Drawable::Oval(d) => d.rotation = angle,
            Drawable::Text(d) => d.rotation = angle,
            Drawable::Badge(d) => d.rotation = angle,
            Drawable::Highlight(d) => d.rotation = angle,
            Drawable::Image(d) => d.rotation = angle,
            Drawable::Blur(d) => d.rotation = angle,
        }
    }

    /// Replace the frame of a rect-like drawable; lines are unchanged
    pub fn set_frame(&mut self, frame: Rect) {
        if let Some(f) = self.frame_mut() {
            *f = frame;
        }
    }

    /// Whether rotation applies to this drawable and is non-zero
    pub fn is_rotated(&self) -> bool {
        self.rotation() != 0.0
    }

    /// Own bounds: endpoint span for lines, unrotated frame otherwise
    pub fn bounds(&self) -> Rect {
        match self {
            Drawable::Line(d) => Rect::from_points(d.start, d.end),
            _ => self.frame().unwrap_or_default(),
        }
    }

    /// Visual extent used for bounds checks: rotated AABB for rect-likes
    pub fn visual_bounds(&self) -> Rect {
        match self {
            Drawable::Line(d) => Rect::from_points(d.start, d.end),
            _ => self.bounds().rotated_aabb(self.rotation()),
        }
    }

    /// Check if `p` lies on the drawable's visual shape
    pub fn hit_test(&self, p: Point) -> bool {
        match self {
            Drawable::Line(d) => {
                let reach = d.stroke.width * 0.5 + HIT_TOLERANCE;
                distance_to_segment(p, d.start, d.end) <= reach
            }
            Drawable::Rect(d) => {
                let local = p.rotated_about(d.frame.center(), -d.rotation);
                let reach = d.stroke.width * 0.5 + HIT_TOLERANCE;
                let outer = d.frame.inset(-reach);
                if !outer.contains(local) {
                    return false;
                }
                d.fill.is_some() || !d.frame.inset(reach).contains(local)
            }
            Drawable::Oval(d) => {
                let center = d.frame.center();
                let local = p.rotated_about(center, -d.rotation);
                let reach = d.stroke.width * 0.5 + HIT_TOLERANCE;
                let (rx, ry) = (d.frame.width * 0.5, d.frame.height * 0.5);
                let inside = |rx: f32, ry: f32| {
                    if rx <= 0.0 || ry <= 0.0 {
                        return false;
                    }
                    let nx = (local.x - center.x) / rx;
                    let ny = (local.y - center.y) / ry;
                    nx * nx + ny * ny <= 1.0
                };
                if !inside(rx + reach, ry + reach) {
                    return false;
                }
                d.fill.is_some() || !inside(rx - reach, ry - reach)
            }
            Drawable::Badge(d) => {
                let radius = d.frame.width.min(d.frame.height) * 0.5;
                p.distance(d.frame.center()) <= radius
            }
            Drawable::Text(_) | Drawable::Highlight(_) | Drawable::Image(_) | Drawable::Blur(_) => {
                let frame = self.bounds();
                frame.contains(p.rotated_about(frame.center(), -self.rotation()))
            }
        }
    }

    /// Control points in author space
    pub fn handle_points(&self) -> Vec<(Handle, Point)> {
        match self {
            Drawable::Line(d) => vec![(Handle::LineStart, d.start), (Handle::LineEnd, d.end)],
            _ => {
                let frame = self.bounds();
                let angle = self.rotation();
                let center = frame.center();
                let corners = frame.rotated_corners(angle);
                let grip = Point::new(
                    frame.max_x() + ROTATE_HANDLE_OFFSET,
                    frame.min_y() - ROTATE_HANDLE_OFFSET,
                )
                .rotated_about(center, angle);
                let mut points: Vec<(Handle, Point)> = Handle::CORNERS
                    .iter()
                    .zip(corners)
                    .map(|(h, p)| (*h, p))
                    .collect();
                points.push((Handle::Rotate, grip));
                points
            }
        }
    }

    /// Handle whose control point lies within [`HANDLE_RADIUS`] of `p`
    ///
    /// When several qualify the nearest wins.
    pub fn handle_hit_test(&self, p: Point) -> Handle {
        self.handle_points()
            .into_iter()
            .map(|(handle, point)| (handle, point.distance(p)))
            .filter(|(_, distance)| *distance <= HANDLE_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(handle, _)| handle)
            .unwrap_or(Handle::None)
    }

    /// Pure translation, unclamped
    pub fn moved(&self, by: Vector) -> Drawable {
        let mut moved = self.clone();
        match &mut moved {
            Drawable::Line(d) => {
                d.start = d.start + by;
                d.end = d.end + by;
            }
            other => {
                if let Some(frame) = other.frame_mut() {
                    *frame = frame.translated(by);
                }
            }
        }
        moved
    }

    /// Geometry with `handle` dragged to `to`, anchored at the opposite handle
    ///
    /// For rotated shapes the anchor stays fixed in author space. The result
    /// is unclamped and may be degenerate; callers bound it.
    pub fn resizing(&self, handle: Handle, to: Point) -> Drawable {
        let mut resized = self.clone();
        match &mut resized {
            Drawable::Line(d) => match handle {
                Handle::LineStart => d.start = to,
                Handle::LineEnd => d.end = to,
                _ => {}
            },
            Drawable::Badge(d) => {
                d.frame = resize_frame(d.frame, d.rotation, handle, to, true);
            }
            Drawable::Text(d) => {
                let old_height = d.frame.height;
                d.frame = resize_frame(d.frame, d.rotation, handle, to, false);
                if old_height > 0.0 && handle.is_corner() {
                    d.font_size = (d.font_size * d.frame.height / old_height).max(MIN_FONT_SIZE);
                }
            }
            other => {
                let angle = other.rotation();
                if let Some(frame) = other.frame_mut() {
                    *frame = resize_frame(*frame, angle, handle, to, false);
                }
            }
        }
        resized
    }

    /// Range of translations keeping the drawable's visual bounds on the canvas
    pub fn translation_limits(&self, canvas: Size) -> DeltaLimits {
        DeltaLimits::for_bounds(&self.visual_bounds(), canvas)
    }

    /// Bring the drawable back onto the canvas
    ///
    /// Unrotated frames are trimmed/translated with the minimum size rule;
    /// rotated frames and lines are only translated.
    pub fn clamped(&self, canvas: Size) -> Drawable {
        let mut clamped = self.clone();
        match &mut clamped {
            Drawable::Line(d) => {
                let (start, end) = transform::clamp_segment(d.start, d.end, canvas);
                d.start = start;
                d.end = end;
            }
            other => {
                let angle = other.rotation();
                let is_badge = matches!(other, Drawable::Badge(_));
                if let Some(frame) = other.frame_mut() {
                    *frame = if angle == 0.0 {
                        let mut r = transform::clamp_rect(*frame, canvas);
                        if is_badge && r.width != r.height {
                            let side = r.width.min(r.height);
                            r = transform::clamp_rect(Rect::centered(r.center(), Size::new(side, side)), canvas);
                        }
                        r
                    } else {
                        let mut r = *frame;
                        r.width = r.width.max(transform::MIN_RECT_SIZE);
                        r.height = r.height.max(transform::MIN_RECT_SIZE);
                        transform::clamp_rotated_rect(r, angle, canvas)
                    };
                }
            }
        }
        clamped
    }
}

/// Resize a frame by moving one corner, keeping the opposite corner fixed
fn resize_frame(frame: Rect, rotation: f32, handle: Handle, to: Point, square: bool) -> Rect {
    let (Some(_), Some(anchor_index)) = (handle.corner_index(), handle.opposite().corner_index())
    else {
        return frame;
    };
    let anchor = frame.corners()[anchor_index].rotated_about(frame.center(), rotation);
    let mut diagonal = (to - anchor).rotated(-rotation);
    if square {
        let side = diagonal.dx.abs().max(diagonal.dy.abs());
        diagonal = Vector::new(side * diagonal.dx.signum(), side * diagonal.dy.signum());
    }
    let center = anchor + (diagonal * 0.5).rotated(rotation);
    Rect::centered(center, Size::new(diagonal.dx.abs(), diagonal.dy.abs()))
}

/// Snap a line endpoint to the horizontal, vertical or 45° axis through `anchor`
///
/// The dominant component of the drag is kept so the snapped endpoint sits
/// exactly on the chosen axis.
pub fn snap_line_endpoint(anchor: Point, raw: Point) -> Point {
    let dx = raw.x - anchor.x;
    let dy = raw.y - anchor.y;
    if dx == 0.0 && dy == 0.0 {
        return raw;
    }
    let ratio = if dx == 0.0 {
        f32::INFINITY
    } else {
        dy.abs() / dx.abs()
    };
    if ratio < SNAP_HORIZONTAL_RATIO {
        Point::new(raw.x, anchor.y)
    } else if ratio > SNAP_VERTICAL_RATIO {
        Point::new(anchor.x, raw.y)
    } else {
        let magnitude = dx.abs().max(dy.abs());
        Point::new(
            anchor.x + magnitude * dx.signum(),
            anchor.y + magnitude * dy.signum(),
        )
    }
}

/// Constrain `current` so the rect it spans with `start` is square
pub fn constrain_square_point(start: Point, current: Point) -> Point {
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    let side = dx.abs().max(dy.abs());
    Point::new(start.x + side * dx.signum(), start.y + side * dy.signum())
}

/// Pull `end` onto the canvas along the direction from `anchor`
///
/// Shortens the segment instead of clamping each axis on its own, so a
/// snapped or squared direction survives the canvas edge.
pub fn clamp_along(anchor: Point, end: Point, canvas: Size) -> Point {
    let anchor = transform::clamp_point(anchor, canvas);
    let d = end - anchor;
    let mut t = 1.0_f32;
    for (delta, origin, bound) in [(d.dx, anchor.x, canvas.width), (d.dy, anchor.y, canvas.height)] {
        if delta > 0.0 && origin + delta > bound {
            t = t.min((bound - origin) / delta);
        } else if delta < 0.0 && origin + delta < 0.0 {
            t = t.min(-origin / delta);
        }
    }
    transform::clamp_point(anchor + d * t, canvas)
}

/// Union of the visual bounds of several drawables
pub fn union_bounds<'a>(drawables: impl IntoIterator<Item = &'a Drawable>) -> Option<Rect> {
    let corners: Vec<Point> = drawables
        .into_iter()
        .flat_map(|d| {
            let b = d.visual_bounds();
            [Point::new(b.min_x(), b.min_y()), Point::new(b.max_x(), b.max_y())]
        })
        .collect();
    bounding_box(&corners)
}
