//! Pointer gesture handlers
//!
//! Turns a stream of down/drag/up events into drawable creation and
//! manipulation. Every gesture pushes at most one undo checkpoint, taken on
//! its first real mutation, so an abandoned gesture leaves no trace.

use super::group_move::group_delta;
use super::hit_test::{PointerTarget, objects_in_marquee, resolve_on_selected, resolve_pointer_down};
use super::rotation::{RotationSnap, target_angle};
use crate::config::Tool;
use crate::domain::{
    BadgeDrawable, BlurDrawable, Drawable, DrawableId, Handle, HighlightDrawable, LineDrawable,
    Point, Rect, Selection, ShapeDrawable, Size, TextDrawable, clamp_along,
    constrain_square_point, snap_line_endpoint, wrap_angle,
};
use crate::render::geometry::defaults;
use crate::render::text;
use crate::session::messages::{PointerEvent, PointerPhase, ToolContext, Viewport};
use crate::session::state::EditorSession;
use crate::transform::{self, MIN_RECT_SIZE};

/// Drag distances, in author units, before a gesture starts mutating
pub mod threshold {
    pub const CREATE: f32 = 5.0;
    pub const MOVE: f32 = 3.0;
    pub const MARQUEE: f32 = 3.0;
    pub const RESIZE: f32 = 0.5;
    pub const ROTATE: f32 = 0.5;
}

/// Gesture in progress
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Drawing a new drawable; `id` is set once it exists
    Creating { tool: Tool, id: Option<DrawableId> },
    Moving { original: Drawable },
    Resizing { handle: Handle, original: Drawable },
    Rotating {
        original: Drawable,
        center: Point,
        start_angle: f32,
    },
    GroupMoving { originals: Vec<Drawable> },
    Marquee { current: Point },
    /// Text object open for editing; lasts until the next pointer-down
    EditingText { id: DrawableId },
}

impl Gesture {
    fn threshold(&self) -> f32 {
        match self {
            Gesture::Creating { .. } => threshold::CREATE,
            Gesture::Moving { .. } | Gesture::GroupMoving { .. } => threshold::MOVE,
            Gesture::Marquee { .. } => threshold::MARQUEE,
            Gesture::Resizing { .. } => threshold::RESIZE,
            Gesture::Rotating { .. } => threshold::ROTATE,
            Gesture::Idle | Gesture::EditingText { .. } => f32::INFINITY,
        }
    }
}

/// Gesture plus the bookkeeping shared by all gestures
#[derive(Debug, Clone, Default)]
pub struct GestureState {
    pub gesture: Gesture,
    /// Author-space pointer-down position
    start: Point,
    past_threshold: bool,
    /// Whether this gesture already pushed its undo checkpoint
    pushed: bool,
}

impl GestureState {
    pub fn new(gesture: Gesture, start: Point) -> Self {
        Self {
            gesture,
            start,
            past_threshold: false,
            pushed: false,
        }
    }

    /// Marquee rectangle while one is being dragged
    pub fn marquee(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Marquee { current } if self.past_threshold => {
                Some(Rect::from_points(self.start, current))
            }
            _ => None,
        }
    }

    pub fn editing_text(&self) -> Option<DrawableId> {
        match self.gesture {
            Gesture::EditingText { id } => Some(id),
            _ => None,
        }
    }

    /// Push the gesture's checkpoint if it has not been pushed yet
    pub(crate) fn checkpoint(&mut self, session: &mut EditorSession) {
        if !self.pushed {
            session.push_snapshot();
            self.pushed = true;
        }
    }
}

/// Feed one pointer event to the session
///
/// Returns true when drawables or selection changed.
pub fn handle_pointer(
    session: &mut EditorSession,
    event: &PointerEvent,
    viewport: &Viewport,
    ctx: &ToolContext,
) -> bool {
    let p = viewport.to_author(event.position);
    match event.phase {
        PointerPhase::Down => pointer_down(session, p, event, ctx),
        PointerPhase::Drag => {
            let mut state = session.take_gesture();
            let changed = pointer_drag(session, &mut state, p, event, ctx);
            session.set_gesture(state);
            changed
        }
        PointerPhase::Up => {
            let mut state = session.take_gesture();
            let changed = pointer_drag(session, &mut state, p, event, ctx);
            changed | pointer_up(session, state, p, ctx)
        }
    }
}

// ============================================================================
// Pointer down
// ============================================================================

fn pointer_down(session: &mut EditorSession, p: Point, event: &PointerEvent, ctx: &ToolContext) -> bool {
    if session.gesture().editing_text().is_some() {
        session.end_text_edit();
    }
    session.set_gesture(GestureState::default());

    if event.is_double_click()
        && let Some(id) = text_at(session.objects(), p)
    {
        return session.begin_text_edit(id);
    }

    let target = if ctx.tool.creates() {
        resolve_on_selected(session.objects(), session.selection(), p).or_else(|| {
            // The text tool grabs existing text instead of stacking a new one on it
            let id = text_at(session.objects(), p).filter(|_| ctx.tool == Tool::Text)?;
            Some(PointerTarget::Object {
                id,
                handle: Handle::None,
            })
        })
    } else {
        Some(resolve_pointer_down(session.objects(), session.selection(), p))
    };

    let gesture = match target {
        Some(PointerTarget::GroupMove) => {
            let ids = session.selection().ids();
            let originals = session
                .objects()
                .iter()
                .filter(|d| ids.contains(&d.id()))
                .cloned()
                .collect();
            Gesture::GroupMoving { originals }
        }
        Some(PointerTarget::Object { id, handle }) => {
            let Some(original) = session.find(id).cloned() else {
                return false;
            };
            session.set_selection(Selection::Single { id, handle });
            match handle {
                Handle::None => Gesture::Moving { original },
                Handle::Rotate => {
                    let center = original.bounds().center();
                    Gesture::Rotating {
                        start_angle: p.angle_from(center),
                        center,
                        original,
                    }
                }
                _ => Gesture::Resizing { handle, original },
            }
        }
        Some(PointerTarget::Marquee) => Gesture::Marquee { current: p },
        None => {
            session.set_selection(Selection::None);
            Gesture::Creating {
                tool: ctx.tool,
                id: None,
            }
        }
    };
    log::trace!("Pointer down at {:?}: {:?}", p, gesture);
    session.set_gesture(GestureState::new(gesture, p));
    true
}

/// Topmost text drawable under `p`
fn text_at(objects: &[Drawable], p: Point) -> Option<DrawableId> {
    objects
        .iter()
        .rev()
        .find(|d| matches!(d, Drawable::Text(_)) && d.hit_test(p))
        .map(Drawable::id)
}

// ============================================================================
// Pointer drag
// ============================================================================

fn pointer_drag(
    session: &mut EditorSession,
    state: &mut GestureState,
    p: Point,
    event: &PointerEvent,
    ctx: &ToolContext,
) -> bool {
    if !state.past_threshold {
        if p.distance(state.start) < state.gesture.threshold() {
            return false;
        }
        state.past_threshold = true;
    }

    let canvas = session.canvas_size();
    let start = state.start;
    match state.gesture.clone() {
        Gesture::Idle | Gesture::EditingText { .. } => false,
        Gesture::Creating { tool, id } => {
            let id = id.unwrap_or_else(|| session.peek_next_id());
            let number = match session.find(id) {
                Some(Drawable::Badge(badge)) => badge.number,
                _ => session.next_badge_number(),
            };
            let Some(drawable) = drawable_for_drag(tool, id, start, p, event, ctx, number, canvas)
            else {
                return false;
            };
            state.checkpoint(session);
            if session.find(id).is_some() {
                session.replace(drawable);
            } else {
                session.insert(drawable);
                state.gesture = Gesture::Creating { tool, id: Some(id) };
            }
            true
        }
        Gesture::Moving { original } => {
            let delta = original.translation_limits(canvas).apply(p - start);
            state.checkpoint(session);
            session.replace(original.moved(delta));
            true
        }
        Gesture::Resizing { handle, original } => {
            let Some(resized) = resize_within(&original, handle, p, event, canvas) else {
                log::trace!("Rejected resize of rotated {} {}", original.kind_name(), original.id());
                return false;
            };
            state.checkpoint(session);
            session.replace(resized);
            true
        }
        Gesture::Rotating {
            original,
            center,
            start_angle,
        } => {
            let snap = RotationSnap::from_modifiers(&event.modifiers);
            let angle = snap.apply(target_angle(original.rotation(), start_angle, p.angle_from(center)));
            let mut rotated = original.clone();
            rotated.set_rotation(wrap_angle(angle));
            let rotated = rotated.clamped(canvas);
            if !transform::rect_in_bounds(&rotated.visual_bounds(), canvas) {
                log::trace!("Rejected rotation of {} {} past the canvas", rotated.kind_name(), rotated.id());
                return false;
            }
            state.checkpoint(session);
            session.replace(rotated);
            true
        }
        Gesture::GroupMoving { originals } => {
            let delta = group_delta(originals.iter(), p - start, canvas);
            state.checkpoint(session);
            for original in &originals {
                session.replace(original.moved(delta));
            }
            true
        }
        Gesture::Marquee { .. } => {
            state.gesture = Gesture::Marquee { current: p };
            false
        }
    }
}

/// Resized geometry, or `None` when a rotated drawable would leave the canvas
fn resize_within(
    original: &Drawable,
    handle: Handle,
    p: Point,
    event: &PointerEvent,
    canvas: Size,
) -> Option<Drawable> {
    if let Drawable::Line(line) = original {
        let anchor = if handle == Handle::LineStart {
            line.end
        } else {
            line.start
        };
        let to = if event.modifiers.shift {
            clamp_along(anchor, snap_line_endpoint(anchor, p), canvas)
        } else {
            transform::clamp_point(p, canvas)
        };
        return Some(original.resizing(handle, to));
    }

    if !original.is_rotated() {
        let to = transform::clamp_point(p, canvas);
        return Some(original.resizing(handle, to).clamped(canvas));
    }

    let resized = original.resizing(handle, p);
    let frame = resized.bounds();
    let fits = frame.width >= MIN_RECT_SIZE
        && frame.height >= MIN_RECT_SIZE
        && transform::rotated_rect_in_bounds(&frame, resized.rotation(), canvas);
    fits.then_some(resized)
}

#[allow(clippy::too_many_arguments)]
fn drawable_for_drag(
    tool: Tool,
    id: DrawableId,
    start: Point,
    current: Point,
    event: &PointerEvent,
    ctx: &ToolContext,
    badge_number: u32,
    canvas: Size,
) -> Option<Drawable> {
    let shift = event.modifiers.shift;
    let start = transform::clamp_point(start, canvas);
    let end = match tool {
        Tool::Line if shift => clamp_along(start, snap_line_endpoint(start, current), canvas),
        Tool::Line => transform::clamp_point(current, canvas),
        Tool::Badge => clamp_along(start, constrain_square_point(start, current), canvas),
        _ if shift => clamp_along(start, constrain_square_point(start, current), canvas),
        _ => transform::clamp_point(current, canvas),
    };

    let drawable = match tool {
        Tool::Select => return None,
        // Text is placed on release, sized by its content
        Tool::Text => return None,
        Tool::Line => Drawable::Line(LineDrawable {
            id,
            start,
            end,
            stroke: ctx.stroke,
            arrow_head: ctx.arrow_head,
        }),
        _ => framed_drawable(tool, id, Rect::from_points(start, end), ctx, badge_number)?,
    };
    Some(drawable.clamped(canvas))
}

/// Rect-like drawable of the tool's kind occupying `frame`
fn framed_drawable(
    tool: Tool,
    id: DrawableId,
    frame: Rect,
    ctx: &ToolContext,
    badge_number: u32,
) -> Option<Drawable> {
    let shape = || ShapeDrawable {
        id,
        frame,
        rotation: 0.0,
        stroke: ctx.stroke,
        fill: ctx.fill,
    };
    Some(match tool {
        Tool::Select | Tool::Line => return None,
        Tool::Rectangle => Drawable::Rect(shape()),
        Tool::Oval => Drawable::Oval(shape()),
        Tool::Text => Drawable::Text(TextDrawable {
            id,
            frame,
            rotation: 0.0,
            content: ctx.default_text.clone(),
            font_size: ctx.font_size,
            color: ctx.text_color,
            background: ctx.text_background,
        }),
        Tool::Badge => Drawable::Badge(BadgeDrawable {
            id,
            frame,
            rotation: 0.0,
            number: badge_number,
            color: ctx.badge_color,
            text_color: ctx.badge_text_color,
        }),
        Tool::Highlight => Drawable::Highlight(HighlightDrawable {
            id,
            frame,
            rotation: 0.0,
            color: ctx.highlight_color,
        }),
        Tool::Blur => Drawable::Blur(BlurDrawable {
            id,
            frame,
            rotation: 0.0,
            block_size: ctx.blur_block_size,
        }),
    })
}

// ============================================================================
// Pointer up
// ============================================================================

fn pointer_up(session: &mut EditorSession, mut state: GestureState, p: Point, ctx: &ToolContext) -> bool {
    let changed = match state.gesture {
        Gesture::Creating { id: Some(id), .. } => {
            session.set_selection(Selection::Single {
                id,
                handle: Handle::None,
            });
            true
        }
        Gesture::Creating { tool, id: None } => match click_drawable(session, tool, state.start, ctx) {
            Some(drawable) => {
                state.checkpoint(session);
                let id = session.insert(drawable);
                session.set_selection(Selection::Single {
                    id,
                    handle: Handle::None,
                });
                true
            }
            None => false,
        },
        Gesture::Marquee { current } => {
            let selection = if state.past_threshold {
                let marquee = Rect::from_points(state.start, current);
                Selection::from_ids(objects_in_marquee(session.objects(), marquee))
            } else {
                Selection::None
            };
            log::debug!("Marquee at {:?} selected {:?}", p, selection);
            session.set_selection(selection);
            true
        }
        Gesture::Moving { .. } | Gesture::Resizing { .. } | Gesture::Rotating { .. } => {
            if let Some(id) = session.selection().single() {
                session.set_selection(Selection::Single {
                    id,
                    handle: Handle::None,
                });
            }
            false
        }
        Gesture::GroupMoving { .. } | Gesture::Idle => false,
        Gesture::EditingText { .. } => {
            session.set_gesture(state);
            return false;
        }
    };
    session.set_gesture(GestureState::default());
    changed
}

/// Drawable created by a click without drag, centered on `at`
fn click_drawable(session: &EditorSession, tool: Tool, at: Point, ctx: &ToolContext) -> Option<Drawable> {
    let size = match tool {
        Tool::Select | Tool::Line => return None,
        Tool::Rectangle | Tool::Oval | Tool::Highlight => defaults::SHAPE,
        Tool::Badge => defaults::BADGE,
        Tool::Blur => defaults::BLUR,
        Tool::Text => text::measure(&ctx.default_text, ctx.font_size, session.font()),
    };
    let id = session.peek_next_id();
    let drawable = framed_drawable(
        tool,
        id,
        Rect::centered(at, size),
        ctx,
        session.next_badge_number(),
    )?;
    Some(drawable.clamped(session.canvas_size()))
}

/// Create a drawable spanning `from`..`to` exactly, without drag thresholds
///
/// Pushes one checkpoint and selects the result. Text has no spanning form
/// and yields `None`, as does the select tool.
pub fn place(session: &mut EditorSession, from: Point, to: Point, ctx: &ToolContext) -> Option<DrawableId> {
    let canvas = session.canvas_size();
    let id = session.peek_next_id();
    let start = transform::clamp_point(from, canvas);
    let end = transform::clamp_point(to, canvas);
    let drawable = match ctx.tool {
        Tool::Select | Tool::Text => return None,
        Tool::Line => Drawable::Line(LineDrawable {
            id,
            start,
            end,
            stroke: ctx.stroke,
            arrow_head: ctx.arrow_head,
        }),
        tool => framed_drawable(
            tool,
            id,
            Rect::from_points(start, end),
            ctx,
            session.next_badge_number(),
        )?,
    };
    Some(commit_placed(session, drawable.clamped(canvas)))
}

/// Create the tool's click-to-create drawable centered on `at`
///
/// Unlike a replayed click, this never grabs an object already under `at`.
pub fn place_at(session: &mut EditorSession, at: Point, ctx: &ToolContext) -> Option<DrawableId> {
    let at = transform::clamp_point(at, session.canvas_size());
    let drawable = click_drawable(session, ctx.tool, at, ctx)?;
    Some(commit_placed(session, drawable))
}

fn commit_placed(session: &mut EditorSession, drawable: Drawable) -> DrawableId {
    session.push_snapshot();
    let id = session.insert(drawable);
    session.set_selection(Selection::Single {
        id,
        handle: Handle::None,
    });
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BaseImage, Vector};
    use crate::session::messages::Modifiers;
    use image::RgbaImage;
    use std::f32::consts::PI;

    fn session() -> EditorSession {
        EditorSession::new(BaseImage::new(RgbaImage::new(200, 100)))
    }

    fn viewport(session: &EditorSession) -> Viewport {
        Viewport::identity(session.canvas_size())
    }

    fn gesture(session: &mut EditorSession, ctx: &ToolContext, points: &[(f32, f32)]) {
        let vp = viewport(session);
        let last = points.len() - 1;
        for (i, (x, y)) in points.iter().enumerate() {
            let event = match i {
                0 => PointerEvent::down(*x, *y),
                i if i == last => PointerEvent::up(*x, *y),
                _ => PointerEvent::drag(*x, *y),
            };
            handle_pointer(session, &event, &vp, ctx);
        }
    }

    fn ctx(tool: Tool) -> ToolContext {
        ToolContext::default().with_tool(tool)
    }

    #[test]
    fn test_drag_creates_rect_with_one_checkpoint() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Rectangle), &[(10.0, 10.0), (30.0, 20.0), (60.0, 40.0), (60.0, 40.0)]);
        assert_eq!(s.objects().len(), 1);
        assert_eq!(s.objects()[0].bounds(), Rect::new(10.0, 10.0, 50.0, 30.0));
        assert_eq!(s.history().undo_len(), 1);
        assert_eq!(s.selection().single(), Some(s.objects()[0].id()));
    }

    #[test]
    fn test_click_creates_default_sizes() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Oval), &[(100.0, 50.0), (100.0, 50.0)]);
        assert_eq!(s.objects()[0].bounds(), Rect::new(80.0, 30.0, 40.0, 40.0));

        let mut s = session();
        gesture(&mut s, &ctx(Tool::Badge), &[(100.0, 50.0), (101.0, 50.0)]);
        assert_eq!(s.objects()[0].bounds().size(), defaults::BADGE);

        let mut s = session();
        gesture(&mut s, &ctx(Tool::Blur), &[(5.0, 5.0), (5.0, 5.0)]);
        // Clamped back onto the canvas
        assert_eq!(s.objects()[0].bounds(), Rect::new(0.0, 0.0, 80.0, 80.0));
    }

    #[test]
    fn test_line_click_creates_nothing() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Line), &[(10.0, 10.0), (12.0, 11.0)]);
        assert!(s.objects().is_empty());
        assert_eq!(s.history().undo_len(), 0);
    }

    #[test]
    fn test_line_shift_snaps_to_axis() {
        let mut s = session();
        let vp = viewport(&s);
        let c = ctx(Tool::Line);
        handle_pointer(&mut s, &PointerEvent::down(10.0, 10.0), &vp, &c);
        handle_pointer(
            &mut s,
            &PointerEvent::up(60.0, 14.0).with_modifiers(Modifiers::shift()),
            &vp,
            &c,
        );
        let Drawable::Line(line) = &s.objects()[0] else {
            panic!("expected a line");
        };
        assert_eq!(line.end, Point::new(60.0, 10.0));
    }

    #[test]
    fn test_small_move_is_abandoned_without_checkpoint() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Rectangle), &[(10.0, 10.0), (60.0, 40.0)]);
        let before = s.history().undo_len();
        gesture(&mut s, &ctx(Tool::Select), &[(35.0, 10.0), (36.0, 11.0)]);
        assert_eq!(s.history().undo_len(), before);
        assert_eq!(s.objects()[0].bounds(), Rect::new(10.0, 10.0, 50.0, 30.0));
    }

    #[test]
    fn test_move_clamps_by_translation() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Rectangle), &[(10.0, 10.0), (60.0, 40.0)]);
        gesture(&mut s, &ctx(Tool::Select), &[(35.0, 10.0), (200.0, 10.0), (400.0, 10.0)]);
        assert_eq!(s.objects()[0].bounds(), Rect::new(150.0, 10.0, 50.0, 30.0));
        assert_eq!(s.history().undo_len(), 2);
    }

    #[test]
    fn test_resize_corner_keeps_anchor() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Highlight), &[(10.0, 10.0), (60.0, 40.0)]);
        gesture(&mut s, &ctx(Tool::Select), &[(60.0, 40.0), (80.0, 60.0), (300.0, 300.0)]);
        assert_eq!(s.objects()[0].bounds(), Rect::new(10.0, 10.0, 190.0, 90.0));
    }

    #[test]
    fn test_rotated_resize_out_of_bounds_is_rejected() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Highlight), &[(80.0, 30.0), (120.0, 70.0)]);
        let id = s.objects()[0].id();
        let mut rotated = s.objects()[0].clone();
        rotated.set_rotation(PI / 4.0);
        s.replace(rotated.clone());

        let grip = rotated
            .handle_points()
            .into_iter()
            .find(|(h, _)| *h == Handle::BottomRight)
            .map(|(_, p)| p)
            .unwrap();
        gesture(
            &mut s,
            &ctx(Tool::Select),
            &[(grip.x, grip.y), (grip.x + 60.0, grip.y + 60.0), (grip.x + 60.0, grip.y + 60.0)],
        );
        assert_eq!(s.find(id), Some(&rotated));
    }

    #[test]
    fn test_rotate_handle_snaps_with_shift() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Highlight), &[(80.0, 30.0), (120.0, 70.0)]);
        let grip = s.objects()[0]
            .handle_points()
            .into_iter()
            .find(|(h, _)| *h == Handle::Rotate)
            .map(|(_, p)| p)
            .unwrap();
        let center = s.objects()[0].bounds().center();
        let target = grip.rotated_about(center, 20f32.to_radians());

        let vp = viewport(&s);
        let c = ctx(Tool::Select);
        handle_pointer(&mut s, &PointerEvent::down(grip.x, grip.y), &vp, &c);
        handle_pointer(
            &mut s,
            &PointerEvent::up(target.x, target.y).with_modifiers(Modifiers::shift()),
            &vp,
            &c,
        );
        assert!((s.objects()[0].rotation() - 15f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_marquee_then_group_move() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Highlight), &[(10.0, 10.0), (30.0, 30.0)]);
        gesture(&mut s, &ctx(Tool::Highlight), &[(150.0, 10.0), (200.0, 30.0)]);
        gesture(&mut s, &ctx(Tool::Select), &[(0.0, 0.0), (100.0, 50.0), (199.0, 50.0)]);
        assert!(matches!(s.selection(), Selection::Multiple(ids) if ids.len() == 2));

        gesture(&mut s, &ctx(Tool::Select), &[(100.0, 20.0), (120.0, 40.0), (130.0, 50.0)]);
        let bounds: Vec<Rect> = s.objects().iter().map(Drawable::bounds).collect();
        // Second highlight is flush right: x is pinned, y moves by the full delta
        assert_eq!(bounds[0], Rect::new(10.0, 40.0, 20.0, 20.0));
        assert_eq!(bounds[1], Rect::new(150.0, 40.0, 50.0, 20.0));
    }

    #[test]
    fn test_empty_marquee_clears_selection() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Highlight), &[(10.0, 10.0), (30.0, 30.0)]);
        gesture(&mut s, &ctx(Tool::Select), &[(100.0, 80.0), (101.0, 80.0)]);
        assert_eq!(s.selection(), &Selection::None);
    }

    #[test]
    fn test_creation_tool_adjusts_selected_object() {
        let mut s = session();
        let c = ctx(Tool::Rectangle);
        gesture(&mut s, &c, &[(10.0, 10.0), (60.0, 40.0)]);
        gesture(&mut s, &c, &[(35.0, 10.0), (45.0, 20.0)]);
        assert_eq!(s.objects().len(), 1);
        assert_eq!(
            s.objects()[0].bounds(),
            Rect::new(10.0, 10.0, 50.0, 30.0).translated(Vector::new(10.0, 10.0))
        );
    }

    #[test]
    fn test_double_click_edits_text() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Text), &[(50.0, 50.0), (50.0, 50.0)]);
        let vp = viewport(&s);
        let c = ctx(Tool::Select);
        handle_pointer(&mut s, &PointerEvent::down(50.0, 50.0).with_click_count(2), &vp, &c);
        handle_pointer(&mut s, &PointerEvent::up(50.0, 50.0).with_click_count(2), &vp, &c);
        assert!(s.gesture().editing_text().is_some());
    }

    #[test]
    fn test_text_tool_double_click_edits_existing_text() {
        let mut s = session();
        let c = ctx(Tool::Text);
        gesture(&mut s, &c, &[(50.0, 50.0), (50.0, 50.0)]);
        let original = s.objects()[0].id();
        s.set_selection(Selection::None);
        let checkpoints = s.history().undo_len();

        let vp = viewport(&s);
        handle_pointer(&mut s, &PointerEvent::down(50.0, 50.0), &vp, &c);
        handle_pointer(&mut s, &PointerEvent::up(50.0, 50.0), &vp, &c);
        handle_pointer(&mut s, &PointerEvent::down(50.0, 50.0).with_click_count(2), &vp, &c);
        handle_pointer(&mut s, &PointerEvent::up(50.0, 50.0).with_click_count(2), &vp, &c);

        assert_eq!(s.objects().len(), 1);
        assert_eq!(s.history().undo_len(), checkpoints);
        assert_eq!(s.gesture().editing_text(), Some(original));
    }

    #[test]
    fn test_line_shift_snap_survives_canvas_edge() {
        let mut s = session();
        let vp = viewport(&s);
        let c = ctx(Tool::Line);
        handle_pointer(&mut s, &PointerEvent::down(170.0, 40.0), &vp, &c);
        handle_pointer(
            &mut s,
            &PointerEvent::up(210.0, 85.0).with_modifiers(Modifiers::shift()),
            &vp,
            &c,
        );
        let Drawable::Line(line) = &s.objects()[0] else {
            panic!("expected a line");
        };
        let (dx, dy) = (line.end.x - line.start.x, line.end.y - line.start.y);
        assert!((dx.abs() - dy.abs()).abs() < 1e-3, "{:?}", line.end);
        assert!(line.end.x <= 200.0 && line.end.y <= 100.0);
        assert!((line.end.x - 200.0).abs() < 1e-3 && (line.end.y - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_line_endpoint_resize_snap_survives_canvas_edge() {
        let mut s = session();
        let c = ctx(Tool::Line);
        gesture(&mut s, &c, &[(100.0, 50.0), (150.0, 50.0)]);
        let vp = viewport(&s);
        let select = ctx(Tool::Select);
        handle_pointer(&mut s, &PointerEvent::down(150.0, 50.0), &vp, &select);
        handle_pointer(
            &mut s,
            &PointerEvent::up(10.0, 120.0).with_modifiers(Modifiers::shift()),
            &vp,
            &select,
        );
        let Drawable::Line(line) = &s.objects()[0] else {
            panic!("expected a line");
        };
        assert_eq!(line.start, Point::new(100.0, 50.0));
        assert!((line.end.x - 50.0).abs() < 1e-3 && (line.end.y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_that_cannot_fit_keeps_last_angle() {
        let mut s = session();
        gesture(&mut s, &ctx(Tool::Highlight), &[(25.0, 45.0), (175.0, 55.0)]);
        let grip = s.objects()[0]
            .handle_points()
            .into_iter()
            .find(|(h, _)| *h == Handle::Rotate)
            .map(|(_, p)| p)
            .unwrap();
        let center = s.objects()[0].bounds().center();
        let small = grip.rotated_about(center, 5f32.to_radians());
        let quarter = grip.rotated_about(center, PI / 2.0);

        gesture(
            &mut s,
            &ctx(Tool::Select),
            &[(grip.x, grip.y), (small.x, small.y), (quarter.x, quarter.y)],
        );
        let rotated = &s.objects()[0];
        assert!(transform::rect_in_bounds(&rotated.visual_bounds(), s.canvas_size()));
        assert!((rotated.rotation() - 5f32.to_radians()).abs() < 1e-3);
    }

    #[test]
    fn test_place_keeps_small_frames() {
        let mut s = session();
        let id = place(&mut s, Point::new(10.0, 10.0), Point::new(13.0, 14.0), &ctx(Tool::Blur)).unwrap();
        assert_eq!(s.find(id).map(Drawable::bounds), Some(Rect::new(10.0, 10.0, 3.0, 4.0)));
        assert_eq!(s.selection().single(), Some(id));
        assert_eq!(s.history().undo_len(), 1);

        // Below the minimum size the frame grows to it rather than to a click default
        let id = place(&mut s, Point::new(50.0, 50.0), Point::new(50.5, 50.5), &ctx(Tool::Oval)).unwrap();
        assert_eq!(s.find(id).map(|d| d.bounds().size()), Some(Size::new(2.0, 2.0)));

        assert!(place(&mut s, Point::new(0.0, 0.0), Point::new(5.0, 5.0), &ctx(Tool::Text)).is_none());
        assert_eq!(s.objects().len(), 2);
    }

    #[test]
    fn test_place_at_stacks_overlapping_texts() {
        let mut s = session();
        let c = ctx(Tool::Text);
        let first = place_at(&mut s, Point::new(50.0, 50.0), &c).unwrap();
        let second = place_at(&mut s, Point::new(52.0, 50.0), &c).unwrap();
        assert_ne!(first, second);
        assert_eq!(s.objects().len(), 2);
        assert_eq!(s.history().undo_len(), 2);
        assert!(place_at(&mut s, Point::new(10.0, 10.0), &ctx(Tool::Line)).is_none());
    }

    #[test]
    fn test_badges_are_numbered_in_order() {
        let mut s = session();
        let c = ctx(Tool::Badge);
        gesture(&mut s, &c, &[(20.0, 20.0), (20.0, 20.0)]);
        s.set_selection(Selection::None);
        gesture(&mut s, &c, &[(120.0, 50.0), (120.0, 50.0)]);
        let numbers: Vec<u32> = s
            .objects()
            .iter()
            .filter_map(|d| match d {
                Drawable::Badge(b) => Some(b.number),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
