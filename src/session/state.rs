//! Editor session state
//!
//! The session owns the drawable list, selection, undo history and blur
//! preview cache for one base image. All mutation goes through its methods
//! on the control thread; background work receives an owned [`Snipshot`].

use std::sync::Arc;

use ab_glyph::FontArc;
use anyhow::Context;
use image::RgbaImage;

use super::history::{Snipshot, UndoManager};
use super::messages::{PointerEvent, ToolContext, Viewport};
use super::throttle::PointerThrottle;
use crate::annotations::handlers::{self, Gesture, GestureState};
use crate::config::{DisplayConfig, ImageEncoding};
use crate::domain::{
    BaseImage, Drawable, DrawableId, Handle, ImageDrawable, Point, Rect, Selection, Size,
};
use crate::error::RenderError;
use crate::export::{self, ClipboardSink, ExportSink};
use crate::render::{self, BlurCache};

/// Largest share of the canvas a pasted image may cover
const PASTE_MAX_FRACTION: f32 = 0.8;

pub struct EditorSession {
    base: Arc<BaseImage>,
    /// Author-space canvas, fixed for the life of the session
    canvas: Size,
    objects: Vec<Drawable>,
    selection: Selection,
    history: UndoManager,
    blur_cache: BlurCache,
    font: Option<FontArc>,
    next_id: DrawableId,
    gesture: GestureState,
    throttle: PointerThrottle,
}

impl EditorSession {
    pub fn new(base: BaseImage) -> Self {
        let canvas = base.logical_size();
        log::debug!(
            "New session: {}x{} pixels, canvas {:?}",
            base.width(),
            base.height(),
            canvas
        );
        Self {
            base: Arc::new(base),
            canvas,
            objects: Vec::new(),
            selection: Selection::None,
            history: UndoManager::default(),
            blur_cache: BlurCache::new(),
            font: None,
            next_id: 1,
            gesture: GestureState::default(),
            throttle: PointerThrottle::default(),
        }
    }

    pub fn with_font(mut self, font: Option<FontArc>) -> Self {
        self.font = font;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn base(&self) -> &Arc<BaseImage> {
        &self.base
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn objects(&self) -> &[Drawable] {
        &self.objects
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn font(&self) -> Option<&FontArc> {
        self.font.as_ref()
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn blur_cache(&self) -> &BlurCache {
        &self.blur_cache
    }

    pub fn find(&self, id: DrawableId) -> Option<&Drawable> {
        self.objects.iter().find(|d| d.id() == id)
    }

    /// Current marquee rectangle, for drawing feedback
    pub fn marquee(&self) -> Option<Rect> {
        self.gesture.marquee()
    }

    // ========================================================================
    // Mutation primitives used by gesture handlers
    // ========================================================================

    pub(crate) fn take_gesture(&mut self) -> GestureState {
        std::mem::take(&mut self.gesture)
    }

    pub(crate) fn set_gesture(&mut self, gesture: GestureState) {
        self.gesture = gesture;
    }

    pub(crate) fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Id the next inserted drawable will get
    pub(crate) fn peek_next_id(&self) -> DrawableId {
        self.next_id
    }

    pub(crate) fn next_badge_number(&self) -> u32 {
        self.objects
            .iter()
            .filter_map(|d| match d {
                Drawable::Badge(b) => Some(b.number),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Append a drawable on top of the others
    pub(crate) fn insert(&mut self, drawable: Drawable) -> DrawableId {
        let id = drawable.id();
        self.next_id = self.next_id.max(id + 1);
        log::debug!("Added {} {}", drawable.kind_name(), id);
        self.objects.push(drawable);
        id
    }

    /// Replace the drawable with the same id
    pub(crate) fn replace(&mut self, drawable: Drawable) {
        let id = drawable.id();
        let Some(slot) = self.objects.iter_mut().find(|d| d.id() == id) else {
            log::warn!("Tried to update missing drawable {}", id);
            return;
        };
        if drawable.is_redaction() && *slot != drawable {
            self.blur_cache.invalidate(id);
        }
        *slot = drawable;
    }

    fn remove(&mut self, id: DrawableId) {
        self.objects.retain(|d| d.id() != id);
        self.blur_cache.invalidate(id);
        self.selection.remove(id);
    }

    // ========================================================================
    // Pointer input
    // ========================================================================

    /// Feed a pointer event; returns true when drawables or selection changed
    ///
    /// Drag events are throttled; dropped events change nothing.
    pub fn handle_pointer(&mut self, event: PointerEvent, viewport: &Viewport, ctx: &ToolContext) -> bool {
        if !self.throttle.admit(&event) {
            return false;
        }
        handlers::handle_pointer(self, &event, viewport, ctx)
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Current state as an owned checkpoint
    pub fn snapshot(&self) -> Snipshot {
        Snipshot::new(self.base.clone(), self.objects.clone())
    }

    pub fn push_snapshot(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    fn restore(&mut self, snapshot: Snipshot) {
        // Patches are cut from the base image; stale geometry is caught on lookup
        if Arc::ptr_eq(&self.base, &snapshot.image) {
            self.blur_cache.retain_objects(&snapshot.objects);
        } else {
            self.blur_cache.clear();
        }
        self.base = snapshot.image;
        self.objects = snapshot.objects;
        self.selection = Selection::None;
        self.gesture = GestureState::default();
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Editing commands
    // ========================================================================

    pub fn delete_selection(&mut self) -> bool {
        let ids = self.selection.ids();
        if ids.is_empty() {
            return false;
        }
        self.push_snapshot();
        for id in ids {
            self.remove(id);
        }
        self.selection = Selection::None;
        true
    }

    /// Add a drawable of the context's tool spanning two author points
    pub fn place(&mut self, from: Point, to: Point, ctx: &ToolContext) -> Option<DrawableId> {
        handlers::place(self, from, to, ctx)
    }

    /// Add the context tool's click default centered on an author point
    pub fn place_at(&mut self, at: Point, ctx: &ToolContext) -> Option<DrawableId> {
        handlers::place_at(self, at, ctx)
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn select_all(&mut self) {
        self.selection = Selection::from_ids(self.objects.iter().map(Drawable::id).collect());
    }

    /// Add an image on top, centered and scaled down to fit the canvas
    pub fn paste_image(&mut self, pixels: RgbaImage) -> Option<DrawableId> {
        let (w, h) = pixels.dimensions();
        if w == 0 || h == 0 {
            log::warn!("Ignoring empty pasted image");
            return None;
        }
        let density = self.base.density();
        let natural = Size::new(w as f32 / density, h as f32 / density);
        let fit = (self.canvas.width * PASTE_MAX_FRACTION / natural.width)
            .min(self.canvas.height * PASTE_MAX_FRACTION / natural.height)
            .min(1.0);
        let size = Size::new(natural.width * fit, natural.height * fit);
        let center = Rect::new(0.0, 0.0, self.canvas.width, self.canvas.height).center();

        self.push_snapshot();
        let drawable = Drawable::Image(ImageDrawable {
            id: self.next_id,
            frame: Rect::centered(center, size),
            rotation: 0.0,
            pixels: Arc::new(pixels),
        })
        .clamped(self.canvas);
        let id = self.insert(drawable);
        self.selection = Selection::Single {
            id,
            handle: Handle::None,
        };
        Some(id)
    }

    /// Start over with a new base image (new capture or opened file)
    pub fn reset(&mut self, base: BaseImage) {
        let font = self.font.take();
        *self = Self::new(base).with_font(font);
    }

    // ========================================================================
    // Text editing
    // ========================================================================

    pub fn begin_text_edit(&mut self, id: DrawableId) -> bool {
        let Some(Drawable::Text(text)) = self.find(id) else {
            return false;
        };
        let origin = text.frame.center();
        self.selection = Selection::Single {
            id,
            handle: Handle::None,
        };
        self.gesture = GestureState::new(Gesture::EditingText { id }, origin);
        true
    }

    /// Replace the content of the text being edited and refit its frame
    pub fn edit_text(&mut self, content: &str) -> bool {
        let Some(id) = self.gesture.editing_text() else {
            return false;
        };
        let Some(Drawable::Text(mut text)) = self.find(id).cloned() else {
            return false;
        };
        if text.content == content {
            return false;
        }

        let mut state = self.take_gesture();
        state.checkpoint(self);
        self.set_gesture(state);

        let size = render::text::measure(content, text.font_size, self.font.as_ref());
        text.content = content.to_string();
        text.frame = Rect::new(text.frame.x, text.frame.y, size.width, size.height);
        self.replace(Drawable::Text(text).clamped(self.canvas));
        true
    }

    /// Close the text editor; empty text is removed
    pub fn end_text_edit(&mut self) {
        let mut state = self.take_gesture();
        let Some(id) = state.editing_text() else {
            self.set_gesture(state);
            return;
        };
        let empty = matches!(self.find(id), Some(Drawable::Text(t)) if t.content.trim().is_empty());
        if empty {
            state.checkpoint(self);
            self.remove(id);
            log::debug!("Removed empty text {}", id);
        }
    }

    // ========================================================================
    // Rendering and export
    // ========================================================================

    /// Live preview using cached blur patches
    pub fn blur_preview(&mut self) -> Result<RgbaImage, RenderError> {
        self.blur_cache
            .compose_preview(&self.base, &self.objects, self.font.as_ref())
    }

    /// Composite all drawables onto the base image
    pub fn flatten(&self) -> Result<RgbaImage, RenderError> {
        render::rasterize(&self.base, &self.objects, self.font.as_ref())
    }

    /// Adopt a flattened image as the new base and clear the drawables
    ///
    /// A checkpoint is pushed first so the flatten can be undone.
    pub fn commit_flattened(&mut self, flattened: RgbaImage) {
        self.push_snapshot();
        let density = self.base.density();
        self.base = Arc::new(BaseImage::with_scale(flattened, density));
        self.objects.clear();
        self.selection = Selection::None;
        self.gesture = GestureState::default();
        self.blur_cache.clear();
    }

    pub fn flatten_in_place(&mut self) -> Result<(), RenderError> {
        let flattened = self.flatten()?;
        self.commit_flattened(flattened);
        Ok(())
    }

    fn export_image(&self, display: &DisplayConfig) -> anyhow::Result<(RgbaImage, RgbaImage)> {
        let flattened = self.flatten().context("flattening annotations")?;
        let output = export::prepare_for_export(&flattened, &self.base, display);
        Ok((flattened, output))
    }

    /// Overwrite the source; drawables are baked in only once the sink
    /// confirms the write
    pub fn save_in_place(
        &mut self,
        sink: &mut dyn ExportSink,
        encoding: ImageEncoding,
        quality: u8,
        display: &DisplayConfig,
    ) -> anyhow::Result<()> {
        let (flattened, output) = self.export_image(display)?;
        sink.write(&output, encoding, quality)?;
        sink.verify().context("verifying saved image")?;
        self.commit_flattened(flattened);
        Ok(())
    }

    /// Write to a new destination; drawables are baked in after the write
    pub fn save_as(
        &mut self,
        sink: &mut dyn ExportSink,
        encoding: ImageEncoding,
        quality: u8,
        display: &DisplayConfig,
    ) -> anyhow::Result<()> {
        let (flattened, output) = self.export_image(display)?;
        sink.write(&output, encoding, quality)?;
        self.commit_flattened(flattened);
        Ok(())
    }

    /// Copy the flattened image without changing the session
    pub fn copy_to_clipboard(&self, sink: &mut dyn ClipboardSink, display: &DisplayConfig) -> anyhow::Result<()> {
        let (_, output) = self.export_image(display)?;
        sink.set_image(&output)
    }
}
