//! Pixelated previews of blur drawables
//!
//! Pixelating on every pointer event is too slow for live feedback, so each
//! blur keeps a patch computed from the base image. A patch is regenerated
//! only when its own geometry or block size changes.

use std::collections::HashMap;

use ab_glyph::FontArc;
use image::{RgbaImage, imageops};

use super::image::{PixelMapper, PixelRegion, blur_region, draw_drawable, draw_patch, pixmap_from_rgba, rgba_from_pixmap};
use super::pixelate::pixelate;
use crate::domain::{BaseImage, BlurDrawable, Drawable, DrawableId, Rect};
use crate::error::RenderError;

/// Cached pixelation of one blur drawable
#[derive(Clone, Debug)]
pub struct BlurSnapshot {
    frame: Rect,
    rotation: f32,
    block_size: u32,
    pub region: PixelRegion,
    pub patch: RgbaImage,
}

impl BlurSnapshot {
    fn matches(&self, blur: &BlurDrawable) -> bool {
        self.frame == blur.frame && self.rotation == blur.rotation && self.block_size == blur.block_size
    }
}

#[derive(Debug, Default)]
pub struct BlurCache {
    entries: HashMap<DrawableId, BlurSnapshot>,
}

impl BlurCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the patch of one drawable
    pub fn invalidate(&mut self, id: DrawableId) {
        self.entries.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop patches of drawables no longer in `objects`
    pub fn retain_objects(&mut self, objects: &[Drawable]) {
        self.entries
            .retain(|id, _| objects.iter().any(|d| d.id() == *id && d.is_redaction()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: DrawableId) -> Option<&BlurSnapshot> {
        self.entries.get(&id)
    }

    /// Patch for `blur`, computed from `base` if missing or stale
    ///
    /// `None` when the blur does not overlap the image.
    pub fn snapshot_for(&mut self, blur: &BlurDrawable, base: &BaseImage) -> Option<&BlurSnapshot> {
        let stale = self.entries.get(&blur.id).is_none_or(|s| !s.matches(blur));
        if stale {
            self.entries.remove(&blur.id);
            let region = blur_region(blur, &PixelMapper::for_image(base))?;
            let crop = imageops::crop_imm(&base.rgba, region.x, region.y, region.width, region.height)
                .to_image();
            log::trace!("Regenerating blur preview {} at {:?}", blur.id, region);
            self.entries.insert(
                blur.id,
                BlurSnapshot {
                    frame: blur.frame,
                    rotation: blur.rotation,
                    block_size: blur.block_size,
                    region,
                    patch: pixelate(&crop, blur.block_size),
                },
            );
        }
        self.entries.get(&blur.id)
    }

    /// Composite a preview using cached blur patches
    ///
    /// Same layering as the final rasterization, except redactions show the
    /// pixelated base image rather than the pixelated composite.
    pub fn compose_preview(
        &mut self,
        base: &BaseImage,
        objects: &[Drawable],
        font: Option<&FontArc>,
    ) -> Result<RgbaImage, RenderError> {
        base.ensure_available()?;
        let mut pixmap = pixmap_from_rgba(&base.rgba).ok_or_else(|| {
            RenderError::ResourceUnavailable("could not allocate preview canvas".to_string())
        })?;
        let mapper = PixelMapper::for_image(base);

        for drawable in objects.iter().filter(|d| !d.is_redaction()) {
            draw_drawable(&mut pixmap, drawable, font, &mapper);
        }
        for drawable in objects {
            if let Drawable::Blur(blur) = drawable
                && let Some(snapshot) = self.snapshot_for(blur, base)
            {
                draw_patch(&mut pixmap, blur, snapshot.region, &snapshot.patch, &mapper);
            }
        }
        Ok(rgba_from_pixmap(&pixmap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Vector;
    use image::Rgba;

    fn base() -> BaseImage {
        BaseImage::new(RgbaImage::from_fn(40, 40, |x, y| {
            Rgba([(x * 6) as u8, (y * 6) as u8, 0, 255])
        }))
    }

    fn blur(id: DrawableId, frame: Rect) -> BlurDrawable {
        BlurDrawable {
            id,
            frame,
            rotation: 0.0,
            block_size: 4,
        }
    }

    #[test]
    fn test_snapshot_is_reused_until_geometry_changes() {
        let base = base();
        let mut cache = BlurCache::new();
        let mut b = blur(1, Rect::new(0.0, 0.0, 16.0, 16.0));

        let first = cache.snapshot_for(&b, &base).unwrap().region;
        assert_eq!(cache.snapshot_for(&b, &base).unwrap().region, first);
        assert_eq!(cache.len(), 1);

        b.frame = b.frame.translated(Vector::new(8.0, 0.0));
        let moved = cache.snapshot_for(&b, &base).unwrap().region;
        assert_eq!(moved.x, first.x + 8);
    }

    #[test]
    fn test_invalidate_and_retain() {
        let base = base();
        let mut cache = BlurCache::new();
        let a = blur(1, Rect::new(0.0, 0.0, 8.0, 8.0));
        let b = blur(2, Rect::new(8.0, 8.0, 8.0, 8.0));
        cache.snapshot_for(&a, &base);
        cache.snapshot_for(&b, &base);
        assert_eq!(cache.len(), 2);

        cache.invalidate(1);
        assert!(cache.get(1).is_none());

        cache.retain_objects(&[]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_offscreen_blur_has_no_snapshot() {
        let base = base();
        let mut cache = BlurCache::new();
        let b = blur(1, Rect::new(500.0, 500.0, 8.0, 8.0));
        assert!(cache.snapshot_for(&b, &base).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_preview_matches_final_render_without_annotations() {
        let base = base();
        let objects = [Drawable::Blur(blur(1, Rect::new(4.0, 4.0, 20.0, 20.0)))];
        let mut cache = BlurCache::new();
        let preview = cache.compose_preview(&base, &objects, None).unwrap();
        let flattened = super::super::image::rasterize(&base, &objects, None).unwrap();
        assert_eq!(preview, flattened);
    }
}
