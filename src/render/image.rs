//! Image rendering for drawables using tiny-skia
//!
//! Flattens a base image and an ordered drawable list into one raster at the
//! base image's native pixel resolution. Geometry goes author space → pixel
//! space (bottom-left origin) → raster rows of the pixmap.

use ab_glyph::FontArc;
use image::RgbaImage;
use tiny_skia::{
    BlendMode, ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Mask, Paint, Path,
    PathBuilder, Pattern, Pixmap, PixmapPaint, SpreadMode, Stroke, Transform,
};

use super::geometry::{self, arrow, badge, shape};
use super::pixelate::pixelate;
use super::text::{self, GlyphCurve};
use crate::config::ShapeColor;
use crate::domain::{
    BadgeDrawable, BaseImage, BlurDrawable, Drawable, ImageDrawable, LineDrawable, Point, Rect,
    ShapeDrawable, Size, StrokeStyle, TextDrawable,
};
use crate::error::RenderError;
use crate::transform;

/// Maps author-space geometry onto the pixmap
#[derive(Clone, Copy, Debug)]
pub struct PixelMapper {
    author_size: Size,
    pixel_size: Size,
}

impl PixelMapper {
    pub fn new(author_size: Size, pixel_size: Size) -> Self {
        Self {
            author_size,
            pixel_size,
        }
    }

    pub fn for_image(base: &BaseImage) -> Self {
        Self::new(base.logical_size(), base.pixel_size())
    }

    /// Author point to pixel space (Y-up)
    pub fn to_pixel(&self, p: Point) -> Point {
        transform::author_point_to_pixel(p, self.author_size, self.pixel_size)
    }

    /// Author rect to pixel space (bottom-left origin)
    pub fn rect_to_pixel(&self, r: Rect) -> Rect {
        transform::author_rect_to_pixel_rect(r, self.author_size, self.pixel_size)
    }

    /// Pixel-space point to pixmap coordinates (rows counted from the top)
    pub fn pixel_to_raster(&self, p: Point) -> Point {
        Point::new(p.x, self.pixel_size.height - p.y)
    }

    pub fn to_raster(&self, p: Point) -> Point {
        self.pixel_to_raster(self.to_pixel(p))
    }

    /// Pixel space to pixmap coordinates as an affine transform
    pub fn pixel_to_raster_transform(&self) -> Transform {
        Transform::from_row(1.0, 0.0, 0.0, -1.0, 0.0, self.pixel_size.height)
    }

    /// Author lengths (stroke widths, font sizes) to pixels
    pub fn length_scale(&self) -> f32 {
        let sx = if self.author_size.width > 0.0 {
            self.pixel_size.width / self.author_size.width
        } else {
            1.0
        };
        let sy = if self.author_size.height > 0.0 {
            self.pixel_size.height / self.author_size.height
        } else {
            1.0
        };
        (sx + sy) * 0.5
    }

    /// Corners of a rotated author rect, rotated about its center in author
    /// space and then mapped onto the pixmap
    pub fn rotated_corners(&self, frame: Rect, rotation: f32) -> [Point; 4] {
        frame.rotated_corners(rotation).map(|p| self.to_raster(p))
    }
}

/// Integer pixmap region (top-left origin) covered by a redaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Region of the pixmap a blur drawable covers, clipped to the image
///
/// The rect is computed in pixel space (bottom-left origin) from the rotated
/// AABB and converted to pixmap rows. `None` when nothing is left after
/// clipping.
pub fn blur_region(blur: &BlurDrawable, mapper: &PixelMapper) -> Option<PixelRegion> {
    let pixel_rect = mapper.rect_to_pixel(blur.frame.rotated_aabb(blur.rotation));
    let top = mapper.pixel_size.height - pixel_rect.max_y();

    let x1 = pixel_rect.min_x().floor().max(0.0);
    let y1 = top.floor().max(0.0);
    let x2 = pixel_rect.max_x().ceil().min(mapper.pixel_size.width);
    let y2 = (top + pixel_rect.height).ceil().min(mapper.pixel_size.height);
    if !(x2 > x1 && y2 > y1) {
        return None;
    }
    Some(PixelRegion {
        x: x1 as u32,
        y: y1 as u32,
        width: (x2 - x1) as u32,
        height: (y2 - y1) as u32,
    })
}

/// Convert RgbaImage to a premultiplied Pixmap
pub fn pixmap_from_rgba(img: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

/// Convert a premultiplied Pixmap back to straight-alpha RgbaImage
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Copy a region out of the pixmap as straight-alpha pixels
fn crop_pixmap(pixmap: &Pixmap, region: PixelRegion) -> Option<RgbaImage> {
    if region.x + region.width > pixmap.width() || region.y + region.height > pixmap.height() {
        return None;
    }
    let mut img = RgbaImage::new(region.width, region.height);
    for y in 0..region.height {
        for x in 0..region.width {
            let c = pixmap.pixel(region.x + x, region.y + y)?.demultiply();
            img.put_pixel(x, y, image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]));
        }
    }
    Some(img)
}

fn paint_for(color: ShapeColor) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn shadow_paint() -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, shape::SHADOW_ALPHA);
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

/// Closed polygon through the given pixmap points
fn polygon_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.close();
    pb.finish()
}

/// Build an arrow path as stroked lines (shaft + two angled head lines)
fn build_line_path(start: Point, end: Point, head_size: Option<f32>) -> Option<Path> {
    let mut pb = PathBuilder::new();

    // Shaft line from start to end
    pb.move_to(start.x, start.y);
    pb.line_to(end.x, end.y);

    if let Some(head_size) = head_size
        && let Some(heads) = arrow::head_points(start, end, head_size)
    {
        for head in heads {
            pb.move_to(end.x, end.y);
            pb.line_to(head.x, head.y);
        }
    }

    pb.finish()
}

/// Build an ellipse path using cubic bezier curves
///
/// Control points are produced in the frame's local author space and passed
/// through `map`, so rotation and the pixel mapping apply to the curve as a
/// whole (both are affine).
fn build_ellipse_path(frame: Rect, map: impl Fn(Point) -> Point) -> Option<Path> {
    let (cx, cy, rx, ry) =
        geometry::ellipse_from_bounds(frame.min_x(), frame.min_y(), frame.max_x(), frame.max_y());
    let kx = rx * shape::BEZIER_K;
    let ky = ry * shape::BEZIER_K;
    let p = |x: f32, y: f32| map(Point::new(x, y));

    let mut pb = PathBuilder::new();

    // Start at top
    let top = p(cx, cy - ry);
    pb.move_to(top.x, top.y);

    let segments = [
        // Top to right
        (p(cx + kx, cy - ry), p(cx + rx, cy - ky), p(cx + rx, cy)),
        // Right to bottom
        (p(cx + rx, cy + ky), p(cx + kx, cy + ry), p(cx, cy + ry)),
        // Bottom to left
        (p(cx - kx, cy + ry), p(cx - rx, cy + ky), p(cx - rx, cy)),
        // Left to top
        (p(cx - rx, cy - ky), p(cx - kx, cy - ry), top),
    ];
    for (c1, c2, to) in segments {
        pb.cubic_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
    }

    pb.close();
    pb.finish()
}

/// Build a path from glyph curves already mapped onto the pixmap
fn build_glyph_path(curves: &[GlyphCurve]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    let mut last: Option<Point> = None;
    for curve in curves {
        let start = curve.start();
        if last != Some(start) {
            if last.is_some() {
                pb.close();
            }
            pb.move_to(start.x, start.y);
        }
        last = Some(match *curve {
            GlyphCurve::Line(_, b) => {
                pb.line_to(b.x, b.y);
                b
            }
            GlyphCurve::Quad(_, c, b) => {
                pb.quad_to(c.x, c.y, b.x, b.y);
                b
            }
            GlyphCurve::Cubic(_, c1, c2, b) => {
                pb.cubic_to(c1.x, c1.y, c2.x, c2.y, b.x, b.y);
                b
            }
        });
    }
    if last.is_some() {
        pb.close();
    }
    pb.finish()
}

fn stroke_with_shadow(pixmap: &mut Pixmap, path: &Path, style: &StrokeStyle, scale: f32) {
    let width = (style.width * scale).max(1.0);
    if style.shadow {
        let spread = shape::SHADOW_SPREAD * scale;
        pixmap.stroke_path(
            path,
            &shadow_paint(),
            &round_stroke(width + spread * 2.0),
            Transform::identity(),
            None,
        );
    }
    pixmap.stroke_path(
        path,
        &paint_for(style.color),
        &round_stroke(width),
        Transform::identity(),
        None,
    );
}

fn draw_line(pixmap: &mut Pixmap, line: &LineDrawable, mapper: &PixelMapper) {
    let scale = mapper.length_scale();
    let start = mapper.to_raster(line.start);
    let end = mapper.to_raster(line.end);
    let head = line
        .arrow_head
        .then(|| arrow::head_size(line.stroke.width) * scale);

    if line.stroke.shadow
        && let Some(path) = build_line_path(start, end, head.map(|h| h + arrow::OUTLINE * scale))
    {
        let width = (line.stroke.width * scale).max(1.0) + arrow::OUTLINE * scale * 2.0;
        pixmap.stroke_path(
            &path,
            &shadow_paint(),
            &round_stroke(width),
            Transform::identity(),
            None,
        );
    }

    if let Some(path) = build_line_path(start, end, head) {
        let style = StrokeStyle {
            shadow: false,
            ..line.stroke
        };
        stroke_with_shadow(pixmap, &path, &style, scale);
    }
}

fn draw_shape(pixmap: &mut Pixmap, shape: &ShapeDrawable, oval: bool, mapper: &PixelMapper) {
    let center = shape.frame.center();
    let path = if oval {
        build_ellipse_path(shape.frame, |p| {
            mapper.to_raster(p.rotated_about(center, shape.rotation))
        })
    } else {
        polygon_path(&mapper.rotated_corners(shape.frame, shape.rotation))
    };
    let Some(path) = path else {
        return;
    };

    if let Some(fill) = shape.fill {
        pixmap.fill_path(
            &path,
            &paint_for(fill),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
    stroke_with_shadow(pixmap, &path, &shape.stroke, mapper.length_scale());
}

fn draw_highlight(pixmap: &mut Pixmap, frame: Rect, rotation: f32, color: ShapeColor, mapper: &PixelMapper) {
    let Some(path) = polygon_path(&mapper.rotated_corners(frame, rotation)) else {
        return;
    };
    let mut paint = paint_for(color);
    paint.blend_mode = BlendMode::Multiply;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

/// Fill glyph outlines laid out in `frame`, rotated about `pivot`
#[allow(clippy::too_many_arguments)]
fn fill_text(
    pixmap: &mut Pixmap,
    content: &str,
    font_size: f32,
    frame_origin: Point,
    pivot: Point,
    rotation: f32,
    color: ShapeColor,
    font: Option<&FontArc>,
    mapper: &PixelMapper,
) {
    let mut curves = Vec::new();
    text::for_each_glyph_curve(content, font_size, frame_origin, font, |curve| {
        curves.push(curve.map(|p| mapper.to_raster(p.rotated_about(pivot, rotation))));
    });
    if curves.is_empty() {
        return;
    }
    if let Some(path) = build_glyph_path(&curves) {
        pixmap.fill_path(
            &path,
            &paint_for(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

fn draw_text(pixmap: &mut Pixmap, t: &TextDrawable, font: Option<&FontArc>, mapper: &PixelMapper) {
    if let Some(background) = t.background
        && let Some(path) = polygon_path(&mapper.rotated_corners(t.frame, t.rotation))
    {
        pixmap.fill_path(
            &path,
            &paint_for(background),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
    let origin = Point::new(t.frame.min_x(), t.frame.min_y());
    fill_text(
        pixmap,
        &t.content,
        t.font_size,
        origin,
        t.frame.center(),
        t.rotation,
        t.color,
        font,
        mapper,
    );
}

fn draw_badge(pixmap: &mut Pixmap, b: &BadgeDrawable, font: Option<&FontArc>, mapper: &PixelMapper) {
    let center = b.frame.center();
    if let Some(path) = build_ellipse_path(b.frame, |p| {
        mapper.to_raster(p.rotated_about(center, b.rotation))
    }) {
        pixmap.fill_path(
            &path,
            &paint_for(b.color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    let label = b.number.to_string();
    let font_size = b.frame.width.min(b.frame.height) * badge::NUMBER_SCALE;
    let size = text::measure(&label, font_size, font);
    let origin = Point::new(center.x - size.width * 0.5, center.y - size.height * 0.5);
    fill_text(
        pixmap,
        &label,
        font_size,
        origin,
        center,
        b.rotation,
        b.text_color,
        font,
        mapper,
    );
}

fn draw_image(pixmap: &mut Pixmap, img: &ImageDrawable, mapper: &PixelMapper) {
    let (iw, ih) = img.pixels.dimensions();
    if iw == 0 || ih == 0 {
        return;
    }
    let Some(source) = pixmap_from_rgba(&img.pixels) else {
        return;
    };
    let Some(path) = polygon_path(&mapper.rotated_corners(img.frame, img.rotation)) else {
        return;
    };

    // Place image pixels (rows top-down) into Y-up pixel space, rotate there
    // with the flipped sign, then map onto the pixmap.
    let pixel_frame = mapper.rect_to_pixel(img.frame);
    let placement = Transform::from_row(
        pixel_frame.width / iw as f32,
        0.0,
        0.0,
        -pixel_frame.height / ih as f32,
        pixel_frame.min_x(),
        pixel_frame.max_y(),
    );
    let pivot = pixel_frame.center();
    let rotation = Transform::from_rotate_at(
        transform::to_pixel_rotation(img.rotation).to_degrees(),
        pivot.x,
        pivot.y,
    );
    let shader_transform = placement
        .post_concat(rotation)
        .post_concat(mapper.pixel_to_raster_transform());

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.shader = Pattern::new(
        source.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bicubic,
        1.0,
        shader_transform,
    );
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

/// Draw one non-redaction drawable
pub(crate) fn draw_drawable(
    pixmap: &mut Pixmap,
    drawable: &Drawable,
    font: Option<&FontArc>,
    mapper: &PixelMapper,
) {
    match drawable {
        Drawable::Line(line) => draw_line(pixmap, line, mapper),
        Drawable::Rect(shape) => draw_shape(pixmap, shape, false, mapper),
        Drawable::Oval(shape) => draw_shape(pixmap, shape, true, mapper),
        Drawable::Text(t) => draw_text(pixmap, t, font, mapper),
        Drawable::Badge(b) => draw_badge(pixmap, b, font, mapper),
        Drawable::Highlight(h) => draw_highlight(pixmap, h.frame, h.rotation, h.color, mapper),
        Drawable::Image(img) => draw_image(pixmap, img, mapper),
        // Second pass
        Drawable::Blur(_) => {}
    }
}

/// Draw a pixelated patch back at `region`, clipped to the blur's rotated
/// outline when it is rotated
pub(crate) fn draw_patch(
    pixmap: &mut Pixmap,
    blur: &BlurDrawable,
    region: PixelRegion,
    patch: &RgbaImage,
    mapper: &PixelMapper,
) {
    let Some(patch) = pixmap_from_rgba(patch) else {
        return;
    };
    let mask = if blur.rotation != 0.0 {
        let Some(path) = polygon_path(&mapper.rotated_corners(blur.frame, blur.rotation)) else {
            return;
        };
        let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
            return;
        };
        mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
        Some(mask)
    } else {
        None
    };

    let paint = PixmapPaint {
        blend_mode: BlendMode::Source,
        ..Default::default()
    };
    pixmap.draw_pixmap(
        region.x as i32,
        region.y as i32,
        patch.as_ref(),
        &paint,
        Transform::identity(),
        mask.as_ref(),
    );
}

/// Pixelate the composited pixels under one blur drawable
fn apply_blur(pixmap: &mut Pixmap, blur: &BlurDrawable, mapper: &PixelMapper) {
    let Some(region) = blur_region(blur, mapper) else {
        log::warn!("Blur {} lies outside the image, skipping", blur.id);
        return;
    };
    let Some(crop) = crop_pixmap(pixmap, region) else {
        log::warn!("Could not crop blur {} at {:?}, skipping", blur.id, region);
        return;
    };
    let patch = pixelate(&crop, blur.block_size);
    draw_patch(pixmap, blur, region, &patch, mapper);
}

/// Flatten `objects` onto `base` at the base image's native resolution
///
/// Annotations are drawn first in insertion order; redactions are applied
/// afterwards so they also obscure annotations beneath them.
pub fn rasterize(
    base: &BaseImage,
    objects: &[Drawable],
    font: Option<&FontArc>,
) -> Result<RgbaImage, RenderError> {
    base.ensure_available()?;
    let mut pixmap = pixmap_from_rgba(&base.rgba).ok_or_else(|| {
        RenderError::ResourceUnavailable(format!(
            "could not allocate {}x{} canvas",
            base.width(),
            base.height()
        ))
    })?;
    let mapper = PixelMapper::for_image(base);

    for drawable in objects.iter().filter(|d| !d.is_redaction()) {
        draw_drawable(&mut pixmap, drawable, font, &mapper);
    }

    for drawable in objects {
        if let Drawable::Blur(blur) = drawable {
            apply_blur(&mut pixmap, blur, &mapper);
        }
    }

    log::debug!(
        "Rasterized {} drawables onto {}x{} image",
        objects.len(),
        base.width(),
        base.height()
    );
    Ok(rgba_from_pixmap(&pixmap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HighlightDrawable, Vector};
    use image::Rgba;
    use std::f32::consts::PI;
    use std::sync::Arc;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn white_base(w: u32, h: u32, scale: f32) -> BaseImage {
        BaseImage::with_scale(RgbaImage::from_pixel(w, h, WHITE), scale)
    }

    fn filled_rect(id: u64, frame: Rect, color: ShapeColor) -> Drawable {
        Drawable::Rect(ShapeDrawable {
            id,
            frame,
            rotation: 0.0,
            stroke: StrokeStyle {
                color,
                width: 1.0,
                shadow: false,
            },
            fill: Some(color),
        })
    }

    fn blur(id: u64, frame: Rect, block_size: u32) -> Drawable {
        Drawable::Blur(BlurDrawable {
            id,
            frame,
            rotation: 0.0,
            block_size,
        })
    }

    #[test]
    fn test_rasterize_keeps_author_orientation() {
        let base = white_base(100, 100, 1.0);
        let objects = [filled_rect(1, Rect::new(10.0, 10.0, 20.0, 20.0), ShapeColor::BLACK)];
        let out = rasterize(&base, &objects, None).unwrap();
        assert_eq!(*out.get_pixel(20, 20), BLACK);
        assert_eq!(*out.get_pixel(20, 80), WHITE);
    }

    #[test]
    fn test_rasterize_uses_native_resolution() {
        let base = white_base(200, 200, 2.0);
        let objects = [filled_rect(1, Rect::new(10.0, 10.0, 20.0, 20.0), ShapeColor::BLACK)];
        let out = rasterize(&base, &objects, None).unwrap();
        assert_eq!(out.dimensions(), (200, 200));
        assert_eq!(*out.get_pixel(40, 40), BLACK);
        assert_eq!(*out.get_pixel(70, 40), WHITE);
    }

    #[test]
    fn test_blur_obscures_annotations_drawn_before_it() {
        let base = white_base(40, 40, 1.0);
        let objects = [
            blur(1, Rect::new(0.0, 0.0, 20.0, 20.0), 20),
            filled_rect(2, Rect::new(0.0, 0.0, 10.0, 10.0), ShapeColor::rgb(1.0, 0.0, 0.0)),
        ];
        let out = rasterize(&base, &objects, None).unwrap();
        let inside = *out.get_pixel(5, 5);
        assert_ne!(inside, Rgba([255, 0, 0, 255]));
        assert_eq!(inside, *out.get_pixel(15, 15));
        assert_eq!(*out.get_pixel(30, 30), WHITE);
    }

    #[test]
    fn test_blur_outside_image_is_skipped() {
        let base = white_base(40, 40, 1.0);
        let objects = [blur(1, Rect::new(100.0, 100.0, 20.0, 20.0), 4)];
        let out = rasterize(&base, &objects, None).unwrap();
        assert_eq!(out, base.rgba);
    }

    #[test]
    fn test_unavailable_base_fails_composite() {
        let base = BaseImage::new(RgbaImage::new(0, 0));
        assert!(matches!(
            rasterize(&base, &[], None),
            Err(RenderError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_blur_region_flips_through_pixel_space() {
        let mapper = PixelMapper::new(Size::new(100.0, 50.0), Size::new(200.0, 100.0));
        let b = BlurDrawable {
            id: 1,
            frame: Rect::new(10.0, 5.0, 20.0, 10.0),
            rotation: 0.0,
            block_size: 4,
        };
        assert_eq!(
            blur_region(&b, &mapper),
            Some(PixelRegion {
                x: 20,
                y: 10,
                width: 40,
                height: 20
            })
        );
    }

    #[test]
    fn test_pixel_space_rotation_matches_author_rotation() {
        let mapper = PixelMapper::new(Size::new(100.0, 100.0), Size::new(200.0, 200.0));
        let frame = Rect::new(20.0, 30.0, 40.0, 10.0);
        let angle = PI / 5.0;

        let author_first = frame.rotated_corners(angle).map(|p| mapper.to_pixel(p));
        let pixel_center = mapper.to_pixel(frame.center());
        let pixel_first = frame
            .corners()
            .map(|p| mapper.to_pixel(p).rotated_about(pixel_center, transform::to_pixel_rotation(angle)));

        for (a, b) in author_first.iter().zip(pixel_first.iter()) {
            assert!((a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_highlight_multiplies() {
        let base = white_base(20, 20, 1.0);
        let objects = [Drawable::Highlight(HighlightDrawable {
            id: 1,
            frame: Rect::new(0.0, 0.0, 20.0, 20.0),
            rotation: 0.0,
            color: ShapeColor::rgb(1.0, 1.0, 0.0),
        })];
        let out = rasterize(&base, &objects, None).unwrap();
        assert_eq!(*out.get_pixel(10, 10), Rgba([255, 255, 0, 255]));
    }

    #[test]
    fn test_pasted_image_is_drawn_into_frame() {
        let base = white_base(50, 50, 1.0);
        let pasted = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        let objects = [Drawable::Image(ImageDrawable {
            id: 1,
            frame: Rect::new(10.0, 10.0, 20.0, 20.0),
            rotation: 0.0,
            pixels: Arc::new(pasted),
        })];
        let out = rasterize(&base, &objects, None).unwrap();
        assert_eq!(*out.get_pixel(20, 20), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.get_pixel(40, 40), WHITE);
    }

    #[test]
    fn test_rotated_blur_is_clipped_to_outline() {
        let mut base = white_base(60, 60, 1.0);
        // Checkerboard so pixelation visibly changes pixels
        for (x, y, p) in base.rgba.enumerate_pixels_mut() {
            if (x + y) % 2 == 0 {
                *p = BLACK;
            }
        }
        let frame = Rect::new(20.0, 20.0, 20.0, 20.0);
        let objects = [Drawable::Blur(BlurDrawable {
            id: 1,
            frame,
            rotation: PI / 4.0,
            block_size: 60,
        })];
        let out = rasterize(&base, &objects, None).unwrap();
        // Corner of the rotated AABB, outside the diamond: untouched
        let corner = frame.rotated_aabb(PI / 4.0).translated(Vector::new(1.0, 1.0));
        let (cx, cy) = (corner.x as u32, corner.y as u32);
        assert_eq!(out.get_pixel(cx, cy), base.rgba.get_pixel(cx, cy));
        // Center: flattened to a single grey
        let center = *out.get_pixel(30, 30);
        assert_ne!(center, WHITE);
        assert_ne!(center, BLACK);
    }
}
