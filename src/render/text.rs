//! Text measurement and glyph outlines using ab_glyph
//!
//! Measurement is shared by the interaction layer (to size text frames) and
//! the rasterizer (to place glyphs), so the frame and the rendered text
//! always agree on padding and line height.

use ab_glyph::{Font, FontArc, OutlineCurve, PxScale, ScaleFont};

use super::geometry::text::{FALLBACK_ADVANCE, LINE_HEIGHT, PADDING};
use crate::domain::{Point, Size};

/// One segment of a glyph contour in author space
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GlyphCurve {
    Line(Point, Point),
    Quad(Point, Point, Point),
    Cubic(Point, Point, Point, Point),
}

impl GlyphCurve {
    pub fn start(&self) -> Point {
        match self {
            GlyphCurve::Line(p, _) | GlyphCurve::Quad(p, _, _) | GlyphCurve::Cubic(p, _, _, _) => *p,
        }
    }

    /// Apply `f` to every control point
    pub fn map(self, f: impl Fn(Point) -> Point) -> GlyphCurve {
        match self {
            GlyphCurve::Line(a, b) => GlyphCurve::Line(f(a), f(b)),
            GlyphCurve::Quad(a, b, c) => GlyphCurve::Quad(f(a), f(b), f(c)),
            GlyphCurve::Cubic(a, b, c, d) => GlyphCurve::Cubic(f(a), f(b), f(c), f(d)),
        }
    }
}

fn line_width(line: &str, font_size: f32, font: Option<&FontArc>) -> f32 {
    match font {
        Some(font) => {
            let scaled = font.as_scaled(PxScale::from(font_size));
            let mut width = 0.0;
            let mut prev = None;
            for c in line.chars() {
                let id = scaled.glyph_id(c);
                if let Some(prev) = prev {
                    width += scaled.kern(prev, id);
                }
                width += scaled.h_advance(id);
                prev = Some(id);
            }
            width
        }
        None => line.chars().count() as f32 * font_size * FALLBACK_ADVANCE,
    }
}

/// Size of the frame needed to show `content`, padding included
pub fn measure(content: &str, font_size: f32, font: Option<&FontArc>) -> Size {
    let lines: Vec<&str> = content.split('\n').collect();
    let width = lines
        .iter()
        .map(|line| line_width(line, font_size, font))
        .fold(0.0_f32, f32::max);
    let height = lines.len() as f32 * font_size * LINE_HEIGHT;
    Size::new(width + PADDING * 2.0, height + PADDING * 2.0)
}

/// Walk the glyph outlines of `content` laid out inside a frame whose
/// top-left corner is `frame_origin`
///
/// Curves are reported in author space, unrotated. Does nothing without a font.
pub fn for_each_glyph_curve(
    content: &str,
    font_size: f32,
    frame_origin: Point,
    font: Option<&FontArc>,
    mut f: impl FnMut(GlyphCurve),
) {
    let Some(font) = font else {
        return;
    };
    let scaled = font.as_scaled(PxScale::from(font_size));
    let (hsf, vsf) = (scaled.h_scale_factor(), scaled.v_scale_factor());
    let line_height = font_size * LINE_HEIGHT;
    // Center the font's ascent/descent box vertically inside each line
    let leading = (line_height - (scaled.ascent() - scaled.descent())) * 0.5;

    for (index, line) in content.split('\n').enumerate() {
        let baseline =
            frame_origin.y + PADDING + index as f32 * line_height + leading + scaled.ascent();
        let mut pen_x = frame_origin.x + PADDING;
        let mut prev = None;
        for c in line.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                pen_x += scaled.kern(prev, id);
            }
            if let Some(outline) = font.outline(id) {
                let origin_x = pen_x;
                // Font units are Y-up from the baseline
                let to_author = |p: ab_glyph::Point| {
                    Point::new(origin_x + p.x * hsf, baseline - p.y * vsf)
                };
                for curve in &outline.curves {
                    f(match curve {
                        OutlineCurve::Line(a, b) => GlyphCurve::Line(to_author(*a), to_author(*b)),
                        OutlineCurve::Quad(a, b, c) => {
                            GlyphCurve::Quad(to_author(*a), to_author(*b), to_author(*c))
                        }
                        OutlineCurve::Cubic(a, b, c, d) => GlyphCurve::Cubic(
                            to_author(*a),
                            to_author(*b),
                            to_author(*c),
                            to_author(*d),
                        ),
                    });
                }
            }
            pen_x += scaled.h_advance(id);
            prev = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_without_font_uses_average_advance() {
        let size = measure("abcd", 10.0, None);
        assert_eq!(size.width, 4.0 * 10.0 * FALLBACK_ADVANCE + PADDING * 2.0);
        assert_eq!(size.height, 10.0 * LINE_HEIGHT + PADDING * 2.0);
    }

    #[test]
    fn test_measure_multiline_takes_widest_line() {
        let one = measure("abcdef", 10.0, None);
        let two = measure("ab\nabcdef", 10.0, None);
        assert_eq!(one.width, two.width);
        assert!(two.height > one.height);
    }

    #[test]
    fn test_no_font_emits_no_curves() {
        let mut count = 0;
        for_each_glyph_curve("hello", 12.0, Point::ORIGIN, None, |_| count += 1);
        assert_eq!(count, 0);
    }
}
