//! Moving several drawables together
//!
//! Every member reports the range of deltas that keeps it on the canvas.
//! The group moves by the requested delta clamped into the intersection of
//! those ranges, independently per axis, so members never drift apart.

use crate::domain::{Drawable, Size, Vector};
use crate::transform::DeltaLimits;

/// Combined delta range of a group
pub fn group_limits<'a>(objects: impl IntoIterator<Item = &'a Drawable>, canvas: Size) -> DeltaLimits {
    objects
        .into_iter()
        .fold(DeltaLimits::unbounded(), |limits, d| {
            limits.intersect(d.translation_limits(canvas))
        })
}

/// Delta actually applied to every member of the group
pub fn group_delta<'a>(
    objects: impl IntoIterator<Item = &'a Drawable>,
    requested: Vector,
    canvas: Size,
) -> Vector {
    group_limits(objects, canvas).apply(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlurDrawable, LineDrawable, Point, Rect, StrokeStyle};

    const CANVAS: Size = Size::new(100.0, 100.0);

    fn blur(frame: Rect) -> Drawable {
        Drawable::Blur(BlurDrawable {
            id: 1,
            frame,
            rotation: 0.0,
            block_size: 4,
        })
    }

    #[test]
    fn test_flush_member_pins_only_its_axis() {
        let flush_right = blur(Rect::new(80.0, 10.0, 20.0, 20.0));
        let free = blur(Rect::new(10.0, 10.0, 20.0, 20.0));
        let delta = group_delta([&flush_right, &free], Vector::new(15.0, 7.0), CANVAS);
        assert_eq!(delta, Vector::new(0.0, 7.0));

        for d in [&flush_right, &free] {
            let moved = d.moved(delta);
            assert_eq!(moved.bounds().x, d.bounds().x);
            assert_eq!(moved.bounds().y, d.bounds().y + 7.0);
        }
    }

    #[test]
    fn test_tightest_member_limits_the_group() {
        let a = blur(Rect::new(50.0, 50.0, 10.0, 10.0));
        let line = Drawable::Line(LineDrawable {
            id: 2,
            start: Point::new(5.0, 20.0),
            end: Point::new(30.0, 20.0),
            stroke: StrokeStyle::default(),
            arrow_head: false,
        });
        let delta = group_delta([&a, &line], Vector::new(-20.0, 0.0), CANVAS);
        assert_eq!(delta, Vector::new(-5.0, 0.0));
    }

    #[test]
    fn test_rotated_member_uses_rotated_bounds() {
        let mut rotated = blur(Rect::new(40.0, 40.0, 40.0, 10.0));
        rotated.set_rotation(std::f32::consts::FRAC_PI_2);
        // Rotated AABB spans y 25..65
        let delta = group_delta([&rotated], Vector::new(0.0, 50.0), CANVAS);
        assert!((delta.dy - 35.0).abs() < 1e-3);
    }
}
