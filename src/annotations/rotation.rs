//! Rotate-handle math
//!
//! The target angle is the rotation at gesture start plus the wrapped change
//! in pointer angle around the shape center, optionally snapped.

use crate::domain::wrap_angle;
use crate::session::messages::Modifiers;

/// Snap increment chosen by the held modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSnap {
    Free,
    /// Control: 1°
    Fine,
    /// Alt: 5°
    Medium,
    /// Shift: 15°
    Coarse,
}

impl RotationSnap {
    pub fn from_modifiers(modifiers: &Modifiers) -> Self {
        if modifiers.control {
            RotationSnap::Fine
        } else if modifiers.alt {
            RotationSnap::Medium
        } else if modifiers.shift {
            RotationSnap::Coarse
        } else {
            RotationSnap::Free
        }
    }

    /// Increment in radians, `None` when unsnapped
    pub fn increment(self) -> Option<f32> {
        match self {
            RotationSnap::Free => None,
            RotationSnap::Fine => Some(1f32.to_radians()),
            RotationSnap::Medium => Some(5f32.to_radians()),
            RotationSnap::Coarse => Some(15f32.to_radians()),
        }
    }

    pub fn apply(self, angle: f32) -> f32 {
        match self.increment() {
            Some(step) => (angle / step).round() * step,
            None => angle,
        }
    }
}

/// Rotation for the current pointer angle
pub fn target_angle(base_rotation: f32, start_pointer_angle: f32, current_pointer_angle: f32) -> f32 {
    base_rotation + wrap_angle(current_pointer_angle - start_pointer_angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_crossing_the_branch_cut_is_a_small_step() {
        let start = PI - 0.05;
        let current = -PI + 0.05;
        let angle = target_angle(0.3, start, current);
        assert!((angle - 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_modifier_increments() {
        let shift = Modifiers::shift();
        let snapped = RotationSnap::from_modifiers(&shift).apply(20f32.to_radians());
        assert!((snapped - 15f32.to_radians()).abs() < 1e-5);

        let control = Modifiers {
            control: true,
            shift: true,
            ..Modifiers::NONE
        };
        assert_eq!(RotationSnap::from_modifiers(&control), RotationSnap::Fine);

        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        let snapped = RotationSnap::from_modifiers(&alt).apply(12f32.to_radians());
        assert!((snapped - 10f32.to_radians()).abs() < 1e-5);

        assert_eq!(RotationSnap::Free.apply(0.123), 0.123);
    }
}
