//! Handles and selection state

use super::drawable::DrawableId;

/// Draggable control point of a drawable
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    #[default]
    None,
    /// Top-left corner (in the shape's unrotated frame)
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    /// First endpoint of a line
    LineStart,
    /// Second endpoint of a line
    LineEnd,
    /// Rotation grip outside the top-right corner
    Rotate,
}

impl Handle {
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomRight | Handle::BottomLeft
        )
    }

    pub fn is_endpoint(self) -> bool {
        matches!(self, Handle::LineStart | Handle::LineEnd)
    }

    /// Handle diagonally opposite a corner, or the other end of a line
    pub fn opposite(self) -> Handle {
        match self {
            Handle::TopLeft => Handle::BottomRight,
            Handle::TopRight => Handle::BottomLeft,
            Handle::BottomRight => Handle::TopLeft,
            Handle::BottomLeft => Handle::TopRight,
            Handle::LineStart => Handle::LineEnd,
            Handle::LineEnd => Handle::LineStart,
            Handle::None | Handle::Rotate => self,
        }
    }

    /// Index into [`crate::domain::Rect::corners`]
    pub fn corner_index(self) -> Option<usize> {
        match self {
            Handle::TopLeft => Some(0),
            Handle::TopRight => Some(1),
            Handle::BottomRight => Some(2),
            Handle::BottomLeft => Some(3),
            _ => None,
        }
    }
}

/// What is currently selected
///
/// Single and multiple selection are exclusive by construction.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    /// One drawable, with the handle grabbed on pointer-down
    Single { id: DrawableId, handle: Handle },
    /// Several drawables moved as a group
    Multiple(Vec<DrawableId>),
}

impl Selection {
    /// Build a selection from marquee hits
    pub fn from_ids(mut ids: Vec<DrawableId>) -> Self {
        match ids.len() {
            0 => Selection::None,
            1 => Selection::Single {
                id: ids.remove(0),
                handle: Handle::None,
            },
            _ => Selection::Multiple(ids),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn contains(&self, id: DrawableId) -> bool {
        match self {
            Selection::None => false,
            Selection::Single { id: selected, .. } => *selected == id,
            Selection::Multiple(ids) => ids.contains(&id),
        }
    }

    pub fn single(&self) -> Option<DrawableId> {
        match self {
            Selection::Single { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn ids(&self) -> Vec<DrawableId> {
        match self {
            Selection::None => Vec::new(),
            Selection::Single { id, .. } => vec![*id],
            Selection::Multiple(ids) => ids.clone(),
        }
    }

    /// Forget a drawable that no longer exists
    pub fn remove(&mut self, id: DrawableId) {
        match self {
            Selection::Single { id: selected, .. } if *selected == id => *self = Selection::None,
            Selection::Multiple(ids) => {
                ids.retain(|i| *i != id);
                *self = Selection::from_ids(std::mem::take(ids));
            }
            _ => {}
        }
    }
}
