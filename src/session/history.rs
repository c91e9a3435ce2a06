//! Undo/redo checkpoints
//!
//! A checkpoint pairs the base image with the drawable list. Images are
//! shared through `Arc`, so checkpoints stay cheap even after a flatten
//! swaps the base image.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::{BaseImage, Drawable};

/// Number of checkpoints kept on each stack
pub const HISTORY_DEPTH: usize = 3;

/// One editing checkpoint
#[derive(Clone, Debug, PartialEq)]
pub struct Snipshot {
    pub image: Arc<BaseImage>,
    pub objects: Vec<Drawable>,
}

impl Snipshot {
    pub fn new(image: Arc<BaseImage>, objects: Vec<Drawable>) -> Self {
        Self { image, objects }
    }
}

#[derive(Debug)]
pub struct UndoManager {
    undo: VecDeque<Snipshot>,
    redo: VecDeque<Snipshot>,
    depth: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(HISTORY_DEPTH)
    }
}

impl UndoManager {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(depth),
            redo: VecDeque::with_capacity(depth),
            depth: depth.max(1),
        }
    }

    fn push_bounded(stack: &mut VecDeque<Snipshot>, snapshot: Snipshot, depth: usize) {
        stack.push_back(snapshot);
        while stack.len() > depth {
            stack.pop_front();
        }
    }

    /// Record a checkpoint; any redo history is discarded
    pub fn push(&mut self, snapshot: Snipshot) {
        Self::push_bounded(&mut self.undo, snapshot, self.depth);
        self.redo.clear();
    }

    /// Step back: returns the checkpoint to restore and keeps `current` for redo
    pub fn undo(&mut self, current: Snipshot) -> Option<Snipshot> {
        let previous = self.undo.pop_back()?;
        Self::push_bounded(&mut self.redo, current, self.depth);
        Some(previous)
    }

    /// Step forward: returns the checkpoint to restore and keeps `current` for undo
    pub fn redo(&mut self, current: Snipshot) -> Option<Snipshot> {
        let next = self.redo.pop_back()?;
        Self::push_bounded(&mut self.undo, current, self.depth);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlurDrawable, Rect};
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn image() -> Arc<BaseImage> {
        Arc::new(BaseImage::new(RgbaImage::new(10, 10)))
    }

    fn objects(n: u64) -> Vec<Drawable> {
        (0..n)
            .map(|id| {
                Drawable::Blur(BlurDrawable {
                    id,
                    frame: Rect::new(0.0, 0.0, 4.0, 4.0),
                    rotation: 0.0,
                    block_size: 2,
                })
            })
            .collect()
    }

    #[test]
    fn test_push_caps_depth_keeping_most_recent() {
        let img = image();
        let mut history = UndoManager::default();
        for n in 0..5 {
            history.push(Snipshot::new(img.clone(), objects(n)));
        }
        assert_eq!(history.undo_len(), 3);
        let mut current = Snipshot::new(img.clone(), objects(5));
        let mut lens = Vec::new();
        while let Some(previous) = history.undo(current) {
            lens.push(previous.objects.len());
            current = previous;
        }
        assert_eq!(lens, vec![4, 3, 2]);
    }

    #[test]
    fn test_undo_then_redo_restores_list() {
        let img = image();
        let mut history = UndoManager::default();
        history.push(Snipshot::new(img.clone(), objects(1)));
        let current = Snipshot::new(img.clone(), objects(2));

        let restored = history.undo(current.clone()).unwrap();
        assert_eq!(restored.objects, objects(1));
        let again = history.redo(restored).unwrap();
        assert_eq!(again, current);
    }

    #[test]
    fn test_push_clears_redo() {
        let img = image();
        let mut history = UndoManager::default();
        history.push(Snipshot::new(img.clone(), objects(1)));
        history.undo(Snipshot::new(img.clone(), objects(2)));
        assert!(history.can_redo());
        history.push(Snipshot::new(img.clone(), objects(3)));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let img = image();
        let mut history = UndoManager::default();
        assert!(history.undo(Snipshot::new(img.clone(), objects(0))).is_none());
        assert!(history.redo(Snipshot::new(img, objects(0))).is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
