//! Base raster image the annotations are drawn over

use std::path::Path;

use anyhow::Context;
use image::RgbaImage;

use super::geometry::Size;
use crate::error::RenderError;

/// A decoded screenshot with both native pixels and its logical size
///
/// On high-density sources the pixel grid is larger than the logical size;
/// drawables live in the logical (author) space.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseImage {
    pub rgba: RgbaImage,
    logical_size: Size,
}

impl BaseImage {
    /// Wrap pixels whose logical size equals their pixel size
    pub fn new(rgba: RgbaImage) -> Self {
        let logical_size = Size::new(rgba.width() as f32, rgba.height() as f32);
        Self { rgba, logical_size }
    }

    /// Wrap pixels captured at `scale` device pixels per logical unit
    pub fn with_scale(rgba: RgbaImage, scale: f32) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let logical_size = Size::new(rgba.width() as f32 / scale, rgba.height() as f32 / scale);
        Self { rgba, logical_size }
    }

    /// Decode an encoded image held in memory
    pub fn decode(bytes: &[u8], scale: f32) -> Result<Self, RenderError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::with_scale(rgba, scale))
    }

    /// Open an image file
    pub fn open(path: &Path, scale: f32) -> anyhow::Result<Self> {
        let rgba = image::open(path)
            .with_context(|| format!("opening {}", path.display()))?
            .to_rgba8();
        log::debug!(
            "BaseImage opened: {}x{} pixels from {}",
            rgba.width(),
            rgba.height(),
            path.display()
        );
        Ok(Self::with_scale(rgba, scale))
    }

    /// Get the width of the image in pixels
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the height of the image in pixels
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn pixel_size(&self) -> Size {
        Size::new(self.width() as f32, self.height() as f32)
    }

    /// Size of the author space drawables are placed in
    pub fn logical_size(&self) -> Size {
        self.logical_size
    }

    /// Device pixels per logical unit along x
    pub fn density(&self) -> f32 {
        if self.logical_size.width > 0.0 {
            self.width() as f32 / self.logical_size.width
        } else {
            1.0
        }
    }

    /// Whether the image can be composited onto
    pub fn ensure_available(&self) -> Result<(), RenderError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(RenderError::ResourceUnavailable(
                "base image has no pixels".to_string(),
            ));
        }
        if !self.logical_size.is_positive() {
            return Err(RenderError::ResourceUnavailable(
                "base image has no logical size".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_sets_logical_size() {
        let img = BaseImage::with_scale(RgbaImage::new(200, 100), 2.0);
        assert_eq!(img.logical_size(), Size::new(100.0, 50.0));
        assert_eq!(img.density(), 2.0);
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let err = BaseImage::decode(b"definitely not an image", 1.0).unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_empty_image_is_unavailable() {
        let img = BaseImage::new(RgbaImage::new(0, 0));
        assert!(img.ensure_available().is_err());
    }
}
