//! Encoding and writing flattened images
//!
//! Sinks receive the final pixels; the session decides when drawables are
//! baked into the base image based on the sink's result.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage, imageops};

use crate::config::{DisplayConfig, ImageEncoding};
use crate::domain::BaseImage;
use crate::render;
use crate::session::history::Snipshot;

/// Destination for exported images
pub trait ExportSink {
    fn write(&mut self, image: &RgbaImage, encoding: ImageEncoding, quality: u8) -> anyhow::Result<()>;

    /// Confirm the last write is readable; sinks without a read-back path
    /// accept every write
    fn verify(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// System clipboard, provided by the embedding application
pub trait ClipboardSink {
    fn set_image(&mut self, image: &RgbaImage) -> anyhow::Result<()>;
}

fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Encode to PNG or JPEG; `quality` only applies to JPEG
pub fn encode<W: io::Write>(w: W, image: &RgbaImage, encoding: ImageEncoding, quality: u8) -> anyhow::Result<()> {
    match encoding {
        ImageEncoding::Png => write_png(w, image).context("encoding PNG")?,
        ImageEncoding::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(w, quality.clamp(1, 100))
                .encode_image(&rgb)
                .context("encoding JPEG")?;
        }
    }
    Ok(())
}

/// Encode into memory
pub fn encode_to_vec(image: &RgbaImage, encoding: ImageEncoding, quality: u8) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    encode(&mut bytes, image, encoding, quality)?;
    Ok(bytes)
}

/// Scale a high-density flatten down to the logical size when configured
pub fn prepare_for_export(flattened: &RgbaImage, base: &BaseImage, display: &DisplayConfig) -> RgbaImage {
    let logical = base.logical_size();
    let width = logical.width.round().max(1.0) as u32;
    let height = logical.height.round().max(1.0) as u32;
    if !display.downsample_on_export || (width, height) == flattened.dimensions() {
        return flattened.clone();
    }
    log::debug!(
        "Downsampling export from {}x{} to {}x{}",
        flattened.width(),
        flattened.height(),
        width,
        height
    );
    imageops::resize(flattened, width, height, imageops::FilterType::Lanczos3)
}

/// Timestamped file name for a new export
pub fn default_file_name(encoding: ImageEncoding) -> String {
    let stem = chrono::Local::now().format("Screenshot_%Y-%m-%d_%H-%M-%S");
    format!("{}.{}", stem, encoding.extension())
}

/// Writes to a file through a temporary file in the same directory, so a
/// failed write never truncates an existing image
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    written: Option<(u32, u32)>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for FileSink {
    fn write(&mut self, image: &RgbaImage, encoding: ImageEncoding, quality: u8) -> anyhow::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut file = tempfile::Builder::new()
            .prefix(".snipshot-")
            .suffix(&format!(".{}", encoding.extension()))
            .tempfile_in(&dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        {
            let mut writer = io::BufWriter::new(file.as_file_mut());
            encode(&mut writer, image, encoding, quality)?;
            writer.flush().context("flushing image data")?;
        }
        file.persist(&self.path)
            .with_context(|| format!("writing {}", self.path.display()))?;
        self.written = Some(image.dimensions());
        log::info!("Saved image to {}", self.path.display());
        Ok(())
    }

    fn verify(&self) -> anyhow::Result<()> {
        let expected = self.written.context("nothing was written")?;
        let actual = image::image_dimensions(&self.path)
            .with_context(|| format!("reading back {}", self.path.display()))?;
        anyhow::ensure!(
            actual == expected,
            "{} has size {:?}, expected {:?}",
            self.path.display(),
            actual,
            expected
        );
        Ok(())
    }
}

/// Flatten a checkpoint on the blocking thread pool
pub async fn flatten_in_background(snapshot: Snipshot, font: Option<FontArc>) -> anyhow::Result<RgbaImage> {
    let image = tokio::task::spawn_blocking(move || {
        render::rasterize(&snapshot.image, &snapshot.objects, font.as_ref())
    })
    .await
    .context("flatten worker failed")??;
    Ok(image)
}

/// Flatten and encode a checkpoint on the blocking thread pool
///
/// Returns the native-resolution flatten alongside the encoded bytes so the
/// caller can commit it to the session once the bytes are stored.
pub async fn export_in_background(
    snapshot: Snipshot,
    font: Option<FontArc>,
    encoding: ImageEncoding,
    quality: u8,
    display: DisplayConfig,
) -> anyhow::Result<(RgbaImage, Vec<u8>)> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let flattened = render::rasterize(&snapshot.image, &snapshot.objects, font.as_ref())?;
        let output = prepare_for_export(&flattened, &snapshot.image, &display);
        let bytes = encode_to_vec(&output, encoding, quality)?;
        Ok((flattened, bytes))
    })
    .await
    .context("export worker failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlurDrawable, Drawable, Rect};
    use image::Rgba;
    use std::sync::Arc;

    fn image() -> RgbaImage {
        RgbaImage::from_fn(20, 10, |x, y| Rgba([(x * 12) as u8, (y * 25) as u8, 40, 255]))
    }

    #[test]
    fn test_png_is_lossless() {
        let img = image();
        let bytes = encode_to_vec(&img, ImageEncoding::Png, 0).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_jpeg_keeps_dimensions() {
        let bytes = encode_to_vec(&image(), ImageEncoding::Jpeg, 80).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn test_file_sink_writes_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let mut sink = FileSink::new(&path);
        assert!(sink.verify().is_err());
        sink.write(&image(), ImageEncoding::Png, 90).unwrap();
        sink.verify().unwrap();
        assert_eq!(image::image_dimensions(&path).unwrap(), (20, 10));
    }

    #[test]
    fn test_file_sink_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("missing").join("out.png"));
        assert!(sink.write(&image(), ImageEncoding::Png, 90).is_err());
    }

    #[test]
    fn test_downsample_only_when_enabled() {
        let base = BaseImage::with_scale(RgbaImage::new(40, 20), 2.0);
        let flattened = RgbaImage::new(40, 20);
        let keep = DisplayConfig::default();
        assert_eq!(prepare_for_export(&flattened, &base, &keep).dimensions(), (40, 20));

        let shrink = DisplayConfig {
            downsample_on_export: true,
            ..keep
        };
        assert_eq!(prepare_for_export(&flattened, &base, &shrink).dimensions(), (20, 10));
    }

    #[test]
    fn test_default_file_name() {
        let name = default_file_name(ImageEncoding::Jpeg);
        assert!(name.starts_with("Screenshot_"));
        assert!(name.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_background_flatten_matches_foreground() {
        let base = Arc::new(BaseImage::new(image()));
        let objects = vec![Drawable::Blur(BlurDrawable {
            id: 1,
            frame: Rect::new(0.0, 0.0, 10.0, 10.0),
            rotation: 0.0,
            block_size: 5,
        })];
        let expected = render::rasterize(&base, &objects, None).unwrap();
        let snapshot = Snipshot::new(base, objects);

        let flattened = flatten_in_background(snapshot.clone(), None).await.unwrap();
        assert_eq!(flattened, expected);

        let (native, bytes) =
            export_in_background(snapshot, None, ImageEncoding::Png, 90, DisplayConfig::default())
                .await
                .unwrap();
        assert_eq!(native, expected);
        assert_eq!(image::load_from_memory(&bytes).unwrap().to_rgba8(), expected);
    }

    #[tokio::test]
    async fn test_background_flatten_reports_unavailable_base() {
        let snapshot = Snipshot::new(Arc::new(BaseImage::new(RgbaImage::new(0, 0))), Vec::new());
        assert!(flatten_in_background(snapshot, None).await.is_err());
    }
}
