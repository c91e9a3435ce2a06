//! Configuration persistence for snipshot settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Default for ShapeColor {
    fn default() -> Self {
        // Annotation red
        Self::rgb(0.9, 0.1, 0.1)
    }
}

impl ShapeColor {
    pub const BLACK: ShapeColor = ShapeColor::rgb(0.0, 0.0, 0.0);
    pub const WHITE: ShapeColor = ShapeColor::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

/// Annotation tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Select,
    Line,
    Rectangle,
    Oval,
    Text,
    Badge,
    Highlight,
    Blur,
}

impl Tool {
    /// Whether a pointer gesture with this tool can create a drawable
    pub fn creates(self) -> bool {
        !matches!(self, Tool::Select)
    }
}

/// Output encoding for exported images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageEncoding {
    #[default]
    Png,
    Jpeg,
}

impl ImageEncoding {
    /// Get file extension for this encoding
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "png",
            ImageEncoding::Jpeg => "jpg",
        }
    }

    /// Guess the encoding from a file path, defaulting to PNG
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => ImageEncoding::Jpeg,
            _ => ImageEncoding::Png,
        }
    }
}

/// How the canvas is presented on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Scale the canvas down to fit the window instead of showing it at actual size
    pub fit_to_window: bool,
    /// Downsample high-density exports to the logical size of the base image
    pub downsample_on_export: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fit_to_window: true,
            downsample_on_export: false,
        }
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tool active when the editor opens
    pub tool: Tool,
    /// Stroke color for lines, rectangles and ovals
    pub stroke_color: ShapeColor,
    /// Stroke width in author units
    pub stroke_width: f32,
    /// Optional fill for rectangles and ovals
    pub fill_color: Option<ShapeColor>,
    /// Whether to draw shadow/border under strokes
    pub shape_shadow: bool,
    /// Whether new lines get an arrow head at their end point
    pub line_arrow_head: bool,
    /// Font size for text and badges
    pub font_size: f32,
    pub text_color: ShapeColor,
    pub text_background: Option<ShapeColor>,
    /// Content of a text object created with a click
    pub default_text: String,
    pub badge_color: ShapeColor,
    pub highlight_color: ShapeColor,
    /// Pixelation block size in image pixels (range 1-64)
    pub blur_block_size: u32,
    /// TrueType/OpenType font used for text and badges
    pub font_path: Option<PathBuf>,
    pub encoding: ImageEncoding,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    pub display: DisplayConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tool: Tool::Select,
            stroke_color: ShapeColor::default(),
            stroke_width: 3.0,
            fill_color: None,
            shape_shadow: true,
            line_arrow_head: true,
            font_size: 18.0,
            text_color: ShapeColor::default(),
            text_background: None,
            default_text: "Text".to_string(),
            badge_color: ShapeColor::default(),
            // Translucent marker yellow
            highlight_color: ShapeColor::rgba(1.0, 0.9, 0.0, 0.45),
            blur_block_size: 16,
            font_path: None,
            encoding: ImageEncoding::Png,
            jpeg_quality: 90,
            display: DisplayConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Application directory name under the platform config dir
    pub const ID: &'static str = "snipshot";

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            log::error!("Could not determine config directory for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Load the configured font, if any
    pub fn load_font(&self) -> Option<ab_glyph::FontArc> {
        let path = self.font_path.as_ref()?;
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Could not read font {}: {}", path.display(), err);
                return None;
            }
        };
        match ab_glyph::FontArc::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(err) => {
                log::warn!("Invalid font {}: {}", path.display(), err);
                None
            }
        }
    }
}
