//! collagekit
//!
//! Assembles a fixed number of independently generated images into a single
//! collage: a grid of rounded, bordered cells on a solid background with a
//! title label on top, exported as PNG.
//!
//! # Pipeline
//!
//! - **Loading**: every encoded image is decoded in parallel; the load is
//!   all-or-nothing
//! - **Layout**: cell geometry from canvas size, gap and grid dimensions
//! - **Cover fit**: a centered crop per image that fills its cell
//! - **Compositing**: an ordered draw plan rasterized onto an exclusively
//!   owned surface
//! - **Export**: PNG bytes with a fixed file name
//!
//! # Example
//!
//! ```no_run
//! use collagekit::{CollageConfig, CollageRequest, RenderSurface, SourceImage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CollageConfig::default();
//! let images = (1..=4)
//!     .map(|i| std::fs::read(format!("image{}.png", i)).map(SourceImage::from))
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let mut compositor = collagekit::new_compositor(&config)?;
//! let mut surface = RenderSurface::new(config.canvas_width, config.canvas_height)?;
//! let request = CollageRequest::new(images, "Watercolor", config.grid_spec());
//! let artifact = compositor.compose_blocking(&mut surface, &request)?;
//!
//! let png = artifact.export(&surface, &config.export_file_name)?;
//! png.save(std::path::Path::new("."))?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod compositor;
pub mod error;
pub mod loader;
pub mod rendering;

pub use compositor::{CollageArtifact, CollageRequest, CompositionState, Compositor};
pub use error::{Error, Result};
pub use loader::{decode_image, load_images, DecodedImage, SourceImage};
pub use rendering::{
    export_png, Cell, CropRect, ExportedImage, GridSpec, LabelStyle, PaintStyle, RenderSurface,
    Rgba, DEFAULT_EXPORT_FILE_NAME,
};

/// Configuration for the compositor
///
/// The defaults describe the classic four-image collage: a 1024px square
/// canvas split into a 2x2 grid with 10px gaps, 24px rounded corners and a
/// faint white border around each cell.
///
/// Every field may be omitted when loading from JSON; missing fields take
/// their default value.
///
/// # Examples
///
/// ```
/// let cfg = collagekit::CollageConfig::default();
/// assert_eq!(cfg.grid_spec().cell_width(), 497.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollageConfig {
    /// Canvas width in pixels
    pub canvas_width: u32,
    /// Canvas height in pixels
    pub canvas_height: u32,
    pub rows: u32,
    pub cols: u32,
    /// Gap between cells and around the outer edge, in pixels
    pub gap: u32,
    /// Requested corner radius; clamped per cell to half its shorter side
    pub corner_radius: f32,
    /// Border stroke width (0 disables the border)
    pub border_width: f32,
    pub background: Rgba,
    pub border: Rgba,
    pub label: LabelStyle,
    /// File name handed to the save action
    pub export_file_name: String,
}

impl Default for CollageConfig {
    fn default() -> Self {
        let paint = PaintStyle::default();
        Self {
            canvas_width: 1024,
            canvas_height: 1024,
            rows: 2,
            cols: 2,
            gap: 10,
            corner_radius: paint.corner_radius,
            border_width: paint.border_width,
            background: paint.background,
            border: paint.border,
            label: paint.label,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl CollageConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&data)
    }

    pub fn grid_spec(&self) -> GridSpec {
        GridSpec {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            rows: self.rows,
            cols: self.cols,
            gap: self.gap,
        }
    }

    pub fn paint_style(&self) -> PaintStyle {
        PaintStyle {
            background: self.background,
            corner_radius: self.corner_radius,
            border_width: self.border_width,
            border: self.border,
            label: self.label.clone(),
        }
    }

    /// Reject values the compositor cannot work with.
    pub fn validate(&self) -> Result<()> {
        let grid = self.grid_spec();
        grid.validate(grid.cell_count())
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        let finite_non_negative = |name: &str, v: f32| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(Error::ConfigError(format!("{} must be a non-negative number, got {}", name, v)))
            }
        };
        finite_non_negative("corner_radius", self.corner_radius)?;
        finite_non_negative("border_width", self.border_width)?;
        finite_non_negative("label.x", self.label.x)?;
        finite_non_negative("label.y", self.label.y)?;
        finite_non_negative("label.padding", self.label.padding)?;
        finite_non_negative("label.corner_radius", self.label.corner_radius)?;
        if !(self.label.scale.is_finite() && self.label.scale > 0.0) {
            return Err(Error::ConfigError(format!(
                "label.scale must be positive, got {}",
                self.label.scale
            )));
        }

        rendering::check_file_name(&self.export_file_name)
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        Ok(())
    }
}

/// Create a compositor for `config` after validating it
pub fn new_compositor(config: &CollageConfig) -> Result<Compositor> {
    config.validate()?;
    Ok(Compositor::from_config(config))
}
