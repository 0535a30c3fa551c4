//! Rendering: grid geometry, cover-fit sampling, the draw plan and its
//! rasterization, the title label, and PNG export.

pub mod cover;
pub mod export;
pub mod label;
pub mod layout;
pub mod paint;
pub mod raster;

pub use cover::{cover_crop, CropRect};
pub use export::{check_file_name, export_png, ExportedImage, DEFAULT_EXPORT_FILE_NAME};
pub use label::LabelStyle;
pub use layout::{layout_grid, Cell, GridSpec};
pub use paint::{clamp_radius, DrawPlan, DrawStep, PaintStyle, Rgba};
pub use raster::{rasterize, RenderSurface};
