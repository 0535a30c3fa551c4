/// PNG export of composed surfaces.

use crate::rendering::raster::RenderSurface;
use crate::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::info;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File name used when the configuration does not name one.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "collage.png";

/// An encoded collage ready to be handed to a save/download action.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl ExportedImage {
    /// Hex SHA-256 of the PNG bytes.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }

    /// Write the PNG into `dir` under `file_name` and return the full path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        check_file_name(&self.file_name)?;
        fs::create_dir_all(dir).map_err(|e| {
            Error::ExportError(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.png_data).map_err(|e| {
            Error::ExportError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        info!("saved collage to {} ({} bytes)", path.display(), self.png_data.len());
        Ok(path)
    }
}

/// Accept only a plain file name: no separators, no `.`/`..`, not absolute.
pub fn check_file_name(file_name: &str) -> Result<()> {
    let reject = |why: &str| -> Result<()> {
        Err(Error::ExportError(format!(
            "export file name {:?} {}",
            file_name, why
        )))
    };
    if file_name.trim().is_empty() {
        return reject("is empty");
    }
    if file_name.contains('/') || file_name.contains('\\') {
        return reject("must not contain path separators");
    }
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => reject("must be a plain file name"),
    }
}

/// Encode the last composition on `surface` as PNG.
///
/// A surface that was never composed is rejected. A later failed composition
/// does not touch the surface, so this always reflects the last success.
pub fn export_png(surface: &RenderSurface, file_name: &str) -> Result<ExportedImage> {
    if !surface.is_composed() {
        return Err(Error::ExportError(
            "surface has not been composed yet".into(),
        ));
    }
    check_file_name(file_name)?;

    let rgba = surface.to_rgba_image();
    let mut png_data = Vec::new();
    PngEncoder::new(&mut png_data)
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
        .map_err(|e| Error::ExportError(format!("PNG encoding failed: {}", e)))?;

    Ok(ExportedImage {
        file_name: file_name.to_string(),
        width: surface.width(),
        height: surface.height(),
        png_data,
    })
}
