/// Grid geometry for the collage.
///
/// Cells are laid out row-major with a uniform gap on every side and between
/// neighbours, so the last cell ends exactly `gap` pixels before the canvas edge.

use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Largest canvas, in pixels, a composition may request (8192 x 8192).
pub const MAX_CANVAS_PIXELS: u64 = 8192 * 8192;

/// Canvas size, grid dimensions and spacing for one composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub rows: u32,
    pub cols: u32,
    pub gap: u32,
}

impl GridSpec {
    /// A square canvas with a square grid, e.g. `square(1024, 2, 10)` for 2x2.
    pub fn square(canvas_size: u32, per_side: u32, gap: u32) -> Self {
        Self {
            canvas_width: canvas_size,
            canvas_height: canvas_size,
            rows: per_side,
            cols: per_side,
            gap,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Width of every cell in pixels.
    pub fn cell_width(&self) -> f32 {
        axis_extent(self.canvas_width, self.cols, self.gap)
    }

    /// Height of every cell in pixels.
    pub fn cell_height(&self) -> f32 {
        axis_extent(self.canvas_height, self.rows, self.gap)
    }

    /// Check that the spec describes a drawable grid for `image_count` images.
    pub fn validate(&self, image_count: usize) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(Error::InvalidGridError(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        let area = self.canvas_width as u64 * self.canvas_height as u64;
        if area > MAX_CANVAS_PIXELS {
            return Err(Error::RenderSurfaceUnavailableError(format!(
                "a {}x{} canvas exceeds the {} pixel limit",
                self.canvas_width, self.canvas_height, MAX_CANVAS_PIXELS
            )));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidGridError(format!(
                "grid must have at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.cell_count() != image_count {
            return Err(Error::InvalidGridError(format!(
                "{} images do not fill a {}x{} grid ({} cells)",
                image_count,
                self.rows,
                self.cols,
                self.cell_count()
            )));
        }
        if self.cell_width() <= 0.0 || self.cell_height() <= 0.0 {
            return Err(Error::InvalidGridError(format!(
                "gap {} leaves no room for cells on a {}x{} canvas",
                self.gap, self.canvas_width, self.canvas_height
            )));
        }
        Ok(())
    }
}

fn axis_extent(canvas: u32, slots: u32, gap: u32) -> f32 {
    if slots == 0 {
        return 0.0;
    }
    let gaps = gap as f32 * (slots as f32 + 1.0);
    (canvas as f32 - gaps) / slots as f32
}

/// One slot of the collage. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Cell {
    /// Side length for square cells (the shorter side otherwise).
    pub fn size(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Compute the row-major cell list for `image_count` images.
pub fn layout_grid(spec: &GridSpec, image_count: usize) -> Result<Vec<Cell>> {
    spec.validate(image_count)?;

    let width = spec.cell_width();
    let height = spec.cell_height();
    let gap = spec.gap as f32;

    let mut cells = Vec::with_capacity(image_count);
    for row in 0..spec.rows {
        for col in 0..spec.cols {
            let index = (row * spec.cols + col) as usize;
            cells.push(Cell {
                index,
                x: gap * (col as f32 + 1.0) + width * col as f32,
                y: gap * (row as f32 + 1.0) + height * row as f32,
                width,
                height,
            });
        }
    }

    debug!(
        "laid out {} cells of {:.2}x{:.2} on {}x{} (gap {})",
        cells.len(),
        width,
        height,
        spec.canvas_width,
        spec.canvas_height,
        spec.gap
    );
    Ok(cells)
}
