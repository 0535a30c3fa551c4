/// Rasterizer: executes a `DrawPlan` with tiny-skia.
///
/// Drawing always happens on a scratch pixmap. The caller's `RenderSurface`
/// only changes when `RenderSurface::commit` swaps a finished pixmap in, so a
/// failed composition can never leave a half-drawn surface behind.

use crate::loader::DecodedImage;
use crate::rendering::paint::{clamp_radius, DrawPlan, DrawStep, Rgba};
use crate::rendering::label;
use crate::rendering::layout::{Cell, MAX_CANVAS_PIXELS};
use crate::{Error, Result};
use image::RgbaImage;
use resvg::tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pattern, Pixmap,
    Rect, SpreadMode, Stroke, Transform,
};

// Bezier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// The exclusively owned drawing target of a composition.
///
/// `generation` counts successful compositions committed to this surface; a
/// surface with generation 0 has never been composed.
#[derive(Debug)]
pub struct RenderSurface {
    pixmap: Pixmap,
    generation: u64,
}

impl RenderSurface {
    /// Acquire a blank (transparent) surface.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            pixmap: acquire_pixmap(width, height)?,
            generation: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_composed(&self) -> bool {
        self.generation > 0
    }

    /// Replace the surface contents with a finished composition.
    pub(crate) fn commit(&mut self, pixmap: Pixmap) -> u64 {
        self.pixmap = pixmap;
        self.generation += 1;
        self.generation
    }

    /// Straight (non-premultiplied) RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            (c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    /// Copy the surface into a straight-alpha `RgbaImage` for display.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data)
            .unwrap_or_else(|| RgbaImage::new(self.width(), self.height()))
    }
}

/// Allocate a transparent pixmap, failing for empty or oversized dimensions.
pub fn acquire_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    if width as u64 * height as u64 > MAX_CANVAS_PIXELS {
        return Err(Error::RenderSurfaceUnavailableError(format!(
            "a {}x{} surface exceeds the {} pixel limit",
            width, height, MAX_CANVAS_PIXELS
        )));
    }
    Pixmap::new(width, height).ok_or_else(|| {
        Error::RenderSurfaceUnavailableError(format!(
            "cannot allocate a {}x{} surface",
            width, height
        ))
    })
}

/// Convert a decoded bitmap into a premultiplied pixmap usable as a pattern.
pub fn bitmap_to_pixmap(image: &DecodedImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height()).ok_or_else(|| {
        Error::RenderError(format!(
            "image {} ({}x{}) could not be converted to a pixmap",
            image.index,
            image.width(),
            image.height()
        ))
    })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.bitmap.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Rounded rectangle path with the radius clamped to half the shorter side.
pub fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = clamp_radius(radius, w, h);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(Rect::from_xywh(x, y, w, h)?));
    }

    let k = r * (1.0 - KAPPA);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - k, y, x + w, y + k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - k, x + w - k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + k, y + h, x, y + h - k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + k, x + k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn cell_path(cell: &Cell, radius: f32) -> Result<Path> {
    rounded_rect_path(cell.x, cell.y, cell.width, cell.height, radius).ok_or_else(|| {
        Error::RenderError(format!("cell {} has degenerate geometry", cell.index))
    })
}

/// Execute `plan` on a fresh `width` x `height` pixmap.
///
/// `images` must be index-aligned with the cells of the plan.
pub fn rasterize(plan: &DrawPlan, images: &[DecodedImage], width: u32, height: u32) -> Result<Pixmap> {
    plan.validate()?;
    if plan.cell_count() != images.len() {
        return Err(Error::RenderError(format!(
            "plan draws {} cells but {} images were supplied",
            plan.cell_count(),
            images.len()
        )));
    }

    let mut pixmap = acquire_pixmap(width, height)?;
    let sources = images
        .iter()
        .map(bitmap_to_pixmap)
        .collect::<Result<Vec<_>>>()?;
    // One mask for the whole plan, cleared and refilled per cell.
    let mut mask: Option<Mask> = None;
    let mut clipped = false;

    for step in plan.steps() {
        match step {
            DrawStep::Clear { rgba } => {
                pixmap.fill(Color::from_rgba8(rgba.0, rgba.1, rgba.2, rgba.3));
            }
            DrawStep::ClipRoundedRect { cell, radius } => {
                let path = cell_path(cell, *radius)?;
                if mask.is_none() {
                    mask = Some(Mask::new(width, height).ok_or_else(|| {
                        Error::RenderSurfaceUnavailableError("cannot allocate clip mask".into())
                    })?);
                }
                if let Some(m) = mask.as_mut() {
                    m.data_mut().fill(0);
                    m.fill_path(&path, FillRule::Winding, true, Transform::identity());
                    clipped = true;
                }
            }
            DrawStep::DrawImage { cell, crop } => {
                let source = sources.get(cell.index).ok_or_else(|| {
                    Error::RenderError(format!("no image for cell {}", cell.index))
                })?;
                let sx = cell.width / crop.width;
                let sy = cell.height / crop.height;
                let to_cell =
                    Transform::from_row(sx, 0.0, 0.0, sy, cell.x - crop.x * sx, cell.y - crop.y * sy);

                let mut paint = Paint::default();
                paint.anti_alias = true;
                paint.shader = Pattern::new(
                    source.as_ref(),
                    SpreadMode::Pad,
                    FilterQuality::Bicubic,
                    1.0,
                    to_cell,
                );

                let rect = Rect::from_xywh(cell.x, cell.y, cell.width, cell.height).ok_or_else(|| {
                    Error::RenderError(format!("cell {} has degenerate geometry", cell.index))
                })?;
                let clip = if clipped { mask.as_ref() } else { None };
                pixmap.fill_rect(rect, &paint, Transform::identity(), clip);
            }
            DrawStep::ReleaseClip => {
                clipped = false;
            }
            DrawStep::StrokeRoundedRect {
                cell,
                radius,
                width: stroke_width,
                rgba,
            } => {
                if *stroke_width <= 0.0 || rgba.3 == 0 {
                    continue;
                }
                let path = cell_path(cell, *radius)?;
                let mut paint = Paint::default();
                paint.anti_alias = true;
                paint.set_color_rgba8(rgba.0, rgba.1, rgba.2, rgba.3);
                let stroke = Stroke {
                    width: *stroke_width,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            DrawStep::Label { text, style } => {
                label::draw_label(&mut pixmap, text, style)?;
            }
        }
    }

    Ok(pixmap)
}
