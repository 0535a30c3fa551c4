//! Cover-fit sampling: pick the centered source region that fills a cell.

/// A crop region in source-image coordinates plus the factor that maps it
/// onto the target cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl CropRect {
    pub fn is_full_image(&self, src_w: u32, src_h: u32) -> bool {
        self.x == 0.0
            && self.y == 0.0
            && self.width == src_w as f32
            && self.height == src_h as f32
    }
}

/// Compute the cover crop of a `src_w` x `src_h` image for a
/// `target_w` x `target_h` cell.
///
/// The source is scaled by `max(target_w / src_w, target_h / src_h)` so it
/// covers the cell on both axes; whatever overflows is cropped evenly from
/// both sides. Never letterboxes.
pub fn cover_crop(src_w: u32, src_h: u32, target_w: f32, target_h: f32) -> CropRect {
    let sw = src_w.max(1) as f32;
    let sh = src_h.max(1) as f32;
    let tw = target_w.max(f32::EPSILON);
    let th = target_h.max(f32::EPSILON);

    let scale = (tw / sw).max(th / sh);
    // Clamp so float rounding can never push the crop past the source bounds.
    let width = (tw / scale).min(sw);
    let height = (th / scale).min(sh);

    CropRect {
        x: ((sw - width) / 2.0).max(0.0),
        y: ((sh - height) / 2.0).max(0.0),
        width,
        height,
        scale,
    }
}
