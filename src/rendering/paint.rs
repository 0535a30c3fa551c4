/// Draw steps for one composition.
///
/// A composition is described as an ordered `DrawPlan` before anything touches
/// pixels. The plan encodes the ordering contract (background first, clip ->
/// image -> release -> border per cell, label last) and can be checked on its
/// own with `DrawPlan::validate`.

use crate::rendering::cover::{cover_crop, CropRect};
use crate::rendering::label::LabelStyle;
use crate::rendering::layout::Cell;
use crate::{Error, Result};

pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawStep {
    Clear {
        rgba: Rgba,
    },
    ClipRoundedRect {
        cell: Cell,
        radius: f32,
    },
    /// Draw image `cell.index`, sampling `crop` and scaling it onto the cell.
    DrawImage {
        cell: Cell,
        crop: CropRect,
    },
    ReleaseClip,
    StrokeRoundedRect {
        cell: Cell,
        radius: f32,
        width: f32,
        rgba: Rgba,
    },
    Label {
        text: String,
        style: LabelStyle,
    },
}

/// Fill and stroke parameters shared by every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintStyle {
    pub background: Rgba,
    pub corner_radius: f32,
    pub border_width: f32,
    pub border: Rgba,
    pub label: LabelStyle,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            background: (17, 17, 22, 255),
            corner_radius: 24.0,
            border_width: 2.0,
            border: (255, 255, 255, 72),
            label: LabelStyle::default(),
        }
    }
}

/// Corner radius actually used for a `width` x `height` rect.
///
/// Never exceeds half the shorter side, so the four arcs cannot overlap.
pub fn clamp_radius(requested: f32, width: f32, height: f32) -> f32 {
    requested
        .max(0.0)
        .min(width / 2.0)
        .min(height / 2.0)
        .max(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawPlan {
    steps: Vec<DrawStep>,
}

impl DrawPlan {
    /// Build the plan for `cells`, where `image_sizes[i]` is the decoded size
    /// of the image destined for cell `i`.
    pub fn build(
        cells: &[Cell],
        image_sizes: &[(u32, u32)],
        style: &PaintStyle,
        label_text: &str,
    ) -> Result<Self> {
        if cells.len() != image_sizes.len() {
            return Err(Error::RenderError(format!(
                "{} cells but {} images",
                cells.len(),
                image_sizes.len()
            )));
        }

        let mut steps = Vec::with_capacity(cells.len() * 4 + 2);
        steps.push(DrawStep::Clear {
            rgba: style.background,
        });

        for (cell, &(src_w, src_h)) in cells.iter().zip(image_sizes) {
            let radius = clamp_radius(style.corner_radius, cell.width, cell.height);
            let crop = cover_crop(src_w, src_h, cell.width, cell.height);
            steps.push(DrawStep::ClipRoundedRect {
                cell: *cell,
                radius,
            });
            steps.push(DrawStep::DrawImage { cell: *cell, crop });
            steps.push(DrawStep::ReleaseClip);
            steps.push(DrawStep::StrokeRoundedRect {
                cell: *cell,
                radius,
                width: style.border_width,
                rgba: style.border,
            });
        }

        steps.push(DrawStep::Label {
            text: label_text.to_string(),
            style: style.label.clone(),
        });

        let plan = Self { steps };
        plan.validate()?;
        Ok(plan)
    }

    pub fn steps(&self) -> &[DrawStep] {
        &self.steps
    }

    pub fn label_is_last(&self) -> bool {
        matches!(self.steps.last(), Some(DrawStep::Label { .. }))
    }

    /// Check the ordering contract.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::RenderError(format!("invalid draw plan: {}", msg)));

        if !matches!(self.steps.first(), Some(DrawStep::Clear { .. })) {
            return fail("plan must start by clearing the surface".into());
        }
        if !self.label_is_last() {
            return fail("label must be the final step".into());
        }

        let mut open_clip: Option<usize> = None;
        let mut drawn: Option<usize> = None;
        let mut stroked: Option<usize> = None;
        let mut next_index = 0usize;

        for (pos, step) in self.steps.iter().enumerate() {
            match step {
                DrawStep::Clear { .. } if pos != 0 => {
                    return fail(format!("clear at step {} would erase earlier cells", pos));
                }
                DrawStep::Clear { .. } => {}
                DrawStep::ClipRoundedRect { cell, .. } => {
                    if let Some(open) = open_clip {
                        return fail(format!("clip for cell {} still active at step {}", open, pos));
                    }
                    if let Some(d) = drawn {
                        if stroked != Some(d) {
                            return fail(format!("cell {} has no border", d));
                        }
                    }
                    if cell.index != next_index {
                        return fail(format!("expected cell {}, found {}", next_index, cell.index));
                    }
                    open_clip = Some(cell.index);
                }
                DrawStep::DrawImage { cell, .. } => {
                    if open_clip != Some(cell.index) {
                        return fail(format!("image {} drawn outside its clip", cell.index));
                    }
                    drawn = Some(cell.index);
                }
                DrawStep::ReleaseClip => {
                    let Some(open) = open_clip.take() else {
                        return fail(format!("release without clip at step {}", pos));
                    };
                    if drawn != Some(open) {
                        return fail(format!("clip for cell {} released before drawing", open));
                    }
                }
                DrawStep::StrokeRoundedRect { cell, .. } => {
                    if open_clip.is_some() {
                        return fail(format!("border of cell {} would be clipped", cell.index));
                    }
                    if drawn != Some(cell.index) {
                        return fail(format!("border of cell {} precedes its image", cell.index));
                    }
                    stroked = Some(cell.index);
                    next_index = cell.index + 1;
                }
                DrawStep::Label { .. } if pos + 1 != self.steps.len() => {
                    return fail(format!("label at step {} is not last", pos));
                }
                DrawStep::Label { .. } => {
                    if open_clip.is_some() {
                        return fail("label drawn while a clip is active".into());
                    }
                    if let Some(d) = drawn {
                        if stroked != Some(d) {
                            return fail(format!("cell {} has no border", d));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Number of cells the plan draws.
    pub fn cell_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, DrawStep::DrawImage { .. }))
            .count()
    }
}

impl From<DrawPlan> for Vec<DrawStep> {
    fn from(plan: DrawPlan) -> Self {
        plan.steps
    }
}
