//! The compositor: drives one composition from encoded images to a committed
//! surface.
//!
//! A composition runs `Idle -> Loading -> Decoded -> Composed`. A decode or
//! draw failure goes through `Failed` back to `Idle` without touching the
//! surface; only the `Decoded -> Composed` step writes to it.

use crate::loader::{load_images, DecodedImage, SourceImage};
use crate::rendering::export::{export_png, ExportedImage};
use crate::rendering::layout::{layout_grid, Cell, GridSpec};
use crate::rendering::paint::{DrawPlan, PaintStyle};
use crate::rendering::raster::{rasterize, RenderSurface};
use crate::{CollageConfig, Error, Result};
use log::{debug, info, warn};
use resvg::tiny_skia::Pixmap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionState {
    Idle,
    Loading,
    Decoded,
    Failed,
    Composed,
}

impl CompositionState {
    pub fn can_transition_to(self, next: CompositionState) -> bool {
        use CompositionState::*;
        matches!(
            (self, next),
            (Idle, Loading)
                | (Loading, Decoded)
                | (Loading, Failed)
                | (Decoded, Composed)
                | (Decoded, Failed)
                | (Failed, Idle)
                | (Composed, Idle)
        )
    }
}

/// Everything the collaborator hands over for one composition.
#[derive(Debug, Clone)]
pub struct CollageRequest {
    pub images: Vec<SourceImage>,
    pub style: String,
    pub prompts: Vec<String>,
    pub grid: GridSpec,
}

impl CollageRequest {
    pub fn new(images: Vec<SourceImage>, style: impl Into<String>, grid: GridSpec) -> Self {
        Self {
            images,
            style: style.into(),
            prompts: Vec::new(),
            grid,
        }
    }

    pub fn with_prompts(mut self, prompts: Vec<String>) -> Self {
        self.prompts = prompts;
        self
    }
}

/// Metadata of a finished composition. The pixels live in the surface the
/// composition was committed to.
#[derive(Debug, Clone, PartialEq)]
pub struct CollageArtifact {
    pub style: String,
    pub prompts: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub cells: Vec<Cell>,
    /// Surface generation this artifact was committed as
    pub generation: u64,
}

impl CollageArtifact {
    /// Export the pixels of this composition from `surface`.
    ///
    /// Rejected when the surface has since been recomposed, because the pixels
    /// would no longer belong to this artifact.
    pub fn export(&self, surface: &RenderSurface, file_name: &str) -> Result<ExportedImage> {
        if surface.generation() != self.generation {
            return Err(Error::ExportError(format!(
                "artifact is stale: surface is at generation {}, artifact was {}",
                surface.generation(),
                self.generation
            )));
        }
        export_png(surface, file_name)
    }
}

pub struct Compositor {
    style: PaintStyle,
    state: CompositionState,
}

impl Compositor {
    pub fn new(style: PaintStyle) -> Self {
        Self {
            style,
            state: CompositionState::Idle,
        }
    }

    pub fn from_config(config: &CollageConfig) -> Self {
        Self::new(config.paint_style())
    }

    pub fn style(&self) -> &PaintStyle {
        &self.style
    }

    pub fn state(&self) -> CompositionState {
        self.state
    }

    fn transition(&mut self, next: CompositionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("composition state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: Error) -> Error {
        warn!("composition failed: {}", err);
        self.transition(CompositionState::Failed);
        self.transition(CompositionState::Idle);
        err
    }

    fn draw(&self, request: &CollageRequest, images: &[DecodedImage]) -> Result<(Pixmap, Vec<Cell>)> {
        let cells = layout_grid(&request.grid, images.len())?;
        let sizes: Vec<(u32, u32)> = images.iter().map(|i| (i.width(), i.height())).collect();
        let plan = DrawPlan::build(&cells, &sizes, &self.style, &request.style)?;
        let pixmap = rasterize(
            &plan,
            images,
            request.grid.canvas_width,
            request.grid.canvas_height,
        )?;
        Ok((pixmap, cells))
    }

    /// Compose `request` onto `surface`.
    ///
    /// On success the surface holds the new collage (resized to the grid's
    /// canvas). On any error the surface is left exactly as it was.
    pub async fn compose(
        &mut self,
        surface: &mut RenderSurface,
        request: &CollageRequest,
    ) -> Result<CollageArtifact> {
        if self.state != CompositionState::Idle {
            debug!("starting a fresh composition from {:?}", self.state);
            self.state = CompositionState::Idle;
        }

        // Reported before any decode starts.
        request.grid.validate(request.images.len())?;

        self.transition(CompositionState::Loading);
        let images = match load_images(&request.images).await {
            Ok(images) => images,
            Err(e) => return Err(self.fail(e)),
        };
        self.transition(CompositionState::Decoded);

        let (pixmap, cells) = match self.draw(request, &images) {
            Ok(drawn) => drawn,
            Err(e) => return Err(self.fail(e)),
        };

        let generation = surface.commit(pixmap);
        self.transition(CompositionState::Composed);
        info!(
            "composed {} images into {}x{} collage '{}' (generation {})",
            cells.len(),
            surface.width(),
            surface.height(),
            request.style,
            generation
        );

        Ok(CollageArtifact {
            style: request.style.clone(),
            prompts: request.prompts.clone(),
            width: surface.width(),
            height: surface.height(),
            cells,
            generation,
        })
    }

    /// Blocking wrapper around `compose` for synchronous callers.
    ///
    /// Spins up a dedicated runtime. Inside an async context use `compose`
    /// instead; calling this there is an error.
    pub fn compose_blocking(
        &mut self,
        surface: &mut RenderSurface,
        request: &CollageRequest,
    ) -> Result<CollageArtifact> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::RenderError(
                "compose_blocking called from inside an async runtime; await compose instead".into(),
            ));
        }
        let threads = num_cpus::get().max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads.min(4))
            .max_blocking_threads(threads)
            .build()
            .map_err(|e| Error::RenderError(format!("Failed to start decode runtime: {}", e)))?;
        runtime.block_on(self.compose(surface, request))
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(PaintStyle::default())
    }
}
