//! The render pipeline: fonts, rasterization, pagination, drawing.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::options::RenderOptions;
use super::rasterizer::{RasterConstraints, Rasterizer, RenderSource};
use super::writer::{DocumentWriter, RasterSlice};
use crate::error::{Error, Result};
use crate::font::{
    FontLoadReport, FontRegistry, FontResolver, FontSourceLoader, FontSubsystem, FsFontLoader,
};
use crate::layout::{CoordinateMapper, PageBreakPlan, PagingMode, Planner};
use crate::model::check_fragments;

/// Pipeline state of a render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    Idle,
    LoadingFonts,
    Rasterizing,
    Paginating,
    Drawing,
    Done,
    Failed,
}

impl RenderState {
    /// Check if the state ends a call.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderState::Done | RenderState::Failed)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderState::Idle => "idle",
            RenderState::LoadingFonts => "loading_fonts",
            RenderState::Rasterizing => "rasterizing",
            RenderState::Paginating => "paginating",
            RenderState::Drawing => "drawing",
            RenderState::Done => "done",
            RenderState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a successful render call did.
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    /// States visited, starting with `Idle` and ending with `Done`
    pub transitions: Vec<RenderState>,

    pub fonts: FontLoadReport,

    pub plan: PageBreakPlan,

    /// Pages appended to the document
    pub pages_added: usize,

    /// `draw_image` calls issued
    pub draw_calls: usize,
}

/// Result of [`Renderer::render_async`]: the document is handed back
/// together with the outcome, including after a failure.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct Completion<D> {
    pub document: D,
    pub report: Result<RenderReport>,
}

/// Records state transitions of one call.
struct StateTracker {
    transitions: Vec<RenderState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            transitions: vec![RenderState::Idle],
        }
    }

    fn current(&self) -> RenderState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(RenderState::Idle)
    }

    fn enter(&mut self, next: RenderState) {
        log::debug!("Render state {} -> {}", self.current(), next);
        self.transitions.push(next);
    }
}

/// Drives a render call through its states.
///
/// Holds the long-lived collaborators: the rasterizer, the font subsystem
/// and the font transport. Cloning is cheap and clones share them.
#[derive(Clone)]
pub struct Renderer {
    rasterizer: Arc<dyn Rasterizer>,
    fonts: Arc<dyn FontSubsystem>,
    loader: Arc<dyn FontSourceLoader>,
}

impl Renderer {
    /// Create a renderer with an in-memory font registry and filesystem font loading.
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            rasterizer,
            fonts: Arc::new(FontRegistry::new()),
            loader: Arc::new(FsFontLoader::new()),
        }
    }

    /// Use a different font subsystem.
    pub fn with_font_subsystem(mut self, fonts: Arc<dyn FontSubsystem>) -> Self {
        self.fonts = fonts;
        self
    }

    /// Use a different font transport.
    pub fn with_font_loader(mut self, loader: Arc<dyn FontSourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// The font subsystem faces are registered with.
    pub fn fonts(&self) -> &Arc<dyn FontSubsystem> {
        &self.fonts
    }

    /// Render `source` into `doc`.
    ///
    /// On failure, pages drawn before the failing step stay in the document.
    pub fn render<D>(
        &self,
        source: &RenderSource,
        options: &RenderOptions,
        doc: &mut D,
    ) -> Result<RenderReport>
    where
        D: DocumentWriter + ?Sized,
    {
        let mut tracker = StateTracker::new();
        match self.run(source, options, doc, &mut tracker) {
            Ok(mut report) => {
                tracker.enter(RenderState::Done);
                log::info!(
                    "Rendered {} entries onto {} pages ({} added), {} of {} fonts loaded",
                    report.plan.len(),
                    report.plan.pages_spanned(),
                    report.pages_added,
                    report.fonts.loaded.len(),
                    options.font_faces.len()
                );
                report.transitions = tracker.transitions;
                Ok(report)
            }
            Err(e) => {
                let failed_in = tracker.current();
                tracker.enter(RenderState::Failed);
                log::debug!("Render failed while {}: {}", failed_in, e);
                Err(e)
            }
        }
    }

    /// Render and deliver the outcome to `on_complete` exactly once.
    pub fn render_with<D, F, R>(
        &self,
        source: &RenderSource,
        options: &RenderOptions,
        doc: &mut D,
        on_complete: F,
    ) -> R
    where
        D: DocumentWriter + ?Sized,
        F: FnOnce(&mut D, Result<RenderReport>) -> R,
    {
        let outcome = self.render(source, options, doc);
        on_complete(doc, outcome)
    }

    /// Render on tokio's blocking pool.
    ///
    /// The outer error only reports a lost worker task; the render outcome
    /// is in [`Completion::report`].
    #[cfg(feature = "async")]
    pub async fn render_async<D>(
        &self,
        source: RenderSource,
        options: RenderOptions,
        mut document: D,
    ) -> Result<Completion<D>>
    where
        D: DocumentWriter + Send + 'static,
    {
        let renderer = self.clone();
        tokio::task::spawn_blocking(move || {
            let report = renderer.render(&source, &options, &mut document);
            Completion { document, report }
        })
        .await
        .map_err(|e| Error::Other(format!("render task failed: {}", e)))
    }

    fn run<D>(
        &self,
        source: &RenderSource,
        options: &RenderOptions,
        doc: &mut D,
        tracker: &mut StateTracker,
    ) -> Result<RenderReport>
    where
        D: DocumentWriter + ?Sized,
    {
        options.validate()?;
        let geometry = options.geometry(doc.page_size());

        tracker.enter(RenderState::LoadingFonts);
        let fonts = FontResolver::new(Arc::clone(&self.loader))
            .with_timeout(options.font_timeout)
            .resolve(&options.font_faces, self.fonts.as_ref());

        tracker.enter(RenderState::Rasterizing);
        let constraints = RasterConstraints {
            window_width_px: options.window_width_px,
            content_width_pt: geometry.content_width(),
        };
        let fragments = self
            .rasterizer
            .rasterize(source, &constraints, self.fonts.as_ref())?;
        check_fragments(&fragments)?;

        tracker.enter(RenderState::Paginating);
        let scale = options.resolve_scale(&fragments, &geometry)?;
        let plan = Planner::new(geometry, options.paging, scale)?
            .plan(&fragments, doc.current_cursor())?;
        if options.verify_plan {
            plan.verify(&fragments)?;
        }
        let draws = CoordinateMapper::new(geometry, scale)
            .with_x_offset(options.x_pt)
            .map_plan(&plan, &fragments, options.parallel)?;

        tracker.enter(RenderState::Drawing);
        if options.paging == PagingMode::None
            && !plan.is_empty()
            && plan.start_cursor.page_index >= doc.page_count()
        {
            return Err(Error::DocumentWrite(format!(
                "page {} does not exist and paging is none",
                plan.start_cursor.page_index
            )));
        }

        let mut pages_added = 0;
        let mut draw_calls = 0;
        for draw in &draws {
            while doc.page_count() <= draw.page_index {
                doc.add_page()?;
                pages_added += 1;
            }
            let slice = RasterSlice::crop(
                draw.fragment_index,
                &fragments[draw.fragment_index].raster,
                draw.source,
            );
            doc.draw_image(
                draw.page_index,
                draw.x_pt,
                draw.y_pt,
                draw.width_pt,
                draw.height_pt,
                slice,
            )?;
            draw_calls += 1;
        }
        if !plan.is_empty() {
            doc.set_cursor(plan.final_cursor)?;
        }

        Ok(RenderReport {
            transitions: Vec::new(),
            fonts,
            plan,
            pages_added,
            draw_calls,
        })
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}
