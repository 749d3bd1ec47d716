//! # dompage
//!
//! Paginates rasterized DOM content onto fixed-size document pages.
//!
//! A render call loads the declared `@font-face` rules, asks a rasterizer
//! for an ordered list of fragments, decides where every fragment lands
//! and draws it through a document writer. Consecutive calls on the same
//! document continue from where the previous call stopped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dompage::{DomPage, FragmentListRasterizer, PagedDocument, PageSize, RenderSource};
//!
//! fn main() -> dompage::Result<()> {
//!     let rasterizer = FragmentListRasterizer::from_path("fragments.json")?;
//!     let mut doc = PagedDocument::new(PageSize::a4());
//!
//!     let report = DomPage::new()
//!         .with_margins(dompage::Margins::uniform(36.0))
//!         .render(Arc::new(rasterizer), &RenderSource::Html("<p>hi</p>".into()), &mut doc)?;
//!
//!     println!("{} pages, {} draws", doc.pages().len(), report.draw_calls);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Paging modes**: `auto` opens pages as content fills them, `none`
//!   stays on the current page
//! - **Split and atomic fragments**: tall splittable fragments are sliced
//!   across pages, atomic ones get a page of their own
//! - **Parallel font loading** with a per-face timeout
//! - **Parallel coordinate mapping** using Rayon
//! - **Async entry point** behind the `async` feature

pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// Re-export commonly used types
pub use error::{Error, Result};
pub use font::{
    FontHandle, FontLoadReport, FontRegistry, FontResolver, FontSourceLoader, FontSubsystem,
    FsFontLoader,
};
pub use layout::{
    CoordinateMapper, DrawInstruction, PageBreakPlan, PagingMode, PixelClip, PlanEntry, Planner,
};
pub use model::{
    check_fragments, DocumentCursor, FontFaceDescriptor, FontFormat, FontKey, FontSource,
    FontStretch, FontStyle, FontWeight, Fragment, Margins, PageGeometry, PageSize, PixelRect,
    RasterData,
};
pub use render::{
    DocumentWriter, FragmentListRasterizer, PagedDocument, RasterConstraints, Rasterizer,
    RenderOptions, RenderReport, RenderSource, RenderState, Renderer,
};

/// Render `source` into `doc` with a fresh [`Renderer`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dompage::{render_document, FragmentListRasterizer, PagedDocument, RenderOptions, RenderSource};
///
/// let rasterizer = Arc::new(FragmentListRasterizer::from_path("fragments.json").unwrap());
/// let mut doc = PagedDocument::default();
/// let source = RenderSource::Node("#report".to_string());
/// render_document(rasterizer, &source, &RenderOptions::default(), &mut doc).unwrap();
/// ```
pub fn render_document<D>(
    rasterizer: Arc<dyn Rasterizer>,
    source: &RenderSource,
    options: &RenderOptions,
    doc: &mut D,
) -> Result<RenderReport>
where
    D: DocumentWriter + ?Sized,
{
    Renderer::new(rasterizer).render(source, options, doc)
}

/// Plan `fragments` without drawing anything.
///
/// Uses the same geometry and scale resolution as a render call on a
/// document whose pages are `page_size` and whose cursor is `start`.
pub fn plan_fragments(
    fragments: &[Fragment],
    options: &RenderOptions,
    page_size: PageSize,
    start: DocumentCursor,
) -> Result<PageBreakPlan> {
    options.validate()?;
    check_fragments(fragments)?;
    let geometry = options.geometry(page_size);
    let scale = options.resolve_scale(fragments, &geometry)?;
    let plan = Planner::new(geometry, options.paging, scale)?.plan(fragments, start)?;
    if options.verify_plan {
        plan.verify(fragments)?;
    }
    Ok(plan)
}

/// Builder for render calls.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dompage::{DomPage, FontFaceDescriptor, FragmentListRasterizer, PagingMode};
///
/// let result = DomPage::new()
///     .with_paging(PagingMode::Auto)
///     .with_font_face(FontFaceDescriptor::new("Roboto").with_source("Roboto-Regular.ttf", None))
///     .with_font_dir("assets/fonts")
///     .sequential()
///     .render_new(
///         Arc::new(FragmentListRasterizer::from_path("fragments.json").unwrap()),
///         &dompage::RenderSource::Html("<h1>Report</h1>".into()),
///     )
///     .unwrap();
/// println!("{}", result.document.pages().len());
/// ```
#[derive(Clone)]
pub struct DomPage {
    options: RenderOptions,
    font_dir: Option<PathBuf>,
    fonts: Option<Arc<dyn FontSubsystem>>,
}

impl DomPage {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self {
            options: RenderOptions::default(),
            font_dir: None,
            fonts: None,
        }
    }

    /// Start from existing options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the paging mode.
    pub fn with_paging(mut self, paging: PagingMode) -> Self {
        self.options.paging = paging;
        self
    }

    /// Declare a font face.
    pub fn with_font_face(mut self, face: FontFaceDescriptor) -> Self {
        self.options.font_faces.push(face);
        self
    }

    /// Resolve relative font URLs against `dir`.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = Some(dir.into());
        self
    }

    /// Register fonts with a shared font subsystem.
    pub fn with_font_subsystem(mut self, fonts: Arc<dyn FontSubsystem>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    /// Set the per-face font timeout.
    pub fn with_font_timeout(mut self, timeout: Duration) -> Self {
        self.options.font_timeout = timeout;
        self
    }

    /// Set an explicit scale in points per pixel.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.options.scale = Some(scale);
        self
    }

    /// Set the output width in points.
    pub fn with_width(mut self, width_pt: f64) -> Self {
        self.options.width_pt = Some(width_pt);
        self
    }

    /// Set page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.options.margins = margins;
        self
    }

    /// Set the page size of documents created by [`DomPage::render_new`].
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.options.page_size = size;
        self
    }

    /// Disable parallel coordinate mapping.
    pub fn sequential(mut self) -> Self {
        self.options.parallel = false;
        self
    }

    /// Current options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Build a renderer around `rasterizer`.
    pub fn renderer(&self, rasterizer: Arc<dyn Rasterizer>) -> Renderer {
        let mut loader = FsFontLoader::new();
        if let Some(dir) = &self.font_dir {
            loader = loader.with_base_dir(dir);
        }
        let renderer = Renderer::new(rasterizer).with_font_loader(Arc::new(loader));
        match &self.fonts {
            Some(fonts) => renderer.with_font_subsystem(Arc::clone(fonts)),
            None => renderer,
        }
    }

    /// Render into an existing document.
    pub fn render<D>(
        &self,
        rasterizer: Arc<dyn Rasterizer>,
        source: &RenderSource,
        doc: &mut D,
    ) -> Result<RenderReport>
    where
        D: DocumentWriter + ?Sized,
    {
        self.renderer(rasterizer).render(source, &self.options, doc)
    }

    /// Render into a new [`PagedDocument`].
    pub fn render_new(
        &self,
        rasterizer: Arc<dyn Rasterizer>,
        source: &RenderSource,
    ) -> Result<DomPageResult> {
        let mut document = PagedDocument::new(self.options.page_size);
        let report = self.render(rasterizer, source, &mut document)?;
        Ok(DomPageResult { document, report })
    }
}

impl Default for DomPage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DomPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomPage")
            .field("options", &self.options)
            .field("font_dir", &self.font_dir)
            .finish_non_exhaustive()
    }
}

/// Result of [`DomPage::render_new`].
#[derive(Debug, Clone)]
pub struct DomPageResult {
    /// The rendered document
    pub document: PagedDocument,
    /// What the render call did
    pub report: RenderReport,
}

impl DomPageResult {
    /// Serialize the document to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        self.document.to_json(pretty)
    }
}
