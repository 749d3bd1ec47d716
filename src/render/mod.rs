//! Rendering: the collaborator seams and the pipeline that drives them.
//!
//! A render call loads the declared fonts, asks the [`Rasterizer`] for
//! fragments, plans page breaks and issues one [`DocumentWriter::draw_image`]
//! call per plan entry.

mod options;
mod orchestrator;
mod rasterizer;
mod writer;

pub use options::RenderOptions;
#[cfg(feature = "async")]
pub use orchestrator::Completion;
pub use orchestrator::{RenderReport, RenderState, Renderer};
pub use rasterizer::{FragmentListRasterizer, RasterConstraints, Rasterizer, RenderSource};
pub use writer::{DocumentWriter, DrawRecord, Page, PagedDocument, RasterSlice};
