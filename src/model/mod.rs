//! Data model shared by the planner, the mapper and the collaborators.
//!
//! Fragments come in from the rasterizer in pixel units; geometry and the
//! document cursor are in points. Font descriptors describe `@font-face`
//! rules before they are loaded.

mod font;
mod fragment;
mod geometry;

pub use font::{
    FontFaceDescriptor, FontFormat, FontKey, FontSource, FontStretch, FontStyle, FontWeight,
};
pub use fragment::{check_fragments, Fragment, PixelRect, RasterData};
pub use geometry::{DocumentCursor, Margins, PageGeometry, PageSize};
