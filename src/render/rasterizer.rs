//! Rasterizer seam and the fragment-list replayer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::font::FontSubsystem;
use crate::model::{check_fragments, Fragment};

/// Content handed to the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RenderSource {
    /// An HTML string
    Html(String),
    /// A reference to an already-attached DOM node
    Node(String),
}

impl RenderSource {
    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            RenderSource::Html(html) => format!("html ({} bytes)", html.len()),
            RenderSource::Node(id) => format!("node '{}'", id),
        }
    }
}

/// Layout constraints passed to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RasterConstraints {
    /// Window width in pixels, when the caller fixed one
    pub window_width_px: Option<f64>,

    /// Width of the page content box in points
    pub content_width_pt: f64,
}

/// Turns a render source into ordered fragments.
///
/// Implementations must only be called after fonts are resolved; they read
/// registered faces from `fonts` while measuring text.
pub trait Rasterizer: Send + Sync {
    /// Rasterize `source` into fragments in document order.
    fn rasterize(
        &self,
        source: &RenderSource,
        constraints: &RasterConstraints,
        fonts: &dyn FontSubsystem,
    ) -> Result<Vec<Fragment>>;
}

/// One fragment entry of a manifest.
#[derive(Debug, Clone, Deserialize)]
struct ManifestFragment {
    width: f64,
    height: f64,
    #[serde(default)]
    atomic: bool,
    #[serde(default)]
    offset: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    fragments: Vec<ManifestFragment>,
}

/// Rasterizer that replays a fixed fragment list.
///
/// Used for manifests produced by an external layout engine and for
/// driving the pipeline in tests. The render source is not inspected.
#[derive(Debug, Clone, Default)]
pub struct FragmentListRasterizer {
    fragments: Vec<Fragment>,
}

impl FragmentListRasterizer {
    /// Replay `fragments`.
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    /// Parse a `{"fragments": [{"width", "height", "atomic", "offset"}]}` manifest.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)?;
        let fragments: Vec<Fragment> = manifest
            .fragments
            .into_iter()
            .map(|entry| {
                Fragment::new(entry.width, entry.height)
                    .with_atomic(entry.atomic)
                    .with_offset(entry.offset)
            })
            .collect();
        check_fragments(&fragments)?;
        Ok(Self::new(fragments))
    }

    /// Read a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Fragments that will be replayed.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }
}

impl Rasterizer for FragmentListRasterizer {
    fn rasterize(
        &self,
        source: &RenderSource,
        _constraints: &RasterConstraints,
        _fonts: &dyn FontSubsystem,
    ) -> Result<Vec<Fragment>> {
        log::debug!(
            "Replaying {} fragments for {}",
            self.fragments.len(),
            source.describe()
        );
        Ok(self.fragments.clone())
    }
}
