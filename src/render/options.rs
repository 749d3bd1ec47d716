//! Render options and configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::font::DEFAULT_FONT_TIMEOUT;
use crate::layout::{resolve_scale, PagingMode};
use crate::model::{FontFaceDescriptor, Fragment, Margins, PageGeometry, PageSize};

/// Options for one render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Whether the planner opens new pages
    pub paging: PagingMode,

    /// Font faces to load before rasterization
    pub font_faces: Vec<FontFaceDescriptor>,

    /// Explicit points-per-pixel scale
    pub scale: Option<f64>,

    /// Target output width in points
    pub width_pt: Option<f64>,

    /// Rasterizer window width in pixels
    pub window_width_px: Option<f64>,

    /// Page margins in points
    pub margins: Margins,

    /// Extra horizontal offset inside the content box, in points
    pub x_pt: f64,

    /// Page size of documents created by the convenience entry points
    pub page_size: PageSize,

    /// Bound on each font face load
    #[serde(with = "millis")]
    pub font_timeout: Duration,

    /// Map draw instructions on the rayon pool
    pub parallel: bool,

    /// Check the plan covers every fragment before drawing
    pub verify_plan: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            paging: PagingMode::Auto,
            font_faces: Vec::new(),
            scale: None,
            width_pt: None,
            window_width_px: None,
            margins: Margins::default(),
            x_pt: 0.0,
            page_size: PageSize::default(),
            font_timeout: DEFAULT_FONT_TIMEOUT,
            parallel: true,
            verify_plan: true,
        }
    }
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paging mode.
    pub fn with_paging(mut self, paging: PagingMode) -> Self {
        self.paging = paging;
        self
    }

    /// Add a font face.
    pub fn with_font_face(mut self, face: FontFaceDescriptor) -> Self {
        self.font_faces.push(face);
        self
    }

    /// Replace the font face list.
    pub fn with_font_faces(mut self, faces: Vec<FontFaceDescriptor>) -> Self {
        self.font_faces = faces;
        self
    }

    /// Set an explicit scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the output width in points.
    pub fn with_width(mut self, width_pt: f64) -> Self {
        self.width_pt = Some(width_pt);
        self
    }

    /// Set the rasterizer window width in pixels.
    pub fn with_window_width(mut self, window_width_px: f64) -> Self {
        self.window_width_px = Some(window_width_px);
        self
    }

    /// Set the page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Set the horizontal offset.
    pub fn with_x_offset(mut self, x_pt: f64) -> Self {
        self.x_pt = x_pt;
        self
    }

    /// Set the page size for newly created documents.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the per-face font timeout.
    pub fn with_font_timeout(mut self, timeout: Duration) -> Self {
        self.font_timeout = timeout;
        self
    }

    /// Enable or disable parallel mapping.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable plan verification.
    pub fn with_verify_plan(mut self, verify: bool) -> Self {
        self.verify_plan = verify;
        self
    }

    /// Geometry for a document whose pages are `size`.
    pub fn geometry(&self, size: PageSize) -> PageGeometry {
        PageGeometry::new(size, self.margins)
    }

    /// Resolve the points-per-pixel scale for `fragments`.
    pub fn resolve_scale(&self, fragments: &[Fragment], geometry: &PageGeometry) -> Result<f64> {
        resolve_scale(
            self.scale,
            self.width_pt,
            self.window_width_px,
            fragments,
            geometry,
        )
    }

    /// Validate options that do not depend on the document.
    pub fn validate(&self) -> Result<()> {
        let m = &self.margins;
        if [m.top, m.right, m.bottom, m.left, self.x_pt]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(Error::InvalidOptions(
                "margins and x offset must be finite and non-negative".to_string(),
            ));
        }
        if self.font_timeout.is_zero() && !self.font_faces.is_empty() {
            return Err(Error::InvalidOptions(
                "font timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
