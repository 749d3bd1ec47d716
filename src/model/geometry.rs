//! Page geometry and the document cursor.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Physical page size in points (1 point = 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// Create a page size from width and height in points.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// ISO A4 (210 x 297 mm).
    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }

    /// US Letter (8.5 x 11 inches).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::a4()
    }
}

impl FromStr for PageSize {
    type Err = String;

    /// Parse `a4`, `letter`, or `WIDTHxHEIGHT` in points.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "a4" => return Ok(Self::a4()),
            "letter" => return Ok(Self::letter()),
            _ => {}
        }

        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("Invalid page size: {}", s))?;
        let width: f64 = w.trim().parse().map_err(|_| "Invalid page width")?;
        let height: f64 = h.trim().parse().map_err(|_| "Invalid page height")?;
        if width <= 0.0 || height <= 0.0 {
            return Err(format!("Page size must be positive: {}", s));
        }
        Ok(Self::new(width, height))
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    /// Same margin on all four sides.
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Sum of left and right margins.
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom margins.
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Geometry of every page touched by one render call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub size: PageSize,
    pub margins: Margins,
}

impl PageGeometry {
    /// Create a geometry from a page size and margins.
    pub fn new(size: PageSize, margins: Margins) -> Self {
        Self { size, margins }
    }

    /// Page width in points.
    pub fn width(&self) -> f64 {
        self.size.width
    }

    /// Page height in points.
    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Width available for content.
    pub fn content_width(&self) -> f64 {
        self.size.width - self.margins.horizontal()
    }

    /// Height available for content; the planner fills pages up to this.
    pub fn content_height(&self) -> f64 {
        self.size.height - self.margins.vertical()
    }
}

/// Current page and vertical offset of a document.
///
/// `y` is measured in points from the top of the page's content box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentCursor {
    pub page_index: usize,
    pub y: f64,
}

impl DocumentCursor {
    /// Create a cursor.
    pub fn new(page_index: usize, y: f64) -> Self {
        Self { page_index, y }
    }

    /// Cursor at the top of the given page.
    pub fn top_of(page_index: usize) -> Self {
        Self::new(page_index, 0.0)
    }
}
