//! Document writer seam and the in-memory paged document.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{DocumentCursor, PageSize, PixelRect, RasterData};

/// Pixel band of one fragment handed to [`DocumentWriter::draw_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSlice {
    pub fragment_index: usize,

    /// Region of the fragment raster, in pixels
    pub source: PixelRect,

    /// Rows of the region; un-materialized when the fragment had no pixels
    pub raster: RasterData,
}

impl RasterSlice {
    /// Cut `source` out of `raster`.
    pub fn crop(fragment_index: usize, raster: &RasterData, source: PixelRect) -> Self {
        let top = source.y.max(0.0).floor() as u32;
        let bottom = source.bottom().max(0.0).ceil() as u32;
        Self {
            fragment_index,
            source,
            raster: raster.crop_rows(top, bottom),
        }
    }
}

/// The paged document being rendered into.
///
/// All pages share one size. The cursor records where the next content
/// goes and is carried between render calls.
pub trait DocumentWriter {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Index of the current page.
    fn current_page_index(&self) -> usize;

    /// Current page and vertical offset.
    fn current_cursor(&self) -> DocumentCursor;

    /// Size shared by all pages.
    fn page_size(&self) -> PageSize;

    /// Append a page, make it current and return its index.
    fn add_page(&mut self) -> Result<usize>;

    /// Draw an image on page `page_index` at `(x, y)` with size `width` x `height` points.
    fn draw_image(
        &mut self,
        page_index: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        slice: RasterSlice,
    ) -> Result<()>;

    /// Move the cursor, typically to where a render call ended.
    fn set_cursor(&mut self, cursor: DocumentCursor) -> Result<()>;
}

/// A recorded `draw_image` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub fragment_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub source: PixelRect,

    /// Size of the pixel payload that was drawn
    #[serde(default)]
    pub bytes: usize,
}

/// One page of a [`PagedDocument`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub draws: Vec<DrawRecord>,
}

impl Page {
    /// Check if nothing was drawn on the page.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

/// In-memory [`DocumentWriter`] that records every draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedDocument {
    size: PageSize,
    cursor: DocumentCursor,
    pages: Vec<Page>,
}

impl PagedDocument {
    /// Create a document with one blank page.
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            cursor: DocumentCursor::default(),
            pages: vec![Page::default()],
        }
    }

    /// Create a document without pages.
    pub fn empty(size: PageSize) -> Self {
        Self {
            size,
            cursor: DocumentCursor::default(),
            pages: Vec::new(),
        }
    }

    /// All pages.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page by index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Total draw calls across pages.
    pub fn draw_count(&self) -> usize {
        self.pages.iter().map(|p| p.draws.len()).sum()
    }

    /// Serialize to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    fn check_page(&self, page_index: usize) -> Result<()> {
        if page_index < self.pages.len() {
            Ok(())
        } else {
            Err(Error::DocumentWrite(format!(
                "page {} does not exist (document has {} pages)",
                page_index,
                self.pages.len()
            )))
        }
    }
}

impl Default for PagedDocument {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl DocumentWriter for PagedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current_page_index(&self) -> usize {
        self.cursor.page_index
    }

    fn current_cursor(&self) -> DocumentCursor {
        self.cursor
    }

    fn page_size(&self) -> PageSize {
        self.size
    }

    fn add_page(&mut self) -> Result<usize> {
        self.pages.push(Page::default());
        let index = self.pages.len() - 1;
        self.cursor = DocumentCursor::top_of(index);
        Ok(index)
    }

    fn draw_image(
        &mut self,
        page_index: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        slice: RasterSlice,
    ) -> Result<()> {
        self.check_page(page_index)?;
        self.pages[page_index].draws.push(DrawRecord {
            fragment_index: slice.fragment_index,
            x,
            y,
            width,
            height,
            source: slice.source,
            bytes: slice.raster.pixels.len(),
        });
        Ok(())
    }

    fn set_cursor(&mut self, cursor: DocumentCursor) -> Result<()> {
        self.check_page(cursor.page_index)?;
        self.cursor = cursor;
        Ok(())
    }
}
