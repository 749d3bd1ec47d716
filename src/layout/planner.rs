//! Page-break planning.
//!
//! The planner walks the fragment sequence once, keeping a cursor
//! (page index + vertical offset in the content box), and decides for each
//! fragment where it lands:
//!
//! 1. It fits in the space left on the current page: place it there.
//! 2. It fits on an empty page: open the next page and place it at the top.
//! 3. It is taller than a page and atomic: give it a page of its own and let
//!    it overflow the bottom edge.
//! 4. It is taller than a page and splittable: fill the current page with
//!    its top rows and continue the rest on following pages.
//!
//! In [`PagingMode::None`] only rule 1 exists; content runs past the bottom
//! of the starting page instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::{check_fragments, DocumentCursor, Fragment, PageGeometry};

/// Slack for point/pixel comparisons; absorbs rounding from scaling.
pub const EPSILON: f64 = 1e-6;

/// How the planner treats the bottom of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagingMode {
    /// Open new pages as content fills them
    #[default]
    Auto,
    /// Never open pages; content may run past the page bottom
    #[serde(alias = "manual")]
    None,
}

impl fmt::Display for PagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingMode::Auto => f.write_str("auto"),
            PagingMode::None => f.write_str("none"),
        }
    }
}

impl FromStr for PagingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(PagingMode::Auto),
            "none" | "manual" => Ok(PagingMode::None),
            other => Err(format!("Invalid paging mode: {}", other)),
        }
    }
}

/// Source rows of a fragment drawn by one plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelClip {
    pub top_px: f64,
    pub bottom_px: f64,
}

impl PixelClip {
    /// Height of the clipped band in pixels.
    pub fn height_px(&self) -> f64 {
        self.bottom_px - self.top_px
    }
}

/// Placement of one fragment, or one slice of a split fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Index into the fragment sequence
    pub fragment_index: usize,

    /// Page the entry is drawn on
    pub page_index: usize,

    /// Offset from the top of the page's content box, in points
    pub y: f64,

    /// Drawn height in points
    pub height: f64,

    /// Source rows when the fragment is split across pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<PixelClip>,
}

impl PlanEntry {
    /// Whether this entry draws only part of its fragment.
    pub fn is_slice(&self) -> bool {
        self.clip.is_some()
    }
}

/// Ordered page-break decisions for one render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBreakPlan {
    pub mode: PagingMode,

    /// Points per rasterizer pixel
    pub scale: f64,

    /// Document cursor when planning started
    pub start_cursor: DocumentCursor,

    /// Document cursor after the last entry
    pub final_cursor: DocumentCursor,

    pub entries: Vec<PlanEntry>,
}

impl PageBreakPlan {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the plan draws nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct pages the plan touches.
    pub fn pages_spanned(&self) -> usize {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => last.page_index - first.page_index + 1,
            _ => 0,
        }
    }

    /// Pages the plan moves past the starting page.
    pub fn pages_advanced(&self) -> usize {
        self.final_cursor.page_index - self.start_cursor.page_index
    }

    /// Entries placed on `page_index`.
    pub fn entries_on_page(&self, page_index: usize) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.page_index == page_index)
    }

    /// Check that the plan reconstructs `fragments` exactly.
    ///
    /// Every fragment must be covered, in order, by a contiguous run of
    /// entries whose clips tile its full height; page indices never
    /// decrease; in [`PagingMode::None`] every entry stays on the start page.
    pub fn verify(&self, fragments: &[Fragment]) -> Result<()> {
        let mut entries = self.entries.iter().peekable();
        let mut last_page = self.start_cursor.page_index;

        for (index, fragment) in fragments.iter().enumerate() {
            let tolerance = EPSILON * fragment.height_px.abs().max(1.0);
            let mut covered = 0.0;
            let mut seen = 0usize;

            while let Some(entry) = entries.next_if(|e| e.fragment_index == index) {
                if entry.page_index < last_page {
                    return Err(Error::PaginationInvariant(format!(
                        "fragment {} moves back from page {} to page {}",
                        index, last_page, entry.page_index
                    )));
                }
                if self.mode == PagingMode::None
                    && entry.page_index != self.start_cursor.page_index
                {
                    return Err(Error::PaginationInvariant(format!(
                        "fragment {} left the start page in paging mode none",
                        index
                    )));
                }
                last_page = entry.page_index;

                match entry.clip {
                    None if seen == 0 => covered = fragment.height_px,
                    None => {
                        return Err(Error::PaginationInvariant(format!(
                            "fragment {} drawn whole after a slice",
                            index
                        )));
                    }
                    Some(clip) => {
                        if (clip.top_px - covered).abs() > tolerance {
                            return Err(Error::PaginationInvariant(format!(
                                "fragment {} slice starts at {} but {} rows were drawn",
                                index, clip.top_px, covered
                            )));
                        }
                        covered = clip.bottom_px;
                    }
                }
                seen += 1;
            }

            if seen == 0 {
                return Err(Error::PaginationInvariant(format!(
                    "fragment {} has no plan entry",
                    index
                )));
            }
            if (covered - fragment.height_px).abs() > tolerance {
                return Err(Error::PaginationInvariant(format!(
                    "fragment {} covered {} of {} rows",
                    index, covered, fragment.height_px
                )));
            }
        }

        if let Some(extra) = entries.next() {
            return Err(Error::PaginationInvariant(format!(
                "entry for fragment {} is out of order or unknown",
                extra.fragment_index
            )));
        }
        Ok(())
    }
}

/// Decides which page each fragment lands on.
#[derive(Debug, Clone, Copy)]
pub struct Planner {
    geometry: PageGeometry,
    mode: PagingMode,
    scale: f64,
}

impl Planner {
    /// Create a planner.
    ///
    /// Fails when the content box has no height or the scale is not a
    /// positive finite number; either would keep the split loop from
    /// making progress.
    pub fn new(geometry: PageGeometry, mode: PagingMode, scale: f64) -> Result<Self> {
        let content_height = geometry.content_height();
        if !(content_height.is_finite() && content_height > EPSILON) {
            return Err(Error::InvalidOptions(format!(
                "page content height must be positive, got {}",
                content_height
            )));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "scale must be positive, got {}",
                scale
            )));
        }
        Ok(Self {
            geometry,
            mode,
            scale,
        })
    }

    /// Paging mode.
    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    /// Points per pixel.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Plan `fragments` starting at `start`.
    ///
    /// Fails with [`Error::Rasterization`] when a fragment size is negative
    /// or not finite.
    pub fn plan(&self, fragments: &[Fragment], start: DocumentCursor) -> Result<PageBreakPlan> {
        check_fragments(fragments)?;
        let start = DocumentCursor::new(start.page_index, start.y.max(0.0));
        let mut cursor = start;
        let mut entries = Vec::with_capacity(fragments.len());

        for (index, fragment) in fragments.iter().enumerate() {
            match self.mode {
                PagingMode::Auto => self.place_auto(index, fragment, &mut cursor, &mut entries),
                PagingMode::None => {
                    let height = fragment.height_pt(self.scale);
                    entries.push(entry(index, cursor, height, None));
                    cursor.y += height;
                }
            }
        }

        log::debug!(
            "Planned {} fragments into {} entries ({} mode), cursor {:?} -> {:?}",
            fragments.len(),
            entries.len(),
            self.mode,
            start,
            cursor
        );

        Ok(PageBreakPlan {
            mode: self.mode,
            scale: self.scale,
            start_cursor: start,
            final_cursor: cursor,
            entries,
        })
    }

    fn place_auto(
        &self,
        index: usize,
        fragment: &Fragment,
        cursor: &mut DocumentCursor,
        entries: &mut Vec<PlanEntry>,
    ) {
        let page_height = self.geometry.content_height();
        let height = fragment.height_pt(self.scale);
        let remaining = page_height - cursor.y;

        // Exactly filling the page still counts as fitting
        if height <= remaining + EPSILON {
            entries.push(entry(index, *cursor, height, None));
            cursor.y += height;
            return;
        }

        let page_has_content = cursor.y > EPSILON;

        if height <= page_height + EPSILON {
            *cursor = DocumentCursor::top_of(cursor.page_index + 1);
            entries.push(entry(index, *cursor, height, None));
            cursor.y = height;
            return;
        }

        if fragment.atomic {
            if page_has_content {
                *cursor = DocumentCursor::top_of(cursor.page_index + 1);
            }
            log::debug!(
                "Atomic fragment {} ({:.2}pt) overflows page {}",
                index,
                height,
                cursor.page_index
            );
            entries.push(entry(index, *cursor, height, None));
            cursor.y += height;
            return;
        }

        self.split(index, fragment, height, cursor, entries);
    }

    /// Slice a fragment taller than a page across consecutive pages.
    fn split(
        &self,
        index: usize,
        fragment: &Fragment,
        height: f64,
        cursor: &mut DocumentCursor,
        entries: &mut Vec<PlanEntry>,
    ) {
        let page_height = self.geometry.content_height();
        if page_height - cursor.y <= EPSILON {
            *cursor = DocumentCursor::top_of(cursor.page_index + 1);
        }

        let mut top_px = 0.0;
        let mut left = height;

        loop {
            let remaining = page_height - cursor.y;
            if left <= remaining + EPSILON {
                let clip = PixelClip {
                    top_px,
                    bottom_px: fragment.height_px,
                };
                entries.push(entry(index, *cursor, left, Some(clip)));
                cursor.y += left;
                return;
            }

            let bottom_px = (top_px + remaining / self.scale).min(fragment.height_px);
            let clip = PixelClip { top_px, bottom_px };
            entries.push(entry(index, *cursor, remaining, Some(clip)));

            top_px = bottom_px;
            left -= remaining;
            *cursor = DocumentCursor::top_of(cursor.page_index + 1);
        }
    }
}

fn entry(
    fragment_index: usize,
    cursor: DocumentCursor,
    height: f64,
    clip: Option<PixelClip>,
) -> PlanEntry {
    PlanEntry {
        fragment_index,
        page_index: cursor.page_index,
        y: cursor.y,
        height,
        clip,
    }
}
