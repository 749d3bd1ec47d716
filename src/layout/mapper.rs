//! Pixel-to-point mapping of plan entries.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::planner::{PageBreakPlan, PlanEntry};
use crate::error::{Error, Result};
use crate::model::{Fragment, PageGeometry, PixelRect};

/// CSS reference pixels per point, used when no width information exists.
pub const DEFAULT_SCALE: f64 = 72.0 / 96.0;

/// One `draw_image` call on the document writer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawInstruction {
    pub fragment_index: usize,
    pub page_index: usize,

    /// Left edge on the page, in points
    pub x_pt: f64,

    /// Top edge on the page, in points
    pub y_pt: f64,

    pub width_pt: f64,
    pub height_pt: f64,

    /// Region of the fragment raster to draw
    pub source: PixelRect,
}

/// Resolve the points-per-pixel scale for a render call.
///
/// Order: an explicit `scale`; otherwise the target output width (or the
/// page content width) divided by the rasterizer window width. The window
/// width defaults to the right edge of the widest fragment.
pub fn resolve_scale(
    scale: Option<f64>,
    width_pt: Option<f64>,
    window_width_px: Option<f64>,
    fragments: &[Fragment],
    geometry: &PageGeometry,
) -> Result<f64> {
    if let Some(scale) = scale {
        return check_positive("scale", scale);
    }

    let window = match window_width_px {
        Some(window) => check_positive("window width", window)?,
        None => {
            let widest = fragments
                .iter()
                .map(|f| f.offset_px + f.width_px)
                .fold(0.0_f64, f64::max);
            if widest <= 0.0 {
                return Ok(DEFAULT_SCALE);
            }
            widest
        }
    };

    let output = width_pt.unwrap_or_else(|| geometry.content_width());
    check_positive("output width", output)?;
    Ok(output / window)
}

fn check_positive(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidOptions(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}

/// Converts plan entries into absolute draw instructions.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    geometry: PageGeometry,
    scale: f64,
    x_pt: f64,
}

impl CoordinateMapper {
    /// Create a mapper for pages of `geometry` at `scale` points per pixel.
    pub fn new(geometry: PageGeometry, scale: f64) -> Self {
        Self {
            geometry,
            scale,
            x_pt: 0.0,
        }
    }

    /// Shift all content right by `x_pt` inside the content box.
    pub fn with_x_offset(mut self, x_pt: f64) -> Self {
        self.x_pt = x_pt;
        self
    }

    /// Map one entry.
    pub fn map_entry(&self, entry: &PlanEntry, fragment: &Fragment) -> DrawInstruction {
        let (top, bottom) = match entry.clip {
            Some(clip) => (clip.top_px, clip.bottom_px),
            None => (0.0, fragment.height_px),
        };
        let source = PixelRect {
            x: 0.0,
            y: top,
            width: fragment.width_px,
            height: bottom - top,
        };
        let margins = &self.geometry.margins;

        DrawInstruction {
            fragment_index: entry.fragment_index,
            page_index: entry.page_index,
            x_pt: margins.left + self.x_pt + fragment.offset_px * self.scale,
            y_pt: margins.top + entry.y,
            width_pt: fragment.width_px * self.scale,
            height_pt: source.height * self.scale,
            source,
        }
    }

    /// Map every entry of `plan`, preserving plan order.
    pub fn map_plan(
        &self,
        plan: &PageBreakPlan,
        fragments: &[Fragment],
        parallel: bool,
    ) -> Result<Vec<DrawInstruction>> {
        let map = |entry: &PlanEntry| -> Result<DrawInstruction> {
            let fragment = fragments.get(entry.fragment_index).ok_or_else(|| {
                Error::PaginationInvariant(format!(
                    "plan references fragment {} of {}",
                    entry.fragment_index,
                    fragments.len()
                ))
            })?;
            Ok(self.map_entry(entry, fragment))
        };

        if parallel {
            plan.entries.par_iter().map(map).collect()
        } else {
            plan.entries.iter().map(map).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PagingMode, Planner};
    use crate::model::{DocumentCursor, Margins, PageSize};

    fn geometry() -> PageGeometry {
        PageGeometry::new(PageSize::new(600.0, 800.0), Margins::uniform(50.0))
    }

    #[test]
    fn test_resolve_scale_order() {
        let g = geometry();
        let fragments = vec![Fragment::new(1000.0, 10.0)];

        assert_eq!(resolve_scale(Some(0.5), Some(100.0), None, &fragments, &g).unwrap(), 0.5);
        assert_eq!(resolve_scale(None, Some(250.0), None, &fragments, &g).unwrap(), 0.25);
        assert_eq!(
            resolve_scale(None, Some(250.0), Some(500.0), &fragments, &g).unwrap(),
            0.5
        );
        // Content box is 500pt wide
        assert_eq!(resolve_scale(None, None, None, &fragments, &g).unwrap(), 0.5);
        assert_eq!(resolve_scale(None, None, None, &[], &g).unwrap(), DEFAULT_SCALE);
    }

    #[test]
    fn test_resolve_scale_rejects_bad_values() {
        let g = geometry();
        assert!(matches!(
            resolve_scale(Some(-1.0), None, None, &[], &g),
            Err(Error::InvalidOptions(_))
        ));
        assert!(resolve_scale(None, None, Some(0.0), &[], &g).is_err());
        assert!(resolve_scale(None, Some(f64::INFINITY), Some(10.0), &[], &g).is_err());
    }

    #[test]
    fn test_window_width_includes_offset() {
        let fragments = vec![Fragment::new(400.0, 10.0).with_offset(100.0)];
        let scale = resolve_scale(None, None, None, &fragments, &geometry()).unwrap();
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn test_map_whole_entry() {
        let mapper = CoordinateMapper::new(geometry(), 0.5).with_x_offset(10.0);
        let fragment = Fragment::new(800.0, 200.0).with_offset(20.0);
        let entry = PlanEntry {
            fragment_index: 0,
            page_index: 3,
            y: 120.0,
            height: 100.0,
            clip: None,
        };

        let draw = mapper.map_entry(&entry, &fragment);
        assert_eq!(draw.page_index, 3);
        assert_eq!(draw.x_pt, 70.0);
        assert_eq!(draw.y_pt, 170.0);
        assert_eq!(draw.width_pt, 400.0);
        assert_eq!(draw.height_pt, 100.0);
        assert_eq!(draw.source, PixelRect::full(800.0, 200.0));
    }

    #[test]
    fn test_map_split_slices_tile_source() {
        let g = geometry();
        let fragments = vec![Fragment::new(500.0, 1500.0)];
        let plan = Planner::new(g, PagingMode::Auto, 1.0)
            .unwrap()
            .plan(&fragments, DocumentCursor::default())
            .unwrap();
        let draws = CoordinateMapper::new(g, 1.0)
            .map_plan(&plan, &fragments, false)
            .unwrap();

        assert_eq!(draws.len(), 3);
        assert!(draws.iter().all(|d| d.y_pt == 50.0));
        assert_eq!(draws[0].source.height, 700.0);
        assert_eq!(draws[1].source.y, draws[0].source.bottom());
        assert_eq!(draws[2].source.bottom(), 1500.0);
        assert_eq!(draws[2].height_pt, 100.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let g = geometry();
        let fragments: Vec<Fragment> = (0..200)
            .map(|i| Fragment::new(500.0, 40.0 + (i % 7) as f64 * 90.0).with_atomic(i % 5 == 0))
            .collect();
        let plan = Planner::new(g, PagingMode::Auto, 1.0)
            .unwrap()
            .plan(&fragments, DocumentCursor::default())
            .unwrap();
        let mapper = CoordinateMapper::new(g, 1.0);

        assert_eq!(
            mapper.map_plan(&plan, &fragments, true).unwrap(),
            mapper.map_plan(&plan, &fragments, false).unwrap()
        );
    }

    #[test]
    fn test_unknown_fragment_index() {
        let g = geometry();
        let fragments = vec![Fragment::new(10.0, 10.0)];
        let plan = Planner::new(g, PagingMode::Auto, 1.0)
            .unwrap()
            .plan(&fragments, DocumentCursor::default())
            .unwrap();

        let result = CoordinateMapper::new(g, 1.0).map_plan(&plan, &[], false);
        assert!(matches!(result, Err(Error::PaginationInvariant(_))));
    }
}
