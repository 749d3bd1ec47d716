//! Rasterized content fragments.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Bytes per pixel of an RGBA8 raster.
const BYTES_PER_PIXEL: usize = 4;

/// One unit of rasterized content, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Source width in rasterizer pixels
    pub width_px: f64,

    /// Source height in rasterizer pixels
    pub height_px: f64,

    /// Pixel data for this fragment
    #[serde(default, skip_serializing)]
    pub raster: RasterData,

    /// Whether the fragment must never be split across pages
    #[serde(default)]
    pub atomic: bool,

    /// Horizontal offset of the fragment inside the rasterized window
    #[serde(default)]
    pub offset_px: f64,
}

impl Fragment {
    /// Create a splittable fragment with an un-materialized raster.
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px,
            height_px,
            raster: RasterData::empty(width_px.ceil() as u32, height_px.ceil() as u32),
            atomic: false,
            offset_px: 0.0,
        }
    }

    /// Create an atomic fragment.
    pub fn atomic(width_px: f64, height_px: f64) -> Self {
        Self::new(width_px, height_px).with_atomic(true)
    }

    /// Mark the fragment as atomic or splittable.
    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Attach raster data.
    pub fn with_raster(mut self, raster: RasterData) -> Self {
        self.raster = raster;
        self
    }

    /// Set the horizontal offset inside the window.
    pub fn with_offset(mut self, offset_px: f64) -> Self {
        self.offset_px = offset_px;
        self
    }

    /// Height of the fragment in points at the given scale.
    pub fn height_pt(&self, scale: f64) -> f64 {
        self.height_px * scale
    }

    /// Check that width and height are finite and non-negative.
    ///
    /// `index` is the fragment's position in document order, used in the error.
    pub fn check_size(&self, index: usize) -> Result<()> {
        if is_extent(self.width_px) && is_extent(self.height_px) {
            return Ok(());
        }
        Err(Error::Rasterization(format!(
            "fragment {} has invalid size {}x{}",
            index, self.width_px, self.height_px
        )))
    }
}

/// Check every fragment's size, failing on the first invalid one.
pub fn check_fragments(fragments: &[Fragment]) -> Result<()> {
    fragments
        .iter()
        .enumerate()
        .try_for_each(|(index, fragment)| fragment.check_size(index))
}

fn is_extent(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Pixel rectangle inside a raster, in rasterizer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    /// Rectangle covering a whole `width` x `height` raster.
    pub fn full(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// RGBA8 pixel rows produced by the rasterizer.
///
/// An empty `pixels` buffer means the raster was never materialized
/// (fragments replayed from a manifest); only its dimensions matter then.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RasterData {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub pixels: Arc<Vec<u8>>,
}

impl RasterData {
    /// Create raster data from RGBA8 pixels.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// Create an un-materialized raster of the given size.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Arc::new(Vec::new()),
        }
    }

    /// Check whether pixel data is present.
    pub fn is_materialized(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// Extract the row band `top..bottom` (clamped to the raster).
    pub fn crop_rows(&self, top: u32, bottom: u32) -> RasterData {
        let top = top.min(self.height);
        let bottom = bottom.clamp(top, self.height);
        let height = bottom - top;

        if !self.is_materialized() {
            return RasterData::empty(self.width, height);
        }

        let stride = self.width as usize * BYTES_PER_PIXEL;
        let start = top as usize * stride;
        let end = bottom as usize * stride;
        RasterData {
            width: self.width,
            height,
            pixels: Arc::new(self.pixels[start..end].to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_builders() {
        let frag = Fragment::atomic(200.0, 500.0).with_offset(8.0);
        assert!(frag.atomic);
        assert_eq!(frag.offset_px, 8.0);
        assert_eq!(frag.raster.height, 500);
        assert!(!frag.raster.is_materialized());
        assert_eq!(frag.height_pt(0.75), 375.0);
    }

    #[test]
    fn test_check_size_rejects_bad_extents() {
        assert!(Fragment::new(0.0, 0.0).check_size(0).is_ok());
        let valid = [Fragment::new(10.0, 10.0), Fragment::atomic(5.0, 900.0)];
        assert!(check_fragments(&valid).is_ok());

        for bad in [f64::INFINITY, f64::NAN, -1.0] {
            let err = Fragment::new(10.0, bad).check_size(3).unwrap_err();
            assert!(matches!(err, Error::Rasterization(_)));
            assert!(err.to_string().contains("fragment 3"));
            assert!(Fragment::new(bad, 10.0).check_size(0).is_err());
        }

        let err = check_fragments(&[Fragment::new(10.0, 10.0), Fragment::new(10.0, f64::NAN)])
            .unwrap_err();
        assert!(err.to_string().contains("fragment 1"));
    }

    #[test]
    fn test_raster_from_rgba_checks_length() {
        assert!(RasterData::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(RasterData::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_crop_rows() {
        // 1px wide, 4 rows, each row filled with its index
        let pixels: Vec<u8> = (0u8..4).flat_map(|row| [row; 4]).collect();
        let raster = RasterData::from_rgba(1, 4, pixels).unwrap();

        let band = raster.crop_rows(1, 3);
        assert_eq!(band.height, 2);
        assert_eq!(band.pixels.as_slice(), &[1, 1, 1, 1, 2, 2, 2, 2]);

        let clamped = raster.crop_rows(3, 10);
        assert_eq!(clamped.height, 1);
    }

    #[test]
    fn test_crop_rows_unmaterialized() {
        let raster = RasterData::empty(10, 100);
        let band = raster.crop_rows(40, 100);
        assert_eq!(band.height, 60);
        assert!(!band.is_materialized());
    }
}
