//! Registered font resources and face matching.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::model::{FontKey, FontStyle, FontWeight};

/// Opaque handle to a registered font resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontHandle(pub u64);

/// The font subsystem that receives loaded faces.
///
/// It outlives a single render call; the rasterizer reads from it while
/// measuring text.
pub trait FontSubsystem: Send + Sync {
    /// Register font bytes under `key`, replacing any earlier registration.
    fn register(&self, key: FontKey, data: Arc<Vec<u8>>) -> FontHandle;

    /// Exact lookup by key.
    fn lookup(&self, key: &FontKey) -> Option<FontHandle>;
}

#[derive(Debug, Clone)]
struct RegisteredFont {
    handle: FontHandle,
    data: Arc<Vec<u8>>,
}

/// In-memory, thread-safe [`FontSubsystem`].
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: RwLock<HashMap<FontKey, RegisteredFont>>,
    next_handle: AtomicU64,
}

impl FontRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered faces.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Font bytes for a handle.
    pub fn data(&self, handle: FontHandle) -> Option<Arc<Vec<u8>>> {
        self.read()
            .values()
            .find(|font| font.handle == handle)
            .map(|font| Arc::clone(&font.data))
    }

    /// Registered family names, sorted and deduplicated.
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self.read().keys().map(|k| k.family.clone()).collect();
        families.sort();
        families.dedup();
        families
    }

    /// Find the closest registered face for a family, weight and style.
    ///
    /// Follows the CSS font matching order: style first (italic falls back
    /// to oblique, then normal), then weight. Returns `None` when the family
    /// has no registered faces, in which case the caller uses its generic
    /// fallback font.
    pub fn best_match(
        &self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
    ) -> Option<FontHandle> {
        let wanted = FontKey::new(family, weight, style, None);
        let fonts = self.read();
        let candidates: Vec<(&FontKey, &RegisteredFont)> = fonts
            .iter()
            .filter(|(key, _)| key.family == wanted.family)
            .collect();

        for style in style_fallbacks(style) {
            let weights: Vec<FontWeight> = candidates
                .iter()
                .filter(|(key, _)| key.style == *style)
                .map(|(key, _)| key.weight)
                .collect();
            let Some(chosen) = closest_weight(weight, &weights) else {
                continue;
            };
            // Prefer the normal stretch when several faces share weight and style
            return candidates
                .iter()
                .filter(|(key, _)| key.style == *style && key.weight == chosen)
                .min_by_key(|(key, _)| key.stretch.is_some())
                .map(|(_, font)| font.handle);
        }
        None
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<FontKey, RegisteredFont>> {
        self.fonts.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FontSubsystem for FontRegistry {
    fn register(&self, key: FontKey, data: Arc<Vec<u8>>) -> FontHandle {
        let handle = FontHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        let mut fonts = self.fonts.write().unwrap_or_else(PoisonError::into_inner);
        if fonts.contains_key(&key) {
            log::debug!("Font face {} replaces an earlier declaration", key);
        }
        fonts.insert(key, RegisteredFont { handle, data });
        handle
    }

    fn lookup(&self, key: &FontKey) -> Option<FontHandle> {
        self.read().get(key).map(|font| font.handle)
    }
}

fn style_fallbacks(style: FontStyle) -> &'static [FontStyle] {
    match style {
        FontStyle::Italic => &[FontStyle::Italic, FontStyle::Oblique, FontStyle::Normal],
        FontStyle::Oblique => &[FontStyle::Oblique, FontStyle::Italic, FontStyle::Normal],
        FontStyle::Normal => &[FontStyle::Normal, FontStyle::Oblique, FontStyle::Italic],
    }
}

/// CSS weight matching over the available weights.
fn closest_weight(desired: FontWeight, available: &[FontWeight]) -> Option<FontWeight> {
    if available.contains(&desired) {
        return Some(desired);
    }
    let d = desired.0;
    let lighter = || available.iter().filter(|w| w.0 < d).max().copied();
    let heavier = || available.iter().filter(|w| w.0 > d).min().copied();

    if (400..=500).contains(&d) {
        // Weights up to 500 first, ascending; then lighter; then heavier
        let up_to_500 = available
            .iter()
            .filter(|w| w.0 > d && w.0 <= 500)
            .min()
            .copied();
        return up_to_500.or_else(lighter).or_else(heavier);
    }
    if d < 400 {
        lighter().or_else(heavier)
    } else {
        heavier().or_else(lighter)
    }
}
