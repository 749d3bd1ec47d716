//! Font source transport.

use std::path::{Path, PathBuf};

use base64::Engine;

use crate::error::{Error, Result};
use crate::model::{FontFormat, FontSource};

/// Fetches the raw bytes behind a font `src` URL.
///
/// Implementations are called from worker threads, one per descriptor.
pub trait FontSourceLoader: Send + Sync {
    /// Fetch the bytes of a single source.
    fn fetch(&self, source: &FontSource) -> Result<Vec<u8>>;
}

impl<F> FontSourceLoader for F
where
    F: Fn(&FontSource) -> Result<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, source: &FontSource) -> Result<Vec<u8>> {
        self(source)
    }
}

/// Loads fonts from the local filesystem and from `data:` URLs.
///
/// Relative paths are resolved against `base_dir` when one is set,
/// otherwise against the process working directory.
#[derive(Debug, Clone, Default)]
pub struct FsFontLoader {
    base_dir: Option<PathBuf>,
}

impl FsFontLoader {
    /// Create a loader resolving relative paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve_path(&self, url: &str) -> PathBuf {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FontSourceLoader for FsFontLoader {
    fn fetch(&self, source: &FontSource) -> Result<Vec<u8>> {
        let url = source.url.trim();

        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        if url.starts_with("http://") || url.starts_with("https://") {
            return Err(Error::Other(format!(
                "Remote font sources are not supported by the filesystem loader: {}",
                url
            )));
        }

        let path = self.resolve_path(url);
        log::debug!("Reading font source {}", path.display());
        Ok(std::fs::read(path)?)
    }
}

/// Decode a `data:[<mime>];base64,<payload>` URL.
fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let comma = url
        .find(',')
        .ok_or_else(|| Error::Other("Invalid data URL: missing comma".to_string()))?;
    let (header, payload) = (&url[..comma], &url[comma + 1..]);
    if !header.ends_with(";base64") {
        return Err(Error::Other(
            "Only base64 data URLs are supported for fonts".to_string(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Other(format!("Base64 decode error: {}", e)))
}

/// Identify a font container from its leading bytes.
pub fn sniff_format(data: &[u8]) -> Option<FontFormat> {
    if data.len() < 4 {
        return None;
    }
    match &data[..4] {
        [0x00, 0x01, 0x00, 0x00] | b"true" | b"ttcf" => Some(FontFormat::TrueType),
        b"OTTO" => Some(FontFormat::OpenType),
        b"wOFF" => Some(FontFormat::Woff),
        b"wOF2" => Some(FontFormat::Woff2),
        _ => None,
    }
}
