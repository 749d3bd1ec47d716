//! Parallel loading of declared font faces.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use serde::Serialize;

use super::loader::{sniff_format, FontSourceLoader};
use super::registry::{FontHandle, FontSubsystem};
use crate::error::{Error, Result};
use crate::model::{FontFaceDescriptor, FontKey};

/// Default bound on how long a single font face may take to load.
pub const DEFAULT_FONT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of resolving a list of font faces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FontLoadReport {
    /// Faces registered with the font subsystem, in declaration order
    pub loaded: Vec<(FontKey, FontHandle)>,

    /// Faces that were dropped, with the reason
    pub failed: Vec<(FontKey, String)>,
}

impl FontLoadReport {
    /// Whether every declared face was registered.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Handle registered for `key`, if it loaded.
    ///
    /// With duplicate keys the last declaration is the registered one.
    pub fn handle(&self, key: &FontKey) -> Option<FontHandle> {
        self.loaded
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, handle)| *handle)
    }
}

/// Loads font faces in parallel and registers them.
///
/// Every descriptor gets its own worker thread; results come back over a
/// channel and the resolver waits until all of them settled or the timeout
/// elapsed. Registration happens afterwards in declaration order so a
/// later face with the same key replaces an earlier one.
///
/// Workers are detached. A load still running at the deadline is reported
/// as timed out, but its thread keeps running until the
/// [`FontSourceLoader`] returns and its result is discarded. A loader that
/// never returns leaks one thread per face per call, so custom loaders
/// should bound their own I/O.
#[derive(Clone)]
pub struct FontResolver {
    loader: Arc<dyn FontSourceLoader>,
    timeout: Duration,
}

impl FontResolver {
    /// Create a resolver using `loader` for transport.
    pub fn new(loader: Arc<dyn FontSourceLoader>) -> Self {
        Self {
            loader,
            timeout: DEFAULT_FONT_TIMEOUT,
        }
    }

    /// Set the per-face timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-face timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load every face and register the successful ones with `fonts`.
    ///
    /// Never fails: faces that cannot be loaded are recorded in
    /// [`FontLoadReport::failed`] and left to fallback matching.
    pub fn resolve(
        &self,
        faces: &[FontFaceDescriptor],
        fonts: &dyn FontSubsystem,
    ) -> FontLoadReport {
        let mut report = FontLoadReport::default();
        if faces.is_empty() {
            return report;
        }

        let mut outcomes = self.load_all(faces);

        for (face, outcome) in faces.iter().zip(outcomes.drain(..)) {
            let key = face.key();
            match outcome {
                Some(Ok(data)) => {
                    let handle = fonts.register(key.clone(), Arc::new(data));
                    log::debug!("Registered font face {} as {:?}", key, handle);
                    report.loaded.push((key, handle));
                }
                Some(Err(e)) => {
                    log::warn!("Skipping font face {}: {}", key, e);
                    report.failed.push((key, e.to_string()));
                }
                None => {
                    log::warn!(
                        "Skipping font face {}: not loaded within {:?}",
                        key,
                        self.timeout
                    );
                    report
                        .failed
                        .push((key, format!("timed out after {:?}", self.timeout)));
                }
            }
        }

        report
    }

    /// Start one load per face and wait for the barrier.
    ///
    /// `None` marks a face that did not settle before the deadline.
    fn load_all(&self, faces: &[FontFaceDescriptor]) -> Vec<Option<Result<Vec<u8>>>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut outcomes: Vec<Option<Result<Vec<u8>>>> = (0..faces.len()).map(|_| None).collect();
        let mut pending = 0usize;

        for (index, face) in faces.iter().enumerate() {
            let tx = tx.clone();
            let loader = Arc::clone(&self.loader);
            let worker_face = face.clone();
            let spawned = thread::Builder::new()
                .name(format!("dompage-font-{}", index))
                .spawn(move || {
                    let outcome = load_face(loader.as_ref(), &worker_face);
                    // The receiver is gone once the deadline passed
                    let _ = tx.send((index, outcome));
                });
            match spawned {
                Ok(_) => pending += 1,
                Err(e) => outcomes[index] = Some(Err(Error::Io(e))),
            }
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        while pending > 0 {
            match rx.recv_deadline(deadline) {
                Ok((index, outcome)) => {
                    outcomes[index] = Some(outcome);
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::debug!("Font barrier reached deadline with {} pending", pending);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        outcomes
    }
}

impl std::fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Try each source of a face in order; the first usable one wins.
fn load_face(loader: &dyn FontSourceLoader, face: &FontFaceDescriptor) -> Result<Vec<u8>> {
    let mut last_error = None;

    for source in &face.sources {
        let format = source.effective_format();
        if !format.is_supported() {
            log::warn!(
                "Font source {} has unsupported format '{}'",
                source.url,
                format.as_str()
            );
            last_error = Some(format!("unsupported format '{}'", format.as_str()));
            continue;
        }

        match loader.fetch(source) {
            Ok(data) if sniff_format(&data).is_some() => return Ok(data),
            Ok(_) => {
                last_error = Some(format!("{} is not a font file", source.url));
            }
            Err(e) => {
                log::debug!("Font source {} failed: {}", source.url, e);
                last_error = Some(e.to_string());
            }
        }
    }

    let reason = last_error.unwrap_or_else(|| "no sources declared".to_string());
    Err(Error::font_load(face.family.clone(), reason))
}
