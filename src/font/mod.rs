//! Font resolution: loading declared `@font-face` rules and handing them to
//! the font subsystem before rasterization starts.

mod loader;
mod registry;
mod resolver;

pub use loader::{sniff_format, FontSourceLoader, FsFontLoader};
pub use registry::{FontHandle, FontRegistry, FontSubsystem};
pub use resolver::{FontLoadReport, FontResolver, DEFAULT_FONT_TIMEOUT};
