//! Integration tests for font resolution during render calls.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use dompage::{
    DomPage, FontFaceDescriptor, FontRegistry, FontStyle, FontSubsystem, FontWeight, Fragment,
    FragmentListRasterizer, PagedDocument, RenderSource,
};

const TTF_MAGIC: [u8; 4] = [0x00, 0x01, 0x00, 0x00];

fn write_font(dir: &std::path::Path, name: &str) {
    let mut data = TTF_MAGIC.to_vec();
    data.extend_from_slice(name.as_bytes());
    fs::write(dir.join(name), data).unwrap();
}

fn roboto_faces() -> Vec<FontFaceDescriptor> {
    let json = r#"[
        { "family": "Roboto", "weight": 400, "style": "normal",
          "src": [{ "url": "Roboto-Regular.ttf", "format": "truetype" }] },
        { "family": "Roboto", "weight": 700, "style": "normal",
          "src": [{ "url": "Roboto-Bold.ttf", "format": "truetype" }] },
        { "family": "Roboto", "weight": "bold", "style": "italic",
          "src": [{ "url": "Roboto-BoldItalic.ttf", "format": "truetype" }] },
        { "family": "Roboto", "weight": "normal", "style": "italic",
          "src": [{ "url": "Roboto-Italic.ttf", "format": "truetype" }] }
    ]"#;
    serde_json::from_str(json).unwrap()
}

fn rasterizer() -> Arc<FragmentListRasterizer> {
    Arc::new(FragmentListRasterizer::new(vec![Fragment::new(100.0, 50.0)]))
}

fn source() -> RenderSource {
    RenderSource::Html("<p style=\"font-family: Roboto\">Hello</p>".to_string())
}

#[test]
fn test_roboto_faces_register_distinct_handles() {
    let dir = tempfile::tempdir().unwrap();
    for name in [
        "Roboto-Regular.ttf",
        "Roboto-Bold.ttf",
        "Roboto-BoldItalic.ttf",
        "Roboto-Italic.ttf",
    ] {
        write_font(dir.path(), name);
    }

    let registry = Arc::new(FontRegistry::new());
    let mut builder = DomPage::new()
        .with_font_dir(dir.path())
        .with_font_subsystem(registry.clone());
    for face in roboto_faces() {
        builder = builder.with_font_face(face);
    }

    let mut doc = PagedDocument::default();
    let report = builder.render(rasterizer(), &source(), &mut doc).unwrap();

    assert!(report.fonts.is_complete());
    assert_eq!(report.fonts.loaded.len(), 4);
    assert_eq!(registry.len(), 4);

    let regular = registry
        .best_match("Roboto", FontWeight::NORMAL, FontStyle::Normal)
        .unwrap();
    let bold = registry
        .best_match("Roboto", FontWeight::BOLD, FontStyle::Normal)
        .unwrap();
    assert_ne!(regular, bold);
    assert!(registry.data(bold).unwrap().ends_with(b"Roboto-Bold.ttf"));

    let bold_italic = registry
        .best_match("roboto", FontWeight::BOLD, FontStyle::Italic)
        .unwrap();
    assert!(registry
        .data(bold_italic)
        .unwrap()
        .ends_with(b"Roboto-BoldItalic.ttf"));
}

#[test]
fn test_missing_font_does_not_fail_render() {
    let dir = tempfile::tempdir().unwrap();
    write_font(dir.path(), "Roboto-Regular.ttf");

    let registry = Arc::new(FontRegistry::new());
    let mut builder = DomPage::new()
        .with_font_dir(dir.path())
        .with_font_subsystem(registry.clone());
    for face in roboto_faces() {
        builder = builder.with_font_face(face);
    }

    let mut doc = PagedDocument::default();
    let report = builder.render(rasterizer(), &source(), &mut doc).unwrap();

    assert_eq!(report.fonts.loaded.len(), 1);
    assert_eq!(report.fonts.failed.len(), 3);
    assert_eq!(report.draw_calls, 1);

    // Bold falls back to the regular face
    let bold = registry.best_match("Roboto", FontWeight::BOLD, FontStyle::Normal);
    assert_eq!(bold, registry.lookup(&roboto_faces()[0].key()));
}

#[test]
fn test_unsupported_format_skipped_for_next_source() {
    let dir = tempfile::tempdir().unwrap();
    write_font(dir.path(), "Roboto-Regular.ttf");
    fs::write(dir.path().join("Roboto-Regular.svg"), b"<svg/>").unwrap();

    let face = FontFaceDescriptor::new("Roboto")
        .with_source("Roboto-Regular.svg", None)
        .with_source("Roboto-Regular.ttf", None);
    let registry = Arc::new(FontRegistry::new());
    let result = DomPage::new()
        .with_font_dir(dir.path())
        .with_font_subsystem(registry.clone())
        .with_font_face(face.clone())
        .with_font_timeout(Duration::from_secs(2))
        .render_new(rasterizer(), &source())
        .unwrap();

    assert!(result.report.fonts.is_complete());
    assert!(registry.lookup(&face.key()).is_some());
}

#[test]
fn test_fonts_registered_before_rasterization() {
    use dompage::{RasterConstraints, Rasterizer, Result};

    struct CheckingRasterizer {
        face: FontFaceDescriptor,
    }

    impl Rasterizer for CheckingRasterizer {
        fn rasterize(
            &self,
            _source: &RenderSource,
            _constraints: &RasterConstraints,
            fonts: &dyn FontSubsystem,
        ) -> Result<Vec<Fragment>> {
            assert!(fonts.lookup(&self.face.key()).is_some());
            Ok(vec![Fragment::new(10.0, 10.0)])
        }
    }

    let dir = tempfile::tempdir().unwrap();
    write_font(dir.path(), "Roboto-Regular.ttf");
    let face = FontFaceDescriptor::new("Roboto").with_source("Roboto-Regular.ttf", None);

    let report = DomPage::new()
        .with_font_dir(dir.path())
        .with_font_face(face.clone())
        .render_new(Arc::new(CheckingRasterizer { face }), &source())
        .unwrap()
        .report;
    assert_eq!(report.fonts.loaded.len(), 1);
}
