//! Integration tests for paging behavior across render calls.

use std::sync::Arc;

use dompage::render::DocumentWriter;
use dompage::{
    DocumentCursor, Fragment, FragmentListRasterizer, PageSize, PagedDocument, PagingMode,
    RenderOptions, RenderSource, Renderer,
};

const PAGE: PageSize = PageSize {
    width: 200.0,
    height: 750.0,
};

fn renderer(fragments: Vec<Fragment>) -> Renderer {
    Renderer::new(Arc::new(FragmentListRasterizer::new(fragments)))
}

fn four_blocks() -> Vec<Fragment> {
    vec![Fragment::new(200.0, 500.0); 4]
}

fn options(paging: PagingMode) -> RenderOptions {
    RenderOptions::new().with_paging(paging).with_scale(1.0)
}

fn source() -> RenderSource {
    RenderSource::Html("<div style=\"height: 2000px\"></div>".to_string())
}

#[test]
fn test_auto_four_blocks_one_per_page() {
    let mut doc = PagedDocument::new(PAGE);
    let report = renderer(four_blocks())
        .render(&source(), &options(PagingMode::Auto), &mut doc)
        .unwrap();

    assert_eq!(doc.page_count(), 4);
    assert_eq!(report.pages_added, 3);
    for page in doc.pages() {
        assert_eq!(page.draws.len(), 1);
        assert_eq!(page.draws[0].y, 0.0);
    }
}

#[test]
fn test_none_single_page() {
    let mut doc = PagedDocument::new(PAGE);
    renderer(four_blocks())
        .render(&source(), &options(PagingMode::None), &mut doc)
        .unwrap();

    assert_eq!(doc.page_count(), 1);
    let ys: Vec<f64> = doc.pages()[0].draws.iter().map(|d| d.y).collect();
    assert_eq!(ys, vec![0.0, 500.0, 1000.0, 1500.0]);
}

#[test]
fn test_auto_from_current_page_after_add_page() {
    let mut doc = PagedDocument::new(PAGE);
    doc.add_page().unwrap();
    doc.add_page().unwrap();

    let report = renderer(four_blocks())
        .render(&source(), &options(PagingMode::Auto), &mut doc)
        .unwrap();

    assert_eq!(report.plan.entries[0].page_index, 2);
    assert!(doc.pages()[0].is_empty());
    assert!(doc.pages()[1].is_empty());
    assert_eq!(doc.page_count(), 6);
    assert_eq!(doc.current_cursor(), DocumentCursor::new(5, 500.0));
}

#[test]
fn test_three_manual_renders_with_add_page() {
    let mut doc = PagedDocument::new(PAGE);
    let renderer = renderer(vec![Fragment::new(200.0, 300.0)]);
    let options = options(PagingMode::None);

    renderer.render(&source(), &options, &mut doc).unwrap();
    doc.add_page().unwrap();
    renderer.render(&source(), &options, &mut doc).unwrap();
    doc.add_page().unwrap();
    renderer.render(&source(), &options, &mut doc).unwrap();

    assert_eq!(doc.page_count(), 3);
    assert!(doc.pages().iter().all(|p| p.draws.len() == 1));
}

#[test]
fn test_consecutive_auto_renders_continue_at_cursor() {
    let mut doc = PagedDocument::new(PAGE);
    let renderer = renderer(vec![Fragment::new(200.0, 300.0)]);
    let options = options(PagingMode::Auto);

    renderer.render(&source(), &options, &mut doc).unwrap();
    renderer.render(&source(), &options, &mut doc).unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.pages()[0].draws[1].y, 300.0);

    // 600 + 300 > 750
    renderer.render(&source(), &options, &mut doc).unwrap();
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.current_cursor(), DocumentCursor::new(1, 300.0));
}

#[test]
fn test_atomic_overflow_adds_one_page_each() {
    let fragments = vec![
        Fragment::atomic(200.0, 900.0),
        Fragment::atomic(200.0, 1200.0),
        Fragment::atomic(200.0, 800.0),
    ];
    let mut doc = PagedDocument::new(PAGE);
    doc.draw_image(
        0,
        0.0,
        0.0,
        10.0,
        10.0,
        dompage::render::RasterSlice::crop(
            0,
            &dompage::RasterData::empty(1, 1),
            dompage::PixelRect::full(1.0, 1.0),
        ),
    )
    .unwrap();
    doc.set_cursor(DocumentCursor::new(0, 10.0)).unwrap();

    let report = renderer(fragments)
        .render(&source(), &options(PagingMode::Auto), &mut doc)
        .unwrap();

    assert_eq!(report.pages_added, 3);
    assert_eq!(doc.page_count(), 4);
    let pages: Vec<usize> = report.plan.entries.iter().map(|e| e.page_index).collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[test]
fn test_split_slices_tile_fragment() {
    let mut doc = PagedDocument::new(PAGE);
    let fragments = vec![Fragment::new(200.0, 100.0), Fragment::new(200.0, 2000.0)];
    renderer(fragments)
        .render(&source(), &options(PagingMode::Auto), &mut doc)
        .unwrap();

    let slices: Vec<_> = doc
        .pages()
        .iter()
        .flat_map(|p| p.draws.iter())
        .filter(|d| d.fragment_index == 1)
        .collect();
    assert_eq!(slices.len(), 3);
    assert_eq!(slices[0].source.y, 0.0);
    for pair in slices.windows(2) {
        assert_eq!(pair[0].source.bottom(), pair[1].source.y);
    }
    assert_eq!(slices[2].source.bottom(), 2000.0);
    let drawn: f64 = slices.iter().map(|d| d.height).sum();
    assert!((drawn - 2000.0).abs() < 1e-6);
}

#[test]
fn test_margins_offset_draws() {
    let mut doc = PagedDocument::new(PageSize::new(300.0, 800.0));
    let options = options(PagingMode::Auto).with_margins(dompage::Margins::uniform(25.0));
    renderer(vec![Fragment::new(250.0, 400.0); 2])
        .render(&source(), &options, &mut doc)
        .unwrap();

    assert_eq!(doc.page_count(), 2);
    let first = &doc.pages()[0].draws[0];
    assert_eq!((first.x, first.y), (25.0, 25.0));
    assert_eq!(doc.pages()[1].draws[0].y, 25.0);
}

#[test]
fn test_scale_from_output_width() {
    let mut doc = PagedDocument::new(PAGE);
    // 800px wide rendered at 200pt: 0.25 pt/px
    let options = RenderOptions::new().with_width(200.0);
    let report = renderer(vec![Fragment::new(800.0, 4000.0)])
        .render(&source(), &options, &mut doc)
        .unwrap();

    assert_eq!(report.plan.scale, 0.25);
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.pages()[0].draws[0].width, 200.0);
}

#[test]
fn test_identical_inputs_identical_plans() {
    let fragments = vec![
        Fragment::new(200.0, 120.0),
        Fragment::atomic(200.0, 900.0),
        Fragment::new(200.0, 1700.0),
    ];
    let render = || {
        let mut doc = PagedDocument::new(PAGE);
        renderer(fragments.clone())
            .render(&source(), &options(PagingMode::Auto), &mut doc)
            .unwrap()
            .plan
    };
    assert_eq!(render(), render());
}
