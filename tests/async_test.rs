//! Integration tests for the async entry point.
#![cfg(feature = "async")]

use std::sync::Arc;

use dompage::render::DocumentWriter;
use dompage::{
    Fragment, FragmentListRasterizer, PageSize, PagedDocument, PagingMode, RenderOptions,
    RenderSource, Renderer,
};

#[tokio::test]
async fn test_render_async_returns_document() {
    let renderer = Renderer::new(Arc::new(FragmentListRasterizer::new(vec![
        Fragment::new(200.0, 500.0);
        4
    ])));
    let options = RenderOptions::new()
        .with_paging(PagingMode::None)
        .with_scale(1.0);

    let completion = renderer
        .render_async(
            RenderSource::Html("<div></div>".to_string()),
            options,
            PagedDocument::new(PageSize::new(200.0, 750.0)),
        )
        .await
        .unwrap();

    let report = completion.report.unwrap();
    assert_eq!(report.draw_calls, 4);
    assert_eq!(completion.document.page_count(), 1);
}

#[tokio::test]
async fn test_render_async_failure_keeps_document() {
    let renderer = Renderer::new(Arc::new(FragmentListRasterizer::new(vec![Fragment::new(
        10.0, 10.0,
    )])));

    let completion = renderer
        .render_async(
            RenderSource::Node("#missing".to_string()),
            RenderOptions::new().with_paging(PagingMode::None),
            PagedDocument::empty(PageSize::a4()),
        )
        .await
        .unwrap();

    assert!(completion.report.is_err());
    assert_eq!(completion.document.page_count(), 0);
}
