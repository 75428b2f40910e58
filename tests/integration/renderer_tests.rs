//! StaticRenderer against a mock marketplace

use carfeed::config::RendererConfig;
use carfeed::{Renderer, RendererError, StaticRenderer};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html><body>
    <article class="cldt-summary-full-item"><h2><span>BMW 320d</span></h2></article>
    <article class="cldt-summary-full-item"><h2><span>Kia Ceed</span></h2></article>
    <button class="image-gallery-right-nav">next</button>
</body></html>"#;

async fn serve_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/lst"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(server)
        .await;
}

fn renderer() -> StaticRenderer {
    StaticRenderer::new(&RendererConfig::default()).unwrap()
}

#[tokio::test]
async fn test_navigate_and_query() {
    let server = MockServer::start().await;
    serve_page(&server).await;

    let mut renderer = renderer();
    let url = format!("{}/lst", server.uri());
    renderer.navigate(&url).await.unwrap();

    assert_eq!(renderer.current_url().await.unwrap(), url);

    let cards = renderer.query_all("article.cldt-summary-full-item").await.unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[1].text, "Kia Ceed");

    let first = renderer.query_one("h2 span").await.unwrap();
    assert_eq!(first.text, "BMW 320d");
}

#[tokio::test]
async fn test_wait_for_missing_selector_times_out() {
    let server = MockServer::start().await;
    serve_page(&server).await;

    let mut renderer = renderer();
    renderer
        .navigate(&format!("{}/lst", server.uri()))
        .await
        .unwrap();

    assert!(renderer
        .wait_for_selector("article", Duration::from_millis(10))
        .await
        .is_ok());

    let result = renderer
        .wait_for_selector("div.never", Duration::from_millis(10))
        .await;
    assert!(matches!(result, Err(RendererError::Timeout { .. })));
}

#[tokio::test]
async fn test_click_requires_target() {
    let server = MockServer::start().await;
    serve_page(&server).await;

    let mut renderer = renderer();
    renderer
        .navigate(&format!("{}/lst", server.uri()))
        .await
        .unwrap();

    assert!(renderer.click("button.image-gallery-right-nav").await.is_ok());
    let result = renderer.click("#vendor-section-call-button").await;
    assert!(matches!(result, Err(RendererError::ElementNotFound(_))));
}

#[tokio::test]
async fn test_error_status_is_a_navigation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let mut renderer = renderer();
    let result = renderer.navigate(&format!("{}/gone", server.uri())).await;

    match result {
        Err(RendererError::Navigation { message, .. }) => assert_eq!(message, "HTTP 410"),
        other => panic!("expected navigation failure, got {:?}", other),
    }
}
