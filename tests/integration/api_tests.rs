//! API integration tests for the upload form, mosaic endpoint and error
//! handling.
//!
//! Tests verify:
//! - The form and results pages
//! - Error cases (bad tile size, missing or undecodable upload, oversize body)
//! - Health and rebuild endpoints

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tile_mosaic::{create_router, MosaicService, RouterConfig, TileIndex};

use super::test_utils::{
    encode_png, multipart_body, multipart_content_type, solid_image, unique_temp_dir,
    MemoryTileSource, BLACK, WHITE,
};

fn test_router_with(source: MemoryTileSource, config: RouterConfig) -> Router {
    let index = TileIndex::build(Arc::new(source)).unwrap();
    create_router(MosaicService::new(Arc::new(index)), config)
}

fn test_router() -> Router {
    let source = MemoryTileSource::new()
        .with_tile("black.png", 4, BLACK)
        .with_tile("white.png", 4, WHITE);
    test_router_with(source, RouterConfig::new().with_tracing(false))
}

fn mosaic_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mosaic")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_upload_form() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));

    let page = body_string(response).await;
    assert!(page.contains("enctype=\"multipart/form-data\""));
    assert!(page.contains("value=\"15\""));
}

#[tokio::test]
async fn test_mosaic_success() {
    let upload = encode_png(&solid_image(8, 8, BLACK));
    let response = test_router()
        .oneshot(mosaic_request(multipart_body(Some(&upload), Some("4"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let page = body_string(response).await;
    assert_eq!(page.matches("data:image/jpeg;base64,").count(), 2);
    assert!(page.contains("8x8 px"));
    assert!(page.contains("4 px tiles"));
}

#[tokio::test]
async fn test_mosaic_tile_size_far_larger_than_image() {
    let upload = encode_png(&solid_image(4, 4, BLACK));
    let response = test_router()
        .oneshot(mosaic_request(multipart_body(Some(&upload), Some("40000"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let page = body_string(response).await;
    assert!(page.contains("4x4 px"));
    assert!(page.contains("40000 px tiles"));
}

#[tokio::test]
async fn test_mosaic_blank_tile_size_uses_default() {
    let config = RouterConfig::new()
        .with_tracing(false)
        .with_default_tile_size(3);
    let router = test_router_with(MemoryTileSource::new().with_tile("white.png", 3, WHITE), config);

    let upload = encode_png(&solid_image(6, 6, WHITE));
    let response = router
        .oneshot(mosaic_request(multipart_body(Some(&upload), Some(""))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("3 px tiles"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_mosaic_invalid_tile_size() {
    let upload = encode_png(&solid_image(8, 8, BLACK));

    for tile_size in ["0", "-3", "abc"] {
        let response = test_router()
            .oneshot(mosaic_request(multipart_body(Some(&upload), Some(tile_size))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "tile_size={}", tile_size);
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_request");
        assert_eq!(json["status"], 400);
    }
}

#[tokio::test]
async fn test_mosaic_missing_image() {
    let response = test_router()
        .oneshot(mosaic_request(multipart_body(None, Some("4"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_request");
    assert!(json["message"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_mosaic_undecodable_image() {
    let response = test_router()
        .oneshot(mosaic_request(multipart_body(Some(b"not an image"), Some("4"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_image");
}

#[tokio::test]
async fn test_mosaic_upload_too_large() {
    let config = RouterConfig::new()
        .with_tracing(false)
        .with_max_upload_bytes(1024);
    let router = test_router_with(MemoryTileSource::new().with_tile("black.png", 2, BLACK), config);

    let upload = vec![0u8; 8 * 1024];
    let response = router
        .oneshot(mosaic_request(multipart_body(Some(&upload), Some("4"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_mosaic_requires_post() {
    let request = Request::builder().uri("/mosaic").body(Body::empty()).unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Health and Rebuild
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["tiles"], 2);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_rebuild_endpoint() {
    let source = MemoryTileSource::new().with_tile("black.png", 2, BLACK);
    let router = test_router_with(source.clone(), RouterConfig::new().with_tracing(false));

    let _source = source
        .with_tile("white.png", 2, WHITE)
        .with_corrupt_tile("broken.png");

    let request = Request::builder()
        .method("POST")
        .uri("/tiles/rebuild")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["tiles"], 2);
    assert_eq!(json["skipped"], 1);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(body_json(response).await["tiles"], 2);
}

// =============================================================================
// Static Files
// =============================================================================

#[tokio::test]
async fn test_static_files() {
    let dir = unique_temp_dir("static");
    std::fs::write(dir.join("style.css"), "body { color: red; }").unwrap();

    let config = RouterConfig::new().with_tracing(false).with_static_dir(&dir);
    let router = test_router_with(MemoryTileSource::new(), config);

    let request = Request::builder()
        .uri("/static/style.css")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "body { color: red; }");

    let request = Request::builder()
        .uri("/static/missing.css")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_no_static_route_by_default() {
    let request = Request::builder()
        .uri("/static/style.css")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
