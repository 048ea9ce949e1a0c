mod helpers;

use serde_json::Value;

use helpers::setup_test_app;

#[tokio::test]
async fn test_health_lists_backends() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backends"], serde_json::json!(["cdn", "object_store"]));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/openapi.json").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/upload/product/thumb"].is_object());
    assert!(body["paths"]["/upload/product/bucket"].is_object());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().post("/upload/product/unknown").await;

    assert_eq!(response.status_code(), 404);
}
