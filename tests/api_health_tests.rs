//! 健康检查 API 集成测试

use axum::http::StatusCode;

mod common;
use common::{body_json, create_test_app, get};

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let response = get(app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = create_test_app();

    let response = get(app, "/api/v1/nope", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
