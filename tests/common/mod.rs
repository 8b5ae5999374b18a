//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use bearer_gate::{
    auth::validator::{CredentialValidator, FnValidator},
    config::{AppConfig, LoggingConfig, SecurityConfig, ServerConfig},
    middleware::AppState,
    models::auth::Credentials,
    routes,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
            body_limit_bytes: 64 * 1024,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            token_ttl_secs: 300, // 5分钟用于测试
            users: None,
        },
    }
}

/// Accepts alice/right and nothing else
pub fn alice_validator() -> Arc<dyn CredentialValidator> {
    Arc::new(FnValidator::new(|c: &Credentials| {
        c.username == "alice" && c.password == "right"
    }))
}

/// 创建测试应用状态
pub fn create_test_app_state(validator: Arc<dyn CredentialValidator>) -> Arc<AppState> {
    Arc::new(
        AppState::new(create_test_config(), validator).expect("Failed to create test app state"),
    )
}

pub fn create_test_app() -> (Router, Arc<AppState>) {
    let state = create_test_app_state(alice_validator());
    (routes::create_router(state.clone()), state)
}

/// GET with an optional raw Authorization header value
pub async fn get(app: Router, uri: &str, authorization: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign in as alice through the API and return the token
pub async fn signin_token(app: Router) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/signin",
        r#"{"username":"alice","password":"right"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    body_json(response).await["message"]
        .as_str()
        .expect("token in message")
        .to_string()
}
