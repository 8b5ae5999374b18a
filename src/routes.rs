//! 路由注册
//! 创建所有 API 路由并为每组路由挂载对应的认证策略

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    auth::middleware::{dispatch, DispatchPolicy},
    handlers,
    middleware::AppState,
};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let codec = state.token_codec.clone();

    // 公开端点（健康检查、登录）
    let public_routes: Router<Arc<AppState>> = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/auth/signin", post(handlers::auth::signin))
        .layer(axum::middleware::from_fn_with_state(
            DispatchPolicy::open(codec.clone()),
            dispatch,
        ));

    // 必须认证的路由
    let authenticated_routes: Router<Arc<AppState>> = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::get_current_user))
        .layer(axum::middleware::from_fn_with_state(
            DispatchPolicy::required(codec.clone()),
            dispatch,
        ));

    // 可选认证的路由，由处理器自行决定是否要求登录
    let optional_routes: Router<Arc<AppState>> = Router::new()
        .route("/api/v1/greeting", get(handlers::account::greeting))
        .route("/api/v1/profile", get(handlers::account::profile))
        .layer(axum::middleware::from_fn_with_state(
            DispatchPolicy::optional(codec),
            dispatch,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(optional_routes)
        .layer(DefaultBodyLimit::max(state.config.server.body_limit_bytes))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
