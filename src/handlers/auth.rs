//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext, error::AppError, middleware::AppState,
    models::{auth::PrincipalResponse, response::JsonResponse},
};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 登录
///
/// The raw body is decoded by the service so that any decode failure, wrong
/// content type included, is reported as the same 400. Bodies over the size
/// limit or streams that fail midway get that 400 as well.
pub async fn signin(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Failed to read signin body");
        AppError::malformed_body()
    })?;

    let token = state.signin_service.signin(&body).await?;

    Ok(JsonResponse::ok(token))
}

/// 获取当前用户信息
pub async fn get_current_user(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    auth_context.check_auth()?;

    Ok(Json(PrincipalResponse {
        authenticated: auth_context.is_authenticated(),
        username: auth_context.username,
    }))
}
