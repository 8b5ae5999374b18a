//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{auth::jwt::TokenError, models::response::JsonResponse};

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Signing error: {0}")]
    Signing(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::MalformedRequest(msg) => msg.clone(),
            AppError::Signing(_) => "Could not create JWT claim.".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    // 便捷方法
    pub fn malformed_header() -> Self {
        AppError::MalformedRequest("Malformed authorization header".to_string())
    }

    pub fn malformed_body() -> Self {
        AppError::MalformedRequest("Body is not a valid JSON string.".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let response = JsonResponse::new(self.status_code(), self.user_message());

        // 客户端错误只记 debug，服务端错误记 error
        if self.status_code().is_server_error() {
            tracing::error!(code = self.code(), message = %self, "Application error");
        } else {
            tracing::debug!(code = self.code(), message = %self, "Request rejected");
        }

        response.into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 令牌错误映射：配置错误 -> 500，签名失败 -> 500，其余一律 401
impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::NotConfigured | TokenError::AlreadyConfigured | TokenError::EmptySecret => {
                AppError::Config(e.to_string())
            }
            TokenError::Signing(msg) => AppError::Signing(msg),
            TokenError::Malformed(_) | TokenError::InvalidSignature | TokenError::Expired => {
                AppError::Unauthorized
            }
        }
    }
}
