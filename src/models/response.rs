//! 统一 JSON 响应体 `{"status": .., "message": ".."}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// Generic response that is written for every outcome of the auth layer,
/// success and error alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: u16,
    pub message: String,
}

impl JsonResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    /// 200 with the given message
    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

impl IntoResponse for JsonResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Json sets `content-type: application/json`
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_serialized_shape() {
        let body = serde_json::to_value(JsonResponse::unauthorized()).unwrap();
        assert_eq!(body, serde_json::json!({"status": 401, "message": "Unauthorized"}));
    }

    #[test]
    fn test_response_status_and_content_type() {
        let response = JsonResponse::new(StatusCode::BAD_REQUEST, "nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
