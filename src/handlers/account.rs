//! 可选认证路由的处理器

use crate::{auth::middleware::AuthContext, error::AppError, models::response::JsonResponse};

/// Greets the caller by name if the token checked out, as a guest otherwise
pub async fn greeting(auth_context: AuthContext) -> JsonResponse {
    match auth_context.username {
        Some(username) if auth_context.is_authenticated() => {
            JsonResponse::ok(format!("Hello, {}", username))
        }
        _ => JsonResponse::ok("Hello, guest"),
    }
}

/// Mounted behind the optional gate; the handler itself insists on a user
pub async fn profile(auth_context: AuthContext) -> Result<JsonResponse, AppError> {
    let username = auth_context.check_auth()?;

    Ok(JsonResponse::ok(format!("Profile of {}", username)))
}
