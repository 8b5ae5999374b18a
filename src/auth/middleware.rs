//! 请求分发策略（开放 / 必须认证 / 可选认证）
//!
//! One middleware, parameterized by [`AuthMode`], gates every route. It
//! extracts the bearer token, verifies it with the shared [`TokenCodec`] and
//! hands the outcome to the handler as an [`AuthContext`] request extension.

use crate::{
    auth::jwt::{Claims, TokenCodec},
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// `Bearer <token>`; the scheme is case-insensitive, everything after the
/// first run of whitespace is the token.
static BEARER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:bearer)\s+(.*)$").expect("Invalid bearer pattern"));

/// How a route is gated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// No check at all
    Open,
    /// Reject unless a valid token is presented
    Required,
    /// Verify if possible, never reject; the handler decides
    Optional,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Open => "open",
            AuthMode::Required => "required",
            AuthMode::Optional => "optional",
        }
    }
}

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub authenticated: bool,
    pub username: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_claims(claims: Claims) -> Self {
        Self {
            authenticated: true,
            username: Some(claims.username),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Succeeds iff the request was authenticated.
    ///
    /// The error renders as the 401 response, so a handler behind an
    /// optional gate short-circuits with `auth.check_auth()?`.
    pub fn check_auth(&self) -> Result<&str, AppError> {
        match (&self.username, self.authenticated) {
            (Some(username), true) => Ok(username),
            _ => Err(AppError::Unauthorized),
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        // A route mounted without any gate is treated as anonymous.
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// 从 Authorization 头提取令牌
///
/// Only the first `Authorization` header is considered. A missing header is
/// `Unauthorized`; a present header that is not `Bearer <token>` is a
/// malformed request.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?;

    let value = value.to_str().map_err(|_| AppError::malformed_header())?;

    BEARER_PATTERN
        .captures(value)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
        .ok_or_else(AppError::malformed_header)
}

/// A gate: the codec plus the mode it enforces
#[derive(Clone)]
pub struct DispatchPolicy {
    codec: Arc<TokenCodec>,
    mode: AuthMode,
}

impl DispatchPolicy {
    pub fn new(codec: Arc<TokenCodec>, mode: AuthMode) -> Self {
        Self { codec, mode }
    }

    pub fn open(codec: Arc<TokenCodec>) -> Self {
        Self::new(codec, AuthMode::Open)
    }

    pub fn required(codec: Arc<TokenCodec>) -> Self {
        Self::new(codec, AuthMode::Required)
    }

    pub fn optional(codec: Arc<TokenCodec>) -> Self {
        Self::new(codec, AuthMode::Optional)
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Verify the request's bearer token
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        let token = extract_token(headers)?;
        let claims = self.codec.verify(token)?;
        Ok(AuthContext::from_claims(claims))
    }

    /// Decide the context for a request, or the rejection to send instead
    pub fn admit(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        match self.mode {
            AuthMode::Open => Ok(AuthContext::anonymous()),
            AuthMode::Required => self.authenticate(headers),
            AuthMode::Optional => match self.authenticate(headers) {
                Ok(context) => Ok(context),
                // An unconfigured codec is a deployment fault, not a guest.
                Err(e @ AppError::Config(_)) => Err(e),
                Err(e) => {
                    tracing::debug!(reason = %e, "Optional auth fell back to anonymous");
                    Ok(AuthContext::anonymous())
                }
            },
        }
    }
}

/// 分发中间件
pub async fn dispatch(
    State(policy): State<DispatchPolicy>,
    mut req: Request,
    next: Next,
) -> Response {
    let mode = policy.mode().as_str();

    match policy.admit(req.headers()) {
        Ok(context) => {
            let outcome = if context.is_authenticated() {
                "authenticated"
            } else {
                "anonymous"
            };
            metrics::counter!("auth_dispatch_total", "mode" => mode, "outcome" => outcome)
                .increment(1);
            tracing::debug!(mode, authenticated = context.is_authenticated(), "Request admitted");

            req.extensions_mut().insert(context);
            next.run(req).await
        }
        Err(e) => {
            metrics::counter!("auth_dispatch_total", "mode" => mode, "outcome" => "rejected")
                .increment(1);
            tracing::warn!(mode, status = e.code(), uri = %req.uri().path(), "Request rejected");

            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &[u8] = b"test_secret_key_32_characters_long!";

    fn codec() -> Arc<TokenCodec> {
        let codec = TokenCodec::default();
        codec.configure(SECRET).unwrap();
        Arc::new(codec)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_token_valid() {
        assert_eq!(extract_token(&headers("Bearer test_token_123")).unwrap(), "test_token_123");
    }

    #[test]
    fn test_extract_token_scheme_case_insensitive() {
        assert_eq!(extract_token(&headers("bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(extract_token(&headers("BEARER abc")).unwrap(), "abc");
    }

    #[test]
    fn test_extract_token_extra_whitespace() {
        assert_eq!(extract_token(&headers("Bearer  \t abc")).unwrap(), "abc");
    }

    #[test]
    fn test_extract_token_keeps_inner_whitespace() {
        assert_eq!(extract_token(&headers("Bearer abc def")).unwrap(), "abc def");
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(extract_token(&headers), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_extract_token_invalid_format() {
        for value in ["InvalidFormat", "Bearer", "Basic dXNlcjpwYXNz", "Bearerabc"] {
            assert!(
                matches!(extract_token(&headers(value)), Err(AppError::MalformedRequest(_))),
                "{value} should be malformed"
            );
        }
    }

    #[test]
    fn test_extract_token_first_header_wins() {
        let mut headers = headers("Bearer first");
        headers.append(header::AUTHORIZATION, HeaderValue::from_static("Bearer second"));
        assert_eq!(extract_token(&headers).unwrap(), "first");
    }

    #[test]
    fn test_extract_token_non_ascii_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert!(matches!(extract_token(&headers), Err(AppError::MalformedRequest(_))));
    }

    #[test]
    fn test_required_admits_valid_token() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();
        let policy = DispatchPolicy::required(codec);

        let context = policy.admit(&headers(&format!("Bearer {}", token))).unwrap();
        assert!(context.authenticated);
        assert_eq!(context.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_required_rejects() {
        let policy = DispatchPolicy::required(codec());

        assert!(matches!(policy.admit(&HeaderMap::new()), Err(AppError::Unauthorized)));
        assert!(matches!(policy.admit(&headers("Bearer")), Err(AppError::MalformedRequest(_))));
        assert!(matches!(policy.admit(&headers("Bearer a.b.c")), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_optional_never_rejects() {
        let policy = DispatchPolicy::optional(codec());

        for headers in [HeaderMap::new(), headers("Bearer"), headers("Bearer a.b.c")] {
            let context = policy.admit(&headers).unwrap();
            assert!(!context.authenticated);
            assert!(context.check_auth().is_err());
        }
    }

    #[test]
    fn test_open_ignores_header() {
        let policy = DispatchPolicy::open(codec());
        assert_eq!(policy.admit(&headers("Bearer")).unwrap(), AuthContext::anonymous());
    }

    #[test]
    fn test_unconfigured_codec_is_server_error() {
        let policy = DispatchPolicy::optional(Arc::new(TokenCodec::default()));
        let err = policy.admit(&headers("Bearer a.b.c")).unwrap_err();
        assert_eq!(err.code(), 500);
    }

    #[test]
    fn test_check_auth() {
        let context = AuthContext {
            authenticated: true,
            username: Some("alice".to_string()),
        };
        assert_eq!(context.check_auth().unwrap(), "alice");
        assert!(matches!(AuthContext::anonymous().check_auth(), Err(AppError::Unauthorized)));
    }
}
