//! Authentication-related models

use serde::{Deserialize, Serialize};

/// Signin request body
///
/// Missing fields decode as empty strings; whether that is acceptable is up
/// to the configured credential validator.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Never print the password, not even in debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Current principal as returned by `/api/v1/auth/me`
#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub authenticated: bool,
    pub username: Option<String>,
}
