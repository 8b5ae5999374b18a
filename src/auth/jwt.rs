//! Bearer token issuance and verification
//! HS256-signed JWTs carrying the username and an expiry

use crate::config::AppConfig;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use once_cell::sync::OnceCell;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default token lifetime when none is configured
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;

/// Token-level failures
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token codec used before a secret was configured")]
    NotConfigured,

    #[error("token codec is already configured")]
    AlreadyConfigured,

    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}

/// JWT claims embedded in every issued token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Username
    pub username: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Expiry is strict: a token is dead at the exact second it expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies bearer tokens.
///
/// The secret is written once through [`TokenCodec::configure`] before the
/// server starts accepting requests and is read-only afterwards, so the codec
/// can be shared behind an `Arc` without locking.
pub struct TokenCodec {
    keys: OnceCell<SigningKeys>,
    default_ttl: Duration,
}

impl TokenCodec {
    /// Unconfigured codec with the given default lifetime
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            keys: OnceCell::new(),
            default_ttl,
        }
    }

    /// Create and configure the codec from config
    pub fn from_config(config: &AppConfig) -> Result<Self, TokenError> {
        let codec = Self::new(Duration::seconds(config.security.token_ttl_secs as i64));
        codec.configure(config.security.jwt_secret.expose_secret().as_bytes())?;
        Ok(codec)
    }

    /// Store the signing secret. May only succeed once.
    pub fn configure(&self, secret: &[u8]) -> Result<(), TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        self.keys
            .set(SigningKeys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            })
            .map_err(|_| TokenError::AlreadyConfigured)?;

        tracing::debug!("Token codec configured");
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.keys.get().is_some()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn keys(&self) -> Result<&SigningKeys, TokenError> {
        self.keys.get().ok_or(TokenError::NotConfigured)
    }

    /// Issue a token with the default lifetime
    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        self.issue_with_ttl(username, self.default_ttl)
    }

    /// Issue a token that expires `ttl` from now
    pub fn issue_with_ttl(&self, username: &str, ttl: Duration) -> Result<String, TokenError> {
        let keys = self.keys()?;
        let now = Utc::now();

        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            TokenError::Signing(e.to_string())
        })
    }

    /// Check signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let keys = self.keys()?;

        // Expiry is checked below with zero leeway and `>=` semantics, which
        // jsonwebtoken's own exp validation does not offer.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(token, &keys.decoding, &validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                classify(token, e)
            })?
            .claims;

        if claims.is_expired_at(Utc::now()) {
            tracing::debug!(username = %claims.username, exp = claims.exp, "Token expired");
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TOKEN_TTL_SECS as i64))
    }
}

fn classify(token: &str, e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        _ if names_foreign_algorithm(token) => TokenError::InvalidSignature,
        _ => TokenError::Malformed(e.to_string()),
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// jsonwebtoken rejects headers naming an algorithm it has no variant for
/// (`none` included) as a parse error, so the header is read by hand here.
fn names_foreign_algorithm(token: &str) -> bool {
    let Some((header, _)) = token.split_once('.') else {
        return false;
    };

    URL_SAFE_NO_PAD
        .decode(header)
        .ok()
        .and_then(|raw| serde_json::from_slice::<RawHeader>(&raw).ok())
        .is_some_and(|header| header.alg != "HS256")
}
