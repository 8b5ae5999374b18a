//! Credential validators
//!
//! The signin flow asks a [`CredentialValidator`] whether a username/password
//! pair is acceptable. The embedding application supplies its own; the
//! default [`DenyAll`] rejects everything until it does.

use crate::{auth::password::PasswordHasher, models::auth::Credentials};
use async_trait::async_trait;
use password_hash::PasswordHash;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Checks a username/password pair against an identity source.
///
/// `Ok(false)` is an ordinary rejection (unknown user, wrong password). `Err`
/// is reserved for resource failures such as an unreachable backend; the
/// signin flow treats it as a rejection too.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, credentials: &Credentials) -> anyhow::Result<bool>;
}

/// Fail-closed default
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

#[async_trait]
impl CredentialValidator for DenyAll {
    async fn validate(&self, _credentials: &Credentials) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Adapts a plain predicate.
///
/// The predicate may block (database driver, file lookup), so it runs on the
/// blocking pool rather than on the request task.
pub struct FnValidator<F> {
    predicate: Arc<F>,
}

impl<F> FnValidator<F>
where
    F: Fn(&Credentials) -> bool + Send + Sync + 'static,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

#[async_trait]
impl<F> CredentialValidator for FnValidator<F>
where
    F: Fn(&Credentials) -> bool + Send + Sync + 'static,
{
    async fn validate(&self, credentials: &Credentials) -> anyhow::Result<bool> {
        let predicate = self.predicate.clone();
        let credentials = credentials.clone();

        Ok(tokio::task::spawn_blocking(move || predicate(&credentials)).await?)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserTableError {
    #[error("entry {0} is missing the ':' separator")]
    MissingSeparator(usize),

    #[error("entry {0} has an empty username")]
    EmptyUsername(usize),

    #[error("entry {0} has an invalid password hash")]
    InvalidHash(usize),

    #[error("duplicate username '{0}'")]
    DuplicateUser(String),
}

/// Parse a `name:phc;name:phc` table. Blank entries are ignored.
pub fn parse_user_table(table: &str) -> Result<HashMap<String, String>, UserTableError> {
    let mut users = HashMap::new();

    for (index, entry) in table.split(';').map(str::trim).enumerate() {
        if entry.is_empty() {
            continue;
        }

        let (username, hash) = entry
            .split_once(':')
            .ok_or(UserTableError::MissingSeparator(index))?;
        let username = username.trim();
        let hash = hash.trim();

        if username.is_empty() {
            return Err(UserTableError::EmptyUsername(index));
        }
        PasswordHash::new(hash).map_err(|_| UserTableError::InvalidHash(index))?;

        if users.insert(username.to_string(), hash.to_string()).is_some() {
            return Err(UserTableError::DuplicateUser(username.to_string()));
        }
    }

    Ok(users)
}

/// Validates against an in-memory table of Argon2 PHC hashes
pub struct PasswordTableValidator {
    users: Arc<HashMap<String, String>>,
    hasher: Arc<PasswordHasher>,
}

impl PasswordTableValidator {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self {
            users: Arc::new(users),
            hasher: Arc::new(PasswordHasher::new()),
        }
    }

    pub fn from_table(table: &str) -> Result<Self, UserTableError> {
        Ok(Self::new(parse_user_table(table)?))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialValidator for PasswordTableValidator {
    async fn validate(&self, credentials: &Credentials) -> anyhow::Result<bool> {
        let Some(hash) = self.users.get(&credentials.username).cloned() else {
            tracing::debug!(username = %credentials.username, "Unknown user");
            return Ok(false);
        };

        let hasher = self.hasher.clone();
        let password = credentials.password.clone();

        // Argon2 is deliberately slow; keep it off the async workers
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await?
            .map_err(|e| anyhow::anyhow!("stored password hash unusable: {}", e))?;

        Ok(verified)
    }
}
