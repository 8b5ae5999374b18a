//! Authentication module

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod validator;

pub use jwt::{Claims, TokenCodec, TokenError};
pub use middleware::{dispatch, extract_token, AuthContext, AuthMode, DispatchPolicy};
pub use password::PasswordHasher;
pub use validator::{CredentialValidator, DenyAll, FnValidator, PasswordTableValidator};
