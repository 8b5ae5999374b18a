//! 登录服务：解析凭据 -> 校验 -> 签发令牌

use crate::{
    auth::{jwt::TokenCodec, validator::CredentialValidator},
    error::AppError,
    models::auth::Credentials,
};
use std::sync::Arc;

pub struct SigninService {
    codec: Arc<TokenCodec>,
    validator: Arc<dyn CredentialValidator>,
}

impl SigninService {
    pub fn new(codec: Arc<TokenCodec>, validator: Arc<dyn CredentialValidator>) -> Self {
        Self { codec, validator }
    }

    /// 用户登录，成功时返回新签发的令牌
    ///
    /// Every step is terminal on failure: an undecodable body is a 400, a
    /// rejected (or failed) credential check a 401, a signing failure a 500.
    pub async fn signin(&self, body: &[u8]) -> Result<String, AppError> {
        let credentials: Credentials = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "Signin body is not valid JSON");
            record_outcome("malformed");
            AppError::malformed_body()
        })?;

        let username = credentials.username.clone();

        if !self.check_credentials(credentials).await {
            tracing::info!(%username, "Signin rejected");
            record_outcome("rejected");
            return Err(AppError::Unauthorized);
        }

        let token = self.codec.issue(&username).map_err(|e| {
            record_outcome("error");
            AppError::from(e)
        })?;

        tracing::info!(%username, "Signin succeeded");
        record_outcome("success");

        Ok(token)
    }

    /// Run the validator in its own task so that a panicking validator is a
    /// rejection for this request only.
    async fn check_credentials(&self, credentials: Credentials) -> bool {
        let validator = self.validator.clone();
        let username = credentials.username.clone();

        match tokio::spawn(async move { validator.validate(&credentials).await }).await {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                tracing::warn!(%username, error = %e, "Credential validator failed");
                false
            }
            Err(e) => {
                tracing::error!(%username, error = %e, "Credential validator aborted");
                false
            }
        }
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("signin_total", "outcome" => outcome).increment(1);
}
