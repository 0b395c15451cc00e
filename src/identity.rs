use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorCode};

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// Account creation at the hosted authentication service. The service owns
/// passwords and token issuance; we only ask it to create an account and get
/// the new uid back.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an email/password account and returns its uid.
    ///
    /// Provider rejections surface as `AppError::Identity` carrying the
    /// classified code (email taken, weak password, ...).
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String>;
}

/// IdentityState
///
/// The concrete type used to share the identity provider across the application state.
pub type IdentityState = Arc<dyn IdentityProvider>;

// 2. The Real Implementation (REST sign-up endpoint)
/// HttpIdentityProvider
///
/// Talks to the provider's `accounts:signUp` REST endpoint.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String> {
        let url = format!("{}/v1/accounts:signUp", self.base_url);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let code = match response.json::<ProviderErrorBody>().await {
                Ok(body) => ErrorCode::from_identity(&body.error.message),
                Err(_) => ErrorCode::Unknown,
            };
            tracing::warn!(%status, code = code.as_str(), "identity provider rejected sign-up");
            return Err(AppError::Identity(code));
        }

        let created = response.json::<SignUpResponse>().await?;
        Ok(created.local_id)
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityProvider
///
/// Accepts every sign-up with a fresh uid unless a rejection is configured.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    /// When set, every sign-up fails with this code.
    pub rejection: Option<ErrorCode>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self { rejection: None }
    }

    pub fn rejecting(code: ErrorCode) -> Self {
        Self {
            rejection: Some(code),
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, _email: &str, _password: &str) -> AppResult<String> {
        if let Some(code) = self.rejection {
            return Err(AppError::Identity(code));
        }
        Ok(format!("mock-{}", Uuid::new_v4().simple()))
    }
}
