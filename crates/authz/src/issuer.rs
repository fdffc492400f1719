//! Exchange of username/password for a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shelf_kernel::settings::ApiSettings;

use crate::error::AuthError;

const USER_AGENT_VALUE: &str = concat!("shelf/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, username: &str, password: &str) -> Result<String, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Form-encoded POST against the remote token endpoint.
#[derive(Debug, Clone)]
pub struct HttpTokenIssuer {
    client: reqwest::Client,
    url: String,
}

impl HttpTokenIssuer {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| AuthError::Client {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_settings(api: &ApiSettings) -> Result<Self, AuthError> {
        Self::new(
            api.token_url(),
            Duration::from_millis(api.timeout_ms),
            api.accept_invalid_certs,
        )
    }
}

#[async_trait]
impl TokenIssuer for HttpTokenIssuer {
    async fn issue(&self, username: &str, password: &str) -> Result<String, AuthError> {
        tracing::debug!(url = %self.url, username, "requesting bearer token");

        let response = self
            .client
            .post(&self.url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| AuthError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| AuthError::InvalidResponse {
                    message: format!("failed to parse token response: {}", e),
                })?;

        if body.access_token.trim().is_empty() {
            return Err(AuthError::InvalidResponse {
                message: "empty access_token".to_string(),
            });
        }

        Ok(body.access_token)
    }
}
