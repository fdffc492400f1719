//! Access to the remote catalog.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use shelf_kernel::settings::ApiSettings;

use super::graphql;
use super::models::{BookDraft, BookId, BookRecord};

const USER_AGENT_VALUE: &str = concat!("shelf/", env!("CARGO_PKG_VERSION"));

/// Remote catalog failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("catalog answered with status {status}")]
    Status { status: u16 },

    /// The catalog reported an error in the GraphQL `errors` array.
    #[error("catalog rejected the request: {message}")]
    Rejected { message: String },

    #[error("invalid catalog response: {message}")]
    InvalidResponse { message: String },

    #[error("book {id} not found")]
    NotFound { id: BookId },

    #[error("client configuration error: {message}")]
    Client { message: String },
}

/// The operations the console consumes from the catalog.
#[async_trait]
pub trait BookSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<BookRecord>, GatewayError>;

    async fn fetch_by_id(&self, id: BookId) -> Result<BookRecord, GatewayError>;

    async fn create(&self, draft: &BookDraft, token: &str) -> Result<BookId, GatewayError>;

    /// Returns the new version. Fails when `version` is stale.
    async fn update(
        &self,
        id: BookId,
        version: u32,
        draft: &BookDraft,
        token: &str,
    ) -> Result<u32, GatewayError>;

    async fn delete(&self, id: BookId, token: &str) -> Result<(), GatewayError>;
}

/// GraphQL-over-HTTP client for the catalog.
#[derive(Debug, Clone)]
pub struct GraphQlCatalog {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphQlCatalog {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| GatewayError::Client {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_settings(api: &ApiSettings) -> Result<Self, GatewayError> {
        Self::new(
            api.graphql_url(),
            Duration::from_millis(api.timeout_ms),
            api.accept_invalid_certs,
        )
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
        token: Option<&str>,
    ) -> Result<T, GatewayError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&graphql::Request { query, variables });
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| GatewayError::Network {
            message: e.to_string(),
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| GatewayError::Network {
            message: e.to_string(),
        })?;

        // GraphQL servers put errors in the body even on 4xx.
        match serde_json::from_slice::<graphql::Response<T>>(&body) {
            Ok(envelope) => {
                if let Some(first) = envelope.errors.into_iter().next() {
                    return Err(GatewayError::Rejected {
                        message: first.message,
                    });
                }
                if !status.is_success() {
                    return Err(GatewayError::Status {
                        status: status.as_u16(),
                    });
                }
                envelope.data.ok_or_else(|| GatewayError::InvalidResponse {
                    message: "response carries neither data nor errors".to_string(),
                })
            }
            Err(_) if !status.is_success() => Err(GatewayError::Status {
                status: status.as_u16(),
            }),
            Err(err) => Err(GatewayError::InvalidResponse {
                message: err.to_string(),
            }),
        }
    }
}

#[async_trait]
impl BookSource for GraphQlCatalog {
    async fn fetch_all(&self) -> Result<Vec<BookRecord>, GatewayError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching all books");
        let data: graphql::AllBooks = self.execute(graphql::ALL_BOOKS, json!({}), None).await?;
        Ok(data.buecher)
    }

    async fn fetch_by_id(&self, id: BookId) -> Result<BookRecord, GatewayError> {
        tracing::debug!(book_id = id, "fetching book");
        let data: graphql::OneBook = self
            .execute(graphql::BOOK_BY_ID, json!({ "id": id.to_string() }), None)
            .await?;
        data.buch.ok_or(GatewayError::NotFound { id })
    }

    async fn create(&self, draft: &BookDraft, token: &str) -> Result<BookId, GatewayError> {
        let data: graphql::Created = self
            .execute(
                graphql::CREATE_BOOK,
                json!({ "input": draft.create_input() }),
                Some(token),
            )
            .await?;
        Ok(data.create.id)
    }

    async fn update(
        &self,
        id: BookId,
        version: u32,
        draft: &BookDraft,
        token: &str,
    ) -> Result<u32, GatewayError> {
        let data: graphql::Updated = self
            .execute(
                graphql::UPDATE_BOOK,
                json!({ "input": draft.update_input(id, version) }),
                Some(token),
            )
            .await?;
        Ok(data.update.version)
    }

    async fn delete(&self, id: BookId, token: &str) -> Result<(), GatewayError> {
        let data: graphql::Deleted = self
            .execute(
                graphql::DELETE_BOOK,
                json!({ "id": id.to_string() }),
                Some(token),
            )
            .await?;
        if data.delete {
            Ok(())
        } else {
            Err(GatewayError::NotFound { id })
        }
    }
}
