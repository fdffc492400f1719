//! Error types for credential handling.

/// Why a token's claims payload could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("token has no claims segment")]
    MissingPayload,

    #[error("claims segment is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("claims segment is not a JSON claims object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Authentication and authorization failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token endpoint unreachable or the request could not be sent.
    #[error("network error: {message}")]
    Network { message: String },

    /// Token endpoint answered with a non-success status.
    #[error("credentials rejected with status {status}")]
    Rejected { status: u16 },

    /// Token endpoint answered 2xx but without a usable token.
    #[error("invalid token response: {message}")]
    InvalidResponse { message: String },

    /// HTTP client could not be constructed.
    #[error("client configuration error: {message}")]
    Client { message: String },

    /// A write operation was attempted without write access.
    #[error("write access required")]
    Forbidden,
}
