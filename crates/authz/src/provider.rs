//! The shared credential holder.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::claims::{decode_claims, has_write_access};
use crate::error::AuthError;
use crate::issuer::TokenIssuer;
use crate::store::TokenStore;

#[derive(Debug, Default)]
struct AuthState {
    token: Option<String>,
    write_access: bool,
}

/// Snapshot of the current login state, safe to hand to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub logged_in: bool,
    pub write_access: bool,
    pub username: Option<String>,
}

/// Holds the bearer credential and the write capability derived from it.
///
/// Construct once at startup and share via `Arc`. Every failure path
/// degrades to "not logged in" or "no write access"; nothing here panics or
/// propagates decode errors to callers.
pub struct AuthProvider {
    issuer: Arc<dyn TokenIssuer>,
    store: Arc<dyn TokenStore>,
    admin_role: String,
    state: RwLock<AuthState>,
}

impl AuthProvider {
    /// Build the provider and restore any persisted token.
    pub fn new(
        issuer: Arc<dyn TokenIssuer>,
        store: Arc<dyn TokenStore>,
        admin_role: impl Into<String>,
    ) -> Self {
        let admin_role = admin_role.into();
        let mut state = AuthState::default();

        if let Some(token) = store.get() {
            state.write_access = has_write_access(&token, &admin_role);
            state.token = Some(token);
            tracing::info!(
                write_access = state.write_access,
                "restored persisted credential"
            );
        }

        Self {
            issuer,
            store,
            admin_role,
            state: RwLock::new(state),
        }
    }

    /// Exchange credentials for a token. Returns false on any failure and
    /// leaves the previous credential in place.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let token = match self.issuer.issue(username, password).await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(username, error = %err, "login failed");
                return false;
            }
        };

        let write_access = has_write_access(&token, &self.admin_role);

        if let Err(err) = self.store.set(&token) {
            tracing::warn!(error = %err, "failed to persist credential");
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.token = Some(token);
        state.write_access = write_access;

        tracing::info!(username, write_access, "login succeeded");
        true
    }

    /// Drop the credential and its persisted copy. No network call.
    pub fn logout(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.token = None;
            state.write_access = false;
        }

        if let Err(err) = self.store.remove() {
            tracing::warn!(error = %err, "failed to remove persisted credential");
        }
        tracing::info!("logged out");
    }

    pub fn is_logged_in(&self) -> bool {
        self.read(|state| state.token.as_deref().is_some_and(|t| !t.is_empty()))
    }

    pub fn write_access(&self) -> bool {
        self.read(|state| state.write_access)
    }

    pub fn token(&self) -> Option<String> {
        self.read(|state| state.token.clone())
    }

    /// Token for a write operation, or `Forbidden` without write access.
    pub fn write_token(&self) -> Result<String, AuthError> {
        self.read(|state| match (&state.token, state.write_access) {
            (Some(token), true) => Ok(token.clone()),
            _ => Err(AuthError::Forbidden),
        })
    }

    pub fn session(&self) -> AuthSession {
        let token = self.token();
        let username = token
            .as_deref()
            .and_then(|t| decode_claims(t).ok())
            .and_then(|claims| claims.username().map(str::to_string));

        AuthSession {
            logged_in: self.is_logged_in(),
            write_access: self.write_access(),
            username,
        }
    }

    fn read<T>(&self, f: impl FnOnce(&AuthState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }
}
