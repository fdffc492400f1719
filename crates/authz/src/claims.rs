//! Claims payload decoding.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;

use crate::error::ClaimsError;

/// The subset of issuer claims the console reads. Unknown claims are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    pub fn roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|access| access.roles.as_slice())
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }

    /// Best display name for the holder.
    pub fn username(&self) -> Option<&str> {
        self.preferred_username.as_deref().or(self.sub.as_deref())
    }
}

/// Decode the middle segment of a dot-delimited token.
///
/// The signature is not verified; the remote API does that on every
/// authenticated call.
pub fn decode_claims(token: &str) -> Result<Claims, ClaimsError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(ClaimsError::MissingPayload)?;

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))?;

    Ok(serde_json::from_slice(&bytes)?)
}

/// Derive write access from a token: true only when the claims decode and
/// the role set contains `admin_role`.
pub fn has_write_access(token: &str, admin_role: &str) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.has_role(admin_role),
        Err(err) => {
            tracing::warn!(error = %err, "token claims unreadable; write access withheld");
            false
        }
    }
}
