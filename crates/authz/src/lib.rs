//! Bearer credential handling for the console.
//!
//! [`AuthProvider`] is built once at startup and shared by every consumer.
//! Write access is never stored on its own: it is recomputed from the
//! token's `realm_access.roles` claim whenever the token changes.

pub mod claims;
pub mod error;
pub mod issuer;
pub mod provider;
pub mod store;

pub use claims::{decode_claims, has_write_access, Claims};
pub use error::{AuthError, ClaimsError};
pub use issuer::{HttpTokenIssuer, TokenIssuer};
pub use provider::{AuthProvider, AuthSession};
pub use store::{FileTokenStore, MemoryTokenStore, NoopTokenStore, TokenStore};
