//! Book catalog console: credential handling, client-side search and
//! write-gated edits against a remote GraphQL catalog.

pub mod bootstrap;
pub mod modules;
pub mod utils;

pub use modules::books::{
    BookDraft, BookId, BookKind, BookRecord, BookSource, CatalogSession, GatewayError,
    GraphQlCatalog, SearchCriteria, SessionError, Status,
};
pub use modules::AppState;
