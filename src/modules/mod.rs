pub mod auth;
pub mod books;

use std::sync::Arc;

use anyhow::Context;
use shelf_authz::{store, AuthProvider, HttpTokenIssuer};
use shelf_kernel::{settings::Settings, ModuleRegistry};

use books::{BookSource, CatalogSession, GraphQlCatalog};

/// Shared services handed to every module.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthProvider>,
    pub session: Arc<CatalogSession>,
}

impl AppState {
    pub fn new(auth: Arc<AuthProvider>, source: Arc<dyn BookSource>) -> Self {
        let session = Arc::new(CatalogSession::new(source, auth.clone()));
        Self { auth, session }
    }

    /// Wire the HTTP token issuer, the configured token store and the
    /// GraphQL catalog client.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let issuer = HttpTokenIssuer::from_settings(&settings.api)
            .context("failed to build token issuer")?;
        let auth = Arc::new(AuthProvider::new(
            Arc::new(issuer),
            store::from_settings(&settings.auth),
            settings.auth.admin_role.clone(),
        ));

        let catalog =
            GraphQlCatalog::from_settings(&settings.api).context("failed to build catalog client")?;

        Ok(Self::new(auth, Arc::new(catalog)))
    }
}

/// Register the auth core module and the books module.
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register_core(Arc::new(auth::AuthModule::new(state.auth.clone())));
    registry.register_custom(Arc::new(books::BooksModule::new(state.session.clone())));
}
