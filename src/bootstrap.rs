//! Process wiring for the console server.

use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, AppState};

/// Build the registry for `state`, in the order modules are started.
pub fn registry(state: &AppState) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state);
    registry
}

/// Run the console until ctrl-c, then stop modules in reverse order.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::from_settings(&settings)?;
    let registry = registry(&state);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;
    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    tracing::info!(
        core = registry.core_module_count(),
        custom = registry.custom_module_count(),
        "modules started"
    );

    let served = shelf_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry
        .stop_custom_modules()
        .await
        .context("failed to stop custom modules")?;
    registry
        .stop_core_modules()
        .await
        .context("failed to stop core modules")?;

    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
