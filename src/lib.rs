//! BookNest application library
//!
//! A REST service for a single `book` resource stored in MongoDB. The books
//! module owns the model, the persistence adapter, and the handlers; [`run`]
//! wires it into the HTTP server.

use anyhow::Context;
use booknest_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;

/// Initialize every module, serve HTTP until shutdown, then stop the modules.
///
/// Fails without binding a listener when the store cannot be reached.
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    run_with(&registry, settings).await
}

/// Same as [`run`] for a caller-assembled registry.
pub async fn run_with(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let ctx = InitCtx { settings };

    registry
        .init_all(&ctx)
        .await
        .context("module initialization failed")?;
    registry
        .start_all(&ctx)
        .await
        .context("module start failed")?;

    let served = booknest_http::start_server(registry, settings).await;
    let stopped = registry.stop_all().await;

    served?;
    stopped
}
