//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the registry into a route table
//! - Report diagnostics and, in debug mode, the full table
//! - Bind the listener and serve until a signal arrives
//!
//! # Design Decisions
//! - Fail fast on bind and server errors
//! - Listeners start last (traffic only when routes are ready)

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use super::{wait_for_signal, Shutdown};
use crate::config::AppConfig;
use crate::dispatch::DispatchRuntime;
use crate::http::HttpServer;
use crate::route::{RouteRegistry, RouteTable};

/// Logs every diagnostic, and the rendered table when `debug` is set.
pub fn report(table: &RouteTable, debug: bool) {
    for diagnostic in table.diagnostics() {
        tracing::warn!(
            kind = ?diagnostic.kind,
            subject = %diagnostic.subject,
            "{}",
            diagnostic.message
        );
    }
    if debug {
        for line in table.render_table().lines() {
            tracing::info!(target: "annoroute::routes", "{}", line);
        }
    }
    tracing::info!(routes = table.len(), diagnostics = table.diagnostics().len(), "routes compiled");
}

/// Builds the routes from `registry` and serves them until shutdown.
pub async fn serve(config: AppConfig, registry: RouteRegistry) -> anyhow::Result<()> {
    let table = registry.build_default();
    report(&table, config.routing.debug);

    let runtime = Arc::new(DispatchRuntime::from_config(&config));
    let server = HttpServer::new(&config, table, runtime);

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;

    let shutdown = Shutdown::new();
    let mut task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        joined = &mut task => {
            return joined.context("server task panicked")?.context("server failed");
        }
        _ = wait_for_signal() => {}
    }

    shutdown.trigger();
    task.await
        .context("server task panicked")?
        .context("server failed during shutdown")?;
    tracing::info!("Shutdown complete");
    Ok(())
}
