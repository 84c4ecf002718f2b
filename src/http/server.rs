//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the compiled route table on an axum Router
//! - Wire up middleware (tracing, limits, timeout, request ID, panic guard)
//! - Merge the admin endpoints when enabled
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::HeaderName, http::Request, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState, ADMIN_PATHS};
use crate::config::AppConfig;
use crate::dispatch::DispatchRuntime;
use crate::route::RouteTable;

pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP server for the compiled routes.
pub struct HttpServer {
    router: Router,
    routes: usize,
}

impl HttpServer {
    /// Create a new HTTP server for `table`. With admin enabled, routes on
    /// the admin paths are dropped with a diagnostic.
    pub fn new(config: &AppConfig, mut table: RouteTable, runtime: Arc<DispatchRuntime>) -> Self {
        if config.admin.enabled {
            table.reserve(&ADMIN_PATHS, "admin");
        }
        let routes = table.len();
        let admin = config
            .admin
            .enabled
            .then(|| AdminState::new(config.admin.api_key.as_str(), &table));

        let mut router = table.into_router(runtime);
        if let Some(state) = admin {
            router = router.merge(setup_admin_router(state));
        }

        Self {
            router: Self::build_router(config, router),
            routes,
        }
    }

    /// Wrap the application routes with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, routes: Router) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        routes
            .layer(CatchPanicLayer::new())
            .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %id,
                )
            }))
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn route_count(&self) -> usize {
        self.routes
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.routes, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
