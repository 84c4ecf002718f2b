//! Read-only admin endpoints over the compiled route table.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::route::{Diagnostic, RouteSummary, RouteTable};

/// Snapshot handed to the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub api_key: Arc<str>,
    pub routes: Arc<Vec<RouteSummary>>,
    pub diagnostics: Arc<Vec<Diagnostic>>,
    pub started: Instant,
}

impl AdminState {
    pub fn new(api_key: impl Into<Arc<str>>, table: &RouteTable) -> Self {
        Self {
            api_key: api_key.into(),
            routes: Arc::new(table.summaries()),
            diagnostics: Arc::new(table.diagnostics().to_vec()),
            started: Instant::now(),
        }
    }
}

pub const STATUS_PATH: &str = "/_admin/status";
pub const ROUTES_PATH: &str = "/_admin/routes";
pub const DIAGNOSTICS_PATH: &str = "/_admin/diagnostics";

/// Paths served by the admin router; application routes may not use them.
pub const ADMIN_PATHS: [&str; 3] = [STATUS_PATH, ROUTES_PATH, DIAGNOSTICS_PATH];

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route(STATUS_PATH, get(get_status))
        .route(ROUTES_PATH, get(get_routes))
        .route(DIAGNOSTICS_PATH, get(get_diagnostics))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
