use axum::{extract::State, Json};
use serde::Serialize;

use super::AdminState;
use crate::route::{Diagnostic, RouteSummary};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub diagnostics: usize,
    pub uptime_secs: u64,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.routes.len(),
        diagnostics: state.diagnostics.len(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteSummary>> {
    Json(state.routes.as_ref().clone())
}

pub async fn get_diagnostics(State(state): State<AdminState>) -> Json<Vec<Diagnostic>> {
    Json(state.diagnostics.as_ref().clone())
}
