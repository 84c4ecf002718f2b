//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick the filter from RUST_LOG, else from config
//! - Switch between pretty and JSON output
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - A second init is a no-op, so tests can call it freely

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter used when RUST_LOG is unset. Debug mode also enables route traces.
pub fn filter_directive(config: &LoggingConfig, debug: bool) -> String {
    let level = config.level.trim();
    let level = if level.is_empty() { "info" } else { level };
    let mut directive = if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("annoroute={level},tower_http={level}")
    };
    if debug {
        directive.push_str(",annoroute::routes=info");
    }
    directive
}

/// Installs the global subscriber. Returns false if one was already set.
pub fn init(config: &LoggingConfig, debug: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config, debug)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.is_ok()
}
