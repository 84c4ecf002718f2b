//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!     → logging.rs subscriber (pretty or JSON, EnvFilter)
//!
//! Notable targets:
//!     → annoroute::routes (one line per registration, debug mode only)
//!     → tower_http::trace (one span per request, carries x-request-id)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every request span
//! - RUST_LOG wins over the configured level

pub mod logging;

pub use logging::{filter_directive, init};
