//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, graceful shutdown)
//!     → request id → trace span → timeout → body limit → panic guard
//!     → route table router (one endpoint per registration)
//!     → admin router (optional, bearer protected)
//! ```

pub mod server;

pub use server::{HttpServer, X_REQUEST_ID};
