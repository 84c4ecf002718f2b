//! annoroute: annotation-driven routing for axum.
//!
//! Controllers are plain structs whose handler methods carry `@Get(..)`,
//! `@Request(..)` style directives in their doc comments. The crate reflects
//! them into a Version → Module → Controller → Action tree (version and
//! module come from the controller's source path), compiles that tree into
//! an axum router with one middleware chain per route, and gives handlers a
//! `Dispatch` façade with envelope responses, content negotiation and
//! template rendering.
//!
//! ```ignore
//! use annoroute::dispatch::{Dispatch, Outcome};
//!
//! #[derive(Default)]
//! pub struct User;
//!
//! #[annoroute::controller]
//! impl User {
//!     /// @Get("profile/{id}")
//!     pub async fn show(&self, dispatch: &mut Dispatch) -> Outcome {
//!         let id = dispatch.param("id").unwrap_or_default().to_string();
//!         dispatch.success(("ok", serde_json::json!({ "id": id })))
//!     }
//! }
//!
//! impl annoroute::Controller for User {}
//!
//! let mut registry = annoroute::RouteRegistry::new(config.routing.clone());
//! annoroute::register!(registry, User);
//! ```

extern crate self as annoroute;

pub mod admin;
pub mod annotation;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod naming;
pub mod observability;
pub mod route;

pub use annoroute_macros::controller;
pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use route::{Controller, RouteRegistry, RouteTable};
