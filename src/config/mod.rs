//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, ROOT_PATH override)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → routing section → RouteRegistry
//!     → response/templates sections → DispatchRuntime
//!     → server/admin sections → HttpServer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes are compiled once from it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, LoggingConfig, ResponseConfig, RoutingConfig, ServerConfig,
    TemplateConfig,
};
pub use validation::{validate_config, ValidationError};
