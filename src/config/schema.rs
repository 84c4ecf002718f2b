//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::annotation::KNOWN_METHODS;
use crate::dispatch::ContentKind;

pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and request limits.
    pub server: ServerConfig,

    /// Route compilation settings.
    pub routing: RoutingConfig,

    /// Result envelope rendering.
    pub response: ResponseConfig,

    /// Template engine settings.
    pub templates: TemplateConfig,

    /// Log filter and format.
    pub logging: LoggingConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time for request/response in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Directory controller source paths are taken relative to.
    pub root_path: String,

    /// Version folder whose URL segment is elided.
    pub default_version: String,

    /// Verbs for actions without a usable annotation.
    pub default_methods: Vec<String>,

    /// Emit a trace line per registered route.
    pub debug: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            root_path: "src".to_string(),
            default_version: "application".to_string(),
            default_methods: vec!["GET".to_string(), "POST".to_string()],
            debug: false,
        }
    }
}

impl RoutingConfig {
    /// `default_methods` as verbs; unknown names are dropped.
    pub fn methods(&self) -> Vec<Method> {
        KNOWN_METHODS
            .iter()
            .filter(|m| {
                self.default_methods
                    .iter()
                    .any(|name| name.trim().eq_ignore_ascii_case(m.as_str()))
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Content kind when neither the caller nor the request picks one.
    pub default_return_type: ContentKind,

    /// Query parameter carrying the JSONP callback name.
    pub jsonp_callback_param: String,

    /// Callback used when the request names none (or an invalid one).
    pub jsonp_default_handler: String,

    /// Root element of XML replies.
    pub xml_root_node: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            default_return_type: ContentKind::Json,
            jsonp_callback_param: "callback".to_string(),
            jsonp_default_handler: "jsonpReturn".to_string(),
            xml_root_node: "root".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Load templates from `dir` with minijinja.
    pub enabled: bool,

    /// Template directory.
    pub dir: String,

    /// Extension appended to template names that have none.
    pub extension: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "views".to_string(),
            extension: "html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error or a full EnvFilter string).
    pub level: String,

    /// JSON output instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve `/_admin/*` next to the application routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

pub const ADMIN_KEY_PLACEHOLDER: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: ADMIN_KEY_PLACEHOLDER.to_string(),
        }
    }
}
