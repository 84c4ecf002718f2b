//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that route defaults name known verbs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::annotation::KNOWN_METHODS;
use crate::config::schema::{AppConfig, ADMIN_KEY_PLACEHOLDER};
use crate::dispatch::reply::is_valid_callback;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("server.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("routing.root_path must not be empty")]
    EmptyRootPath,

    #[error("routing.default_version must not be empty")]
    EmptyDefaultVersion,

    #[error("routing.default_methods must name at least one verb")]
    NoDefaultMethods,

    #[error("routing.default_methods contains unknown verb {0:?}")]
    UnknownMethod(String),

    #[error("response.jsonp_default_handler {0:?} is not a valid callback name")]
    InvalidJsonpHandler(String),

    #[error("response.jsonp_callback_param must not be empty")]
    EmptyCallbackParam,

    #[error("response.xml_root_node {0:?} is not a valid element name")]
    InvalidXmlRoot(String),

    #[error("templates.dir must not be empty when templates are enabled")]
    EmptyTemplateDir,

    #[error("admin.api_key must be set to a real secret when admin is enabled")]
    WeakAdminKey,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let routing = &config.routing;
    if routing.root_path.trim().is_empty() {
        errors.push(ValidationError::EmptyRootPath);
    }
    if routing.default_version.trim().is_empty() {
        errors.push(ValidationError::EmptyDefaultVersion);
    }
    if routing.default_methods.is_empty() {
        errors.push(ValidationError::NoDefaultMethods);
    }
    for name in &routing.default_methods {
        let known = KNOWN_METHODS
            .iter()
            .any(|m| name.trim().eq_ignore_ascii_case(m.as_str()));
        if !known {
            errors.push(ValidationError::UnknownMethod(name.clone()));
        }
    }

    let response = &config.response;
    if !is_valid_callback(&response.jsonp_default_handler) {
        errors.push(ValidationError::InvalidJsonpHandler(response.jsonp_default_handler.clone()));
    }
    if response.jsonp_callback_param.trim().is_empty() {
        errors.push(ValidationError::EmptyCallbackParam);
    }
    let root = &response.xml_root_node;
    let root_ok = root.chars().next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false)
        && root.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !root_ok {
        errors.push(ValidationError::InvalidXmlRoot(root.clone()));
    }

    if config.templates.enabled && config.templates.dir.trim().is_empty() {
        errors.push(ValidationError::EmptyTemplateDir);
    }

    if config.admin.enabled
        && (config.admin.api_key.trim().is_empty() || config.admin.api_key == ADMIN_KEY_PLACEHOLDER)
    {
        errors.push(ValidationError::WeakAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
