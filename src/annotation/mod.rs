//! Annotation subsystem.
//!
//! # Data Flow
//! ```text
//! doc text of a controller method (captured by #[controller], or read
//! from a source file by source.rs)
//!     → parser.rs (lines starting with `@` → Annotation)
//!     → mapping.rs (annotation name → resolver → methods + path)
//!     → route builder
//! ```
//!
//! # Syntax (version 1)
//! ```text
//! @Name(positional, key=value, key2="quoted, value") free form words
//! ```
//! - `Name` matches `[A-Za-z_][A-Za-z0-9_]+`
//! - arguments split on commas outside double quotes
//! - each argument splits on its first `=` outside quotes; a bare argument
//!   is stored under the empty key
//! - words after the argument group are kept as the description

pub mod mapping;
pub mod parser;
pub mod source;

use std::collections::BTreeMap;

use serde::Serialize;

pub use mapping::{Mapping, MappingError, MappingRegistry, MethodToken, Resolution, KNOWN_METHODS};
pub use parser::{parse_doc, parse_line};

/// Attribute key used for a positional argument.
pub const POSITIONAL: &str = "";

/// Attribute map of one annotation. Keys are unique.
pub type Attributes = BTreeMap<String, String>;

/// One parsed `@Name(...)` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub name: String,
    pub attributes: Attributes,
    pub description: Vec<String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            description: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// The unnamed argument, if one was given.
    pub fn positional(&self) -> Option<&str> {
        self.attr(POSITIONAL)
    }
}

/// Errors raised while looking up annotations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    /// The method exists but its documentation carries no `@` directive.
    #[error("no comments")]
    NoComments,

    /// No method with that name is declared for the type.
    #[error("method {type_name}::{method} not found")]
    NotFound { type_name: String, method: String },

    /// The source text could not be parsed.
    #[error("failed to parse source: {0}")]
    Source(String),
}
