//! Annotation name → route resolver table.
//!
//! # Responsibilities
//! - Hold one resolver per directive name (`Request`, `Get`, `Post`, ...)
//! - Turn an annotation's attributes into a method list and optional path
//! - Report an empty method list as an invalid route, never panic
//!
//! # Design Decisions
//! - Built once before route building, read-only afterwards
//! - Unknown method tokens are dropped silently
//! - No path means "use the convention path"

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use super::{Attributes, POSITIONAL};
use crate::naming::normalize_route_path;

/// Verbs a route may be registered for, in canonical order.
pub const KNOWN_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Raw method token handed to a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodToken {
    /// Any known verb.
    Any,
    /// A single verb.
    Verb(Method),
}

impl MethodToken {
    fn base(&self) -> Vec<Method> {
        match self {
            MethodToken::Any => KNOWN_METHODS.to_vec(),
            MethodToken::Verb(method) => vec![method.clone()],
        }
    }
}

/// Resolved routing intent of one annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub methods: Vec<Method>,
    /// `None` means the convention path applies.
    pub path: Option<String>,
}

impl Resolution {
    /// Trace label: `Any` for the full verb set, otherwise the verbs joined by spaces.
    pub fn label(&self) -> String {
        method_label(&self.methods)
    }
}

pub(crate) fn method_label(methods: &[Method]) -> String {
    if methods.len() == KNOWN_METHODS.len() && KNOWN_METHODS.iter().all(|m| methods.contains(m)) {
        return "Any".to_string();
    }
    methods.iter().map(Method::as_str).collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The `method` attribute narrowed the verb set to nothing.
    #[error("invalid route: method list {requested:?} leaves no usable verb")]
    InvalidRoute { requested: String },
}

/// Resolver contract: raw method token plus attributes → methods and path.
pub type Resolver =
    Arc<dyn Fn(&MethodToken, &Attributes) -> Result<Resolution, MappingError> + Send + Sync>;

/// A registered directive.
#[derive(Clone)]
pub struct Mapping {
    token: MethodToken,
    resolver: Resolver,
}

impl Mapping {
    pub fn new(token: MethodToken, resolver: Resolver) -> Self {
        Self { token, resolver }
    }

    pub fn token(&self) -> &MethodToken {
        &self.token
    }

    pub fn resolve(&self, attributes: &Attributes) -> Result<Resolution, MappingError> {
        (self.resolver)(&self.token, attributes)
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping").field("token", &self.token).finish_non_exhaustive()
    }
}

/// Name-keyed resolver table.
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    mappings: HashMap<String, Mapping>,
}

impl MappingRegistry {
    /// An empty table with no directives.
    pub fn empty() -> Self {
        Self { mappings: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, token: MethodToken, resolver: Resolver) {
        self.mappings.insert(name.into(), Mapping::new(token, resolver));
    }

    pub fn get(&self, name: &str) -> Option<&Mapping> {
        self.mappings.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.mappings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MappingRegistry {
    /// `Request` for any verb plus one directive per known verb.
    fn default() -> Self {
        let mut registry = Self::empty();
        let standard: Resolver = Arc::new(request_mapping);
        registry.register("Request", MethodToken::Any, standard.clone());
        for (name, method) in [
            ("Get", Method::GET),
            ("Post", Method::POST),
            ("Put", Method::PUT),
            ("Patch", Method::PATCH),
            ("Delete", Method::DELETE),
            ("Head", Method::HEAD),
            ("Options", Method::OPTIONS),
        ] {
            registry.register(name, MethodToken::Verb(method), standard.clone());
        }
        registry
    }
}

/// Standard resolver shared by every built-in directive.
///
/// Path precedence is positional, then `path`, then `value`. The `method`
/// attribute narrows the token's verbs.
pub fn request_mapping(
    token: &MethodToken,
    attributes: &Attributes,
) -> Result<Resolution, MappingError> {
    let base = token.base();

    let methods = match attributes.get("method") {
        Some(requested) => {
            let narrowed = narrow_methods(&base, requested);
            if narrowed.is_empty() {
                return Err(MappingError::InvalidRoute { requested: requested.clone() });
            }
            narrowed
        }
        None => base,
    };

    let path = [POSITIONAL, "path", "value"]
        .iter()
        .filter_map(|key| attributes.get(*key))
        .last()
        .map(|raw| normalize_route_path(raw.trim().trim_matches('"')))
        .filter(|path| !path.is_empty());

    Ok(Resolution { methods, path })
}

/// Intersects a raw `GET,POST` style list with `base`, keeping canonical order.
fn narrow_methods(base: &[Method], requested: &str) -> Vec<Method> {
    let compact: String = requested.chars().filter(|c| !c.is_whitespace()).collect();
    let tokens: Vec<String> = compact
        .trim_matches('"')
        .split(',')
        .map(str::to_ascii_uppercase)
        .collect();

    KNOWN_METHODS
        .iter()
        .filter(|method| base.contains(method))
        .filter(|method| tokens.iter().any(|token| token == method.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::parse_line;

    fn resolve(line: &str) -> Result<Resolution, MappingError> {
        let annotation = parse_line(line).unwrap();
        let registry = MappingRegistry::default();
        registry.get(&annotation.name).unwrap().resolve(&annotation.attributes)
    }

    #[test]
    fn test_request_narrows_and_drops_unknown_verbs() {
        let resolution = resolve(r#"Request(method="GET,POST,BOGUS")"#).unwrap();
        assert_eq!(resolution.methods, vec![Method::GET, Method::POST]);
        assert_eq!(resolution.path, None);
    }

    #[test]
    fn test_request_with_only_unknown_verbs_is_invalid() {
        let err = resolve(r#"Request(method="BOGUS")"#).unwrap_err();
        assert!(matches!(err, MappingError::InvalidRoute { .. }));
    }

    #[test]
    fn test_value_and_method_round_trip_ignores_whitespace() {
        for line in [
            r#"Request(value="v", method="GET, POST")"#,
            r#"Request(value="v", method="GET ,   POST")"#,
            r#"Request( value = "v" , method = "GET,POST" )"#,
        ] {
            let resolution = resolve(line).unwrap();
            assert_eq!(resolution.path.as_deref(), Some("v"), "{}", line);
            assert_eq!(resolution.methods, vec![Method::GET, Method::POST], "{}", line);
        }
    }

    #[test]
    fn test_verb_directive_uses_positional_path() {
        let resolution = resolve(r#"Get("custom")"#).unwrap();
        assert_eq!(resolution.methods, vec![Method::GET]);
        assert_eq!(resolution.path.as_deref(), Some("custom"));
    }

    #[test]
    fn test_value_outranks_path_and_positional() {
        let resolution = resolve(r#"Post(first, path="second", value="third")"#).unwrap();
        assert_eq!(resolution.path.as_deref(), Some("third"));
    }

    #[test]
    fn test_verb_directive_cannot_widen() {
        let err = resolve(r#"Get(method="POST")"#).unwrap_err();
        assert!(matches!(err, MappingError::InvalidRoute { .. }));
        let resolution = resolve(r#"Get(method="get,post")"#).unwrap();
        assert_eq!(resolution.methods, vec![Method::GET]);
    }

    #[test]
    fn test_rooted_paths_are_normalised() {
        let resolution = resolve(r#"Get("\\health//check")"#).unwrap();
        assert_eq!(resolution.path.as_deref(), Some("/health/check"));
    }

    #[test]
    fn test_labels() {
        let any = resolve("Request").unwrap();
        assert_eq!(any.label(), "Any");
        let two = resolve(r#"Request(method="POST,GET")"#).unwrap();
        assert_eq!(two.label(), "GET POST");
    }

    #[test]
    fn test_custom_directive_registration() {
        let mut registry = MappingRegistry::default();
        registry.register(
            "Api",
            MethodToken::Verb(Method::POST),
            Arc::new(|token: &MethodToken, attributes: &Attributes| {
                let mut resolution = request_mapping(token, attributes)?;
                resolution.path = resolution.path.map(|p| format!("api/{}", p));
                Ok(resolution)
            }),
        );
        let annotation = parse_line("Api(orders)").unwrap();
        let resolution = registry.get("Api").unwrap().resolve(&annotation.attributes).unwrap();
        assert_eq!(resolution.path.as_deref(), Some("api/orders"));
        assert!(registry.get("Nope").is_none());
        assert!(registry.names().contains(&"Api"));
    }
}
