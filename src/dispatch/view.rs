//! Template lookup and rendering for `Dispatch::fetch`.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::RouteIdentity;
use crate::naming::clean_path;

/// Arguments of a `fetch` call: template name and call-scoped variables.
#[derive(Debug, Clone, Default)]
pub struct View {
    /// Empty means the convention template of the current action.
    pub template: String,
    pub vars: Map<String, Value>,
}

impl View {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            vars: Map::new(),
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: Value) -> Self {
        self.vars.insert(name.into(), value);
        self
    }
}

impl From<()> for View {
    fn from(_: ()) -> Self {
        View::default()
    }
}

impl From<&str> for View {
    fn from(template: &str) -> Self {
        View::new(template)
    }
}

impl From<String> for View {
    fn from(template: String) -> Self {
        View::new(template)
    }
}

impl<T: Into<String>> From<(T, Value)> for View {
    /// Non-object values carry no variables.
    fn from((template, vars): (T, Value)) -> Self {
        let vars = match vars {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            template: template.into(),
            vars,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("no template engine configured")]
    NotConfigured,

    #[error("template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Renders a named template with a variable map.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, vars: &Map<String, Value>) -> Result<String, TemplateError>;
}

/// `minijinja` environment loading templates from a directory.
pub struct MiniJinjaEngine {
    env: minijinja::Environment<'static>,
    dir: PathBuf,
}

impl MiniJinjaEngine {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let mut env = minijinja::Environment::new();
        env.set_loader(minijinja::path_loader(&dir));
        Self { env, dir }
    }

    /// Uses a prepared environment, e.g. one with templates added in memory.
    pub fn from_environment(env: minijinja::Environment<'static>) -> Self {
        Self {
            env,
            dir: PathBuf::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, name: &str, vars: &Map<String, Value>) -> Result<String, TemplateError> {
        let wrap = |source| TemplateError::Render {
            name: name.to_string(),
            source,
        };
        let template = self.env.get_template(name).map_err(wrap)?;
        template.render(vars).map_err(wrap)
    }
}

/// Template name for `requested` in the context of `identity`.
///
/// The convention name is `{version}/{module}/view/{controller}/{action}`.
/// A rooted name is cleaned and taken as given. A plain name replaces the
/// action part, `./name` keeps only its last segment, and any other dotted
/// name (`../shared/layout`) is cleaned against the full convention name.
/// `extension` is appended when the result has none.
pub fn resolve_template(identity: &RouteIdentity, requested: &str, extension: &str) -> String {
    let convention = format!(
        "{}/{}/view/{}/{}",
        identity.version, identity.module, identity.controller, identity.action
    );
    let convention = convention.trim_start_matches('/');
    let dir = convention.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(".");

    let mut template = if requested.is_empty() {
        convention.to_string()
    } else if requested.starts_with('/') {
        clean_path(requested)
    } else if !requested.starts_with('.') {
        format!("{}/{}", dir, requested)
    } else if let Some(local) = requested.strip_prefix("./") {
        let base = local.rsplit('/').next().unwrap_or(local);
        format!("{}/{}", dir, base)
    } else {
        clean_path(&format!("{}/{}", convention, requested))
    };

    let extension = extension.trim_start_matches('.');
    if Path::new(&template).extension().is_none() && !extension.is_empty() {
        template.push('.');
        template.push_str(extension);
    }
    template.trim_start_matches('/').to_string()
}
