//! Shared, read-only rendering state handed to every dispatch.

use std::fmt;
use std::sync::Arc;

use super::{MiniJinjaEngine, TemplateEngine};
use crate::config::schema::{AppConfig, ResponseConfig, TemplateConfig};

pub struct DispatchRuntime {
    pub response: ResponseConfig,
    pub templates: TemplateConfig,
    /// Upper bound when buffering a request body.
    pub max_body_bytes: usize,
    engine: Option<Arc<dyn TemplateEngine>>,
}

impl DispatchRuntime {
    pub fn new(response: ResponseConfig, templates: TemplateConfig) -> Self {
        Self {
            response,
            templates,
            max_body_bytes: crate::config::schema::DEFAULT_MAX_BODY_BYTES,
            engine: None,
        }
    }

    /// Runtime for `config`, with a `minijinja` engine over the template
    /// directory when templates are enabled.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut runtime = Self::new(config.response.clone(), config.templates.clone());
        runtime.max_body_bytes = config.server.max_body_bytes;
        if config.templates.enabled {
            runtime.engine = Some(Arc::new(MiniJinjaEngine::new(&config.templates.dir)));
        }
        runtime
    }

    pub fn with_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn engine(&self) -> Option<&Arc<dyn TemplateEngine>> {
        self.engine.as_ref()
    }
}

impl Default for DispatchRuntime {
    fn default() -> Self {
        Self::new(ResponseConfig::default(), TemplateConfig::default())
    }
}

impl fmt::Debug for DispatchRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRuntime")
            .field("response", &self.response)
            .field("templates", &self.templates)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("engine", &self.engine.is_some())
            .finish()
    }
}
