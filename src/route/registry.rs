//! Controller registration front door.

use std::path::Path;
use std::sync::Arc;

use axum::http::Method;

use super::table::{Diagnostic, DiagnosticKind, RouteTable};
use super::{builder, reflect, Controller, RouteTree};
use crate::annotation::MappingRegistry;
use crate::config::RoutingConfig;

/// Registers a controller with the source file of the calling module.
///
/// ```ignore
/// annoroute::register!(registry, UserController::default());
/// ```
#[macro_export]
macro_rules! register {
    ($registry:expr, $controller:expr) => {
        $registry.register_at($controller, file!())
    };
}

/// Collects controllers into the route tree and builds the route table.
#[derive(Debug)]
pub struct RouteRegistry {
    config: RoutingConfig,
    mappings: MappingRegistry,
    tree: RouteTree,
    diagnostics: Vec<Diagnostic>,
}

impl RouteRegistry {
    pub fn new(config: RoutingConfig) -> Self {
        let tree = RouteTree::new(&config.root_path, config.default_version.clone());
        Self {
            config,
            mappings: MappingRegistry::default(),
            tree,
            diagnostics: Vec::new(),
        }
    }

    /// Reflects `controller` and files it under the module derived from
    /// `source`. Failures are logged and kept as diagnostics.
    pub fn register_at<C: Controller>(&mut self, controller: C, source: impl AsRef<Path>) -> &mut Self {
        let source = source.as_ref();
        let subject = format!("{} ({})", C::type_name(), source.display());

        let entry = match reflect(Arc::new(controller)) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(controller = C::type_name(), error = %err, "controller rejected");
                self.diagnostics
                    .push(Diagnostic::new(DiagnosticKind::Rejected, subject, err.to_string()));
                return self;
            }
        };

        match self.tree.module_for(source) {
            Ok(module) => {
                tracing::debug!(
                    controller = %entry.name,
                    module = %module.name,
                    actions = entry.actions.len(),
                    "controller registered"
                );
                module.controllers.push(entry);
            }
            Err(err) => {
                tracing::warn!(controller = C::type_name(), error = %err, "no module for controller");
                self.diagnostics
                    .push(Diagnostic::new(DiagnosticKind::NoModule, subject, err.to_string()));
            }
        }
        self
    }

    /// Directive table, open for custom annotations until `build`.
    pub fn mappings_mut(&mut self) -> &mut MappingRegistry {
        &mut self.mappings
    }

    pub fn mappings(&self) -> &MappingRegistry {
        &self.mappings
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Builds with the configured default methods.
    pub fn build_default(self) -> RouteTable {
        let methods = self.config.methods();
        self.build(&methods)
    }

    /// Walks the tree and compiles every registration. `default_methods`
    /// applies to actions without a usable annotation.
    pub fn build(self, default_methods: &[Method]) -> RouteTable {
        let mut table = RouteTable::new(self.diagnostics);
        builder::build(&self.tree, &self.mappings, &self.config, default_methods, &mut table);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{boxed, Dispatch, Outcome};
    use crate::route::{ActionDef, Reflect};

    #[derive(Default)]
    struct Ping;

    impl Ping {
        async fn ping(&self, dispatch: &mut Dispatch) -> Outcome {
            dispatch.success("pong")
        }
    }

    impl Reflect for Ping {
        fn type_name() -> &'static str {
            "Ping"
        }

        fn actions() -> Vec<ActionDef<Self>> {
            vec![ActionDef::<Self>::new("ping", "", |this, d| boxed(this.ping(d)))]
        }
    }

    impl Controller for Ping {}

    #[test]
    fn test_register_collects_diagnostics() {
        let mut registry = RouteRegistry::new(RoutingConfig::default());
        registry
            .register_at(Ping, "src/application/index/controller/ping.rs")
            .register_at(Ping, "src/ping.rs");

        assert_eq!(registry.tree().versions()[0].modules[0].controllers.len(), 1);
        assert_eq!(registry.diagnostics().len(), 1);
        assert_eq!(registry.diagnostics()[0].kind, DiagnosticKind::NoModule);

        let table = registry.build(&[Method::GET]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.routes()[0].path, "/index/ping/ping");
        assert_eq!(table.diagnostics().len(), 1);
    }
}
