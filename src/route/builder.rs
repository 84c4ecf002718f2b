//! Tree walk that turns reflected controllers into route registrations.
//!
//! For every action the chain is, in order: identity setter, exception
//! boundary (if any), capability mount, before-action hooks, controller
//! initializer, action. Each annotation with a known resolver yields one
//! registration; an action with none falls back to the defaults.

use std::sync::Arc;

use axum::http::Method;

use super::group::RouterGroup;
use super::reflect::{Action, ControllerEntry};
use super::table::{Diagnostic, DiagnosticKind, RegisteredRoute, RouteTable};
use super::RouteTree;
use crate::annotation::MappingRegistry;
use crate::config::RoutingConfig;
use crate::dispatch::chain::{CapabilityMount, IdentitySetter};
use crate::dispatch::Middleware;
use crate::naming::{normalize_route_path, validate_route_path};

pub(crate) fn build(
    tree: &RouteTree,
    mappings: &MappingRegistry,
    config: &RoutingConfig,
    default_methods: &[Method],
    table: &mut RouteTable,
) {
    let root = RouterGroup::root();
    for version in tree.versions() {
        let version_group = root.group(&version.path());
        for module in &version.modules {
            let module_group = version_group.group(&module.path());
            for controller in &module.controllers {
                let group = module_group.group(&controller.path());
                for action in &controller.actions {
                    let handler = format!(
                        "{}/{}/{}.{}",
                        version.name, module.name, controller.name, action.name
                    );
                    let context = ActionContext {
                        handler,
                        source: module.absolute_path.display().to_string(),
                        group: &group,
                        default_version: tree.default_version(),
                        stages: stages(controller),
                        config,
                    };
                    build_action(&context, controller, action, mappings, default_methods, table);
                }
            }
        }
    }
}

struct ActionContext<'a> {
    handler: String,
    source: String,
    group: &'a RouterGroup,
    default_version: &'a str,
    /// Exception boundary, mount and hooks.
    stages: Vec<Arc<dyn Middleware>>,
    config: &'a RoutingConfig,
}

impl ActionContext<'_> {
    /// Rooted paths register at the router root, the rest under the group.
    fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            self.group.absolute(path)
        }
    }
}

fn stages(controller: &ControllerEntry) -> Vec<Arc<dyn Middleware>> {
    let mut stages: Vec<Arc<dyn Middleware>> = Vec::with_capacity(controller.hooks.len() + 2);
    if let Some(exception) = &controller.exception {
        stages.push(exception.clone());
    }
    stages.push(Arc::new(CapabilityMount::new(controller.capabilities.clone())));
    for hook in &controller.hooks {
        stages.push(Arc::new(*hook));
    }
    stages
}

fn build_action(
    context: &ActionContext<'_>,
    controller: &ControllerEntry,
    action: &Action,
    mappings: &MappingRegistry,
    default_methods: &[Method],
    table: &mut RouteTable,
) {
    let mut used = 0usize;
    for annotation in &action.annotations {
        let Some(mapping) = mappings.get(&annotation.name) else {
            tracing::debug!(
                handler = %context.handler,
                annotation = %annotation.name,
                "annotation has no resolver"
            );
            continue;
        };
        used += 1;
        match mapping.resolve(&annotation.attributes) {
            Ok(resolution) => {
                let path = resolution.path.unwrap_or_else(|| action.path());
                register(context, controller, action, resolution.methods, &path, false, table);
            }
            Err(err) => {
                tracing::warn!(
                    handler = %context.handler,
                    annotation = %annotation.name,
                    error = %err,
                    "route not registered"
                );
                table.diagnose(Diagnostic::new(
                    DiagnosticKind::InvalidRoute,
                    context.handler.clone(),
                    format!("@{}: {}", annotation.name, err),
                ));
            }
        }
    }
    if used > 0 {
        return;
    }

    let defaulted = action.methods.is_none();
    let methods = action.methods.clone().unwrap_or_else(|| default_methods.to_vec());
    if methods.is_empty() {
        table.diagnose(Diagnostic::new(
            DiagnosticKind::InvalidRoute,
            context.handler.clone(),
            "no default methods configured",
        ));
        return;
    }
    let paths: Vec<String> = match &action.paths {
        Some(paths) if !paths.is_empty() => {
            paths.iter().map(|p| normalize_route_path(p)).collect()
        }
        _ => vec![action.path()],
    };
    for path in paths {
        let path = if path.is_empty() { action.path() } else { path };
        register(context, controller, action, methods.clone(), &path, defaulted, table);
    }
}

fn register(
    context: &ActionContext<'_>,
    controller: &ControllerEntry,
    action: &Action,
    methods: Vec<Method>,
    path: &str,
    defaulted: bool,
    table: &mut RouteTable,
) {
    let path = context.absolute(path);
    if let Err(reason) = validate_route_path(&path) {
        tracing::warn!(handler = %context.handler, path = %path, reason = %reason, "route not registered");
        table.diagnose(Diagnostic::new(
            DiagnosticKind::InvalidRoute,
            context.handler.clone(),
            format!("{}: {}", path, reason),
        ));
        return;
    }

    let mut chain: Vec<Arc<dyn Middleware>> = Vec::with_capacity(context.stages.len() + 3);
    chain.push(Arc::new(IdentitySetter::new(&context.handler, context.default_version)));
    chain.extend(context.stages.iter().cloned());
    chain.push(controller.initializer.clone());
    chain.push(action.endpoint.clone());

    let route = RegisteredRoute {
        methods,
        path,
        handler: context.handler.clone(),
        handlers: chain.len(),
        defaulted,
        source: context.source.clone(),
        chain: chain.into(),
    };

    if !table.push(route) || !context.config.debug {
        return;
    }
    if let Some(route) = table.routes().last() {
        tracing::info!(
            target: "annoroute::routes",
            methods = %route.label(),
            path = %route.path,
            handler = %route.handler,
            handlers = route.handlers,
            "route"
        );
    }
}
