//! Compiled route table and its axum adapter.
//!
//! # Responsibilities
//! - Hold every concrete (methods, path, chain) registration in build order
//! - Keep the first registration of a (method, path) pair, report the rest
//! - Refuse patterns the router would reject as overlapping, e.g.
//!   `/item/{id}` next to `/item/{name}`
//! - Turn the table into an `axum::Router` whose endpoints run the chains
//!
//! # Design Decisions
//! - Duplicates and conflicts are resolved here instead of letting the
//!   router panic
//! - One `MethodRouter` per path, so verbs added later merge cleanly
//! - Chains are immutable `Arc` slices shared by all requests of a route

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use serde::Serialize;

use crate::annotation::mapping::method_label;
use crate::naming::{pattern_segments, PatternSegment};
use crate::dispatch::{recover, Dispatch, DispatchRuntime, Middleware, Next};

pub type Chain = Arc<[Arc<dyn Middleware>]>;

/// One concrete registration.
#[derive(Clone)]
pub struct RegisteredRoute {
    pub methods: Vec<Method>,
    pub path: String,
    /// `{version}/{module}/{Controller}.{action}`.
    pub handler: String,
    /// Chain length, stages plus the action.
    pub handlers: usize,
    /// Registered via the default method list rather than an annotation.
    pub defaulted: bool,
    /// Module directory the controller was filed under.
    pub source: String,
    pub(crate) chain: Chain,
}

impl RegisteredRoute {
    /// Method label as printed in traces: `Any`, `GET POST`, or `def(GET POST)`.
    pub fn label(&self) -> String {
        let label = method_label(&self.methods);
        if self.defaulted {
            format!("def({})", label)
        } else {
            label
        }
    }
}

impl std::fmt::Debug for RegisteredRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredRoute")
            .field("methods", &self.methods)
            .field("path", &self.path)
            .field("handler", &self.handler)
            .field("handlers", &self.handlers)
            .field("defaulted", &self.defaulted)
            .finish()
    }
}

/// Serialisable view of a route for the admin endpoint and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub methods: Vec<String>,
    pub path: String,
    pub handler: String,
    pub handlers: usize,
    pub defaulted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No module could be derived from the source path.
    NoModule,
    /// The controller failed reflection.
    Rejected,
    /// An annotation narrowed its verbs to nothing.
    InvalidRoute,
    /// A (method, path) pair was already taken.
    DuplicateRoute,
    /// The path overlaps another pattern the router cannot tell apart.
    ConflictingRoute,
}

/// Non-fatal problem found while registering or building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RegisteredRoute>,
    diagnostics: Vec<Diagnostic>,
    taken: HashSet<(Method, String)>,
}

impl RouteTable {
    pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    /// Adds `route`, dropping verbs whose (method, path) is already taken.
    /// A path that conflicts with an earlier pattern is refused whole.
    /// Returns false when nothing was left to register.
    pub(crate) fn push(&mut self, mut route: RegisteredRoute) -> bool {
        if let Some(owner) = self.routes.iter().find(|r| patterns_conflict(&r.path, &route.path)) {
            tracing::warn!(
                path = %route.path,
                handler = %route.handler,
                conflicts_with = %owner.path,
                owner = %owner.handler,
                "conflicting route skipped"
            );
            let message = format!(
                "{} conflicts with {} served by {}",
                route.path, owner.path, owner.handler
            );
            self.diagnostics
                .push(Diagnostic::new(DiagnosticKind::ConflictingRoute, route.handler.clone(), message));
            return false;
        }

        let mut kept = Vec::with_capacity(route.methods.len());
        for method in route.methods.drain(..) {
            if self.taken.insert((method.clone(), route.path.clone())) {
                kept.push(method);
            } else {
                let owner = self
                    .find(&method, &route.path)
                    .map(|r| r.handler.clone())
                    .unwrap_or_default();
                tracing::warn!(
                    method = %method,
                    path = %route.path,
                    handler = %route.handler,
                    owner = %owner,
                    "duplicate route skipped"
                );
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateRoute,
                    route.handler.clone(),
                    format!("{} {} is already served by {}", method, route.path, owner),
                ));
            }
        }
        if kept.is_empty() {
            return false;
        }
        route.methods = kept;
        self.routes.push(route);
        true
    }

    /// Drops every route whose path collides with one of `paths`, which
    /// `owner` serves outside the table.
    pub fn reserve(&mut self, paths: &[&str], owner: &str) {
        let (clashing, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.routes)
            .into_iter()
            .partition(|route| {
                paths
                    .iter()
                    .any(|path| *path == route.path || patterns_conflict(path, &route.path))
            });
        self.routes = kept;
        for route in clashing {
            tracing::warn!(
                path = %route.path,
                handler = %route.handler,
                owner = %owner,
                "route shadows a reserved path, skipped"
            );
            for method in &route.methods {
                self.taken.remove(&(method.clone(), route.path.clone()));
            }
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::ConflictingRoute,
                route.handler.clone(),
                format!("{} is reserved by {}", route.path, owner),
            ));
        }
    }

    pub(crate) fn diagnose(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registration serving `method` at exactly `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<&RegisteredRoute> {
        self.routes
            .iter()
            .find(|r| r.path == path && r.methods.contains(method))
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes
            .iter()
            .map(|r| RouteSummary {
                methods: r.methods.iter().map(|m| m.to_string()).collect(),
                path: r.path.clone(),
                handler: r.handler.clone(),
                handlers: r.handlers,
                defaulted: r.defaulted,
            })
            .collect()
    }

    /// Plain-text table of the registrations, one row per route.
    pub fn render_table(&self) -> String {
        let headers = ["method", "path", "handler", "handlers"];
        let rows: Vec<[String; 4]> = self
            .routes
            .iter()
            .map(|r| [r.label(), r.path.clone(), r.handler.clone(), r.handlers.to_string()])
            .collect();

        let mut widths = headers.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        let line = |cells: [&str; 4], out: &mut String| {
            for (i, cell) in cells.iter().enumerate() {
                let _ = write!(out, "{:<width$}", cell, width = widths[i]);
                out.push_str(if i + 1 < cells.len() { "  " } else { "\n" });
            }
        };
        line(headers, &mut out);
        let rule = widths.map(|w| "-".repeat(w));
        line([&rule[0], &rule[1], &rule[2], &rule[3]], &mut out);
        for row in &rows {
            line([&row[0], &row[1], &row[2], &row[3]], &mut out);
        }
        out
    }

    /// Builds the router. Every endpoint buffers the body, creates a
    /// `Dispatch` and runs its chain behind `recover`.
    pub fn into_router(self, runtime: Arc<DispatchRuntime>) -> Router {
        let mut order: Vec<String> = Vec::new();
        let mut by_path: HashMap<String, MethodRouter> = HashMap::new();

        for route in self.routes {
            let Some(filter) = method_filter(&route.methods) else {
                continue;
            };
            let endpoint = endpoint(route.chain.clone(), runtime.clone());
            match by_path.remove(&route.path) {
                Some(existing) => {
                    by_path.insert(route.path.clone(), existing.on(filter, endpoint));
                }
                None => {
                    order.push(route.path.clone());
                    by_path.insert(route.path.clone(), on(filter, endpoint));
                }
            }
        }

        order.into_iter().fold(Router::new(), |router, path| {
            match by_path.remove(&path) {
                Some(method_router) => router.route(&path, method_router),
                None => router,
            }
        })
    }
}

/// Whether the router would refuse `a` and `b` side by side. Static
/// segments may sit next to parameters, but parameters at the same position
/// must share a name, and a catch-all overlaps any parameter. Patterns that
/// match segment for segment differ only in slashes and stay apart.
fn patterns_conflict(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    let (left, right) = (pattern_segments(a), pattern_segments(b));
    for (l, r) in left.iter().zip(right.iter()) {
        match (l, r) {
            (PatternSegment::Static(x), PatternSegment::Static(y)) if x == y => {}
            (PatternSegment::Param(x), PatternSegment::Param(y)) if x == y => {}
            (PatternSegment::CatchAll(x), PatternSegment::CatchAll(y)) if x == y => {}
            (PatternSegment::Param(_), PatternSegment::Param(_))
            | (PatternSegment::CatchAll(_), PatternSegment::Param(_) | PatternSegment::CatchAll(_))
            | (PatternSegment::Param(_), PatternSegment::CatchAll(_)) => return true,
            _ => return false,
        }
    }
    false
}

fn method_filter(methods: &[Method]) -> Option<MethodFilter> {
    methods
        .iter()
        .filter_map(|m| MethodFilter::try_from(m.clone()).ok())
        .reduce(MethodFilter::or)
}

type PathParams = Result<RawPathParams, RawPathParamsRejection>;

fn endpoint(
    chain: Chain,
    runtime: Arc<DispatchRuntime>,
) -> impl Fn(PathParams, Request) -> futures_util::future::BoxFuture<'static, Response>
       + Clone
       + Send
       + Sync
       + 'static {
    move |params: PathParams, request: Request| {
        let chain = chain.clone();
        let runtime = runtime.clone();
        Box::pin(async move { run_chain(chain, runtime, params, request).await })
    }
}

async fn run_chain(
    chain: Chain,
    runtime: Arc<DispatchRuntime>,
    params: PathParams,
    request: Request,
) -> Response {
    let params: Vec<(String, String)> = params
        .map(|raw| {
            raw.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let (parts, body) = request.into_parts();
    let body: Bytes = match axum::body::to_bytes(body, runtime.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "request body rejected");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut dispatch = Dispatch::new(parts, params, body, runtime);
    let outcome = Next::new(&chain).run(&mut dispatch).await;

    match recover(outcome) {
        Ok(()) => dispatch.into_response(),
        Err(fault) => {
            tracing::error!(
                request_id = %dispatch.request_id(),
                handler = %dispatch.identity().handler,
                path = %dispatch.path(),
                error = %format!("{:#}", fault),
                "request failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
