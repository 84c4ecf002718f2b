//! Route building: tree derivation, annotation resolution, defaults and
//! diagnostics.

mod common;

use std::borrow::Cow;
use std::sync::Arc;

use annoroute::annotation::mapping::request_mapping;
use annoroute::annotation::{Attributes, MethodToken};
use annoroute::dispatch::{hook, BoxFuture, Dispatch, DispatchRuntime, Hook, Outcome};
use annoroute::route::DiagnosticKind;
use annoroute::Controller;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{app_source, get, registry, router, send};

pub struct User;

#[annoroute::controller]
impl User {
    /// Shows a user.
    ///
    /// @Get("custom")
    pub async fn show(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("show")
    }

    pub async fn list_all(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("list")
    }

    /// @Request(method="BOGUS")
    pub async fn broken(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("unreachable")
    }

    /// @Get("/ping")
    pub async fn ping(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("pong")
    }

    /// @Unknown(whatever)
    pub async fn odd(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("odd")
    }

    /// @Get("a")
    /// @Post("b")
    pub async fn multi(&self, dispatch: &mut Dispatch) -> Outcome {
        let method = dispatch.method().to_string();
        dispatch.success(method)
    }

    /// @Get("item/{id}")
    pub async fn item(&self, dispatch: &mut Dispatch) -> Outcome {
        let id = dispatch.param("id").unwrap_or_default().to_string();
        dispatch.success(("item", json!({ "id": id })))
    }

    /// @Get("ignored")
    fn helper(&self) -> usize {
        0
    }
}

impl Controller for User {}

pub struct Account;

#[annoroute::controller]
impl Account {
    /// @Get("/ping")
    pub async fn ping(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("second")
    }

    /// @Request
    pub async fn everything(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("any")
    }
}

impl Controller for Account {
    fn value(&self) -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed("people"))
    }
}

pub struct Nothing;

#[annoroute::controller]
impl Nothing {
    pub fn not_an_action(&self) {}
}

impl Controller for Nothing {}

pub struct Item;

#[annoroute::controller]
impl Item {
    /// @Get("{id}")
    pub async fn show(&self, dispatch: &mut Dispatch) -> Outcome {
        let id = dispatch.param("id").unwrap_or_default().to_string();
        dispatch.success(id)
    }

    /// @Delete("{name}")
    pub async fn remove(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("removed")
    }

    /// @Get("user/:id")
    pub async fn legacy(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("legacy")
    }

    /// @Get("{*rest}/tail")
    pub async fn tail(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("tail")
    }
}

impl Controller for Item {}

fn audit(dispatch: &mut Dispatch) -> BoxFuture<'_, Outcome> {
    annoroute::dispatch::boxed(async move {
        let _ = dispatch.path();
        Ok(())
    })
}

pub struct Hooked;

#[annoroute::controller]
impl Hooked {
    pub async fn index(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("hooked")
    }
}

impl Controller for Hooked {
    fn before_action(&self) -> Vec<Hook> {
        vec![hook(audit), hook(audit)]
    }
}

#[test]
fn test_annotation_path_overrides_convention() {
    let mut registry = registry();
    registry.register_at(User, app_source("index", "user"));
    let table = registry.build(&[Method::GET, Method::POST]);

    let route = table.find(&Method::GET, "/index/user/custom").expect("custom route");
    assert_eq!(route.handler, "application/index/User.show");
    assert!(!route.defaulted);
    assert!(table.find(&Method::POST, "/index/user/custom").is_none());
    assert!(table.find(&Method::GET, "/index/user/show").is_none());
}

#[test]
fn test_unannotated_action_uses_default_methods() {
    let mut registry = registry();
    registry.register_at(User, app_source("index", "user"));
    let table = registry.build(&[Method::GET, Method::POST]);

    let route = table.find(&Method::GET, "/index/user/list_all").expect("default route");
    assert_eq!(route.methods, vec![Method::GET, Method::POST]);
    assert!(route.defaulted);
    assert_eq!(route.label(), "def(GET POST)");

    // Only unknown annotations count as none at all.
    let odd = table.find(&Method::POST, "/index/user/odd").expect("odd falls back");
    assert!(odd.defaulted);
}

#[test]
fn test_invalid_route_is_reported_not_registered() {
    let mut registry = registry();
    registry.register_at(User, app_source("index", "user"));
    let table = registry.build(&[Method::GET]);

    assert!(table.routes().iter().all(|r| r.handler != "application/index/User.broken"));
    let diagnostic = table
        .diagnostics()
        .iter()
        .find(|d| d.kind == DiagnosticKind::InvalidRoute)
        .expect("invalid route diagnostic");
    assert_eq!(diagnostic.subject, "application/index/User.broken");
    assert!(diagnostic.message.contains("BOGUS"));
}

#[test]
fn test_rooted_and_multiple_annotations() {
    let mut registry = registry();
    registry.register_at(User, app_source("index", "user"));
    let table = registry.build(&[Method::GET]);

    assert!(table.find(&Method::GET, "/ping").is_some());
    assert!(table.find(&Method::GET, "/index/user/ping").is_none());
    assert!(table.find(&Method::GET, "/index/user/a").is_some());
    assert!(table.find(&Method::POST, "/index/user/b").is_some());
    assert!(table.find(&Method::GET, "/index/user/b").is_none());
    assert!(table.routes().iter().all(|r| !r.path.ends_with("ignored")));
}

#[test]
fn test_controllers_share_modules_and_versions_nest() {
    let mut registry = registry();
    registry
        .register_at(User, app_source("index", "user"))
        .register_at(Account, app_source("index", "account"))
        .register_at(User, "src/api/shop/controller/user.rs");

    let versions = registry.tree().versions();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].modules.len(), 1);
    assert_eq!(versions[0].modules[0].controllers.len(), 2);
    assert_eq!(versions[1].path(), "api");

    let table = registry.build(&[Method::GET]);
    assert!(table.find(&Method::GET, "/index/people/everything").is_some());
    assert!(table.find(&Method::GET, "/api/shop/user/custom").is_some());
    let any = table.find(&Method::DELETE, "/index/people/everything").expect("any verb");
    assert_eq!(any.label(), "Any");
}

#[test]
fn test_duplicate_route_keeps_first_registration() {
    let mut registry = registry();
    registry
        .register_at(User, app_source("index", "user"))
        .register_at(Account, app_source("index", "account"));
    let table = registry.build(&[Method::GET]);

    let ping = table.find(&Method::GET, "/ping").expect("ping");
    assert_eq!(ping.handler, "application/index/User.ping");
    assert!(table
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::DuplicateRoute && d.subject == "application/index/Account.ping"));
}

#[test]
fn test_depth_guard_and_rejected_controllers() {
    let mut registry = registry();
    // file!() here is tests/routing.rs, outside the src root.
    annoroute::register!(registry, User);
    registry.register_at(User, "src/user.rs");
    registry.register_at(Nothing, app_source("index", "nothing"));

    let kinds: Vec<DiagnosticKind> = registry.diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::NoModule, DiagnosticKind::NoModule, DiagnosticKind::Rejected]
    );
    assert!(registry.tree().versions().is_empty());

    let table = registry.build(&[Method::GET]);
    assert!(table.is_empty());
    assert_eq!(table.diagnostics().len(), 3);
}

#[test]
fn test_chain_length_counts_every_stage() {
    let mut registry = registry();
    registry
        .register_at(Hooked, app_source("index", "hooked"))
        .register_at(User, app_source("index", "user"));
    let table = registry.build(&[Method::GET]);

    // identity, mount, two hooks, initializer, action
    let hooked = table.find(&Method::GET, "/index/hooked/index").expect("hooked");
    assert_eq!(hooked.handlers, 6);
    let plain = table.find(&Method::GET, "/index/user/custom").expect("plain");
    assert_eq!(plain.handlers, 4);
}

#[test]
fn test_custom_directive() {
    let mut registry = registry();
    registry.mappings_mut().register(
        "Unknown",
        MethodToken::Verb(Method::PUT),
        Arc::new(|token: &MethodToken, attributes: &Attributes| {
            let mut resolution = request_mapping(token, attributes)?;
            resolution.path = resolution.path.map(|p| format!("x/{}", p));
            Ok(resolution)
        }),
    );
    registry.register_at(User, app_source("index", "user"));
    let table = registry.build(&[Method::GET]);

    let route = table.find(&Method::PUT, "/index/user/x/whatever").expect("custom directive");
    assert!(!route.defaulted);
    assert!(table.find(&Method::GET, "/index/user/odd").is_none());
}

#[test]
fn test_render_table_lists_routes() {
    let mut registry = registry();
    registry.register_at(User, app_source("index", "user"));
    let table = registry.build(&[Method::GET]);

    let rendered = table.render_table();
    let mut lines = rendered.lines();
    assert!(lines.next().unwrap().starts_with("method"));
    assert!(lines.next().unwrap().starts_with("---"));
    assert!(rendered.contains("application/index/User.show"));
    assert!(rendered.contains("def(GET)"));
    assert_eq!(table.summaries().len(), table.len());
}

#[tokio::test]
async fn test_router_serves_methods_and_params() {
    let mut registry = common::debug_registry();
    registry.register_at(User, app_source("index", "user"));
    let router = router(registry, DispatchRuntime::default());

    let response = get(&router, "/index/user/custom").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["code"], 1);
    assert_eq!(body["msg"], "show");

    let response = get(&router, "/index/user/item/42").await;
    assert_eq!(response.json()["data"]["id"], "42");

    let wrong_verb = send(
        &router,
        Request::post("/index/user/custom").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(wrong_verb.status, StatusCode::METHOD_NOT_ALLOWED);

    let missing = get(&router, "/index/user/nope").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let multi = send(&router, Request::post("/index/user/b").body(Body::empty()).unwrap()).await;
    assert_eq!(multi.json()["msg"], "POST");
}

#[tokio::test]
async fn test_overlapping_and_malformed_paths_do_not_break_the_router() {
    let mut registry = registry();
    registry.register_at(Item, app_source("index", "item"));
    let table = registry.build(&[Method::GET]);

    assert_eq!(table.len(), 1);
    assert!(table.find(&Method::GET, "/index/item/{id}").is_some());

    let conflict = table
        .diagnostics()
        .iter()
        .find(|d| d.kind == DiagnosticKind::ConflictingRoute)
        .expect("conflict diagnostic");
    assert_eq!(conflict.subject, "application/index/Item.remove");
    assert!(conflict.message.contains("/index/item/{id}"));

    let invalid: Vec<&str> = table
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::InvalidRoute)
        .map(|d| d.subject.as_str())
        .collect();
    assert_eq!(
        invalid,
        vec!["application/index/Item.legacy", "application/index/Item.tail"]
    );

    let router = table.into_router(Arc::new(DispatchRuntime::default()));
    let shown = get(&router, "/index/item/42").await;
    assert_eq!(shown.json()["msg"], "42");
    let delete = send(&router, Request::delete("/index/item/42").body(Body::empty()).unwrap()).await;
    assert_eq!(delete.status, StatusCode::METHOD_NOT_ALLOWED);
}
