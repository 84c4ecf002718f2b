//! Request dispatch through compiled chains: abort semantics, hooks,
//! exception boundaries, negotiation and templates.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use annoroute::dispatch::{
    boxed, hook, BoxFuture, Capabilities, ContentKind, Dispatch, DispatchRuntime,
    ExceptionHandle, Hook, HttpResponseException, Interrupt, Middleware, MiniJinjaEngine, Outcome,
    Reply, ResponseTypeHandler, ResultHandler,
};
use annoroute::Controller;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::{json, Value};

use common::{app_source, get, post_json, registry, router, send};

static AFTER_SUCCESS: AtomicBool = AtomicBool::new(false);
static GUARDED_RAN: AtomicBool = AtomicBool::new(false);

#[derive(Clone)]
struct Started(&'static str);

pub struct Flow;

#[annoroute::controller]
impl Flow {
    /// @Get("stop")
    pub async fn stop(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("done")?;
        AFTER_SUCCESS.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// @Get("nothing")
    pub async fn nothing(&self, _dispatch: &mut Dispatch) -> Outcome {
        Ok(())
    }

    /// @Get("boom")
    pub async fn boom(&self, _dispatch: &mut Dispatch) -> Outcome {
        Err(Interrupt::fault(anyhow::anyhow!("boom")))
    }

    /// @Get("init")
    pub async fn init(&self, dispatch: &mut Dispatch) -> Outcome {
        let started = dispatch.extensions().get::<Started>().map(|s| s.0).unwrap_or("missing");
        dispatch.success(started)
    }

    /// @Get("created")
    pub async fn created(&self, dispatch: &mut Dispatch) -> Outcome {
        let mut headers = HeaderMap::new();
        headers.insert("statuscode", HeaderValue::from_static("201"));
        headers.insert("x-extra", HeaderValue::from_static("yes"));
        dispatch.success(
            Reply::new()
                .msg("created")
                .data(json!({ "id": 7 }))
                .headers(headers),
        )
    }

    /// @Get("teapot")
    pub async fn teapot(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.fail(("short and stout", Value::Null, 418))
    }

    /// @Get("text")
    pub async fn text(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success(("plain words", Value::Null, 1, ContentKind::Text))
    }

    /// @Get("negotiated")
    pub async fn negotiated(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success(("n", json!([1, 2])))
    }

    /// @Get("away")
    pub async fn away(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.redirect("/elsewhere")
    }

    /// @Post("echo")
    pub async fn echo(&self, dispatch: &mut Dispatch) -> Outcome {
        let body: Value = dispatch.json().map_err(Interrupt::fault)?;
        let args = dispatch.args();
        dispatch.success(("echo", json!({ "body": body, "args": args })))
    }
}

impl Controller for Flow {
    async fn initialize(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.extensions_mut().insert(Started("initialized"));
        Ok(())
    }
}

fn require_token(dispatch: &mut Dispatch) -> BoxFuture<'_, Outcome> {
    boxed(async move {
        if dispatch.header("x-token").is_none() {
            return dispatch.fail(("token required", Value::Null, 401));
        }
        Ok(())
    })
}

pub struct Guarded;

#[annoroute::controller]
impl Guarded {
    pub async fn secret(&self, dispatch: &mut Dispatch) -> Outcome {
        GUARDED_RAN.store(true, Ordering::SeqCst);
        dispatch.success("secret")
    }
}

impl Controller for Guarded {
    fn before_action(&self) -> Vec<Hook> {
        vec![hook(require_token)]
    }
}

pub struct Shop;

#[annoroute::controller]
impl Shop {
    /// @Get("/rooted/teapot")
    pub async fn teapot(&self, _dispatch: &mut Dispatch) -> Outcome {
        Err(HttpResponseException::new(StatusCode::IM_A_TEAPOT, "teapot").into())
    }

    /// @Get("/rooted/xml")
    pub async fn xml(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success(("x", json!({ "items": ["a", "b"] })))
    }

    /// @Get("fault")
    pub async fn fault(&self, _dispatch: &mut Dispatch) -> Outcome {
        Err(Interrupt::fault(anyhow::anyhow!("not an http exception")))
    }
}

impl ResponseTypeHandler for Shop {
    fn response_type(&self, _dispatch: &Dispatch) -> Option<ContentKind> {
        Some(ContentKind::Xml)
    }
}

impl Controller for Shop {
    fn exception(&self) -> Option<Arc<dyn Middleware>> {
        Some(Arc::new(ExceptionHandle))
    }

    fn capabilities(this: &Arc<Self>) -> Capabilities {
        Capabilities::new().with_response_type(this.clone())
    }
}

pub struct Custom;

#[annoroute::controller]
impl Custom {
    pub async fn index(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("ignored")
    }
}

impl ResultHandler for Custom {
    fn result(&self, dispatch: &mut Dispatch, reply: Reply) -> Outcome {
        let body = format!("custom:{}:{}", reply.code.unwrap_or_default(), reply.msg);
        dispatch.write(StatusCode::ACCEPTED, HeaderMap::new(), body)
    }
}

impl Controller for Custom {
    fn capabilities(this: &Arc<Self>) -> Capabilities {
        Capabilities::new().with_result(this.clone())
    }
}

pub struct Page;

#[annoroute::controller]
impl Page {
    pub async fn show(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.assign("name", json!("bob"));
        dispatch.assign("greeting", json!("Hi"));
        dispatch.fetch(())
    }

    pub async fn other(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.assign("name", json!("bob"));
        dispatch.fetch(("card", json!({ "name": "alice" })))
    }
}

impl Controller for Page {}

fn flow_router() -> axum::Router {
    let mut registry = registry();
    registry
        .register_at(Flow, app_source("index", "flow"))
        .register_at(Guarded, app_source("index", "guarded"))
        .register_at(Shop, "src/api/shop/controller/shop.rs")
        .register_at(Custom, app_source("index", "custom"));
    router(registry, DispatchRuntime::default())
}

#[tokio::test]
async fn test_code_after_success_never_runs() {
    let router = flow_router();
    let response = get(&router, "/index/flow/stop").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type(), "application/json; charset=utf-8");
    let body = response.json();
    assert_eq!(body["code"], 1);
    assert_eq!(body["msg"], "done");
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    assert!((body["time"].as_i64().unwrap() - now).abs() <= 5);
    assert!(!AFTER_SUCCESS.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_silent_action_and_fault() {
    let router = flow_router();

    let nothing = get(&router, "/index/flow/nothing").await;
    assert_eq!(nothing.status, StatusCode::OK);
    assert!(nothing.body.is_empty());

    let boom = get(&router, "/index/flow/boom").await;
    assert_eq!(boom.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_initializer_runs_before_action() {
    let router = flow_router();
    let response = get(&router, "/index/flow/init").await;
    assert_eq!(response.json()["msg"], "initialized");
}

#[tokio::test]
async fn test_status_resolution() {
    let router = flow_router();

    let created = get(&router, "/index/flow/created").await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.headers.get("statuscode").is_none());
    assert_eq!(created.headers.get("x-extra").unwrap(), "yes");
    assert_eq!(created.json()["data"]["id"], 7);

    let teapot = get(&router, "/index/flow/teapot").await;
    assert_eq!(teapot.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(teapot.json()["code"], 418);
}

#[tokio::test]
async fn test_content_negotiation() {
    let router = flow_router();

    let text = get(&router, "/index/flow/text").await;
    assert_eq!(text.content_type(), "text/plain; charset=utf-8");
    assert_eq!(text.text(), "plain words");

    let request = Request::get("/index/flow/negotiated")
        .header("response-type", "xml")
        .body(Body::empty())
        .unwrap();
    let xml = send(&router, request).await;
    assert_eq!(xml.content_type(), "text/xml; charset=utf-8");
    let body = xml.text();
    assert!(body.starts_with("<?xml"));
    assert!(body.contains(r#"<data><item id="0">1</item><item id="1">2</item></data>"#));

    let request = Request::get("/index/flow/negotiated?callback=cb")
        .header("response-type", "jsonp")
        .body(Body::empty())
        .unwrap();
    let jsonp = send(&router, request).await;
    assert_eq!(jsonp.content_type(), "application/javascript; charset=utf-8");
    assert!(jsonp.text().starts_with("cb({"));

    let request = Request::get("/index/flow/negotiated?callback=alert(1)")
        .header("response-type", "jsonp")
        .body(Body::empty())
        .unwrap();
    let fallback = send(&router, request).await;
    assert!(fallback.text().starts_with("jsonpReturn("));
}

#[tokio::test]
async fn test_redirect_and_body_access() {
    let router = flow_router();

    let away = get(&router, "/index/flow/away").await;
    assert_eq!(away.status, StatusCode::FOUND);
    assert_eq!(away.headers.get("location").unwrap(), "/elsewhere");

    let echo = post_json(&router, "/index/flow/echo?page=2", &json!({ "a": 1 })).await;
    let body = echo.json();
    assert_eq!(body["data"]["body"]["a"], 1);
    assert_eq!(body["data"]["args"]["page"], "2");
}

#[tokio::test]
async fn test_hook_short_circuits_action() {
    let router = flow_router();

    let denied = get(&router, "/index/guarded/secret").await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.json()["msg"], "token required");
    assert!(!GUARDED_RAN.load(Ordering::SeqCst));

    let request = Request::get("/index/guarded/secret")
        .header("x-token", "t")
        .body(Body::empty())
        .unwrap();
    let allowed = send(&router, request).await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.json()["msg"], "secret");
    assert!(GUARDED_RAN.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_rooted_routes_keep_exception_boundary_and_capabilities() {
    let router = flow_router();

    let teapot = get(&router, "/rooted/teapot").await;
    assert_eq!(teapot.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(teapot.text(), "teapot");

    let xml = get(&router, "/rooted/xml").await;
    assert_eq!(xml.content_type(), "text/xml; charset=utf-8");
    assert!(xml.text().contains("<root>"));

    let fault = get(&router, "/api/shop/shop/fault").await;
    assert_eq!(fault.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_result_override_replaces_envelope() {
    let router = flow_router();
    let response = get(&router, "/index/custom/index").await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.text(), "custom:1:ignored");
}

#[tokio::test]
async fn test_fetch_renders_convention_and_relative_templates() {
    let mut env = minijinja::Environment::new();
    env.add_template_owned(
        "index/view/page/show.html".to_string(),
        "{{ greeting }} {{ name }}".to_string(),
    )
    .unwrap();
    env.add_template_owned("index/view/page/card.html".to_string(), "card {{ name }}".to_string())
        .unwrap();
    let runtime = DispatchRuntime::default().with_engine(Arc::new(MiniJinjaEngine::from_environment(env)));

    let mut registry = registry();
    registry.register_at(Page, app_source("index", "page"));
    let router = router(registry, runtime);

    let show = get(&router, "/index/page/show").await;
    assert_eq!(show.status, StatusCode::OK);
    assert_eq!(show.content_type(), "text/html; charset=utf-8");
    assert_eq!(show.text(), "Hi bob");

    let other = get(&router, "/index/page/other").await;
    assert_eq!(other.text(), "card alice");
}

#[tokio::test]
async fn test_fetch_without_engine_is_a_fault() {
    let mut registry = registry();
    registry.register_at(Page, app_source("index", "page"));
    let router = router(registry, DispatchRuntime::default());

    let response = get(&router, "/index/page/show").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut runtime = DispatchRuntime::default();
    runtime.max_body_bytes = 8;
    let mut registry = registry();
    registry.register_at(Flow, app_source("index", "flow"));
    let router = router(registry, runtime);

    let response = post_json(&router, "/index/flow/echo", &json!({ "long": "0123456789" })).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
}
