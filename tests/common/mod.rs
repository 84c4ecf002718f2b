//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use annoroute::config::RoutingConfig;
use annoroute::dispatch::DispatchRuntime;
use annoroute::RouteRegistry;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

/// Source path that derives to the default version and `module`.
pub fn app_source(module: &str, file: &str) -> String {
    format!("src/application/{}/controller/{}.rs", module, file)
}

pub fn registry() -> RouteRegistry {
    RouteRegistry::new(RoutingConfig::default())
}

pub fn debug_registry() -> RouteRegistry {
    RouteRegistry::new(RoutingConfig {
        debug: true,
        ..RoutingConfig::default()
    })
}

/// Builds the registry with the configured default methods into a router.
pub fn router(registry: RouteRegistry, runtime: DispatchRuntime) -> Router {
    registry.build_default().into_router(Arc::new(runtime))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let (parts, body) = response.into_parts();
    TestResponse {
        status: parts.status,
        headers: parts.headers,
        body: to_bytes(body, usize::MAX).await.expect("body collects"),
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(router: &Router, uri: &str, body: &Value) -> TestResponse {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}
