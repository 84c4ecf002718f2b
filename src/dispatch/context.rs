//! Per-request dispatch façade.
//!
//! # Responsibilities
//! - Hold the buffered request, its route identity and the mounted overrides
//! - Offer the response helpers used by actions (`success`, `fail`,
//!   `result`, `assign`, `fetch`, `write`, `redirect`)
//! - Track the request phase: Received → Mounted → Executing → Terminated
//!
//! # Design Decisions
//! - Every helper that writes returns `Err(Interrupt::Abort)`, so `?` stops
//!   the action on the spot
//! - The first write wins; later writes are dropped with a warning
//! - The response is kept as plain parts so the façade stays `Send + Sync`

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, Extensions, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::reply::{is_valid_callback, render, resolve_status, RenderOptions, RESPONSE_TYPE_HEADER};
use super::view::resolve_template;
use super::{
    Capabilities, ContentKind, DispatchRuntime, Envelope, Interrupt, Outcome, Reply, RouteIdentity,
    TemplateError, View,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request lifecycle as seen by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Phase {
    /// Built from the request, nothing attached yet.
    Received,
    /// Capability overrides attached.
    Mounted,
    /// Hooks, initializer or action running.
    Executing,
    /// A response was written, or the action returned.
    Terminated,
}

/// A written response.
#[derive(Debug, Clone)]
pub struct Written {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for Written {
    fn into_response(self) -> Response {
        (self.status, self.headers, Body::from(self.body)).into_response()
    }
}

pub struct Dispatch {
    request_id: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: Bytes,
    extensions: Extensions,
    identity: RouteIdentity,
    phase: Phase,
    capabilities: Capabilities,
    assigned: Map<String, Value>,
    runtime: Arc<DispatchRuntime>,
    written: Option<Written>,
}

impl Dispatch {
    pub fn new(
        parts: Parts,
        params: Vec<(String, String)>,
        body: Bytes,
        runtime: Arc<DispatchRuntime>,
    ) -> Self {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            request_id,
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body,
            extensions: parts.extensions,
            identity: RouteIdentity::default(),
            phase: Phase::Received,
            capabilities: Capabilities::default(),
            assigned: Map::new(),
            runtime,
            written: None,
        }
    }

    pub fn identity(&self) -> &RouteIdentity {
        &self.identity
    }

    /// The `x-request-id` of the request, or a fresh UUID when it had none.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub(crate) fn set_identity(&mut self, identity: RouteIdentity) {
        self.identity = identity;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves the phase forward; never backwards.
    pub(crate) fn enter(&mut self, phase: Phase) {
        if phase > self.phase {
            self.phase = phase;
        }
    }

    pub(crate) fn mount(&mut self, capabilities: Capabilities) {
        self.capabilities = capabilities;
        self.enter(Phase::Mounted);
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn runtime(&self) -> &DispatchRuntime {
        &self.runtime
    }

    // Request accessors.

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn query_args(&self) -> Vec<(String, String)> {
        self.query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn form_args(&self) -> Vec<(String, String)> {
        let is_form = self
            .header(header::CONTENT_TYPE.as_str())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        if !is_form {
            return Vec::new();
        }
        url::form_urlencoded::parse(&self.body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Path parameter captured by the route pattern.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Query and form arguments merged; form values win.
    pub fn args(&self) -> BTreeMap<String, String> {
        self.query_args()
            .into_iter()
            .chain(self.form_args())
            .collect()
    }

    pub fn arg(&self, name: &str) -> Option<String> {
        self.args().remove(name)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with") == Some("XMLHttpRequest")
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn is_put(&self) -> bool {
        self.method == Method::PUT
    }

    pub fn is_patch(&self) -> bool {
        self.method == Method::PATCH
    }

    pub fn is_delete(&self) -> bool {
        self.method == Method::DELETE
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    pub fn is_options(&self) -> bool {
        self.method == Method::OPTIONS
    }

    /// Typed per-request store, seeded with the request's extensions.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    // Response helpers.

    /// Success reply; `code` defaults to 1.
    pub fn success(&mut self, reply: impl Into<Reply>) -> Outcome {
        let mut reply = reply.into();
        if let Some(handler) = self.capabilities.success.clone() {
            return handler.success(self, reply);
        }
        reply.code.get_or_insert(1);
        self.result(reply)
    }

    /// Failure reply; `code` defaults to 0.
    pub fn fail(&mut self, reply: impl Into<Reply>) -> Outcome {
        let mut reply = reply.into();
        if let Some(handler) = self.capabilities.fail.clone() {
            return handler.fail(self, reply);
        }
        reply.code.get_or_insert(0);
        self.result(reply)
    }

    /// Writes the `{code, msg, time, data}` envelope and aborts.
    pub fn result(&mut self, reply: impl Into<Reply>) -> Outcome {
        let mut reply = reply.into();
        let code = *reply.code.get_or_insert(0);
        if let Some(handler) = self.capabilities.result.clone() {
            return handler.result(self, reply);
        }

        let kind = self.response_kind(reply.kind);
        let mut headers = std::mem::take(&mut reply.headers);
        let status = resolve_status(code, &mut headers);
        let envelope = Envelope::new(code, reply.msg, reply.data);

        let callback = self.jsonp_callback();
        let options = RenderOptions {
            jsonp_callback: &callback,
            xml_root: &self.runtime.response.xml_root_node,
        };
        let body = render(&envelope, kind, &options).map_err(Interrupt::fault)?;

        headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(kind.content_type()));
        self.write(status, headers, body)
    }

    /// Content kind for a reply: explicit, then the controller override,
    /// then the `Response-Type` request header, then the configured default.
    pub fn response_kind(&self, explicit: Option<ContentKind>) -> ContentKind {
        explicit
            .or_else(|| {
                self.capabilities
                    .response_type
                    .as_ref()
                    .and_then(|handler| handler.response_type(self))
            })
            .or_else(|| self.header(RESPONSE_TYPE_HEADER).and_then(|v| v.parse().ok()))
            .unwrap_or(self.runtime.response.default_return_type)
    }

    fn jsonp_callback(&self) -> String {
        let config = &self.runtime.response;
        self.query_args()
            .into_iter()
            .find(|(key, _)| *key == config.jsonp_callback_param)
            .map(|(_, value)| value)
            .filter(|value| is_valid_callback(value))
            .unwrap_or_else(|| config.jsonp_default_handler.clone())
    }

    /// Sets a template variable for a later `fetch`.
    pub fn assign(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        let name = name.into();
        match self.capabilities.assign.clone() {
            Some(handler) => handler.assign(self, &name, value),
            None => {
                self.assigned.insert(name, value);
            }
        }
        self
    }

    pub fn assigned(&self) -> &Map<String, Value> {
        &self.assigned
    }

    pub fn assigned_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.assigned
    }

    /// Renders a template as `text/html` with status 200 and aborts.
    pub fn fetch(&mut self, view: impl Into<View>) -> Outcome {
        let view = view.into();
        if let Some(handler) = self.capabilities.fetch.clone() {
            return handler.fetch(self, view);
        }
        self.render_view(view)
    }

    /// Built-in `fetch`, usable from a `FetchHandler` override.
    pub fn render_view(&mut self, view: View) -> Outcome {
        let name = resolve_template(
            &self.identity,
            &view.template,
            &self.runtime.templates.extension,
        );

        let mut vars = self.assigned.clone();
        vars.extend(view.vars);

        let engine = self
            .runtime
            .engine()
            .cloned()
            .ok_or_else(|| Interrupt::fault(TemplateError::NotConfigured))?;
        let html = engine.render(&name, &vars).map_err(Interrupt::fault)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        self.write(StatusCode::OK, headers, html)
    }

    /// Writes a raw response and aborts.
    pub fn write(&mut self, status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Outcome {
        if self.written.is_some() {
            tracing::warn!(
                handler = %self.identity.handler,
                "response already written, dropping second write"
            );
            return Err(Interrupt::Abort);
        }
        self.written = Some(Written {
            status,
            headers,
            body: body.into(),
        });
        self.enter(Phase::Terminated);
        Err(Interrupt::Abort)
    }

    /// `302 Found` to `location` and aborts.
    pub fn redirect(&mut self, location: &str) -> Outcome {
        let value = HeaderValue::from_str(location).map_err(Interrupt::fault)?;
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, value);
        self.write(StatusCode::FOUND, headers, Bytes::new())
    }

    pub fn is_written(&self) -> bool {
        self.written.is_some()
    }

    pub fn written(&self) -> Option<&Written> {
        self.written.as_ref()
    }

    /// Final response; an action that wrote nothing yields an empty 200.
    pub fn into_response(mut self) -> Response {
        self.enter(Phase::Terminated);
        match self.written.take() {
            Some(written) => written.into_response(),
            None => StatusCode::OK.into_response(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test() -> Self {
        Self::for_request(axum::http::Request::new(Bytes::new()), DispatchRuntime::default())
    }

    #[cfg(test)]
    pub(crate) fn for_request(request: axum::http::Request<Bytes>, runtime: DispatchRuntime) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, Vec::new(), body, Arc::new(runtime))
    }
}
