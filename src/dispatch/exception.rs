//! Exception boundary for controllers.
//!
//! A handler can bail out with a ready-made response by returning an
//! [`HttpResponseException`] as a fault. [`ExceptionHandle`], installed as
//! a controller's exception boundary, writes that response and stops the
//! chain; every other fault passes through untouched.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::body::Bytes;

use super::{BoxFuture, Dispatch, Interrupt, Middleware, Next, Outcome};

#[derive(Debug, Clone, thiserror::Error)]
#[error("http response exception ({status})")]
pub struct HttpResponseException {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponseException {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        let mut exception = Self::new(status, value.to_string());
        exception.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        exception
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<HttpResponseException> for Interrupt {
    fn from(exception: HttpResponseException) -> Self {
        Interrupt::Fault(anyhow::Error::new(exception))
    }
}

/// Default exception boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionHandle;

impl Middleware for ExceptionHandle {
    fn handle<'a>(&'a self, dispatch: &'a mut Dispatch, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            match next.run(&mut *dispatch).await {
                Err(Interrupt::Fault(fault)) => match fault.downcast::<HttpResponseException>() {
                    Ok(exception) => {
                        tracing::debug!(
                            handler = %dispatch.identity().handler,
                            status = %exception.status,
                            "http response exception"
                        );
                        dispatch.write(exception.status, exception.headers, exception.body)
                    }
                    Err(other) => Err(Interrupt::Fault(other)),
                },
                outcome => outcome,
            }
        })
    }
}
