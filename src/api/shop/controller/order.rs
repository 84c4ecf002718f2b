use std::sync::Arc;

use annoroute::dispatch::{
    Capabilities, ContentKind, Dispatch, ExceptionHandle, HttpResponseException, Middleware,
    Outcome, ResponseTypeHandler,
};
use annoroute::{Controller, RouteRegistry};
use axum::http::StatusCode;
use serde_json::{json, Value};

pub struct Order;

#[annoroute::controller]
impl Order {
    /// @Request(method="GET,POST")
    pub async fn list(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success(("orders", json!([{ "id": 1 }, { "id": 2 }])))
    }

    /// @Get("{id}")
    pub async fn show(&self, dispatch: &mut Dispatch) -> Outcome {
        let id: u64 = dispatch.param("id").and_then(|id| id.parse().ok()).unwrap_or(0);
        if id == 0 {
            return Err(HttpResponseException::json(
                StatusCode::NOT_FOUND,
                &json!({ "error": "order not found" }),
            )
            .into());
        }
        dispatch.success(("order", json!({ "id": id })))
    }

    /// @Delete("{id}")
    pub async fn remove(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.fail(("orders cannot be removed", Value::Null, 403))
    }
}

impl ResponseTypeHandler for Order {
    /// `?format=xml` and friends.
    fn response_type(&self, dispatch: &Dispatch) -> Option<ContentKind> {
        dispatch.arg("format").and_then(|format| format.parse().ok())
    }
}

impl Controller for Order {
    fn exception(&self) -> Option<Arc<dyn Middleware>> {
        Some(Arc::new(ExceptionHandle))
    }

    fn capabilities(this: &Arc<Self>) -> Capabilities {
        Capabilities::new().with_response_type(this.clone())
    }
}

pub fn register(registry: &mut RouteRegistry) {
    annoroute::register!(registry, Order);
}
