use annoroute::dispatch::{Dispatch, Outcome};
use annoroute::{Controller, RouteRegistry};
use serde_json::json;

pub struct Index;

#[annoroute::controller]
impl Index {
    /// Landing page.
    ///
    /// @Get("/")
    pub async fn home(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success(("welcome", json!({ "name": env!("CARGO_PKG_NAME") })))
    }

    /// @Get("/health") liveness probe
    pub async fn health(&self, dispatch: &mut Dispatch) -> Outcome {
        dispatch.success("ok")
    }

    /// Served on the default methods at `/index/index/index`.
    pub async fn index(&self, dispatch: &mut Dispatch) -> Outcome {
        let data = json!({ "ajax": dispatch.is_ajax(), "method": dispatch.method().as_str() });
        dispatch.success(("index", data))
    }
}

impl Controller for Index {}

pub fn register(registry: &mut RouteRegistry) {
    annoroute::register!(registry, Index);
}
