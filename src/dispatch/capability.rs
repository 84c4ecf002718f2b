//! Optional controller overrides for the dispatch helpers.
//!
//! A controller opts into any of these by implementing the trait and
//! returning itself from `Controller::capabilities`:
//!
//! ```ignore
//! fn capabilities(this: &Arc<Self>) -> Capabilities {
//!     Capabilities::new().with_success(this.clone())
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{ContentKind, Dispatch, Outcome, Reply, View};

/// Replaces the built-in `success` formatting.
pub trait SuccessHandler: Send + Sync {
    fn success(&self, dispatch: &mut Dispatch, reply: Reply) -> Outcome;
}

/// Replaces the built-in `fail` formatting.
pub trait FailHandler: Send + Sync {
    fn fail(&self, dispatch: &mut Dispatch, reply: Reply) -> Outcome;
}

/// Replaces the whole result envelope. `reply.code` is always set.
pub trait ResultHandler: Send + Sync {
    fn result(&self, dispatch: &mut Dispatch, reply: Reply) -> Outcome;
}

/// Chooses the content kind when the caller gave none.
pub trait ResponseTypeHandler: Send + Sync {
    fn response_type(&self, dispatch: &Dispatch) -> Option<ContentKind>;
}

/// Replaces template variable assignment.
pub trait AssignHandler: Send + Sync {
    fn assign(&self, dispatch: &mut Dispatch, name: &str, value: Value);
}

/// Replaces template fetching and rendering.
pub trait FetchHandler: Send + Sync {
    fn fetch(&self, dispatch: &mut Dispatch, view: View) -> Outcome;
}

/// Overrides discovered for one controller, fixed at registration.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub success: Option<Arc<dyn SuccessHandler>>,
    pub fail: Option<Arc<dyn FailHandler>>,
    pub result: Option<Arc<dyn ResultHandler>>,
    pub response_type: Option<Arc<dyn ResponseTypeHandler>>,
    pub assign: Option<Arc<dyn AssignHandler>>,
    pub fetch: Option<Arc<dyn FetchHandler>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_success(mut self, handler: Arc<dyn SuccessHandler>) -> Self {
        self.success = Some(handler);
        self
    }

    pub fn with_fail(mut self, handler: Arc<dyn FailHandler>) -> Self {
        self.fail = Some(handler);
        self
    }

    pub fn with_result(mut self, handler: Arc<dyn ResultHandler>) -> Self {
        self.result = Some(handler);
        self
    }

    pub fn with_response_type(mut self, handler: Arc<dyn ResponseTypeHandler>) -> Self {
        self.response_type = Some(handler);
        self
    }

    pub fn with_assign(mut self, handler: Arc<dyn AssignHandler>) -> Self {
        self.assign = Some(handler);
        self
    }

    pub fn with_fetch(mut self, handler: Arc<dyn FetchHandler>) -> Self {
        self.fetch = Some(handler);
        self
    }

    /// Names of the overrides present, for route traces.
    pub fn names(&self) -> Vec<&'static str> {
        [
            ("success", self.success.is_some()),
            ("fail", self.fail.is_some()),
            ("result", self.result.is_some()),
            ("response_type", self.response_type.is_some()),
            ("assign", self.assign.is_some()),
            ("fetch", self.fetch.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
