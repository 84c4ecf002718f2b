//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → table.rs endpoint adapter (buffer body, build Dispatch)
//!     → chain.rs: identity → exception? → mount → hooks → initializer → action
//!     → context.rs helpers (success / fail / result / fetch) write a response
//!       and return Interrupt::Abort
//!     → chain::recover at the outermost boundary: Abort = stop, Fault = 500
//! ```
//!
//! # Design Decisions
//! - Abort is a value, not an unwind: every helper that writes returns it
//! - One `Dispatch` per request, never shared; no locking on per-request state
//! - Capability overrides are resolved once per controller and cloned per request

pub mod capability;
pub mod chain;
pub mod context;
pub mod exception;
pub mod identity;
pub mod reply;
pub mod runtime;
pub mod view;

use std::future::Future;

pub use capability::{
    AssignHandler, Capabilities, FailHandler, FetchHandler, ResponseTypeHandler, ResultHandler,
    SuccessHandler,
};
pub use chain::{hook, recover, Hook, HookFn, Middleware, Next};
pub use context::{Dispatch, Phase, Written};
pub use exception::{ExceptionHandle, HttpResponseException};
pub use identity::RouteIdentity;
pub use reply::{ContentKind, Envelope, Reply};
pub use runtime::DispatchRuntime;
pub use view::{MiniJinjaEngine, TemplateEngine, TemplateError, View};

/// Boxed, `Send` future borrowed for `'a`.
pub type BoxFuture<'a, T> = futures_util::future::BoxFuture<'a, T>;

/// Why a chain stopped before running to completion.
#[derive(Debug, thiserror::Error)]
pub enum Interrupt {
    /// A response has been written; nothing after this point may run.
    #[error("abort")]
    Abort,

    /// A genuine failure raised by handler code.
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

impl Interrupt {
    pub fn fault<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Interrupt::Fault(error.into())
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Interrupt::Abort)
    }
}

/// Result of every chain stage and action.
pub type Outcome = Result<(), Interrupt>;

/// Boxes an action or hook future.
pub fn boxed<'a, F>(future: F) -> BoxFuture<'a, Outcome>
where
    F: Future<Output = Outcome> + Send + 'a,
{
    Box::pin(future)
}
