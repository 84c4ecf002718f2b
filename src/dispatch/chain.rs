//! Middleware chain protocol.
//!
//! # Responsibilities
//! - Define the stage contract (`Middleware`) and its continuation (`Next`)
//! - Provide the fixed stages installed by the route builder
//! - Translate the abort sentinel at the outermost boundary (`recover`)
//!
//! # Design Decisions
//! - A chain is an immutable slice built once per route; `Next` walks it
//! - A stage stops the chain by returning without calling `next`, or by
//!   returning an `Interrupt`
//! - `Next::run` reborrows the dispatch, so a stage can inspect it after
//!   the rest of the chain finished

use std::sync::Arc;

use super::{BoxFuture, Capabilities, Dispatch, Interrupt, Outcome, Phase, RouteIdentity};

/// One stage of a route's chain.
pub trait Middleware: Send + Sync {
    fn handle<'a>(&'a self, dispatch: &'a mut Dispatch, next: Next<'a>) -> BoxFuture<'a, Outcome>;
}

/// Continuation over the stages after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self { rest: chain }
    }

    /// Runs the remaining stages. An exhausted chain completes normally.
    pub fn run<'b>(self, dispatch: &'b mut Dispatch) -> BoxFuture<'b, Outcome>
    where
        'a: 'b,
    {
        match self.rest.split_first() {
            Some((stage, rest)) => stage.handle(dispatch, Next { rest }),
            None => Box::pin(std::future::ready(Ok(()))),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// Outermost boundary: an abort means "stop, response already written";
/// faults are handed back unchanged.
pub fn recover(outcome: Outcome) -> Result<(), anyhow::Error> {
    match outcome {
        Ok(()) | Err(Interrupt::Abort) => Ok(()),
        Err(Interrupt::Fault(fault)) => Err(fault),
    }
}

/// Signature of a before-action hook.
pub type HookFn = for<'a> fn(&'a mut Dispatch) -> BoxFuture<'a, Outcome>;

/// Before-action hook. Runs before the initializer; a hook that writes a
/// response (or returns any `Interrupt`) keeps the action from running.
#[derive(Clone, Copy)]
pub struct Hook {
    run: HookFn,
}

/// Wraps a hook function.
///
/// ```ignore
/// fn require_token(dispatch: &mut Dispatch) -> BoxFuture<'_, Outcome> {
///     boxed(async move {
///         if dispatch.header("x-token").is_none() {
///             return dispatch.fail("token required");
///         }
///         Ok(())
///     })
/// }
///
/// fn before_action(&self) -> Vec<Hook> {
///     vec![hook(require_token)]
/// }
/// ```
pub fn hook(run: HookFn) -> Hook {
    Hook { run }
}

impl Middleware for Hook {
    fn handle<'a>(&'a self, dispatch: &'a mut Dispatch, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            dispatch.enter(Phase::Executing);
            (self.run)(&mut *dispatch).await?;
            next.run(dispatch).await
        })
    }
}

/// First stage of every route: attaches the route identity.
pub(crate) struct IdentitySetter {
    identity: RouteIdentity,
}

impl IdentitySetter {
    pub(crate) fn new(handler: &str, default_version: &str) -> Self {
        Self {
            identity: RouteIdentity::from_handler_name(handler, default_version),
        }
    }
}

impl Middleware for IdentitySetter {
    fn handle<'a>(&'a self, dispatch: &'a mut Dispatch, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        dispatch.set_identity(self.identity.clone());
        next.run(dispatch)
    }
}

/// Exposes the controller's capability overrides on the dispatch.
pub(crate) struct CapabilityMount {
    capabilities: Capabilities,
}

impl CapabilityMount {
    pub(crate) fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }
}

impl Middleware for CapabilityMount {
    fn handle<'a>(&'a self, dispatch: &'a mut Dispatch, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        dispatch.mount(self.capabilities.clone());
        next.run(dispatch)
    }
}
