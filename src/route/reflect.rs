//! Controller contract and reflection.
//!
//! # Responsibilities
//! - Define what a controller is (`Controller`) and how its actions are
//!   listed (`Reflect`, generated by `#[controller]`)
//! - Turn a controller value into a `ControllerEntry`: name, path override,
//!   actions with their annotations, hooks, exception boundary, overrides
//!
//! # Design Decisions
//! - The handler shape is checked by the compiler, not probed at runtime
//! - Capability probing happens once here; requests only clone the result
//! - Doc text without directives means "use the convention path"

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;

use crate::annotation::{parse_doc, Annotation, AnnotationError};
use crate::dispatch::{
    BoxFuture, Capabilities, Dispatch, Hook, Middleware, Next, Outcome, Phase,
};
use crate::naming::camel_to_snake;

/// Handler pointer stored for each action.
pub type ActionFn<C> = for<'a> fn(&'a C, &'a mut Dispatch) -> BoxFuture<'a, Outcome>;

/// Action listing of a controller type. Implemented by `#[controller]`.
pub trait Reflect: Sized + Send + Sync + 'static {
    /// Declared type name, e.g. `UserProfile`.
    fn type_name() -> &'static str;

    fn actions() -> Vec<ActionDef<Self>>;
}

/// Minimal controller contract plus the optional structural hooks.
pub trait Controller: Reflect {
    /// Runs before every action of the controller.
    fn initialize(&self, dispatch: &mut Dispatch) -> impl Future<Output = Outcome> + Send {
        let _ = dispatch;
        std::future::ready(Ok(()))
    }

    /// Route segment override; defaults to the snake-cased type name.
    fn value(&self) -> Option<Cow<'static, str>> {
        None
    }

    /// Before-action hooks, in the order they run.
    fn before_action(&self) -> Vec<Hook> {
        Vec::new()
    }

    /// Exception boundary wrapped around the rest of the chain.
    fn exception(&self) -> Option<Arc<dyn Middleware>> {
        None
    }

    /// Dispatch overrides this controller provides.
    fn capabilities(this: &Arc<Self>) -> Capabilities {
        let _ = this;
        Capabilities::default()
    }
}

/// One handler-shaped method of a controller type.
pub struct ActionDef<C> {
    name: &'static str,
    doc: &'static str,
    handler: ActionFn<C>,
    methods: Option<Vec<Method>>,
    paths: Option<Vec<String>>,
}

impl<C> ActionDef<C> {
    pub fn new(name: &'static str, doc: &'static str, handler: ActionFn<C>) -> Self {
        Self {
            name,
            doc,
            handler,
            methods: None,
            paths: None,
        }
    }

    /// Verbs used when no annotation applies.
    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = Some(methods);
        self
    }

    /// Paths used when no annotation applies.
    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    #[error("controller type has no name")]
    Unnamed,

    #[error("controller {0} exposes no actions")]
    NoActions(String),

    #[error("controller {controller} lists action {action} twice")]
    DuplicateAction { controller: String, action: String },
}

/// A reflected action, ready for route building.
pub struct Action {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub methods: Option<Vec<Method>>,
    pub paths: Option<Vec<String>>,
    pub(crate) endpoint: Arc<dyn Middleware>,
}

impl Action {
    /// Convention path: the snake-cased method name.
    pub fn path(&self) -> String {
        camel_to_snake(&self.name)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .field("methods", &self.methods)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

/// A reflected controller.
pub struct ControllerEntry {
    pub name: String,
    pub value: Option<String>,
    pub actions: Vec<Action>,
    pub capabilities: Capabilities,
    pub(crate) hooks: Vec<Hook>,
    pub(crate) exception: Option<Arc<dyn Middleware>>,
    pub(crate) initializer: Arc<dyn Middleware>,
}

impl ControllerEntry {
    /// Route segment: the `value` override, else the snake-cased type name.
    pub fn path(&self) -> String {
        match &self.value {
            Some(value) => value.trim_matches('/').to_string(),
            None => camel_to_snake(&self.name),
        }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }
}

impl fmt::Debug for ControllerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerEntry")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("actions", &self.actions)
            .field("capabilities", &self.capabilities)
            .field("hooks", &self.hooks.len())
            .field("exception", &self.exception.is_some())
            .finish()
    }
}

/// Reflects `controller` into a `ControllerEntry`.
pub fn reflect<C: Controller>(controller: Arc<C>) -> Result<ControllerEntry, ReflectError> {
    let name = C::type_name();
    if name.is_empty() {
        return Err(ReflectError::Unnamed);
    }

    let defs = C::actions();
    if defs.is_empty() {
        return Err(ReflectError::NoActions(name.to_string()));
    }

    let mut seen = HashSet::new();
    let mut actions = Vec::with_capacity(defs.len());
    for def in defs {
        if !seen.insert(def.name) {
            return Err(ReflectError::DuplicateAction {
                controller: name.to_string(),
                action: def.name.to_string(),
            });
        }
        let annotations = match parse_doc(def.doc) {
            Ok(annotations) => annotations,
            Err(AnnotationError::NoComments) => Vec::new(),
            Err(err) => {
                tracing::debug!(controller = name, action = def.name, error = %err, "annotations skipped");
                Vec::new()
            }
        };
        actions.push(Action {
            name: def.name.to_string(),
            annotations,
            methods: def.methods,
            paths: def.paths,
            endpoint: Arc::new(ActionEndpoint {
                controller: controller.clone(),
                handler: def.handler,
            }),
        });
    }

    Ok(ControllerEntry {
        name: name.to_string(),
        value: controller.value().map(Cow::into_owned),
        actions,
        capabilities: C::capabilities(&controller),
        hooks: controller.before_action(),
        exception: controller.exception(),
        initializer: Arc::new(Initializer { controller }),
    })
}

/// Runs `Controller::initialize` before the action.
struct Initializer<C> {
    controller: Arc<C>,
}

impl<C: Controller> Middleware for Initializer<C> {
    fn handle<'a>(&'a self, dispatch: &'a mut Dispatch, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            dispatch.enter(Phase::Executing);
            self.controller.initialize(&mut *dispatch).await?;
            next.run(dispatch).await
        })
    }
}

/// Last stage: the action itself.
struct ActionEndpoint<C> {
    controller: Arc<C>,
    handler: ActionFn<C>,
}

impl<C: Controller> Middleware for ActionEndpoint<C> {
    fn handle<'a>(&'a self, dispatch: &'a mut Dispatch, _next: Next<'a>) -> BoxFuture<'a, Outcome> {
        dispatch.enter(Phase::Executing);
        (self.handler)(&self.controller, dispatch)
    }
}
