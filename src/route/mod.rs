//! Route tree and route building.
//!
//! # Data Flow
//! ```text
//! register!(registry, Controller)      (source path from file!())
//!     → reflect.rs (name, actions, annotations, hooks, overrides)
//!     → tree.rs (version/module derived from the source path)
//!     → builder.rs (walk tree, resolve annotations, build chains)
//!     → table.rs (dedupe, trace, axum::Router)
//! ```
//!
//! # Design Decisions
//! - Registration is explicit: no global list, no life-before-main
//! - Building never fails; problems end up as `Diagnostic`s
//! - Every chain is complete on its own, so rooted routes need no group
//!   middleware to inherit

pub mod builder;
pub mod group;
pub mod reflect;
pub mod registry;
pub mod table;
pub mod tree;

pub use group::RouterGroup;
pub use reflect::{reflect, Action, ActionDef, ActionFn, Controller, ControllerEntry, Reflect, ReflectError};
pub use registry::RouteRegistry;
pub use table::{Diagnostic, DiagnosticKind, RegisteredRoute, RouteSummary, RouteTable};
pub use tree::{Module, RouteTree, TreeError, Version};
