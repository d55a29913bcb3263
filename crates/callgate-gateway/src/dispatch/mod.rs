//! Dispatcher module exports.
//!
//! Re-exports the dispatcher, registry and handler contract so downstream
//! handler crates can depend on this module directly.

pub mod args;
pub mod descriptor;
pub mod dispatcher;
pub mod registry;

pub use args::CallArgs;
pub use descriptor::{Handler, HandlerDescriptor, Param, Reply, AUTH_PARAM, USER_ID_PARAM};
pub use dispatcher::Dispatcher;
pub use registry::HandlerRegistry;
