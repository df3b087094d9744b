//! # Handler abstractions and declarations.
//!
//! This module provides the handler-related types:
//! - [`Handler`] - trait for async cancelable action handlers
//! - [`HandlerFn`] - function-based handler implementation
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler>`)
//! - [`HandlerDescriptor`] - binds a handler to an action type and a policy
//! - [`HandlerSet`] - ordered, identity-deduplicated descriptors of one owner

mod descriptor;
mod handler;
mod handler_fn;
mod set;

pub use descriptor::HandlerDescriptor;
pub use handler::{BoxHandlerFuture, Handler, HandlerRef};
pub use handler_fn::HandlerFn;
pub use set::HandlerSet;
