//! # Handler abstraction.
//!
//! This module defines the [`Handler`] trait: a named unit of work that produces
//! a fresh future per matching [`Action`]. The common handle type is
//! [`HandlerRef`], an `Arc<dyn Handler>` shared between the descriptor and every
//! watcher built from it.
//!
//! A handler receives a [`CancellationToken`]. Invocations are also dropped at
//! their next suspension point once the token fires, so checking the token is
//! only needed around blocking or non-`await` work.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::actions::Action;
use crate::error::HandlerError;

/// Boxed future returned by [`Handler::spawn`].
pub type BoxHandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// # Asynchronous, cancelable action handler.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use takevisor::{Action, BoxHandlerFuture, Handler};
///
/// struct Audit;
///
/// impl Handler for Audit {
///     fn name(&self) -> &str { "audit" }
///
///     fn spawn(&self, action: Action, _ctx: CancellationToken) -> BoxHandlerFuture {
///         Box::pin(async move {
///             println!("saw {}", action.action_type());
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Returns a stable, human-readable handler name.
    fn name(&self) -> &str;

    /// Creates the future for one invocation.
    fn spawn(&self, action: Action, ctx: CancellationToken) -> BoxHandlerFuture;
}
