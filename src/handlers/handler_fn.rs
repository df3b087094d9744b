//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Action, CancellationToken) -> Fut`, producing
//! a fresh future per invocation. Invocations never share hidden state; if a
//! handler needs shared state, capture an `Arc<...>` in the closure explicitly.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use takevisor::{Action, HandlerError, HandlerFn, HandlerRef};
//!
//! let h: HandlerRef = HandlerFn::arc("save", |action: Action, ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(HandlerError::Canceled);
//!     }
//!     let _ = action.payload::<String>();
//!     Ok(())
//! });
//!
//! assert_eq!(h.name(), "save");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::actions::Action;
use crate::error::HandlerError;
use crate::handlers::handler::{BoxHandlerFuture, Handler};

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Action, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, action: Action, ctx: CancellationToken) -> BoxHandlerFuture {
        Box::pin((self.f)(action, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn each_spawn_runs_the_closure_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let h = HandlerFn::new("count", move |_a: Action, _ctx: CancellationToken| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        h.spawn(Action::new("x"), CancellationToken::new()).await.unwrap();
        h.spawn(Action::new("x"), CancellationToken::new()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.name(), "count");
    }
}
