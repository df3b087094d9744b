//! # Run a single handler invocation.
//!
//! Executes one invocation of a [`Handler`] for one [`Action`] with optional
//! timeout, isolating panics, and publishes lifecycle events to [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! InvocationStarting
//!   handler.spawn() → Ok(())              → InvocationCompleted
//!   handler.spawn() → Err(Canceled)       → InvocationCanceled
//!   token cancelled (preempt / shutdown)  → InvocationCanceled
//!   handler.spawn() → Err(Fail) / panic   → InvocationFailed
//!   timeout exceeded → cancel token       → TimeoutHit → InvocationFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event.
//! - The handler future is raced against its token: once the token fires the
//!   handler gets one more poll to observe it, then it is dropped.
//! - Panics are caught here, so a panicking handler never takes its watcher down.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    actions::Action,
    error::HandlerError,
    events::{Bus, Event, EventKind},
    handlers::HandlerRef,
};

/// Identity of the watcher an invocation belongs to, shared by all its invocations.
pub(crate) struct InvocationScope {
    pub watcher: Arc<str>,
    pub action_type: Arc<str>,
    pub bus: Bus,
}

impl InvocationScope {
    fn event(&self, kind: EventKind, id: u64) -> Event {
        Event::new(kind)
            .with_watcher(self.watcher.clone())
            .with_action(self.action_type.clone())
            .with_invocation(id)
    }
}

/// Executes invocation `id` of `handler` for `action`.
///
/// `token` belongs to this invocation only; cancelling it (preemption by a newer
/// action or watcher shutdown) ends the invocation with [`HandlerError::Canceled`].
pub(crate) async fn run_once(
    handler: HandlerRef,
    action: Action,
    token: CancellationToken,
    timeout: Option<Duration>,
    id: u64,
    scope: Arc<InvocationScope>,
) -> Result<(), HandlerError> {
    scope.bus.publish(scope.event(EventKind::InvocationStarting, id));

    let ctx = token.clone();
    let body = AssertUnwindSafe(async move { handler.spawn(action, ctx).await })
        .catch_unwind()
        .map(|res| match res {
            Ok(r) => r,
            Err(payload) => Err(HandlerError::Panicked {
                info: panic_message(payload.as_ref()),
            }),
        });

    // Body first; the token branch only ends handlers that ignore cancellation.
    let res = tokio::select! {
        biased;
        r = with_deadline(body, timeout) => r,
        _ = token.cancelled() => Err(HandlerError::Canceled),
    };

    match &res {
        Ok(()) => {
            scope.bus.publish(scope.event(EventKind::InvocationCompleted, id));
        }
        Err(HandlerError::Canceled) => {
            scope.bus.publish(scope.event(EventKind::InvocationCanceled, id));
        }
        Err(e) => {
            if let HandlerError::Timeout { timeout } = e {
                token.cancel();
                scope
                    .bus
                    .publish(scope.event(EventKind::TimeoutHit, id).with_timeout(*timeout));
            }
            scope.bus.publish(
                scope
                    .event(EventKind::InvocationFailed, id)
                    .with_reason(e.to_string()),
            );
        }
    }
    res
}

/// Applies `timeout` (if any and non-zero) to `fut`.
async fn with_deadline<F>(fut: F, timeout: Option<Duration>) -> Result<(), HandlerError>
where
    F: Future<Output = Result<(), HandlerError>>,
{
    match timeout.filter(|d| !d.is_zero()) {
        Some(dur) => time::timeout(dur, fut)
            .await
            .unwrap_or(Err(HandlerError::Timeout { timeout: dur })),
        None => fut.await,
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerFn;

    fn scope(bus: &Bus) -> Arc<InvocationScope> {
        Arc::new(InvocationScope {
            watcher: Arc::from("owner::h"),
            action_type: Arc::from("a"),
            bus: bus.clone(),
        })
    }

    fn kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    #[tokio::test]
    async fn success_publishes_completed() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let h: HandlerRef = HandlerFn::arc("h", |_a: Action, _c: CancellationToken| async {
            Ok::<(), HandlerError>(())
        });

        let res = run_once(h, Action::new("a"), CancellationToken::new(), None, 1, scope(&bus)).await;

        assert!(res.is_ok());
        assert_eq!(
            kinds(&mut rx),
            [EventKind::InvocationStarting, EventKind::InvocationCompleted]
        );
    }

    #[tokio::test]
    async fn panic_becomes_failure() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        fn explode() -> Result<(), HandlerError> {
            panic!("kaboom")
        }
        let h: HandlerRef = HandlerFn::arc("h", |_a: Action, _c: CancellationToken| async { explode() });

        let res = run_once(h, Action::new("a"), CancellationToken::new(), None, 1, scope(&bus)).await;

        assert_eq!(res, Err(HandlerError::Panicked { info: "kaboom".into() }));
        assert_eq!(
            kinds(&mut rx),
            [EventKind::InvocationStarting, EventKind::InvocationFailed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_token() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let h: HandlerRef = HandlerFn::arc("h", |_a: Action, _c: CancellationToken| async {
            time::sleep(Duration::from_secs(10)).await;
            Ok::<(), HandlerError>(())
        });
        let token = CancellationToken::new();

        let res = run_once(
            h,
            Action::new("a"),
            token.clone(),
            Some(Duration::from_millis(50)),
            1,
            scope(&bus),
        )
        .await;

        assert_eq!(res, Err(HandlerError::Timeout { timeout: Duration::from_millis(50) }));
        assert!(token.is_cancelled());
        assert_eq!(
            kinds(&mut rx),
            [
                EventKind::InvocationStarting,
                EventKind::TimeoutHit,
                EventKind::InvocationFailed
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_drops_handler_future() {
        let bus = Bus::new(16);
        let h: HandlerRef = HandlerFn::arc("h", |_a: Action, _c: CancellationToken| async {
            time::sleep(Duration::from_secs(3600)).await;
            Ok::<(), HandlerError>(())
        });
        let token = CancellationToken::new();
        let run = tokio::spawn(run_once(h, Action::new("a"), token.clone(), None, 1, scope(&bus)));

        time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        assert_eq!(run.await.unwrap(), Err(HandlerError::Canceled));
    }
}
