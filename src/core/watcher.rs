//! # Watcher: one long-lived task per handler descriptor.
//!
//! A watcher waits for actions matching its action type and dispatches its
//! handler through a [`Gate`] that implements the resolved [`Strategy`].
//!
//! ## State machine
//! ```text
//! Idle ──run()──► Waiting ──matching action──► Dispatching ──► Waiting
//!                    │                          (gate: start / replace / drop)
//!                    └──────── token cancelled (from any state) ──────► Canceled
//! ```
//!
//! ## Loop
//! ```text
//! publish WatcherStarting
//! loop {
//!   select! (biased) {
//!     token cancelled        → break
//!     invocation settled     → gate.settled(id)
//!     action received        → filter by type → gate.admit(now)
//!                                 ├─ Start        → spawn run_once(child token)
//!                                 ├─ Replace(tok) → tok.cancel(), publish Preempted, spawn
//!                                 └─ Drop(reason) → publish ActionDropped
//!     stream lagged          → publish WatcherLagged, continue
//!     stream closed          → stop receiving, keep waiting for cancellation
//!   }
//! }
//! drain in-flight invocations (their tokens are children of ours)
//! publish WatcherStopped
//! ```
//!
//! ## Rules
//! - Invocations run in their own tokio tasks; their failures never end the loop.
//! - Settled invocations are reaped before the next action is received, so a
//!   `leading` watcher that just finished accepts the very next match.
//! - The action receiver is created with the watcher, so no action dispatched
//!   after construction is missed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    actions::Action,
    core::{
        gate::{Admission, Gate},
        runner::{InvocationScope, run_once},
    },
    error::HandlerError,
    events::{Bus, Event, EventKind},
    handlers::HandlerDescriptor,
    policies::Strategy,
};

/// Everything needed to instantiate a watcher, resolved once per descriptor.
#[derive(Clone)]
pub(crate) struct WatcherPlan {
    pub name: Arc<str>,
    pub descriptor: Arc<HandlerDescriptor>,
    pub strategy: Strategy,
    pub timeout: Option<Duration>,
}

/// Runs one descriptor's handler under its strategy.
pub(crate) struct Watcher {
    plan: WatcherPlan,
    rx: broadcast::Receiver<Action>,
    scope: Arc<InvocationScope>,
}

impl Watcher {
    /// Creates a watcher already subscribed to the action stream.
    pub(crate) fn new(plan: WatcherPlan, rx: broadcast::Receiver<Action>, bus: Bus) -> Self {
        let scope = Arc::new(InvocationScope {
            watcher: plan.name.clone(),
            action_type: plan.descriptor.action_type_arc(),
            bus,
        });
        Self { plan, rx, scope }
    }

    pub(crate) fn name(&self) -> &str {
        &self.plan.name
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.scope.bus
    }

    /// Runs until `token` is cancelled, then waits for in-flight invocations to settle.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        let mut gate = Gate::new(self.plan.strategy);
        let mut invocations: JoinSet<(u64, Result<(), HandlerError>)> = JoinSet::new();
        let mut next_id: u64 = 0;
        let mut receiving = true;

        self.publish(
            self.event(EventKind::WatcherStarting)
                .with_reason(self.plan.strategy.as_label()),
        );

        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => break,

                Some(joined) = invocations.join_next(), if !invocations.is_empty() => {
                    if let Ok((id, _)) = joined {
                        gate.settled(id);
                    }
                }

                msg = self.rx.recv(), if receiving => match msg {
                    Ok(action) => {
                        if action.matches(&self.scope.action_type) {
                            next_id += 1;
                            self.dispatch(action, next_id, &mut gate, &mut invocations, &token);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        self.publish(
                            self.event(EventKind::WatcherLagged)
                                .with_reason(format!("skipped={skipped}")),
                        );
                    }
                    Err(RecvError::Closed) => receiving = false,
                },
            }
        }

        while invocations.join_next().await.is_some() {}
        self.publish(self.event(EventKind::WatcherStopped));
    }

    /// Applies the gate decision for one matching action.
    fn dispatch(
        &self,
        action: Action,
        id: u64,
        gate: &mut Gate,
        invocations: &mut JoinSet<(u64, Result<(), HandlerError>)>,
        token: &CancellationToken,
    ) {
        self.publish(
            self.event(EventKind::ActionMatched)
                .with_reason(format!("seq={}", action.seq())),
        );

        match gate.admit(Instant::now()) {
            Admission::Drop(reason) => {
                self.publish(
                    self.event(EventKind::ActionDropped)
                        .with_reason(reason.as_label()),
                );
                return;
            }
            Admission::Replace { id: prev, token: prev_token } => {
                prev_token.cancel();
                self.publish(
                    self.event(EventKind::InvocationPreempted)
                        .with_invocation(prev),
                );
            }
            Admission::Start => {}
        }

        let child = token.child_token();
        gate.started(id, &child);

        let handler = self.plan.descriptor.handler().clone();
        let timeout = self.plan.timeout;
        let scope = Arc::clone(&self.scope);
        invocations.spawn(async move {
            let res = run_once(handler, action, child, timeout, id, scope).await;
            (id, res)
        });
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_watcher(self.plan.name.clone())
            .with_action(self.scope.action_type.clone())
    }

    fn publish(&self, ev: Event) {
        self.scope.bus.publish(ev);
    }
}
