//! # Supervisor: builds supervised tasks from declared handlers and drives shutdown.
//!
//! The [`Supervisor`] owns the handler registry, the action stream, the event bus
//! and a [`SubscriberSet`]. It turns an owner's declared handlers into a
//! [`SupervisedTask`] and, optionally, drives a set of root tasks until an OS
//! signal or an explicit [`shutdown`](Supervisor::shutdown).
//!
//! ## Key responsibilities
//! - keep the `OwnerId → HandlerSet` table ([`HandlerRegistry`])
//! - resolve each descriptor's policy once and build one watcher per descriptor
//! - subscribe to the [`Bus`] and **fan-out** events via [`SubscriberSet`]
//! - perform graceful shutdown with a configurable [`SupervisorConfig::grace`]
//!
//! ## High-level architecture
//! ```text
//! register(owner, HandlerSet) ──► HandlerRegistry
//!
//! create_supervisor(owner):
//!   HandlerRegistry::require(owner)            (MissingDeclaration if empty)
//!       └─► for each descriptor:
//!             resolve(policy, param, cfg.throttle_window) ─► Strategy
//!             (PolicyFallback / ParamCorrected published here)
//!       └─► SupervisedFactory
//!
//! factory():
//!   one Watcher per descriptor, each subscribed to the ActionStream
//!       └─► SupervisedTask "owner" { owner::h1, owner::h2, ... }
//!
//! dispatch(action) ──► ActionStream ──► every watcher ──► filter by type ──► Gate ──► run_once
//!
//! Event flow:
//!   watchers / invocations ── publish(Event) ──► Bus ──► listener ──┬─► AliveTracker::update
//!                                                                 └─► SubscriberSet::emit
//!
//! Shutdown path (run):
//!   OS signal or shutdown()
//!             └─► Bus.publish(ShutdownRequested)
//!             └─► runtime_token.cancel()   → roots → watchers → invocations
//!             └─► wait_all_with_grace(cfg.grace):
//!                    ├─ all joined         → Bus.publish(AllStoppedWithin)
//!                    └─ timeout exceeded   → Bus.publish(GraceExceeded)
//!                                            (AliveTracker.snapshot() for stuck watchers)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use takevisor::{
//!     Action, HandlerDescriptor, HandlerError, HandlerFn, HandlerSet, Supervisor,
//!     SupervisorConfig,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(SupervisorConfig::default()).build();
//!
//!     let save = HandlerFn::arc("save", |_a: Action, _ctx: CancellationToken| async {
//!         Ok::<(), HandlerError>(())
//!     });
//!     sup.register("cart", HandlerSet::new().with(HandlerDescriptor::latest("cart/save", save)))?;
//!
//!     let factory = sup.create_supervisor("cart")?;
//!     let handle = factory().spawn(&CancellationToken::new());
//!
//!     sup.dispatch(Action::new("cart/save"));
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    actions::{Action, ActionStream},
    core::{
        alive::AliveTracker,
        builder::SupervisorBuilder,
        config::SupervisorConfig,
        registry::{HandlerRegistry, OwnerId},
        shutdown,
        supervised::SupervisedTask,
        watcher::{Watcher, WatcherPlan},
    },
    error::{RuntimeError, SupervisorError},
    events::{Bus, Event, EventKind},
    handlers::{HandlerDescriptor, HandlerSet},
    policies::{ResolveNote, resolve},
    subscribers::SubscriberSet,
};

/// Produces a fresh [`SupervisedTask`] for one owner on every call.
///
/// Each task it builds subscribes its own watchers to the action stream, so
/// calling it twice yields two independent sets of watchers.
pub type SupervisedFactory = Arc<dyn Fn() -> SupervisedTask + Send + Sync>;

/// Builds supervised tasks from declared handlers and coordinates shutdown.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    actions: ActionStream,
    subs: Arc<SubscriberSet>,
    alive: Arc<AliveTracker>,
    registry: Arc<HandlerRegistry>,
    runtime_token: CancellationToken,
}

impl Supervisor {
    /// Creates a builder for constructing a Supervisor.
    ///
    /// Must be built inside a tokio runtime (subscriber workers are spawned).
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        let actions = ActionStream::new(cfg.action_capacity_clamped());
        let sup = Self {
            cfg,
            bus,
            actions,
            subs,
            alive: Arc::new(AliveTracker::new()),
            registry,
            runtime_token: CancellationToken::new(),
        };
        sup.subscriber_listener();
        sup
    }

    /// Runtime configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Handler registry shared by this supervisor.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Declares the handlers of `owner`.
    pub fn register(&self, owner: impl Into<OwnerId>, set: HandlerSet) -> Result<(), SupervisorError> {
        self.registry.register(owner, set)
    }

    /// Removes the declaration of `owner`.
    ///
    /// Tasks already built for the owner keep running until cancelled.
    pub fn teardown(&self, owner: impl Into<OwnerId>) -> Option<HandlerSet> {
        self.registry.remove(&owner.into())
    }

    /// Puts an action on the stream shared by all watchers.
    ///
    /// Returns the number of watchers that received it.
    pub fn dispatch(&self, action: Action) -> usize {
        self.actions.dispatch(action)
    }

    /// The action stream watchers subscribe to.
    pub fn actions(&self) -> &ActionStream {
        &self.actions
    }

    /// Subscribes to raw runtime events.
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Builds the task factory for `owner`.
    ///
    /// Resolves every declared descriptor's policy once; resolver corrections are
    /// published as `PolicyFallback` / `ParamCorrected`. Fails with
    /// [`SupervisorError::MissingDeclaration`] when the owner declares no handlers,
    /// unless [`SupervisorConfig::allow_empty`] is set.
    pub fn create_supervisor(
        &self,
        owner: impl Into<OwnerId>,
    ) -> Result<SupervisedFactory, SupervisorError> {
        let owner = owner.into();
        let set = if self.cfg.allow_empty {
            self.registry.get(&owner)
        } else {
            self.registry.require(&owner)?
        };

        let plans: Arc<[WatcherPlan]> = set
            .iter()
            .map(|descriptor| self.plan(&owner, descriptor))
            .collect();

        let name: Arc<str> = Arc::from(owner.as_str());
        let actions = self.actions.clone();
        let bus = self.bus.clone();

        Ok(Arc::new(move || {
            let watchers = plans
                .iter()
                .map(|plan| Watcher::new(plan.clone(), actions.subscribe(), bus.clone()))
                .collect();
            SupervisedTask::from_watchers(name.clone(), watchers)
        }))
    }

    fn plan(&self, owner: &OwnerId, descriptor: &Arc<HandlerDescriptor>) -> WatcherPlan {
        let name: Arc<str> = Arc::from(format!("{owner}::{}", descriptor.name()));
        let resolved = resolve(
            descriptor.policy(),
            descriptor.policy_param(),
            self.cfg.throttle_window,
        );

        if let Some(note) = resolved.note {
            let ev = match note {
                ResolveNote::UnknownPolicyFallback { tag } => {
                    Event::new(EventKind::PolicyFallback).with_reason(tag)
                }
                ResolveNote::ParamCorrected { given, applied } => {
                    Event::new(EventKind::ParamCorrected)
                        .with_reason(given.to_string())
                        .with_window(applied)
                }
            };
            self.bus.publish(
                ev.with_watcher(name.clone())
                    .with_action(descriptor.action_type_arc()),
            );
        }

        WatcherPlan {
            name,
            descriptor: Arc::clone(descriptor),
            strategy: resolved.strategy,
            timeout: descriptor.timeout().or(self.cfg.default_timeout()),
        }
    }

    /// Runs the provided root tasks until either:
    /// - all of them finish on their own, or
    /// - a termination signal arrives or [`shutdown`](Self::shutdown) is called →
    ///   graceful shutdown (may end with `GraceExceeded`).
    pub async fn run(&self, roots: Vec<SupervisedTask>) -> Result<(), RuntimeError> {
        let mut set = JoinSet::new();
        for root in roots {
            set.spawn(root.run(self.runtime_token.child_token()));
        }
        self.drive_shutdown(&mut set).await
    }

    /// Requests shutdown of everything started through [`run`](Self::run).
    pub fn shutdown(&self) {
        if !self.runtime_token.is_cancelled() {
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
            self.runtime_token.cancel();
        }
    }

    /// Sorted names of watchers currently running.
    pub async fn alive_watchers(&self) -> Vec<String> {
        self.alive.snapshot().await
    }

    /// Subscribes to the bus and forwards events to the alive tracker and subscriber set.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let alive = Arc::clone(&self.alive);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        alive.update(&ev).await;
                        set.emit(&ev);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Waits until either all roots finish or shutdown is requested.
    async fn drive_shutdown(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {
                self.shutdown();
                self.wait_all_with_grace(set).await
            }
            _ = self.runtime_token.cancelled() => {
                self.wait_all_with_grace(set).await
            }
            _ = async { while set.join_next().await.is_some() {} } => {
                Ok(())
            }
        }
    }

    /// Waits for all roots to finish within the configured grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout, aborts the remaining roots and
    /// returns [`RuntimeError::GraceExceeded`] with the list of stuck watchers.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async { while set.join_next().await.is_some() {} };

        match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.alive.snapshot().await;
                set.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handlers::{HandlerFn, HandlerRef};
    use crate::policies::ConcurrencyPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio::time::sleep;

    fn counting(name: &'static str, hits: &Arc<AtomicUsize>) -> HandlerRef {
        let hits = Arc::clone(hits);
        HandlerFn::arc(name, move |_a: Action, _ctx: CancellationToken| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok::<(), HandlerError>(())
            }
        })
    }

    fn failing(name: &'static str) -> HandlerRef {
        HandlerFn::arc(name, |_a: Action, _ctx: CancellationToken| async {
            Err::<(), HandlerError>(HandlerError::fail("out of stock"))
        })
    }

    async fn wait_for(hits: &AtomicUsize, n: usize) {
        while hits.load(Ordering::SeqCst) < n {
            sleep(Duration::from_millis(1)).await;
        }
    }

    async fn next_of(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
        loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == kind {
                return ev;
            }
        }
    }

    fn supervisor() -> Arc<Supervisor> {
        Supervisor::builder(SupervisorConfig::default()).build()
    }

    #[tokio::test(start_paused = true)]
    async fn one_watcher_per_descriptor() {
        let sup = supervisor();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = counting("add", &hits);
        let set = HandlerSet::new()
            .with(HandlerDescriptor::every("cart/add", h.clone()))
            .with(HandlerDescriptor::every("cart/add", h.clone()))
            .with(HandlerDescriptor::leading("cart/remove", counting("remove", &hits)));
        sup.register("cart", set).unwrap();

        let task = sup.create_supervisor("cart").unwrap()();
        assert_eq!(task.name(), "cart");
        assert_eq!(task.watcher_count(), 3);
        assert_eq!(
            task.watcher_names(),
            vec!["cart::add", "cart::add", "cart::remove"]
        );

        let handle = task.spawn(&CancellationToken::new());
        sup.dispatch(Action::new("cart/add"));
        wait_for(&hits, 2).await;
        handle.shutdown().await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_declaration_fails_synchronously() {
        let sup = supervisor();
        let err = sup.create_supervisor("nobody").err().unwrap();
        assert_eq!(
            err,
            SupervisorError::MissingDeclaration {
                owner: "nobody".into()
            }
        );

        sup.register("empty", HandlerSet::new()).unwrap();
        assert!(sup.create_supervisor("empty").is_err());
        assert_eq!(sup.dispatch(Action::new("x")), 0);
    }

    #[tokio::test]
    async fn allow_empty_yields_task_that_completes() {
        let cfg = SupervisorConfig {
            allow_empty: true,
            ..SupervisorConfig::default()
        };
        let sup = Supervisor::builder(cfg).build();

        let task = sup.create_supervisor("nobody").unwrap()();
        assert_eq!(task.watcher_count(), 0);
        task.spawn(&CancellationToken::new()).join().await;
    }

    #[tokio::test]
    async fn duplicate_registration_and_teardown() {
        let sup = supervisor();
        let hits = Arc::new(AtomicUsize::new(0));
        let set = HandlerSet::new().with(HandlerDescriptor::every("a", counting("a", &hits)));

        sup.register("owner", set.clone()).unwrap();
        assert!(matches!(
            sup.register("owner", set.clone()),
            Err(SupervisorError::OwnerAlreadyRegistered { .. })
        ));
        assert_eq!(sup.teardown("owner").map(|s| s.len()), Some(1));
        sup.register("owner", set).unwrap();
    }

    #[tokio::test]
    async fn resolver_notes_are_published() {
        let sup = supervisor();
        let mut rx = sup.subscribe_events();
        let hits = Arc::new(AtomicUsize::new(0));
        let set = HandlerSet::new()
            .with(HandlerDescriptor::new(
                "a",
                ConcurrencyPolicy::Unrecognized("debounce".into()),
                counting("legacy", &hits),
            ))
            .with(HandlerDescriptor::new("b", ConcurrencyPolicy::Throttle, counting("t", &hits)).with_param(-5.0));
        sup.register("m", set).unwrap();
        let _factory = sup.create_supervisor("m").unwrap();

        let ev = next_of(&mut rx, EventKind::PolicyFallback).await;
        assert_eq!(ev.watcher.as_deref(), Some("m::legacy"));
        assert_eq!(ev.reason.as_deref(), Some("debounce"));

        let ev = next_of(&mut rx, EventKind::ParamCorrected).await;
        assert_eq!(ev.watcher.as_deref(), Some("m::t"));
        assert_eq!(ev.window_ms, Some(350));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_handler_does_not_affect_siblings() {
        let sup = supervisor();
        let mut rx = sup.subscribe_events();
        let hits = Arc::new(AtomicUsize::new(0));
        let set = HandlerSet::new()
            .with(HandlerDescriptor::every("boom", failing("explode")))
            .with(HandlerDescriptor::every("ok", counting("ok", &hits)));
        sup.register("m", set).unwrap();
        let handle = sup.create_supervisor("m").unwrap()().spawn(&CancellationToken::new());

        sup.dispatch(Action::new("boom"));
        let ev = next_of(&mut rx, EventKind::InvocationFailed).await;
        assert_eq!(ev.watcher.as_deref(), Some("m::explode"));

        sup.dispatch(Action::new("ok"));
        sup.dispatch(Action::new("boom"));
        sup.dispatch(Action::new("ok"));
        wait_for(&hits, 2).await;
        let ev = next_of(&mut rx, EventKind::InvocationFailed).await;
        assert_eq!(ev.invocation, Some(2));

        assert!(!handle.is_finished());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn group_cancellation_stops_every_watcher() {
        let sup = supervisor();
        let mut rx = sup.subscribe_events();
        let hits = Arc::new(AtomicUsize::new(0));
        sup.register(
            "cart",
            HandlerSet::new().with(HandlerDescriptor::latest("cart/save", counting("save", &hits))),
        )
        .unwrap();
        sup.register(
            "search",
            HandlerSet::new()
                .with(HandlerDescriptor::throttle("q", Duration::from_millis(100), counting("fetch", &hits)))
                .with(HandlerDescriptor::leading("q", counting("suggest", &hits))),
        )
        .unwrap();

        let app = SupervisedTask::group(
            "app",
            [
                sup.create_supervisor("cart").unwrap()(),
                sup.create_supervisor("search").unwrap()(),
            ],
        );
        assert_eq!(app.watcher_count(), 3);

        let handle = app.spawn(&CancellationToken::new());
        sup.dispatch(Action::new("q"));
        wait_for(&hits, 2).await;

        handle.shutdown().await;
        for _ in 0..3 {
            next_of(&mut rx, EventKind::WatcherStopped).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_after_shutdown() {
        let sup = supervisor();
        let hits = Arc::new(AtomicUsize::new(0));
        sup.register(
            "m",
            HandlerSet::new().with(HandlerDescriptor::every("a", counting("a", &hits))),
        )
        .unwrap();
        let factory = sup.create_supervisor("m").unwrap();
        let roots = vec![factory(), factory()];

        let runner = {
            let sup = Arc::clone(&sup);
            tokio::spawn(async move { sup.run(roots).await })
        };

        sup.dispatch(Action::new("a"));
        wait_for(&hits, 2).await;
        while sup.alive_watchers().await != vec!["m::a".to_string()] {
            sleep(Duration::from_millis(1)).await;
        }

        sup.shutdown();
        assert!(runner.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn run_without_roots_returns_immediately() {
        let sup = supervisor();
        assert!(sup.run(Vec::new()).await.is_ok());
    }
}
