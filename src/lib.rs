//! # takevisor
//!
//! **Takevisor** supervises async action handlers on tokio.
//!
//! An owner declares a set of handlers, each bound to an action type and a
//! concurrency policy. The [`Supervisor`] turns that declaration into a single
//! cancelable [`SupervisedTask`] running one watcher per handler. Every watcher
//! listens to a shared action stream and schedules its handler according to the
//! policy:
//!
//! | Policy     | Behaviour when matching actions overlap                              |
//! |------------|----------------------------------------------------------------------|
//! | `every`    | every action starts its own invocation                               |
//! | `latest`   | a new action cancels the in-flight invocation and starts anew        |
//! | `leading`  | actions are dropped while an invocation is in flight                 |
//! | `throttle` | at most one start per window (default 350ms), the rest are dropped   |
//!
//! Unrecognized policy tags fall back to `every` and are reported as events.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  owner "cart"                 owner "search"
//!  HandlerSet                   HandlerSet
//!  ├─ cart/add   every          ├─ search/query  latest
//!  └─ cart/save  latest         └─ search/hint   throttle(200ms)
//!        │                             │
//!        ▼                             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - HandlerRegistry (OwnerId → HandlerSet)                         │
//! │  - resolve() (policy tag → Strategy)                              │
//! │  - ActionStream (broadcast actions)                               │
//! │  - Bus + SubscriberSet (runtime events)                           │
//! └──────┬─────────────────────────────────────────────┬──────────────┘
//!        │ create_supervisor(owner)                    │ dispatch(action)
//!        ▼                                             ▼
//!   SupervisedTask "cart"                       ActionStream
//!     ├─ Watcher cart::add   ◄──────────────────────────┤
//!     └─ Watcher cart::save  ◄──────────────────────────┘
//!           │
//!           │ Gate (strategy) ─► run_once() in its own task
//!           │
//!           ▼ Publishes events:
//!             WatcherStarting, ActionMatched, ActionDropped,
//!             InvocationStarting/Completed/Failed/Canceled/Preempted, ...
//!           │
//!           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │   (in Supervisor)      │
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                    AliveTracker     SubscriberSet
//!                                  ┌─────────┼─────────┐
//!                                  ▼         ▼         ▼
//!                             sub1.on   sub2.on   subN.on
//!                              _event()  _event()  _event()
//! ```
//!
//! ### Cancellation
//! ```text
//! root token
//!   └─► SupervisedTask (child token)
//!         └─► Watcher (child token)
//!               └─► invocation (child token)   ◄── also cancelled by `latest` preemption
//! ```
//! A task completes only when every child has completed; watchers complete only
//! on cancellation, after their in-flight invocations have settled.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Declarations**  | Bind handlers to action types and policies.                  | [`HandlerDescriptor`], [`HandlerSet`]       |
//! | **Handlers**      | Async cancelable handlers, as closures or trait objects.     | [`Handler`], [`HandlerFn`], [`HandlerRef`]  |
//! | **Policies**      | Policy tags and their resolution into strategies.            | [`ConcurrencyPolicy`], [`resolve`]          |
//! | **Supervision**   | Build, compose and run supervised tasks.                     | [`Supervisor`], [`SupervisedTask`]          |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom).         | [`Subscribe`]                               |
//! | **Errors**        | Typed errors for construction, runtime and invocations.      | [`SupervisorError`], [`HandlerError`]       |
//! | **Configuration** | Centralize runtime settings.                                 | [`SupervisorConfig`]                        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use takevisor::{
//!     Action, HandlerDescriptor, HandlerError, HandlerFn, HandlerRef, HandlerSet,
//!     SupervisedTask, Supervisor, SupervisorConfig,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn takevisor::Subscribe>> = vec![Arc::new(takevisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn takevisor::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let fetch: HandlerRef = HandlerFn::arc("fetch", |action: Action, ctx: CancellationToken| async move {
//!         let query = action.payload::<String>().cloned().unwrap_or_default();
//!         tokio::select! {
//!             _ = tokio::time::sleep(Duration::from_millis(50)) => {
//!                 println!("results for {query}");
//!                 Ok(())
//!             }
//!             _ = ctx.cancelled() => Err(HandlerError::Canceled),
//!         }
//!     });
//!     sup.register("search", HandlerSet::new().with(HandlerDescriptor::latest("search/query", fetch)))?;
//!
//!     let factory = sup.create_supervisor("search")?;
//!     let root = SupervisedTask::group("app", [factory()]);
//!     let handle = root.spawn(&CancellationToken::new());
//!
//!     // Only the last query completes; the first two are preempted.
//!     for q in ["r", "ru", "rust"] {
//!         sup.dispatch(Action::new("search/query").with_payload(q.to_string()));
//!     }
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
mod actions;
mod core;
mod error;
mod events;
mod handlers;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use actions::{Action, ActionStream};
pub use core::{
    HandlerRegistry, OwnerId, SupervisedFactory, SupervisedHandle, SupervisedTask, Supervisor,
    SupervisorBuilder, SupervisorConfig,
};
pub use error::{HandlerError, RuntimeError, SupervisorError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{BoxHandlerFuture, Handler, HandlerDescriptor, HandlerFn, HandlerRef, HandlerSet};
pub use policies::{ConcurrencyPolicy, ResolveNote, Resolved, Strategy, resolve};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
