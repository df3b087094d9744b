//! Runtime core: registry, watchers and orchestration.
//!
//! This module contains the embedded implementation of the takevisor runtime.
//! Its public API is [`Supervisor`] (with [`SupervisorBuilder`] and
//! [`SupervisorConfig`]), the [`HandlerRegistry`] it reads declarations from,
//! and the [`SupervisedTask`] tree it produces.
//!
//! Internal modules:
//! - [`registry`]: explicit owner → handler-set table;
//! - [`gate`]: per-watcher admission state machine for each strategy;
//! - [`runner`]: executes one invocation with timeout/cancellation and event publishing;
//! - [`watcher`]: one long-lived loop per handler descriptor;
//! - [`supervised`]: composable task tree and its handle;
//! - [`supervisor`]: builds tasks from declarations, handles shutdown;
//! - [`alive`]: tracks running watchers for the shutdown report;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod alive;
mod builder;
mod config;
mod gate;
mod registry;
mod runner;
mod shutdown;
mod supervised;
mod supervisor;
mod watcher;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use registry::{HandlerRegistry, OwnerId};
pub(crate) use runner::panic_message;
pub use supervised::{SupervisedHandle, SupervisedTask};
pub use supervisor::{SupervisedFactory, Supervisor};
