//! Concurrency policies.
//!
//! This module groups the knobs that control **how** overlapping or rapid
//! matching actions are dispatched to a handler.
//!
//! ## Contents
//! - [`ConcurrencyPolicy`] declared tag (every / latest / leading / throttle / unrecognized)
//! - [`resolve`] pure mapping from a tag and parameter to a [`Strategy`]
//!
//! ## Quick wiring
//! ```text
//! HandlerDescriptor { policy, policy_param, .. }
//!      └─► resolve(policy, policy_param, cfg.throttle_window) ─► Strategy
//!           └─► core::watcher::Watcher drives a Gate built from the strategy
//! ```
//!
//! ## Defaults
//! - `ConcurrencyPolicy::Every` when nothing is declared.
//! - Throttle window 350ms (`SupervisorConfig::throttle_window`).

mod policy;
mod resolver;

pub use policy::ConcurrencyPolicy;
pub use resolver::{ResolveNote, Resolved, Strategy, resolve};
