//! # Event subscribers for the takevisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] that
//! fans runtime events out to subscribers.
//!
//! ## Architecture
//! ```text
//! Watcher ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet::emit
//!                                                                  │
//!                                                   ┌──────────────┼──────────────┐
//!                                                   ▼              ▼              ▼
//!                                               LogWriter       Metrics        Custom
//! ```
//!
//! Liveness tracking used during shutdown lives in the core (`AliveTracker`)
//! and is fed by the same listener.

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
