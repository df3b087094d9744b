//! # Runtime events emitted by the supervisor and its watchers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Watcher events**: watcher lifecycle (starting, stopped, lagged, dead)
//! - **Dispatch events**: action matching and gating (matched, dropped, preempted)
//! - **Invocation events**: handler execution flow (starting, completed, failed, canceled, timeout)
//! - **Runtime events**: resolver notes, subscriber health and shutdown
//!
//! The [`Event`] struct carries additional metadata such as timestamps, watcher name,
//! action type, invocation number and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use takevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InvocationFailed)
//!     .with_watcher("search::fetch")
//!     .with_action("search/query")
//!     .with_invocation(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::InvocationFailed);
//! assert_eq!(ev.watcher.as_deref(), Some("search::fetch"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `watcher`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `watcher`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or explicit shutdown).
    ShutdownRequested,

    /// All root tasks stopped within configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some watchers did not stop in time.
    GraceExceeded,

    // === Resolver notes ===
    /// Unrecognized or absent policy tag resolved to `every`.
    ///
    /// Sets:
    /// - `watcher`: watcher name
    /// - `action`: action type
    /// - `reason`: offending tag (empty when absent)
    PolicyFallback,

    /// Invalid throttle window corrected to the configured default.
    ///
    /// Sets:
    /// - `watcher`: watcher name
    /// - `window_ms`: window actually used
    /// - `reason`: offending value
    ParamCorrected,

    // === Watcher lifecycle ===
    /// Watcher started waiting for actions.
    ///
    /// Sets:
    /// - `watcher`: watcher name
    /// - `action`: action type it filters on
    /// - `reason`: strategy label
    WatcherStarting,

    /// Watcher finished after cancellation; all its invocations have settled.
    WatcherStopped,

    /// Watcher fell behind the action stream and skipped actions.
    ///
    /// Sets:
    /// - `watcher`: watcher name
    /// - `reason`: number of skipped actions
    WatcherLagged,

    /// Watcher loop terminated abnormally (panic escaped the loop).
    WatcherDead,

    // === Dispatch events ===
    /// Action matched the watcher's action type.
    ///
    /// Sets:
    /// - `watcher`, `action`, `reason`: action sequence number
    ActionMatched,

    /// Matching action suppressed by the gate (`leading` busy or `throttle` window).
    ///
    /// Sets:
    /// - `watcher`, `action`, `reason`: why it was dropped
    ActionDropped,

    /// In-flight invocation cancelled by a newer matching action (`latest`).
    ///
    /// Sets:
    /// - `watcher`, `action`, `invocation`: the preempted invocation
    InvocationPreempted,

    // === Invocation events ===
    /// Handler invocation is starting.
    ///
    /// Sets:
    /// - `watcher`, `action`, `invocation` (1-based, per watcher)
    InvocationStarting,

    /// Handler invocation returned `Ok`.
    InvocationCompleted,

    /// Handler invocation failed (error, panic or timeout).
    ///
    /// Sets:
    /// - `watcher`, `action`, `invocation`, `reason`: failure message
    InvocationFailed,

    /// Handler invocation observed cancellation and stopped.
    InvocationCanceled,

    /// Handler invocation exceeded its configured timeout.
    ///
    /// Sets:
    /// - `watcher`, `invocation`, `timeout_ms`
    TimeoutHit,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the watcher (or subscriber), if applicable.
    pub watcher: Option<Arc<str>>,
    /// Action type involved, if applicable.
    pub action: Option<Arc<str>>,
    /// Invocation number within the watcher (starting from 1).
    pub invocation: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Invocation timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Throttle window in milliseconds (compact).
    pub window_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            watcher: None,
            action: None,
            invocation: None,
            reason: None,
            timeout_ms: None,
            window_ms: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a watcher name.
    #[inline]
    pub fn with_watcher(mut self, watcher: impl Into<Arc<str>>) -> Self {
        self.watcher = Some(watcher.into());
        self
    }

    /// Attaches an action type.
    #[inline]
    pub fn with_action(mut self, action: impl Into<Arc<str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Attaches an invocation number.
    #[inline]
    pub fn with_invocation(mut self, n: u64) -> Self {
        self.invocation = Some(n);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a throttle window (stored as milliseconds).
    #[inline]
    pub fn with_window(mut self, d: Duration) -> Self {
        self.window_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_watcher(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_watcher(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::ActionMatched);
        let b = Event::new(EventKind::ActionMatched);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_clamped() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));

        let ev = Event::new(EventKind::ParamCorrected).with_window(Duration::from_millis(350));
        assert_eq!(ev.window_ms, Some(350));
    }
}
