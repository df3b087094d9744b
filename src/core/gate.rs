//! # Dispatch gate: per-watcher admission state machine.
//!
//! Each watcher owns one [`Gate`], built from its resolved [`Strategy`]. When a
//! matching action arrives the watcher asks the gate whether to start an
//! invocation; when an invocation settles it tells the gate.
//!
//! ## Transitions
//! ```text
//! Every     : admit → Start                                  (always)
//! Latest    : admit → Start                  if nothing in flight
//!                   → Replace(prev token)    otherwise (caller cancels prev)
//!             started(id, token) → current = (id, token)
//!             settled(id)        → current = None   if id is current
//! Leading   : admit → Start                  if idle
//!                   → Drop(Busy)             while an invocation is in flight
//!             started(id) → busy(id);  settled(id) → idle
//! Throttle  : admit → Start, opened_at = now if no window or now - opened_at >= window
//!                   → Drop(Throttled)        otherwise
//! ```
//!
//! ## Rules
//! - A gate never spawns or cancels anything itself; it only decides.
//! - `Drop` is final for that action: nothing is buffered.
//! - The throttle window is measured from the **start** of the last admitted
//!   invocation, on the monotonic tokio clock.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::policies::Strategy;

/// Why a matching action was not dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DropReason {
    /// `leading`: an invocation is still in flight.
    Busy,
    /// `throttle`: the window opened by the last start has not elapsed.
    Throttled,
}

impl DropReason {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            DropReason::Busy => "leading_busy",
            DropReason::Throttled => "throttle_window",
        }
    }
}

/// Decision for one matching action.
#[derive(Debug)]
pub(crate) enum Admission {
    /// Start a new invocation.
    Start,
    /// Cancel the in-flight invocation `id` (via its token), then start a new one.
    Replace { id: u64, token: CancellationToken },
    /// Ignore the action.
    Drop(DropReason),
}

/// Per-strategy dispatch state.
#[derive(Debug)]
pub(crate) enum Gate {
    Every,
    Latest {
        current: Option<(u64, CancellationToken)>,
    },
    Leading {
        in_flight: Option<u64>,
    },
    Throttle {
        window: Duration,
        opened_at: Option<Instant>,
    },
}

impl Gate {
    pub(crate) fn new(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Every => Gate::Every,
            Strategy::Latest => Gate::Latest { current: None },
            Strategy::Leading => Gate::Leading { in_flight: None },
            Strategy::Throttle { window } => Gate::Throttle {
                window,
                opened_at: None,
            },
        }
    }

    /// Decides what to do with a matching action arriving at `now`.
    pub(crate) fn admit(&mut self, now: Instant) -> Admission {
        match self {
            Gate::Every => Admission::Start,
            Gate::Latest { current } => match current.take() {
                Some((id, token)) => Admission::Replace { id, token },
                None => Admission::Start,
            },
            Gate::Leading { in_flight } => {
                if in_flight.is_some() {
                    Admission::Drop(DropReason::Busy)
                } else {
                    Admission::Start
                }
            }
            Gate::Throttle { window, opened_at } => {
                let window = *window;
                let closed = opened_at.is_some_and(|at| now.saturating_duration_since(at) < window);
                if closed {
                    Admission::Drop(DropReason::Throttled)
                } else {
                    *opened_at = Some(now);
                    Admission::Start
                }
            }
        }
    }

    /// Records that invocation `id` was started with `token`.
    pub(crate) fn started(&mut self, id: u64, token: &CancellationToken) {
        match self {
            Gate::Latest { current } => *current = Some((id, token.clone())),
            Gate::Leading { in_flight } => *in_flight = Some(id),
            Gate::Every | Gate::Throttle { .. } => {}
        }
    }

    /// Records that invocation `id` has settled (completed, failed or cancelled).
    pub(crate) fn settled(&mut self, id: u64) {
        match self {
            Gate::Latest { current } => {
                if current.as_ref().is_some_and(|(cur, _)| *cur == id) {
                    *current = None;
                }
            }
            Gate::Leading { in_flight } => {
                if *in_flight == Some(id) {
                    *in_flight = None;
                }
            }
            Gate::Every | Gate::Throttle { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(gate: &mut Gate, id: u64, now: Instant) -> CancellationToken {
        let token = CancellationToken::new();
        assert!(matches!(gate.admit(now), Admission::Start));
        gate.started(id, &token);
        token
    }

    #[test]
    fn every_always_starts() {
        let mut gate = Gate::new(Strategy::Every);
        let now = Instant::now();
        for id in 1..=5 {
            start(&mut gate, id, now);
        }
    }

    #[test]
    fn latest_replaces_in_flight() {
        let mut gate = Gate::new(Strategy::Latest);
        let now = Instant::now();
        let first = start(&mut gate, 1, now);

        match gate.admit(now) {
            Admission::Replace { id, token } => {
                assert_eq!(id, 1);
                token.cancel();
            }
            other => panic!("expected replace, got {other:?}"),
        }
        assert!(first.is_cancelled());
        gate.started(2, &CancellationToken::new());

        // stale settle of the preempted invocation keeps the newer one current
        gate.settled(1);
        assert!(matches!(gate.admit(now), Admission::Replace { id: 2, .. }));
    }

    #[test]
    fn latest_starts_fresh_after_settle() {
        let mut gate = Gate::new(Strategy::Latest);
        let now = Instant::now();
        start(&mut gate, 1, now);
        gate.settled(1);
        start(&mut gate, 2, now);
    }

    #[test]
    fn leading_drops_while_busy() {
        let mut gate = Gate::new(Strategy::Leading);
        let now = Instant::now();
        start(&mut gate, 1, now);

        assert!(matches!(gate.admit(now), Admission::Drop(DropReason::Busy)));
        gate.settled(1);
        start(&mut gate, 2, now);
    }

    #[test]
    fn throttle_window_from_start() {
        let window = Duration::from_millis(100);
        let mut gate = Gate::new(Strategy::Throttle { window });
        let t0 = Instant::now();
        start(&mut gate, 1, t0);

        assert!(matches!(
            gate.admit(t0 + Duration::from_millis(99)),
            Admission::Drop(DropReason::Throttled)
        ));
        start(&mut gate, 2, t0 + Duration::from_millis(101));
        assert!(matches!(
            gate.admit(t0 + Duration::from_millis(150)),
            Admission::Drop(DropReason::Throttled)
        ));
    }
}
