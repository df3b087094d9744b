//! # Policy resolver.
//!
//! Translates a declared [`ConcurrencyPolicy`] and its optional parameter into the
//! [`Strategy`] a watcher applies. Resolution is a pure function: the same input
//! always yields the same strategy, and nothing here holds state or performs I/O.
//!
//! ## Rules
//! ```text
//! Every                       ─► Strategy::Every
//! Latest                      ─► Strategy::Latest
//! Leading                     ─► Strategy::Leading
//! Throttle + param > 0 (ms)   ─► Strategy::Throttle { window: param }
//! Throttle + param absent     ─► Strategy::Throttle { window: default }
//! Throttle + param <= 0 / NaN ─► Strategy::Throttle { window: default } + ParamCorrected
//! Unrecognized(tag)           ─► Strategy::Every + UnknownPolicyFallback
//! ```
//!
//! Neither note is an error: the supervisor publishes them as events and keeps going.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use takevisor::{ConcurrencyPolicy, Strategy, resolve};
//!
//! let default = Duration::from_millis(350);
//!
//! let r = resolve(&ConcurrencyPolicy::Throttle, Some(1000.0), default);
//! assert_eq!(r.strategy, Strategy::Throttle { window: Duration::from_secs(1) });
//! assert!(r.note.is_none());
//!
//! let r = resolve(&ConcurrencyPolicy::Throttle, Some(-5.0), default);
//! assert_eq!(r.strategy, Strategy::Throttle { window: default });
//! assert!(r.note.is_some());
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::policy::ConcurrencyPolicy;

/// Scheduling behaviour applied by one watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Overlapping invocations, no cancellation.
    Every,
    /// At most one in-flight invocation; newest wins.
    Latest,
    /// At most one in-flight invocation; oldest wins, newer matches dropped.
    Leading,
    /// At most one start per `window`, measured from the start of the last invocation.
    Throttle {
        /// Suppression window.
        window: Duration,
    },
}

impl Strategy {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            Strategy::Every => "every",
            Strategy::Latest => "latest",
            Strategy::Leading => "leading",
            Strategy::Throttle { .. } => "throttle",
        }
    }
}

/// Non-fatal correction applied while resolving.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolveNote {
    /// Tag was unrecognized or absent; `every` was used instead.
    UnknownPolicyFallback {
        /// Tag as declared (empty when absent).
        tag: Arc<str>,
    },
    /// Throttle window was not a positive finite number; the default was used.
    ParamCorrected {
        /// Declared value.
        given: f64,
        /// Window actually applied.
        applied: Duration,
    },
}

/// Outcome of [`resolve`].
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    /// Strategy the watcher will apply.
    pub strategy: Strategy,
    /// Correction applied, if any.
    pub note: Option<ResolveNote>,
}

/// Resolves a declared policy and parameter into a watcher strategy.
///
/// `param` is interpreted as milliseconds and only consulted for
/// [`ConcurrencyPolicy::Throttle`]; `default_window` is used when it is absent
/// or invalid.
pub fn resolve(policy: &ConcurrencyPolicy, param: Option<f64>, default_window: Duration) -> Resolved {
    match policy {
        ConcurrencyPolicy::Every => plain(Strategy::Every),
        ConcurrencyPolicy::Latest => plain(Strategy::Latest),
        ConcurrencyPolicy::Leading => plain(Strategy::Leading),
        ConcurrencyPolicy::Throttle => resolve_throttle(param, default_window),
        ConcurrencyPolicy::Unrecognized(tag) => Resolved {
            strategy: Strategy::Every,
            note: Some(ResolveNote::UnknownPolicyFallback { tag: tag.clone() }),
        },
    }
}

fn plain(strategy: Strategy) -> Resolved {
    Resolved {
        strategy,
        note: None,
    }
}

fn resolve_throttle(param: Option<f64>, default_window: Duration) -> Resolved {
    match param {
        None => plain(Strategy::Throttle {
            window: default_window,
        }),
        Some(ms) if ms.is_finite() && ms > 0.0 => plain(Strategy::Throttle {
            window: Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX),
        }),
        Some(given) => Resolved {
            strategy: Strategy::Throttle {
                window: default_window,
            },
            note: Some(ResolveNote::ParamCorrected {
                given,
                applied: default_window,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: Duration = Duration::from_millis(350);

    #[test]
    fn known_tags_resolve_without_notes() {
        for (policy, want) in [
            (ConcurrencyPolicy::Every, Strategy::Every),
            (ConcurrencyPolicy::Latest, Strategy::Latest),
            (ConcurrencyPolicy::Leading, Strategy::Leading),
        ] {
            let r = resolve(&policy, Some(10.0), DEFAULT);
            assert_eq!(r.strategy, want);
            assert!(r.note.is_none());
        }
    }

    #[test]
    fn throttle_defaults_when_absent() {
        let r = resolve(&ConcurrencyPolicy::Throttle, None, DEFAULT);
        assert_eq!(r.strategy, Strategy::Throttle { window: DEFAULT });
        assert!(r.note.is_none());
    }

    #[test]
    fn throttle_uses_positive_param() {
        let r = resolve(&ConcurrencyPolicy::Throttle, Some(120.0), DEFAULT);
        assert_eq!(
            r.strategy,
            Strategy::Throttle {
                window: Duration::from_millis(120)
            }
        );
    }

    #[test]
    fn throttle_corrects_invalid_param() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let r = resolve(&ConcurrencyPolicy::Throttle, Some(bad), DEFAULT);
            assert_eq!(r.strategy, Strategy::Throttle { window: DEFAULT });
            assert!(matches!(
                r.note,
                Some(ResolveNote::ParamCorrected { applied, .. }) if applied == DEFAULT
            ));
        }
    }

    #[test]
    fn unknown_falls_back_to_every() {
        let r = resolve(&ConcurrencyPolicy::from_tag(Some("debounce")), None, DEFAULT);
        assert_eq!(r.strategy, Strategy::Every);
        assert_eq!(
            r.note,
            Some(ResolveNote::UnknownPolicyFallback {
                tag: Arc::from("debounce")
            })
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let p = ConcurrencyPolicy::Throttle;
        assert_eq!(resolve(&p, Some(5.0), DEFAULT), resolve(&p, Some(5.0), DEFAULT));
    }
}
