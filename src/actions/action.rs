//! # Action values.
//!
//! An [`Action`] is an external event carrying a type tag that watchers match on,
//! plus an optional type-erased payload. Actions are cheap to clone: the tag and
//! payload are both reference counted, which matters because the action stream
//! hands every receiver its own clone.
//!
//! ## Example
//! ```rust
//! use takevisor::Action;
//!
//! let a = Action::new("search/query").with_payload(String::from("rust"));
//! assert_eq!(a.action_type(), "search/query");
//! assert_eq!(a.payload::<String>().map(String::as_str), Some("rust"));
//! assert!(a.payload::<u32>().is_none());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global dispatch counter.
static ACTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// External event value matched by watchers through its action type.
#[derive(Clone)]
pub struct Action {
    action_type: Arc<str>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    seq: u64,
}

impl Action {
    /// Creates an action without payload.
    pub fn new(action_type: impl Into<Arc<str>>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
            seq: ACTION_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }

    /// Attaches a payload value.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Returns the action type tag.
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Returns the payload if present and of type `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Monotonic creation number, usable to tell actions of the same type apart.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns true if this action carries the given type tag.
    #[inline]
    pub fn matches(&self, action_type: &str) -> bool {
        *self.action_type == *action_type
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("action_type", &self.action_type)
            .field("seq", &self.seq)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_type_only() {
        let a = Action::new("cart/add");
        assert!(a.matches("cart/add"));
        assert!(!a.matches("cart"));
        assert!(!a.matches("cart/add/more"));
    }

    #[test]
    fn clones_share_payload_and_seq() {
        let a = Action::new("x").with_payload(7u32);
        let b = a.clone();
        assert_eq!(a.seq(), b.seq());
        assert_eq!(b.payload::<u32>(), Some(&7));
        assert!(Action::new("x").seq() > a.seq());
    }
}
