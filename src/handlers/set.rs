//! # Ordered set of handler descriptors.
//!
//! [`HandlerSet`] is the read-only collection a supervisor is built from. It keeps
//! insertion order (so watcher order is reproducible) and deduplicates by
//! descriptor **identity**: inserting the same `Arc<HandlerDescriptor>` twice is a
//! no-op, while two distinct descriptors for the same action type are both kept.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use takevisor::{Action, HandlerDescriptor, HandlerError, HandlerFn, HandlerRef, HandlerSet};
//!
//! let h: HandlerRef = HandlerFn::arc("noop", |_a: Action, _c: CancellationToken| async {
//!     Ok::<(), HandlerError>(())
//! });
//! let shared = Arc::new(HandlerDescriptor::every("a", h.clone()));
//!
//! let mut set = HandlerSet::new();
//! assert!(set.insert(shared.clone()));
//! assert!(!set.insert(shared));                                // same identity
//! assert!(set.insert(HandlerDescriptor::latest("a", h)));      // same type, new descriptor
//! assert_eq!(set.len(), 2);
//! ```

use std::sync::Arc;

use super::descriptor::HandlerDescriptor;

/// Ordered, identity-deduplicated collection of descriptors.
#[derive(Clone, Debug, Default)]
pub struct HandlerSet {
    items: Vec<Arc<HandlerDescriptor>>,
}

impl HandlerSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a descriptor; returns `false` if this exact descriptor is already present.
    pub fn insert(&mut self, descriptor: impl Into<Arc<HandlerDescriptor>>) -> bool {
        let descriptor = descriptor.into();
        if self.items.iter().any(|d| Arc::ptr_eq(d, &descriptor)) {
            return false;
        }
        self.items.push(descriptor);
        true
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, descriptor: impl Into<Arc<HandlerDescriptor>>) -> Self {
        self.insert(descriptor);
        self
    }

    /// Iterates descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<HandlerDescriptor>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<HandlerDescriptor> for HandlerSet {
    fn from_iter<I: IntoIterator<Item = HandlerDescriptor>>(iter: I) -> Self {
        let mut set = HandlerSet::new();
        for d in iter {
            set.insert(d);
        }
        set
    }
}

impl FromIterator<Arc<HandlerDescriptor>> for HandlerSet {
    fn from_iter<I: IntoIterator<Item = Arc<HandlerDescriptor>>>(iter: I) -> Self {
        let mut set = HandlerSet::new();
        for d in iter {
            set.insert(d);
        }
        set
    }
}

impl<'a> IntoIterator for &'a HandlerSet {
    type Item = &'a Arc<HandlerDescriptor>;
    type IntoIter = std::slice::Iter<'a, Arc<HandlerDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, HandlerError, HandlerFn, HandlerRef};
    use tokio_util::sync::CancellationToken;

    fn noop(name: &'static str) -> HandlerRef {
        HandlerFn::arc(name, |_a: Action, _c: CancellationToken| async {
            Ok::<(), HandlerError>(())
        })
    }

    #[test]
    fn keeps_insertion_order() {
        let set: HandlerSet = ["c", "a", "b"]
            .into_iter()
            .map(|t| HandlerDescriptor::every(t, noop("h")))
            .collect();

        let order: Vec<&str> = set.iter().map(|d| d.action_type()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn dedups_by_identity_not_action_type() {
        let d = Arc::new(HandlerDescriptor::leading("x", noop("h")));
        let set: HandlerSet = vec![d.clone(), d.clone(), Arc::new(HandlerDescriptor::leading("x", noop("h")))]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }
}
