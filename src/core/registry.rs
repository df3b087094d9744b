//! # Handler registry - explicit owner → handler-set table.
//!
//! Owners (model instances) declare their handlers once at startup under a
//! caller-assigned [`OwnerId`]. The supervisor looks them up by that id when it
//! builds a supervised task; nothing is discovered through introspection.
//!
//! ## Lifecycle
//! ```text
//! register(owner, set) ──► table[owner] = set        (OwnerAlreadyRegistered if present)
//! get(owner)           ──► clone of table[owner]     (empty set if absent)
//! require(owner)       ──► clone, or MissingDeclaration when empty/absent
//! remove(owner)        ──► explicit teardown
//! ```
//!
//! ## Rules
//! - Lookups are pure: they never mutate the table.
//! - A [`HandlerSet`] is cheap to clone (descriptors are `Arc`-shared).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::SupervisorError;
use crate::handlers::HandlerSet;

/// Stable, caller-assigned identifier of a handler owner.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(Arc<str>);

impl OwnerId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&OwnerId> for OwnerId {
    fn from(id: &OwnerId) -> Self {
        id.clone()
    }
}

/// Table of declared handler sets keyed by owner.
#[derive(Default)]
pub struct HandlerRegistry {
    owners: RwLock<HashMap<OwnerId, HandlerSet>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler set of `owner`.
    ///
    /// Fails with [`SupervisorError::OwnerAlreadyRegistered`] if the owner is
    /// already present; call [`remove`](Self::remove) first to replace it.
    pub fn register(
        &self,
        owner: impl Into<OwnerId>,
        set: HandlerSet,
    ) -> Result<(), SupervisorError> {
        let owner = owner.into();
        let mut owners = self.owners.write();
        if owners.contains_key(&owner) {
            return Err(SupervisorError::OwnerAlreadyRegistered {
                owner: owner.to_string(),
            });
        }
        owners.insert(owner, set);
        Ok(())
    }

    /// Returns the handler set of `owner` (empty if the owner is unknown).
    pub fn get(&self, owner: &OwnerId) -> HandlerSet {
        self.owners.read().get(owner).cloned().unwrap_or_default()
    }

    /// Returns the handler set of `owner`, requiring at least one handler.
    pub fn require(&self, owner: &OwnerId) -> Result<HandlerSet, SupervisorError> {
        let set = self.get(owner);
        if set.is_empty() {
            return Err(SupervisorError::MissingDeclaration {
                owner: owner.to_string(),
            });
        }
        Ok(set)
    }

    /// Removes `owner` and returns its handler set.
    ///
    /// Supervised tasks already built for the owner keep running until cancelled.
    pub fn remove(&self, owner: &OwnerId) -> Option<HandlerSet> {
        self.owners.write().remove(owner)
    }

    /// Returns sorted list of registered owners.
    pub fn owners(&self) -> Vec<OwnerId> {
        let mut ids: Vec<OwnerId> = self.owners.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.owners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, HandlerDescriptor, HandlerError, HandlerFn, HandlerRef};
    use tokio_util::sync::CancellationToken;

    fn one_handler() -> HandlerSet {
        let h: HandlerRef = HandlerFn::arc("h", |_a: Action, _c: CancellationToken| async {
            Ok::<(), HandlerError>(())
        });
        HandlerSet::new().with(HandlerDescriptor::every("a", h))
    }

    #[test]
    fn register_then_lookup() {
        let reg = HandlerRegistry::new();
        reg.register("cart", one_handler()).unwrap();

        assert_eq!(reg.get(&"cart".into()).len(), 1);
        assert_eq!(reg.require(&"cart".into()).unwrap().len(), 1);
        assert_eq!(reg.owners(), vec![OwnerId::from("cart")]);
    }

    #[test]
    fn duplicate_owner_is_rejected() {
        let reg = HandlerRegistry::new();
        reg.register("cart", one_handler()).unwrap();
        let err = reg.register("cart", one_handler()).unwrap_err();
        assert_eq!(
            err,
            SupervisorError::OwnerAlreadyRegistered {
                owner: "cart".into()
            }
        );
    }

    #[test]
    fn require_fails_for_unknown_or_empty_owner() {
        let reg = HandlerRegistry::new();
        reg.register("empty", HandlerSet::new()).unwrap();

        assert!(reg.get(&"ghost".into()).is_empty());
        assert!(matches!(
            reg.require(&"ghost".into()),
            Err(SupervisorError::MissingDeclaration { .. })
        ));
        assert!(matches!(
            reg.require(&"empty".into()),
            Err(SupervisorError::MissingDeclaration { .. })
        ));
    }

    #[test]
    fn remove_is_explicit_teardown() {
        let reg = HandlerRegistry::new();
        reg.register("cart", one_handler()).unwrap();

        assert_eq!(reg.remove(&"cart".into()).map(|s| s.len()), Some(1));
        assert!(reg.is_empty());
        assert!(reg.remove(&"cart".into()).is_none());
        reg.register("cart", one_handler()).unwrap();
        assert_eq!(reg.len(), 1);
    }
}
