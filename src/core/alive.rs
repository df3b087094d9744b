//! # Watcher liveness tracker.
//!
//! Maintains which watchers are currently running, fed by the supervisor's bus
//! listener. Used to name stuck watchers when shutdown exceeds its grace period.
//!
//! ## Architecture
//! ```text
//! Watcher ──► Bus ──► subscriber_listener() ──► AliveTracker::update()
//!                                                      │
//!                                                      ▼
//!                                          HashMap<String, running count>
//! ```
//!
//! ## Rules
//! - Only `WatcherStarting` / `WatcherStopped` / `WatcherDead` change state
//! - Several watchers may share a name (one factory built twice), hence a count
//! - Read operations (`snapshot`, `is_alive`) are **eventually consistent**

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Thread-safe tracker of running watchers.
#[derive(Default)]
pub struct AliveTracker {
    running: RwLock<HashMap<String, usize>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a watcher lifecycle event; returns `true` if state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(name) = ev.watcher.as_deref() else {
            return false;
        };

        match ev.kind {
            EventKind::WatcherStarting => {
                let mut running = self.running.write().await;
                *running.entry(name.to_string()).or_insert(0) += 1;
                true
            }
            EventKind::WatcherStopped | EventKind::WatcherDead => {
                let mut running = self.running.write().await;
                match running.get_mut(name) {
                    Some(n) if *n > 1 => {
                        *n -= 1;
                        true
                    }
                    Some(_) => {
                        running.remove(name);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Returns sorted list of currently running watcher names.
    pub async fn snapshot(&self) -> Vec<String> {
        let running = self.running.read().await;
        let mut alive: Vec<String> = running.keys().cloned().collect();
        alive.sort_unstable();
        alive
    }

    /// Returns true if at least one watcher with this name is running.
    pub async fn is_alive(&self, name: &str) -> bool {
        self.running.read().await.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, name: &str) -> Event {
        Event::new(kind).with_watcher(name)
    }

    #[tokio::test]
    async fn counts_instances_sharing_a_name() {
        let t = AliveTracker::new();
        assert!(t.update(&ev(EventKind::WatcherStarting, "cart::add")).await);
        assert!(t.update(&ev(EventKind::WatcherStarting, "cart::add")).await);
        assert!(t.update(&ev(EventKind::WatcherStopped, "cart::add")).await);
        assert!(t.is_alive("cart::add").await);

        assert!(t.update(&ev(EventKind::WatcherDead, "cart::add")).await);
        assert!(!t.is_alive("cart::add").await);
        assert!(!t.update(&ev(EventKind::WatcherStopped, "cart::add")).await);
    }

    #[tokio::test]
    async fn ignores_other_events() {
        let t = AliveTracker::new();
        assert!(!t.update(&ev(EventKind::InvocationStarting, "x")).await);
        assert!(!t.update(&Event::new(EventKind::WatcherStarting)).await);
        assert!(t.snapshot().await.is_empty());
    }
}
