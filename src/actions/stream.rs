//! # Action stream.
//!
//! [`ActionStream`] is the only resource shared between watchers: a broadcast
//! channel that delivers every dispatched [`Action`] to every watcher, in
//! dispatch order. Each watcher filters by its own action type.
//!
//! ```text
//! dispatch(a1, a2, a3) ──► ActionStream ──┬──► watcher "cart/add"    (keeps a1, a3)
//!                         (broadcast)     ├──► watcher "cart/remove" (keeps a2)
//!                                         └──► watcher "search"      (keeps nothing)
//! ```
//!
//! A receiver only observes actions sent after it subscribed; watchers therefore
//! subscribe when they are constructed, not when they are first polled.

use tokio::sync::broadcast;

use super::action::Action;

/// Broadcast channel carrying dispatched actions.
#[derive(Clone, Debug)]
pub struct ActionStream {
    tx: broadcast::Sender<Action>,
}

impl ActionStream {
    /// Creates a stream with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Action>(capacity.max(1));
        Self { tx }
    }

    /// Dispatches an action to all current receivers.
    ///
    /// Returns how many receivers got the action (0 when nobody is watching).
    pub fn dispatch(&self, action: Action) -> usize {
        self.tx.send(action).unwrap_or(0)
    }

    /// Creates an independent receiver for subsequent actions.
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.tx.subscribe()
    }

    /// Number of live receivers (one per running or pending watcher).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_dispatch_order() {
        let stream = ActionStream::new(8);
        let mut rx = stream.subscribe();

        assert_eq!(stream.dispatch(Action::new("a")), 1);
        stream.dispatch(Action::new("b"));

        assert_eq!(rx.recv().await.unwrap().action_type(), "a");
        assert_eq!(rx.recv().await.unwrap().action_type(), "b");
    }

    #[test]
    fn dispatch_without_watchers_returns_zero() {
        let stream = ActionStream::new(8);
        assert_eq!(stream.dispatch(Action::new("a")), 0);
        assert_eq!(stream.receiver_count(), 0);
    }
}
