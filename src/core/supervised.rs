//! # Supervised task: the composable root produced by a supervisor.
//!
//! A [`SupervisedTask`] is a tree: its children are watchers (one per handler
//! descriptor) and, optionally, other supervised tasks. Running it spawns every
//! child under a child [`CancellationToken`] and completes when all children
//! have completed, which for watchers only happens on cancellation.
//!
//! ```text
//! SupervisedTask "app"
//!   ├── SupervisedTask "cart"      (from create_supervisor("cart"))
//!   │     ├── Watcher cart::add      every
//!   │     └── Watcher cart::sync     latest
//!   └── SupervisedTask "search"
//!         └── Watcher search::fetch  throttle(350ms)
//! ```
//!
//! ## Rules
//! - Cancellation flows top-down only: root token → child tokens → invocation tokens.
//! - A watcher that panics is reported as `WatcherDead`; its siblings keep running.
//! - A task without children completes immediately.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::core::{runner::panic_message, watcher::Watcher};
use crate::events::{Event, EventKind};

enum Child {
    Watcher(Watcher),
    Task(SupervisedTask),
}

/// Cancelable unit of work running a set of watchers (and nested tasks).
pub struct SupervisedTask {
    name: Arc<str>,
    children: Vec<Child>,
}

impl SupervisedTask {
    pub(crate) fn from_watchers(name: Arc<str>, watchers: Vec<Watcher>) -> Self {
        Self {
            name,
            children: watchers.into_iter().map(Child::Watcher).collect(),
        }
    }

    /// Combines several tasks under one parent that runs them concurrently.
    pub fn group(name: impl Into<Arc<str>>, tasks: impl IntoIterator<Item = SupervisedTask>) -> Self {
        Self {
            name: name.into(),
            children: tasks.into_iter().map(Child::Task).collect(),
        }
    }

    /// Returns the task name (owner id for tasks built by a supervisor).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of watchers in this task and all nested tasks.
    pub fn watcher_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                Child::Watcher(_) => 1,
                Child::Task(t) => t.watcher_count(),
            })
            .sum()
    }

    /// Names of all watchers, depth-first in declaration order.
    pub fn watcher_names(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.watcher_count());
        self.collect_names(&mut out);
        out
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        for c in &self.children {
            match c {
                Child::Watcher(w) => out.push(w.name().to_string()),
                Child::Task(t) => t.collect_names(out),
            }
        }
    }

    /// Runs every child until `token` is cancelled and all children have stopped.
    pub fn run(self, token: CancellationToken) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let mut set = JoinSet::new();
            for child in self.children {
                let child_token = token.child_token();
                match child {
                    Child::Watcher(w) => {
                        set.spawn(guard_watcher(w, child_token));
                    }
                    Child::Task(t) => {
                        set.spawn(t.run(child_token));
                    }
                }
            }
            while set.join_next().await.is_some() {}
        })
    }

    /// Spawns the task on the current runtime under a child of `parent`.
    pub fn spawn(self, parent: &CancellationToken) -> SupervisedHandle {
        let token = parent.child_token();
        let join = tokio::spawn(self.run(token.clone()));
        SupervisedHandle { token, join }
    }
}

/// Runs a watcher, reporting a panic that escapes its loop as `WatcherDead`.
async fn guard_watcher(watcher: Watcher, token: CancellationToken) {
    let name = watcher.name().to_string();
    let bus = watcher.bus().clone();

    if let Err(payload) = AssertUnwindSafe(watcher.run(token)).catch_unwind().await {
        bus.publish(
            Event::new(EventKind::WatcherDead)
                .with_watcher(name)
                .with_reason(panic_message(payload.as_ref())),
        );
    }
}

/// Handle to a spawned [`SupervisedTask`].
pub struct SupervisedHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl SupervisedHandle {
    /// Requests cancellation of the task and everything below it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once every child has stopped.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the task to finish.
    pub async fn join(self) {
        let _ = self.join.await;
    }

    /// Cancels the task and waits until all watchers and invocations have settled.
    pub async fn shutdown(self) {
        self.cancel();
        self.join().await;
    }
}
