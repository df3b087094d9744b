//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [watcher-starting] watcher="cart::add" action="cart/add" strategy=every
//! [matched] watcher="cart::add" action="cart/add" seq=4
//! [invoke] watcher="cart::add" invocation=1
//! [failed] watcher="cart::add" invocation=1 err="execution failed: out of stock"
//! [preempted] watcher="search::fetch" invocation=3
//! [dropped] watcher="search::suggest" reason=throttle_window
//! [policy-fallback] watcher="cart::legacy" tag="debounce" → every
//! [shutdown-requested]
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let w = e.watcher.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::WatcherStarting => {
                println!(
                    "[watcher-starting] watcher={w:?} action={:?} strategy={reason}",
                    e.action.as_deref().unwrap_or("-")
                );
            }
            EventKind::WatcherStopped => println!("[watcher-stopped] watcher={w:?}"),
            EventKind::WatcherLagged => println!("[watcher-lagged] watcher={w:?} {reason}"),
            EventKind::WatcherDead => println!("[watcher-dead] watcher={w:?} info={reason:?}"),
            EventKind::ActionMatched => {
                println!(
                    "[matched] watcher={w:?} action={:?} {reason}",
                    e.action.as_deref().unwrap_or("-")
                );
            }
            EventKind::ActionDropped => println!("[dropped] watcher={w:?} reason={reason}"),
            EventKind::InvocationPreempted => {
                println!("[preempted] watcher={w:?} invocation={:?}", e.invocation);
            }
            EventKind::InvocationStarting => {
                println!("[invoke] watcher={w:?} invocation={:?}", e.invocation);
            }
            EventKind::InvocationCompleted => {
                println!("[completed] watcher={w:?} invocation={:?}", e.invocation);
            }
            EventKind::InvocationCanceled => {
                println!("[canceled] watcher={w:?} invocation={:?}", e.invocation);
            }
            EventKind::InvocationFailed => {
                println!(
                    "[failed] watcher={w:?} invocation={:?} err={reason:?}",
                    e.invocation
                );
            }
            EventKind::TimeoutHit => {
                println!(
                    "[timeout] watcher={w:?} invocation={:?} timeout_ms={:?}",
                    e.invocation, e.timeout_ms
                );
            }
            EventKind::PolicyFallback => {
                println!("[policy-fallback] watcher={w:?} tag={reason:?} → every");
            }
            EventKind::ParamCorrected => {
                println!(
                    "[param-corrected] watcher={w:?} given={reason} window_ms={:?}",
                    e.window_ms
                );
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={w} {reason}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={w} info={reason}");
            }
            EventKind::ShutdownRequested => println!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => println!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => println!("[grace-exceeded]"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
