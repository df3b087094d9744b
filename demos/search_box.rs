//! # Example: search_box
//!
//! A search box backed by three handlers, one per policy flavour.
//!
//! Shows how to:
//! - Declare handlers with [`HandlerDescriptor`] and register them per owner
//! - Build a supervised task with [`Supervisor::create_supervisor`]
//! - Compose owners under one root with [`SupervisedTask::group`]
//! - Run roots with [`Supervisor::run`] and stop them with [`Supervisor::shutdown`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► register "search":  search/query  latest    (fetch results)
//!   │                       search/query  throttle  (suggestions, 200ms)
//!   ├─► register "history": search/submit leading   (save, slow)
//!   ├─► spawn Supervisor::run([group "app" { search, history }])
//!   │
//!   └─► typist task
//!         ├─► "r", "ru", "rus", "rust" every 60ms
//!         │     ├─► fetch: each keystroke preempts the previous fetch
//!         │     └─► suggest: at most one start per 200ms, rest dropped
//!         ├─► submit twice quickly
//!         │     └─► save: second submit dropped while the first is in flight
//!         └─► Supervisor.shutdown()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example search_box --features logging
//! ```

use std::{sync::Arc, time::Duration};
use takevisor::{
    Action, HandlerDescriptor, HandlerError, HandlerFn, HandlerRef, HandlerSet, LogWriter,
    Subscribe, SupervisedTask, Supervisor, SupervisorConfig,
};
use tokio_util::sync::CancellationToken;

/// Sleeps `work`, or gives up as soon as the invocation is cancelled.
async fn pretend_io(label: &str, work: Duration, ctx: &CancellationToken) -> Result<(), HandlerError> {
    tokio::select! {
        _ = tokio::time::sleep(work) => {
            println!("  >> {label} done");
            Ok(())
        }
        _ = ctx.cancelled() => Err(HandlerError::Canceled),
    }
}

fn query_of(action: &Action) -> String {
    action.payload::<String>().cloned().unwrap_or_default()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== search_box example ===\n");

    // 1. Configure runtime
    let cfg = SupervisorConfig {
        grace: Duration::from_secs(2),
        bus_capacity: 256,
        ..SupervisorConfig::default()
    };

    // 2. Create supervisor with the built-in log writer
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(cfg).with_subscribers(subs).build();

    // 3. Declare handlers
    let fetch: HandlerRef = HandlerFn::arc("fetch", |action: Action, ctx: CancellationToken| async move {
        let q = query_of(&action);
        pretend_io(&format!("fetch {q:?}"), Duration::from_millis(150), &ctx).await
    });
    let suggest: HandlerRef = HandlerFn::arc("suggest", |action: Action, ctx: CancellationToken| async move {
        let q = query_of(&action);
        pretend_io(&format!("suggest {q:?}"), Duration::from_millis(20), &ctx).await
    });
    let save: HandlerRef = HandlerFn::arc("save", |action: Action, ctx: CancellationToken| async move {
        let q = query_of(&action);
        if q.is_empty() {
            return Err(HandlerError::fail("nothing to save"));
        }
        pretend_io(&format!("save {q:?}"), Duration::from_millis(300), &ctx).await
    });

    sup.register(
        "search",
        HandlerSet::new()
            .with(HandlerDescriptor::latest("search/query", fetch))
            .with(HandlerDescriptor::throttle("search/query", Duration::from_millis(200), suggest)),
    )?;
    sup.register(
        "history",
        HandlerSet::new().with(HandlerDescriptor::leading("search/submit", save)),
    )?;

    // 4. Build the task tree
    let app = SupervisedTask::group(
        "app",
        [
            sup.create_supervisor("search")?(),
            sup.create_supervisor("history")?(),
        ],
    );
    println!("watchers: {:?}\n", app.watcher_names());

    // 5. Drive the runtime in the background
    let runner = {
        let sup = Arc::clone(&sup);
        tokio::spawn(async move { sup.run(vec![app]).await })
    };

    // 6. Type, submit, stop
    for q in ["r", "ru", "rus", "rust"] {
        sup.dispatch(Action::new("search/query").with_payload(q.to_string()));
        tokio::time::sleep(Duration::from_millis(60)).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    sup.dispatch(Action::new("search/submit").with_payload("rust".to_string()));
    sup.dispatch(Action::new("search/submit").with_payload("rust".to_string()));
    tokio::time::sleep(Duration::from_millis(400)).await;

    sup.shutdown();
    runner.await??;

    println!("\n=== done ===");
    Ok(())
}
