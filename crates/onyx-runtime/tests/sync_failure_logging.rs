#![forbid(unsafe_code)]

//! Remote failures are logged at `warn` under `onyx.sync` and never
//! disturb local state.
//!
//! The push failure is logged from the sync worker thread, so this binary
//! installs a global capture subscriber and holds a single test.
//!
//! Run:
//!   cargo test -p onyx-runtime --test sync_failure_logging

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use onyx_core::ManualClock;
use onyx_runtime::{DashboardSession, InMemoryRemote, LoadOutcome, OnyxConfig, SyncConfig};
use tracing_subscriber::layer::SubscriberExt;
use web_time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields,
        });
    }
}

fn warnings(events: &Arc<Mutex<Vec<CapturedEvent>>>) -> Vec<CapturedEvent> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.level == tracing::Level::WARN && e.target == "onyx.sync")
        .cloned()
        .collect()
}

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(5) {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn remote_failures_warn_and_keep_local_state() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: Arc::clone(&events),
    });
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let remote = Arc::new(InMemoryRemote::new());
    remote.set_fail_loads(true);
    remote.set_fail_pushes(true);
    let config = OnyxConfig {
        sync: SyncConfig {
            debounce_ms: 10,
            ..SyncConfig::default()
        }
        .with_profile("user-3"),
        ..OnyxConfig::default()
    };
    let mut session = DashboardSession::builder(config)
        .clock(Arc::new(ManualClock::new(0)))
        .remote(remote.clone())
        .build();

    // Load failure: logged on the calling thread, store keeps its seed.
    assert!(matches!(session.start(), LoadOutcome::Failed(_)));
    assert_eq!(session.store().layouts().len(), 1);
    let load_warnings = warnings(&events);
    assert_eq!(load_warnings.len(), 1);
    assert_eq!(load_warnings[0].message, "failed to load remote layouts");
    assert_eq!(load_warnings[0].fields.get("profile").map(String::as_str), Some("user-3"));

    // Push failure: logged on the worker, baseline untouched.
    session.set_edit_mode(true);
    let added = session.add_widget("MEAL_PLAN");
    assert!(added.is_some());
    assert!(wait_until(|| session.sync().status().pushes_failed == 1));
    assert!(wait_until(|| warnings(&events).len() == 2));

    let push_warning = &warnings(&events)[1];
    assert_eq!(push_warning.message, "layout push failed");
    assert!(push_warning.fields["err"].contains("injected"));
    assert_eq!(session.sync().status().last_synced_hash, None);
    assert!(session.store().active_layout().unwrap().contains_widget("MEAL_PLAN"));

    session.end();
}
