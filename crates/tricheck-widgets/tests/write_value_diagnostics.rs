#![forbid(unsafe_code)]

//! The external-selection entry point reports a warning instead of failing.

use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Registry as SubscriberRegistry;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tricheck_runtime::TaskQueue;
use tricheck_widgets::{CheckboxControl, Registry, RegistryConfig, TriState, WriteOutcome};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<(Level, String)>>>);

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for Captured {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        if let Ok(mut events) = self.0.lock() {
            events.push((*event.metadata().level(), message));
        }
    }
}

fn capture(f: impl FnOnce()) -> Vec<(Level, String)> {
    let captured = Captured::default();
    let subscriber = SubscriberRegistry::default().with(captured.clone());
    tracing::subscriber::with_default(subscriber, f);
    captured.0.lock().map(|e| e.to_vec()).unwrap_or_default()
}

fn warnings(events: &[(Level, String)]) -> Vec<&str> {
    events
        .iter()
        .filter(|(level, _)| *level == Level::WARN)
        .map(|(_, msg)| msg.as_str())
        .collect()
}

#[test]
fn non_empty_external_selection_warns_and_is_not_applied() {
    let registry = Registry::with_queue(RegistryConfig::default(), TaskQueue::new());
    let rows: Vec<_> = (0..3u32)
        .map(|id| CheckboxControl::attached(id, &registry))
        .collect();

    let mut outcome = WriteOutcome::Ignored;
    let events = capture(|| outcome = registry.write_value(&[0, 2]));

    assert_eq!(outcome, WriteOutcome::Unsupported { requested: 2 });
    let warns = warnings(&events);
    assert_eq!(warns.len(), 1);
    assert!(warns[0].contains("not supported"));
    assert!(rows.iter().all(|r| !r.is_checked()));
    assert_eq!(registry.current_state(), TriState::None);
}

#[test]
fn empty_external_selection_is_silent() {
    let registry: Registry<u32> = Registry::with_queue(RegistryConfig::default(), TaskQueue::new());
    let mut outcome = WriteOutcome::Unsupported { requested: 0 };
    let events = capture(|| outcome = registry.write_value(&[]));

    assert_eq!(outcome, WriteOutcome::Ignored);
    assert!(warnings(&events).is_empty());
}
