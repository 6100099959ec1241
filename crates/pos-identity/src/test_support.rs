//! In-memory tracing layer for asserting on log output in tests.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

#[derive(Debug, Clone)]
pub(crate) struct CapturedEvent {
    pub level: Level,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route this thread's events into the capture until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(Registry::default().with(self.clone()))
    }

    /// Number of events at `level` whose message or fields contain `needle`.
    pub fn count(&self, level: Level, needle: &str) -> usize {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.level == level && e.text.contains(needle))
                    .count()
            })
            .unwrap_or(0)
    }
}

struct TextVisitor(String);

impl Visit for TextVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        } else {
            self.0.push_str(&format!(" {}={}", field.name(), value));
        }
        self.0.push(' ');
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
        self.0.push(' ');
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = TextVisitor(String::new());
        event.record(&mut visitor);
        if let Ok(mut events) = self.events.lock() {
            events.push(CapturedEvent {
                level: *event.metadata().level(),
                text: visitor.0,
            });
        }
    }
}
