//! Bridge from `tracing` events to the message bus.

use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::domain::{FieldValue, Level, LogEntry};
use crate::sender::async_handler::in_publish_scope;
use crate::sender::{AsyncPublishHandler, Rejected};

/// Targets never forwarded: this crate and the HTTP stack underneath the
/// publishers, whose connection tasks run outside the publish call.
const SKIPPED_TARGETS: &[&str] = &[
    env!("CARGO_CRATE_NAME"),
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "want",
];

fn is_skipped_target(target: &str) -> bool {
    SKIPPED_TARGETS.iter().any(|skipped| {
        target
            .strip_prefix(skipped)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Turns every tracing event into a [`LogEntry`] and enqueues it on an
/// [`AsyncPublishHandler`] without blocking.
///
/// The `message` field becomes the entry message and every other field is
/// carried as a string, along with the event's `target`. Events raised
/// while a worker is publishing are skipped, as are events from this crate
/// and from the HTTP stack, so publishing cannot feed back into the bus.
pub struct BusLayer {
    handler: Arc<AsyncPublishHandler>,
}

impl BusLayer {
    pub fn new(handler: Arc<AsyncPublishHandler>) -> Self {
        Self { handler }
    }

    pub fn to_entry(event: &Event<'_>) -> LogEntry {
        let metadata = event.metadata();
        let mut visitor = EntryVisitor {
            entry: LogEntry::new(Level::from(metadata.level()), ""),
        };
        event.record(&mut visitor);
        visitor.entry.with_field("target", metadata.target())
    }

    fn divert(&self, rejected: Rejected) {
        let fallback = self.handler.fallback().clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { AsyncPublishHandler::divert(&fallback, rejected).await });
            }
            Err(_) => {
                futures::executor::block_on(AsyncPublishHandler::divert(&fallback, rejected));
            }
        }
    }
}

impl<S: Subscriber> Layer<S> for BusLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if in_publish_scope() || is_skipped_target(event.metadata().target()) {
            return;
        }
        if let Err(rejected) = self.handler.try_enqueue(Self::to_entry(event)) {
            self.divert(rejected);
        }
    }
}

struct EntryVisitor {
    entry: LogEntry,
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.entry.message = value.to_string();
        } else {
            self.entry
                .fields
                .insert(field.name().to_string(), FieldValue::from(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{value:?}");
        if field.name() == "message" {
            self.entry.message = text;
        } else {
            self.entry
                .fields
                .insert(field.name().to_string(), FieldValue::Str(text));
        }
    }
}
