use crate::buffer::LogBuffer;
use crate::record::{Level, Payload};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that feeds `tracing` events into a
/// shared [`LogBuffer`].
///
/// The event target becomes the record category, the event level maps
/// onto [`Level`], and the message plus any extra fields become the
/// payload. Events below `max_level` are ignored. Appending is
/// synchronous; when the buffer's flush threshold is crossed the
/// dispatch cost is paid by the thread that emitted the event.
pub struct BufferLayer {
    buffer: Arc<LogBuffer>,
    max_level: tracing::Level,
}

impl BufferLayer {
    /// Capture events at `max_level` severity and above.
    pub fn new(buffer: Arc<LogBuffer>, max_level: tracing::Level) -> Self {
        Self { buffer, max_level }
    }

    /// Capture only `error!` events, the usual production setting.
    pub fn errors_only(buffer: Arc<LogBuffer>) -> Self {
        Self::new(buffer, tracing::Level::ERROR)
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warning,
        tracing::Level::INFO => Level::Info,
        _ => Level::Trace,
    }
}

impl<S> Layer<S> for BufferLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        if *event.metadata().level() > self.max_level {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let meta = event.metadata();
        let payload = if fields.is_empty() {
            Payload::Text(message.unwrap_or_default())
        } else {
            if let Some(message) = message {
                fields.insert("message".to_string(), serde_json::Value::String(message));
            }
            Payload::Data(serde_json::Value::Object(fields.into_iter().collect()))
        };

        self.buffer
            .log(payload, map_level(meta.level()), meta.target());
    }
}

struct FieldVisitor<'a> {
    fields: &'a mut BTreeMap<String, serde_json::Value>,
    message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(format!("{:?}", value)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferConfig;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn quiet_buffer() -> Arc<LogBuffer> {
        Arc::new(LogBuffer::new(BufferConfig::manual().with_trace_level(0)))
    }

    #[test]
    fn error_event_lands_in_buffer() {
        let buffer = quiet_buffer();
        let subscriber = Registry::default().with(BufferLayer::errors_only(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "app.db", "query failed");
            tracing::info!(target: "app.db", "below threshold");
        });

        let records = buffer.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Error);
        assert_eq!(records[0].category, "app.db");
        assert_eq!(records[0].payload, Payload::Text("query failed".into()));
    }

    #[test]
    fn extra_fields_become_structured_payload() {
        let buffer = quiet_buffer();
        let subscriber =
            Registry::default().with(BufferLayer::new(buffer.clone(), tracing::Level::INFO));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app.cache", hits = 3u64, "eviction");
        });

        let records = buffer.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Warning);
        match &records[0].payload {
            Payload::Data(value) => {
                assert_eq!(value["hits"], serde_json::json!(3));
                assert_eq!(value["message"], serde_json::json!("eviction"));
            }
            other => panic!("expected structured payload, got {:?}", other),
        }
    }
}
