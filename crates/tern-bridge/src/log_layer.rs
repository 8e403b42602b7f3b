use std::fmt::Debug;
use std::sync::mpsc::Sender;

use chrono::Utc;
use tracing::field::Field;
use tracing::field::Visit;
use tracing::Event;
use tracing::Level;
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::contracts::FeedUpdate;
use crate::contracts::LogRecord;

pub struct BusLogLayer {
    tx: Sender<FeedUpdate>,
    min_level: Level,
}

impl BusLogLayer {
    pub fn new(tx: Sender<FeedUpdate>) -> Self {
        Self {
            tx,
            min_level: Level::INFO,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl<S> Layer<S> for BusLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.min_level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Some(Utc::now()),
            level: metadata.level().as_str().to_string(),
            message: visitor.finish(),
            source: Some(metadata.target().to_string()),
        };
        let _ = self.tx.send(FeedUpdate::Log(record));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.join(" ")
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    fn capture(layer_level: Level, emit: impl FnOnce()) -> Vec<LogRecord> {
        let (tx, rx) = mpsc::channel();
        let subscriber = tracing_subscriber::registry()
            .with(BusLogLayer::new(tx).with_min_level(layer_level));
        tracing::subscriber::with_default(subscriber, emit);
        rx.try_iter()
            .filter_map(|update| match update {
                FeedUpdate::Log(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn forwards_info_and_above_only() {
        let records = capture(Level::INFO, || {
            tracing::debug!("too chatty");
            tracing::info!("agent connected");
            tracing::warn!(attempt = 2, "retrying");
        });

        let lines: Vec<(String, String)> = records
            .into_iter()
            .map(|record| (record.level, record.message))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("INFO".to_string(), "agent connected".to_string()),
                ("WARN".to_string(), "retrying attempt=2".to_string()),
            ]
        );
    }

    #[test]
    fn records_carry_target_and_timestamp() {
        let records = capture(Level::DEBUG, || {
            tracing::debug!(target: "tern::feed", "tick");
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source.as_deref(), Some("tern::feed"));
        assert!(records[0].timestamp.is_some());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let subscriber = tracing_subscriber::registry().with(BusLogLayer::new(tx));
        tracing::subscriber::with_default(subscriber, || tracing::error!("nobody listening"));
    }
}
