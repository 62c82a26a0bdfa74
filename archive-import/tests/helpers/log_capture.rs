//! Log Capture Utilities for Testing
//!
//! Records tracing events so tests can assert on the import journal

use std::sync::{Arc, Mutex};

use archive_import::logger::JOURNAL_TARGET;
use tracing::dispatcher::DefaultGuard;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Captured log record
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Log capture layer for testing
#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the capture as this thread's default subscriber
    ///
    /// `#[tokio::test]` runs on a current-thread runtime, so every event of
    /// the test lands here until the guard is dropped.
    pub fn install(&self) -> DefaultGuard {
        tracing_subscriber::registry().with(self.clone()).set_default()
    }

    /// All captured records
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Journal lines only, in emission order
    pub fn journal(&self) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.target == JOURNAL_TARGET)
            .collect()
    }

    pub fn errors(&self) -> Vec<LogRecord> {
        self.journal()
            .into_iter()
            .filter(|r| r.level == Level::ERROR)
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }

    /// Count journal lines containing `pattern`
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.journal()
            .iter()
            .filter(|r| r.message.contains(pattern))
            .count()
    }
}

impl<S> tracing_subscriber::Layer<S> for LogCapture
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        use tracing::field::Visit;

        struct MessageVisitor {
            message: String,
        }

        impl Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{:?}", value);
                }
            }
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        self.records.lock().unwrap().push(LogRecord {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
        });
    }
}
