use tracing::{error, info, warn};

/// Fire-and-forget notification sink.
///
/// The desktop rendering layer is an external collaborator; this core only
/// produces title/message events. Cadence-check failures intentionally
/// produce no notification at all, while every LLM failure produces
/// exactly one.
pub trait NotificationSink: Send + Sync {
    fn info(&self, title: &str, message: &str);
    fn warn(&self, title: &str, message: &str);
    fn error(&self, title: &str, message: &str);
}

/// Sink that renders notifications as tracing events
pub struct LogSink;

impl NotificationSink for LogSink {
    fn info(&self, title: &str, message: &str) {
        info!(title, "{message}");
    }

    fn warn(&self, title: &str, message: &str) {
        warn!(title, "{message}");
    }

    fn error(&self, title: &str, message: &str) {
        error!(title, "{message}");
    }
}
