use tracing::info;

/// Receives user-facing progress while a workflow runs.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, message: &str, percentage: u8);
    fn info(&self, message: &str);
}

/// Writes progress to the tracing subscriber.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn progress(&self, message: &str, percentage: u8) {
        info!(percentage, "{}", message);
    }

    fn info(&self, message: &str) {
        info!("{}", message);
    }
}
