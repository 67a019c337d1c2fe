//! Waiting for a submitted work item to reach a terminal state.
//!
//! Elapsed time is counted in poll intervals rather than measured, so a slow
//! status request does not eat into the budget.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use super::progress::ProgressSink;
use crate::domain::error::{AppError, Result};
use crate::domain::workitem::WorkItemStatus;
use crate::infrastructure::aps_clients::DesignAutomationClient;
use crate::infrastructure::config::PollingConfig;

pub const POLL_START_PERCENT: u8 = 35;
const POLL_SPAN_PERCENT: f64 = 55.0;
const POLL_CAP_PERCENT: u8 = 90;

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(600),
        }
    }
}

impl From<&PollingConfig> for PollSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_wait: config.max_wait(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub status: Option<WorkItemStatus>,
    pub report_url: Option<String>,
    pub elapsed: Duration,
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        self.status.as_ref().is_some_and(WorkItemStatus::is_success)
    }

    /// Anything but `success` becomes an error naming the last status seen.
    pub fn into_success(self, label: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(AppError::WorkItem {
            label: label.to_string(),
            status: self.status.map(|status| status.as_str().to_string()),
            report_url: self.report_url,
        })
    }
}

/// Progress shown while polling: 35 % at submission, capped at 90 %.
pub fn poll_percentage(elapsed: Duration, max_wait: Duration) -> u8 {
    if max_wait.is_zero() {
        return POLL_CAP_PERCENT;
    }
    let fraction = elapsed.as_secs_f64() / max_wait.as_secs_f64();
    let percentage = POLL_START_PERCENT as f64 + (fraction * POLL_SPAN_PERCENT).floor();
    percentage.min(POLL_CAP_PERCENT as f64) as u8
}

pub async fn poll_until_terminal(
    client: &dyn DesignAutomationClient,
    workitem_id: &str,
    settings: PollSettings,
    progress: &dyn ProgressSink,
) -> Result<PollOutcome> {
    let mut elapsed = Duration::ZERO;
    let mut status = None;
    let mut report_url = None;

    while elapsed <= settings.max_wait {
        let response = client.get_workitem_status(workitem_id).await?;
        report_url = response.report_url;
        let current = response.status;

        progress.progress(
            &format!(
                "Work item status: {} [{}s]...",
                current,
                elapsed.as_secs()
            ),
            poll_percentage(elapsed, settings.max_wait),
        );
        progress.info(&format!("[{:3}s] status = {}", elapsed.as_secs(), current));

        let terminal = current.is_terminal();
        status = Some(current);
        if terminal {
            break;
        }

        sleep(settings.interval).await;
        elapsed += settings.interval;
    }

    debug!(
        workitem_id = %workitem_id,
        status = ?status.as_ref().map(|s| s.as_str()),
        elapsed_secs = elapsed.as_secs(),
        "Stopped polling work item"
    );

    Ok(PollOutcome {
        status,
        report_url,
        elapsed,
    })
}
