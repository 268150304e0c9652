//! Dead man switch check job.

use crate::background_jobs::{JobError, MaintenanceJob};
use crate::feed_store::FeedStore;
use crate::notifier::Notify;
use async_trait::async_trait;
use chrono::Utc;
use cron::Schedule;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// How old the newest pulse may be before the feed counts as stale.
const MAX_PULSE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const ALERT_TITLE: &str = "Dead Man Check Failed";

/// Verifies the `deadman` feed received a pulse within the last 24 hours and
/// escalates through the push notifier when it has not.
pub struct DeadManCheckJob {
    store: Arc<dyn FeedStore>,
    notifier: Arc<dyn Notify>,
    schedule: Schedule,
}

impl DeadManCheckJob {
    pub fn new(store: Arc<dyn FeedStore>, notifier: Arc<dyn Notify>, schedule: Schedule) -> Self {
        Self {
            store,
            notifier,
            schedule,
        }
    }

    fn find_failure(&self) -> Option<String> {
        match self.store.latest_item("deadman") {
            Err(e) => Some(format!("failed to query deadman feed: {}", e)),
            Ok(None) => Some("deadman feed is empty".to_string()),
            Ok(Some(item)) => {
                // Absolute difference: a pulse from the future is just as
                // wrong as a missing one
                let age = Utc::now().signed_duration_since(item.created_at).abs();
                if age.num_seconds() as u64 > MAX_PULSE_AGE.as_secs() {
                    Some(format!(
                        "deadman feed is stale: newest pulse is {} old",
                        humantime::format_duration(Duration::from_secs(age.num_seconds() as u64))
                    ))
                } else {
                    None
                }
            }
        }
    }
}

#[async_trait]
impl MaintenanceJob for DeadManCheckJob {
    fn name(&self) -> &'static str {
        "deadman-check"
    }

    fn description(&self) -> &'static str {
        "Verifies the deadman feed received a pulse within 24 hours"
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    async fn execute(&self) -> Result<(), JobError> {
        let Some(cause) = self.find_failure() else {
            return Ok(());
        };

        warn!("Dead man check failed: {}", cause);
        match self.notifier.notify(ALERT_TITLE, &cause).await {
            Ok(()) => Err(JobError::ExecutionFailed(cause)),
            Err(send_err) => Err(JobError::ExecutionFailed(format!(
                "failed to send push notification: {} (original failure: {})",
                send_err, cause
            ))),
        }
    }
}
