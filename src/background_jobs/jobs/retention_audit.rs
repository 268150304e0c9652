//! Feed retention audit job.

use crate::background_jobs::{JobError, MaintenanceJob};
use crate::feed_store::FeedStore;
use crate::notifier::Notify;
use async_trait::async_trait;
use cron::Schedule;
use std::sync::Arc;
use tracing::warn;

/// Item count above which a feed is reported; sits above the sweep cap so an
/// alert means the sweep has not been keeping up.
pub const AUDIT_THRESHOLD: usize = 75;

const ALERT_TITLE: &str = "Retention Check Failed";

/// Reports feeds whose item count exceeds the soft ceiling, all offenders in
/// one combined alert.
pub struct RetentionAuditJob {
    store: Arc<dyn FeedStore>,
    notifier: Arc<dyn Notify>,
    schedule: Schedule,
}

impl RetentionAuditJob {
    pub fn new(store: Arc<dyn FeedStore>, notifier: Arc<dyn Notify>, schedule: Schedule) -> Self {
        Self {
            store,
            notifier,
            schedule,
        }
    }
}

#[async_trait]
impl MaintenanceJob for RetentionAuditJob {
    fn name(&self) -> &'static str {
        "retention-audit"
    }

    fn description(&self) -> &'static str {
        "Reports feeds holding more items than the retention sweep should allow"
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    async fn execute(&self) -> Result<(), JobError> {
        let offenders = self
            .store
            .feeds_exceeding(AUDIT_THRESHOLD)
            .map_err(|e| JobError::ExecutionFailed(format!("retention audit failed: {}", e)))?;

        if offenders.is_empty() {
            return Ok(());
        }

        let listing: String = offenders
            .iter()
            .map(|fc| format!("<li>{} has {} items</li>", fc.feed, fc.count))
            .collect();
        let body = format!("<ul>{}</ul>", listing);

        warn!("Retention audit found {} oversized feeds", offenders.len());
        self.notifier
            .notify(ALERT_TITLE, &body)
            .await
            .map_err(|e| JobError::ExecutionFailed(format!("failed to send alert: {}", e)))?;
        Ok(())
    }
}
