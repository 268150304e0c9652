//! Feed freshness audit job.

use crate::background_jobs::{JobError, MaintenanceJob};
use crate::feed_store::FeedStore;
use crate::notifier::Notify;
use async_trait::async_trait;
use chrono::Utc;
use cron::Schedule;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const ALERT_TITLE: &str = "Feed Stale Error";

/// A per-feed freshness requirement, parsed and validated at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessRule {
    pub feed: String,
    pub max_age: Duration,
}

/// Alerts when a configured feed has gone longer than its max age without a
/// new item. Feeds without a rule, or without any items yet, are never
/// checked.
pub struct FreshnessAuditJob {
    store: Arc<dyn FeedStore>,
    notifier: Arc<dyn Notify>,
    rules: Vec<FreshnessRule>,
    schedule: Schedule,
}

impl FreshnessAuditJob {
    pub fn new(
        store: Arc<dyn FeedStore>,
        notifier: Arc<dyn Notify>,
        rules: Vec<FreshnessRule>,
        schedule: Schedule,
    ) -> Self {
        Self {
            store,
            notifier,
            rules,
            schedule,
        }
    }
}

#[async_trait]
impl MaintenanceJob for FreshnessAuditJob {
    fn name(&self) -> &'static str {
        "freshness-audit"
    }

    fn description(&self) -> &'static str {
        "Alerts when configured feeds stop receiving items"
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    async fn execute(&self) -> Result<(), JobError> {
        let latests = self
            .store
            .newest_per_feed()
            .map_err(|e| JobError::ExecutionFailed(format!("freshness audit failed: {}", e)))?;

        let now = Utc::now();
        for rule in &self.rules {
            let Some(latest) = latests.iter().find(|l| l.feed == rule.feed) else {
                continue;
            };
            let age = now.signed_duration_since(latest.newest_created_at);
            if age.num_seconds() <= rule.max_age.as_secs() as i64 {
                continue;
            }

            let body = format!(
                "Feed {} has not been updated in over {}",
                rule.feed,
                humantime::format_duration(rule.max_age)
            );
            warn!("Freshness audit: {}", body);
            self.notifier
                .notify(ALERT_TITLE, &body)
                .await
                .map_err(|e| JobError::ExecutionFailed(format!("failed to send alert: {}", e)))?;
        }
        Ok(())
    }
}
