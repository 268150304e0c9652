//! Feed retention sweep job.

use crate::background_jobs::{JobError, MaintenanceJob};
use crate::feed_store::FeedStore;
use async_trait::async_trait;
use cron::Schedule;
use std::sync::Arc;
use tracing::info;

/// How many items each feed may keep.
pub const RETENTION_CAP: usize = 50;

/// Deletes everything beyond the 50 newest items of each feed.
pub struct RetentionSweepJob {
    store: Arc<dyn FeedStore>,
    schedule: Schedule,
}

impl RetentionSweepJob {
    pub fn new(store: Arc<dyn FeedStore>, schedule: Schedule) -> Self {
        Self { store, schedule }
    }
}

#[async_trait]
impl MaintenanceJob for RetentionSweepJob {
    fn name(&self) -> &'static str {
        "retention-sweep"
    }

    fn description(&self) -> &'static str {
        "Trims every feed down to its 50 newest items"
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    async fn execute(&self) -> Result<(), JobError> {
        let deleted = self
            .store
            .sweep_retention(RETENTION_CAP)
            .map_err(|e| JobError::ExecutionFailed(format!("retention sweep failed: {}", e)))?;
        if deleted > 0 {
            info!("Retention sweep deleted {} items", deleted);
        }
        Ok(())
    }
}
