//! Dead man switch pulse job.

use crate::background_jobs::{JobError, MaintenanceJob};
use anyhow::{Context, Result};
use async_trait::async_trait;
use cron::Schedule;
use serde::Serialize;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct PulseItem<'a> {
    title: &'a str,
    body: &'a str,
    url: &'a str,
}

/// Posts a heartbeat item into the `deadman` feed through the same ingestion
/// endpoint external senders use, proving the whole HTTP path works.
pub struct DeadManPulseJob {
    client: reqwest::Client,
    endpoint: String,
    schedule: Schedule,
}

impl DeadManPulseJob {
    pub fn new(endpoint: String, schedule: Schedule) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build pulse http client")?;
        Ok(Self {
            client,
            endpoint,
            schedule,
        })
    }
}

#[async_trait]
impl MaintenanceJob for DeadManPulseJob {
    fn name(&self) -> &'static str {
        "deadman-pulse"
    }

    fn description(&self) -> &'static str {
        "Posts a heartbeat item into the deadman feed"
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    async fn execute(&self) -> Result<(), JobError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&[PulseItem {
                title: "Dead Man Pulse",
                body: "",
                url: "",
            }])
            .send()
            .await
            .map_err(|e| JobError::ExecutionFailed(format!("failed to post pulse: {}", e)))?;

        if !response.status().is_success() {
            return Err(JobError::ExecutionFailed(format!(
                "pulse endpoint returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
