use super::context::JobContext;
use super::job::{run_job, MaintenanceJob};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// In-process job runner.
///
/// Sleeps until the next cron tick across the registered jobs, then spawns
/// every due job on its own task. Runs may overlap with the next tick; there
/// is no per-job serialization.
pub struct JobRunner {
    jobs: Vec<Arc<dyn MaintenanceJob>>,
    shutdown_token: CancellationToken,
}

impl JobRunner {
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self {
            jobs: Vec::new(),
            shutdown_token,
        }
    }

    /// Register a job with the runner.
    pub fn register_job(&mut self, job: Arc<dyn MaintenanceJob>) {
        info!("Registering job: {} - {}", job.name(), job.description());
        self.jobs.push(job);
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Main runner loop, exits on shutdown.
    pub async fn run(self) {
        info!("Starting job runner with {} registered jobs", self.jobs.len());

        loop {
            let now = Utc::now();
            let upcoming: Vec<Option<DateTime<Utc>>> = self
                .jobs
                .iter()
                .map(|job| job.schedule().after(&now).next())
                .collect();

            let Some(due) = upcoming.iter().flatten().min().copied() else {
                info!("No job has an upcoming run, runner idle until shutdown");
                self.shutdown_token.cancelled().await;
                break;
            };

            let sleep_duration = (due - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            debug!("Runner sleeping for {:?} until next job", sleep_duration);

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    for (job, next) in self.jobs.iter().zip(&upcoming) {
                        if *next == Some(due) {
                            self.spawn_job(Arc::clone(job));
                        }
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Job runner received shutdown signal");
                    break;
                }
            }
        }

        info!("Job runner stopped");
    }

    fn spawn_job(&self, job: Arc<dyn MaintenanceJob>) {
        let ctx = JobContext::new(self.shutdown_token.child_token());
        tokio::spawn(async move {
            let name = job.name();
            info!("Starting job: {}", name);
            let start_time = Instant::now();
            match run_job(job, &ctx).await {
                Ok(()) => {
                    info!("Job {} completed successfully in {:?}", name, start_time.elapsed());
                }
                Err(e) => {
                    error!("Job {} failed after {:?}: {}", name, start_time.elapsed(), e);
                }
            }
        });
    }
}
