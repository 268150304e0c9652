use super::context::JobContext;
use async_trait::async_trait;
use cron::Schedule;
use std::sync::Arc;
use std::time::Duration;

/// Every job gets the same execution budget; exceeding it is a failure.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(15);

/// Daily at midnight, used by every job unless overridden in config.
pub const DEFAULT_SCHEDULE: &str = "0 0 0 * * *";

/// Errors that can occur during job execution.
#[derive(Debug)]
pub enum JobError {
    ExecutionFailed(String),
    Cancelled,
    Timeout,
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            JobError::Cancelled => write!(f, "Job was cancelled"),
            JobError::Timeout => write!(f, "Job timed out"),
        }
    }
}

impl std::error::Error for JobError {}

/// Trait for scheduled maintenance jobs.
#[async_trait]
pub trait MaintenanceJob: Send + Sync {
    /// Unique identifier for this job, also the config override key.
    fn name(&self) -> &'static str;

    /// Description of what this job does.
    fn description(&self) -> &'static str;

    /// When this job should run.
    fn schedule(&self) -> &Schedule;

    /// Execution budget before the run is reported as timed out.
    fn timeout(&self) -> Duration {
        JOB_TIMEOUT
    }

    /// Execute the job.
    async fn execute(&self) -> Result<(), JobError>;
}

/// Run a job, racing its execution against cancellation and the timeout.
///
/// The work runs on its own task. When cancellation or the timeout wins the
/// race the worker task is abandoned rather than killed, so a late side
/// effect can still land; the reported outcome is the cancellation or
/// timeout regardless.
pub async fn run_job(job: Arc<dyn MaintenanceJob>, ctx: &JobContext) -> Result<(), JobError> {
    let timeout = job.timeout();
    let worker = tokio::spawn(async move { job.execute().await });

    tokio::select! {
        _ = ctx.cancellation_token.cancelled() => Err(JobError::Cancelled),
        _ = tokio::time::sleep(timeout) => Err(JobError::Timeout),
        joined = worker => match joined {
            Ok(result) => result,
            Err(e) => Err(JobError::ExecutionFailed(format!("worker task panicked: {}", e))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    struct TestJob {
        schedule: Schedule,
        delay: Duration,
        timeout: Duration,
        execution_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    impl TestJob {
        fn new(delay: Duration, timeout: Duration) -> Self {
            Self {
                schedule: Schedule::from_str(DEFAULT_SCHEDULE).unwrap(),
                delay,
                timeout,
                execution_count: Arc::new(AtomicUsize::new(0)),
                should_fail: false,
            }
        }
    }

    #[async_trait]
    impl MaintenanceJob for TestJob {
        fn name(&self) -> &'static str {
            "test-job"
        }

        fn description(&self) -> &'static str {
            "A test job for unit tests"
        }

        fn schedule(&self) -> &Schedule {
            &self.schedule
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        async fn execute(&self) -> Result<(), JobError> {
            tokio::time::sleep(self.delay).await;
            self.execution_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(JobError::ExecutionFailed("Test failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_run_job_success() {
        let job = TestJob::new(Duration::from_millis(10), Duration::from_secs(5));
        let count = Arc::clone(&job.execution_count);
        let ctx = JobContext::new(CancellationToken::new());

        run_job(Arc::new(job), &ctx).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_job_propagates_failure() {
        let mut job = TestJob::new(Duration::from_millis(10), Duration::from_secs(5));
        job.should_fail = true;
        let ctx = JobContext::new(CancellationToken::new());

        let result = run_job(Arc::new(job), &ctx).await;
        assert!(matches!(result, Err(JobError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_run_job_times_out() {
        let job = TestJob::new(Duration::from_secs(60), Duration::from_millis(50));
        let count = Arc::clone(&job.execution_count);
        let ctx = JobContext::new(CancellationToken::new());

        let result = run_job(Arc::new(job), &ctx).await;
        assert!(matches!(result, Err(JobError::Timeout)));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_job_cancelled() {
        let job = TestJob::new(Duration::from_secs(60), Duration::from_secs(60));
        let token = CancellationToken::new();
        let ctx = JobContext::new(token.clone());

        let handle = tokio::spawn(async move { run_job(Arc::new(job), &ctx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(JobError::Cancelled)));
    }

    #[tokio::test]
    async fn test_abandoned_worker_still_completes() {
        let job = TestJob::new(Duration::from_millis(100), Duration::from_millis(20));
        let count = Arc::clone(&job.execution_count);
        let ctx = JobContext::new(CancellationToken::new());

        let result = run_job(Arc::new(job), &ctx).await;
        assert!(matches!(result, Err(JobError::Timeout)));

        // The worker was abandoned, not killed; its side effect lands late
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
