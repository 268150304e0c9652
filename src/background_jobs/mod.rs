mod context;
mod job;
pub mod jobs;
mod runner;

pub use context::JobContext;
pub use job::{run_job, JobError, MaintenanceJob, DEFAULT_SCHEDULE, JOB_TIMEOUT};
pub use runner::JobRunner;
