mod deadman_check;
#[cfg(test)]
pub(crate) mod test_support;
mod deadman_pulse;
mod freshness_audit;
mod retention_audit;
mod retention_sweep;

pub use deadman_check::DeadManCheckJob;
pub use deadman_pulse::DeadManPulseJob;
pub use freshness_audit::{FreshnessAuditJob, FreshnessRule};
pub use retention_audit::RetentionAuditJob;
pub use retention_sweep::RetentionSweepJob;
