mod file_config;

pub use file_config::{FileConfig, FreshnessFileRule, PushoverFileConfig};

use crate::background_jobs::jobs::FreshnessRule;
use crate::background_jobs::DEFAULT_SCHEDULE;
use crate::server::{valid_feed_name, RequestsLoggingLevel};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use cron::Schedule;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

const JOB_NAMES: &[&str] = &[
    "deadman-pulse",
    "deadman-check",
    "retention-sweep",
    "retention-audit",
    "freshness-audit",
];

lazy_static! {
    static ref DEFAULT_JOB_SCHEDULE: Schedule = Schedule::from_str(DEFAULT_SCHEDULE).unwrap();
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub endpoint_base: Option<String>,
    pub logging_level: RequestsLoggingLevel,
    pub alerts_feed: Option<String>,
}

/// Pushover credentials, present only when both halves are configured.
#[derive(Debug, Clone)]
pub struct PushoverSettings {
    pub token: String,
    pub user_key: String,
}

/// Per-job cron schedule overrides, validated at resolution.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOverrides {
    overrides: HashMap<String, Schedule>,
}

impl ScheduleOverrides {
    pub fn for_job(&self, name: &str) -> Schedule {
        self.overrides
            .get(name)
            .cloned()
            .unwrap_or_else(|| DEFAULT_JOB_SCHEDULE.clone())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub endpoint_base: String,
    pub logging_level: RequestsLoggingLevel,
    pub alerts_feed: String,
    pub pushover: Option<PushoverSettings>,
    pub schedules: ScheduleOverrides,
    pub freshness_rules: Vec<FreshnessRule>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present. Everything a job run
    /// depends on is validated here, so a malformed schedule or freshness
    /// rule fails startup instead of a run at 3am.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        let port = file.port.unwrap_or(cli.port);

        let endpoint_base = file
            .endpoint_base
            .or_else(|| cli.endpoint_base.clone())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", port))
            .trim_end_matches('/')
            .to_string();

        let logging_level = file
            .requests_logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let alerts_feed = file
            .alerts_feed
            .or_else(|| cli.alerts_feed.clone())
            .unwrap_or_else(|| "alerts".to_string());
        if !valid_feed_name(&alerts_feed) {
            bail!("Invalid alerts feed name: {}", alerts_feed);
        }

        let pushover = match file.pushover {
            None => None,
            Some(po) => match (po.token, po.user_key) {
                (Some(token), Some(user_key)) => Some(PushoverSettings { token, user_key }),
                (None, None) => None,
                _ => bail!("Pushover config requires both token and user_key"),
            },
        };

        let mut overrides = HashMap::new();
        for (job_name, expression) in file.schedules.unwrap_or_default() {
            if !JOB_NAMES.contains(&job_name.as_str()) {
                bail!("Unknown job in [schedules]: {}", job_name);
            }
            let schedule = Schedule::from_str(&expression).with_context(|| {
                format!("Invalid cron expression for job {}: {}", job_name, expression)
            })?;
            overrides.insert(job_name, schedule);
        }
        let schedules = ScheduleOverrides { overrides };

        let mut freshness_rules = Vec::new();
        for rule in file.freshness.unwrap_or_default() {
            if !valid_feed_name(&rule.feed) {
                bail!("Invalid feed name in freshness rule: {}", rule.feed);
            }
            let max_age = humantime::parse_duration(&rule.max_age).with_context(|| {
                format!("Invalid max_age for feed {}: {}", rule.feed, rule.max_age)
            })?;
            freshness_rules.push(FreshnessRule {
                feed: rule.feed,
                max_age,
            });
        }

        Ok(Self {
            db_path,
            port,
            endpoint_base,
            logging_level,
            alerts_feed,
            pushover,
            schedules,
            freshness_rules,
        })
    }

    /// Ingestion endpoint the pulse job posts its heartbeat to.
    pub fn pulse_endpoint(&self) -> String {
        format!("{}/feeds/deadman/items", self.endpoint_base)
    }

    /// Ingestion endpoint the feed-alert notifier posts into.
    pub fn alerts_endpoint(&self) -> String {
        format!("{}/feeds/{}/items", self.endpoint_base, self.alerts_feed)
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_cli() -> CliConfig {
        CliConfig {
            db_path: Some(PathBuf::from("/data/feeds.db")),
            port: 8080,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_cli_only_defaults() {
        let config = AppConfig::resolve(&base_cli(), None).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/feeds.db"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.endpoint_base, "http://127.0.0.1:8080");
        assert_eq!(config.alerts_feed, "alerts");
        assert!(config.pushover.is_none());
        assert!(config.freshness_rules.is_empty());
        assert_eq!(config.pulse_endpoint(), "http://127.0.0.1:8080/feeds/deadman/items");
        assert_eq!(
            config.alerts_endpoint(),
            "http://127.0.0.1:8080/feeds/alerts/items"
        );
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let file: FileConfig = toml::from_str(
            r#"
            port = 9000
            endpoint_base = "https://feeds.example.com/"
            alerts_feed = "ops"
            requests_logging_level = "headers"

            [pushover]
            token = "tok"
            user_key = "usr"

            [schedules]
            deadman-pulse = "0 */5 * * * *"

            [[freshness]]
            feed = "news"
            max_age = "2h"
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(&base_cli(), Some(file)).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.endpoint_base, "https://feeds.example.com");
        assert_eq!(config.alerts_feed, "ops");
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.pushover.as_ref().unwrap().token, "tok");
        assert_eq!(
            config.freshness_rules,
            vec![FreshnessRule {
                feed: "news".to_string(),
                max_age: Duration::from_secs(2 * 60 * 60),
            }]
        );
        assert_eq!(
            config.alerts_endpoint(),
            "https://feeds.example.com/feeds/ops/items"
        );

        // Override applies only to the named job
        let upcoming = config.schedules.for_job("deadman-pulse");
        assert_eq!(upcoming.to_string(), "0 */5 * * * *");
        let default = config.schedules.for_job("retention-sweep");
        assert_eq!(default.to_string(), DEFAULT_SCHEDULE);
    }

    #[test]
    fn test_resolve_missing_db_path_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_path must be specified"));
    }

    #[test]
    fn test_resolve_invalid_cron_fails_startup() {
        let file: FileConfig = toml::from_str(
            r#"
            [schedules]
            deadman-pulse = "not a cron line"
            "#,
        )
        .unwrap();

        let result = AppConfig::resolve(&base_cli(), Some(file));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid cron expression"));
    }

    #[test]
    fn test_resolve_unknown_job_in_schedules_fails() {
        let file: FileConfig = toml::from_str(
            r#"
            [schedules]
            mystery-job = "0 0 0 * * *"
            "#,
        )
        .unwrap();

        let result = AppConfig::resolve(&base_cli(), Some(file));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown job"));
    }

    #[test]
    fn test_resolve_invalid_max_age_fails_startup() {
        let file: FileConfig = toml::from_str(
            r#"
            [[freshness]]
            feed = "news"
            max_age = "soonish"
            "#,
        )
        .unwrap();

        let result = AppConfig::resolve(&base_cli(), Some(file));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid max_age"));
    }

    #[test]
    fn test_resolve_partial_pushover_fails() {
        let file: FileConfig = toml::from_str(
            r#"
            [pushover]
            token = "tok"
            "#,
        )
        .unwrap();

        let result = AppConfig::resolve(&base_cli(), Some(file));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("both token and user_key"));
    }
}
