use anyhow::{Context, Result};
use clap::Parser;
use hookfeed_server::background_jobs::jobs::{
    DeadManCheckJob, DeadManPulseJob, FreshnessAuditJob, RetentionAuditJob, RetentionSweepJob,
};
use hookfeed_server::background_jobs::JobRunner;
use hookfeed_server::config::{AppConfig, CliConfig, FileConfig};
use hookfeed_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use hookfeed_server::{FeedAlertNotifier, FeedStore, Notify, PushoverNotifier, SqliteFeedStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hookfeed-server")]
#[command(about = "Ingests webhook payloads into feeds and republishes them as Atom documents")]
struct Cli {
    /// Path to the SQLite feeds database
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Base URL clients reach this server at
    #[arg(long)]
    endpoint_base: Option<String>,

    /// HTTP requests logging verbosity
    #[arg(long, value_enum, default_value_t = RequestsLoggingLevel::Path)]
    requests_logging_level: RequestsLoggingLevel,

    /// Feed that maintenance alerts are posted into
    #[arg(long)]
    alerts_feed: Option<String>,

    /// Path to a TOML config file; file values override CLI
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let file_config = match &cli.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli.db_path,
        port: cli.port,
        endpoint_base: cli.endpoint_base,
        logging_level: cli.requests_logging_level,
        alerts_feed: cli.alerts_feed,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let store: Arc<dyn FeedStore> =
        Arc::new(SqliteFeedStore::new(&config.db_path).context("Failed to open feed store")?);

    let shutdown_token = CancellationToken::new();
    let mut runner = JobRunner::new(shutdown_token.clone());

    let alert_notifier: Arc<dyn Notify> =
        Arc::new(FeedAlertNotifier::new(config.alerts_endpoint())?);

    runner.register_job(Arc::new(DeadManPulseJob::new(
        config.pulse_endpoint(),
        config.schedules.for_job("deadman-pulse"),
    )?));
    match &config.pushover {
        Some(po) => {
            let push_notifier: Arc<dyn Notify> =
                Arc::new(PushoverNotifier::new(po.token.clone(), po.user_key.clone())?);
            runner.register_job(Arc::new(DeadManCheckJob::new(
                Arc::clone(&store),
                push_notifier,
                config.schedules.for_job("deadman-check"),
            )));
        }
        None => warn!("Pushover is not configured, dead man check job disabled"),
    }
    runner.register_job(Arc::new(RetentionSweepJob::new(
        Arc::clone(&store),
        config.schedules.for_job("retention-sweep"),
    )));
    runner.register_job(Arc::new(RetentionAuditJob::new(
        Arc::clone(&store),
        Arc::clone(&alert_notifier),
        config.schedules.for_job("retention-audit"),
    )));
    runner.register_job(Arc::new(FreshnessAuditJob::new(
        Arc::clone(&store),
        alert_notifier,
        config.freshness_rules.clone(),
        config.schedules.for_job("freshness-audit"),
    )));

    let server_config = ServerConfig {
        port: config.port,
        endpoint_base: config.endpoint_base.clone(),
        requests_logging_level: config.logging_level.clone(),
    };

    tokio::select! {
        result = run_server(server_config, Arc::clone(&store)) => {
            result.context("Server exited")?;
        }
        _ = runner.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    shutdown_token.cancel();
    Ok(())
}
