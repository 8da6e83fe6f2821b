#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::process::ExitCode;

use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use logtail_agent::{
    config::Config,
    logger,
    tail::TailAgent,
    AGENT_VERSION,
};

const DEFAULT_CONFIG_PATH: &str = "logtail.yaml";
const RECORD_CHANNEL_CAPACITY: usize = 1000;

#[tokio::main]
pub async fn main() -> ExitCode {
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match Config::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("logtail: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Environment overrides the config file for log verbosity.
    let log_level = env::var("LOGTAIL_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or_else(|_| config.log_level.as_ref().to_lowercase());

    let env_filter =
        EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .event_format(logger::Formatter)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logtail: failed to install tracing subscriber");
        return ExitCode::FAILURE;
    }

    if config.sources.is_empty() {
        info!("no sources configured in {config_path}, nothing to tail");
    }

    let (tx, mut rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);
    let agent = match TailAgent::start(&config, tx) {
        Ok(agent) => agent,
        Err(e) => {
            error!("failed to start agent: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "logtail agent {AGENT_VERSION} started sources={}",
        config.sources.len()
    );

    // Completed records are serialized to stdout as JSON lines; everything
    // the agent logs itself goes to stderr via the subscriber above.
    let printer = tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("failed to serialize record: {e}"),
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }

    info!("shutting down, draining tailed streams");
    agent.shutdown().await;

    // All senders are gone once the workers exit, so the printer drains the
    // channel and finishes on its own.
    if let Err(e) = printer.await {
        error!("record printer failed to join: {e}");
    }

    ExitCode::SUCCESS
}
