//! Buy Bot - Telegram server
//!
//! Posts market cap and buy alerts for a tracked token contract to a
//! Telegram group.

mod config;

use buybot_alerts::{start_scheduler, CommandRouter, ConfigStore, Notifier, TelegramBot};
use buybot_core::Trigger;
use buybot_market::{HttpMarketClient, MarketClientConfig, MarketDataClient};
use clap::Parser;
use config::{AppConfig, CliOverrides, RunMode};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Buy Bot CLI
#[derive(Parser, Debug)]
#[command(name = "buybot")]
#[command(about = "Telegram market cap and buy alert bot", long_about = None)]
struct Args {
    /// Bot config file path (overrides CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Update interval in seconds (overrides UPDATE_INTERVAL_SECS)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level or filter directive: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_logging(level: &str, mode: RunMode) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match mode {
        RunMode::Development => tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_line_number(true)
                .finish(),
        ),
        RunMode::Production => tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .compact()
                .finish(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = match AppConfig::from_env(CliOverrides {
        config_path: args.config,
        interval_secs: args.interval,
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = args
        .log_level
        .unwrap_or_else(|| config.mode.default_log_level().to_string());
    init_logging(&level, config.mode);

    info!("🚀 Buy Bot starting...");
    info!("  Mode: {:?}", config.mode);
    info!("  Config file: {}", config.config_path.display());
    info!("  Update interval: {}s", config.update_interval.as_secs());
    info!("  Market API: {}", config.market_api_url);

    let store = ConfigStore::load(config.config_path.clone()).await;

    let market: Arc<dyn MarketDataClient> = match HttpMarketClient::new(MarketClientConfig {
        base_url: config.market_api_url.clone(),
        api_key: config.market_api_key.clone(),
        transaction_limit: config.transaction_limit,
        ..Default::default()
    }) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create market client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let telegram = Arc::new(TelegramBot::new(&config.telegram_token));
    let notifier = Arc::new(Notifier::new(
        store.clone(),
        Arc::clone(&market),
        telegram.clone(),
    ));

    let mut triggers = vec![Trigger::Every(config.update_interval)];
    triggers.extend(
        store
            .snapshot()
            .await
            .schedules
            .into_iter()
            .map(Trigger::DailyAt),
    );
    let (scheduler, scheduler_task) = start_scheduler(triggers, Arc::clone(&notifier));

    let router = Arc::new(
        CommandRouter::new(store.clone(), market, telegram.clone(), notifier, scheduler)
            .with_onboarding_image(config.onboarding_image.clone()),
    );

    info!("Press Ctrl+C to stop...");

    tokio::select! {
        _ = telegram.run(router) => {
            warn!("Telegram dispatcher stopped");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            warn!("Shutdown signal received");
        }
    }

    scheduler_task.abort();
    store.save().await;

    info!("👋 Buy Bot stopped");
    ExitCode::SUCCESS
}
