use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use price_watcher::config::{AppConfig, ConfigOverrides};
use price_watcher::extractor::{Locators, ProductExtractor};
use price_watcher::monitor::PriceMonitor;
use price_watcher::plugins::NotifierManager;
use price_watcher::scraper::WebScraper;
use price_watcher::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "price-watcher")]
#[command(version)]
#[command(about = "Watches a product page and alerts when the price drops to a target", long_about = None)]
struct Cli {
    /// Extra configuration file (TOML/YAML/JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Product page to monitor
    #[arg(long)]
    url: Option<String>,

    /// Alert when the price is at or below this value
    #[arg(long)]
    target_price: Option<Decimal>,

    /// Minutes between successful checks
    #[arg(long)]
    interval_minutes: Option<u64>,

    /// Minutes to wait after a failed check
    #[arg(long)]
    retry_minutes: Option<u64>,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,

    /// Start even if the notifier connection test fails
    #[arg(long)]
    skip_notifier_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        target_url: cli.url,
        target_price: cli.target_price,
        check_interval_minutes: cli.interval_minutes,
        retry_interval_minutes: cli.retry_minutes,
    };
    let config = AppConfig::load(cli.config.as_deref(), &overrides).context("Invalid configuration")?;

    let _log_guard = init_tracing(&config.logging)?;

    info!("Starting Price Watcher...");

    if config.metrics.enabled {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.metrics.port))
            .install()
            .context("Failed to start metrics exporter")?;
        info!("Metrics exporter listening on port {}", config.metrics.port);
    }

    let fetcher = Arc::new(WebScraper::new(&config.scraper)?);
    let extractor = ProductExtractor::with_locators(&Locators::default(), config.monitor.require_title)?;
    let notifiers = NotifierManager::from_config(&config.notifications).await?;
    info!("Notifiers: {}", notifiers.list_notifier_types().await.join(", "));

    if cli.skip_notifier_check {
        info!("Skipping notifier connection test");
    } else {
        notifiers
            .test_connections()
            .await
            .context("Notifier connection test failed, refusing to start (use --skip-notifier-check to override)")?;
    }

    let monitor = PriceMonitor::new(
        config.monitor_config(),
        config.scraper.headers(),
        fetcher,
        extractor,
        notifiers.clone(),
        config.notifications.currency_symbol.clone(),
    );

    if cli.once {
        let outcome = monitor.run_once().await?;
        info!("Check finished: {:?}", outcome);
    } else {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down...");
                let _ = shutdown_tx.send(true);
            }
        });

        monitor.run(shutdown_rx).await;
    }

    notifiers.shutdown().await?;
    Ok(())
}
