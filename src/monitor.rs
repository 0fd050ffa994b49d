use chrono::Utc;
use futures::FutureExt;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::extractor::ProductExtractor;
use crate::models::ExtractionResult;
use crate::plugins::{NotificationEvent, NotifierManager};
use crate::scraper::PageFetcher;
use crate::utils::error::{AppError, Result, panic_reason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Checking,
}

/// How a completed cycle ended. Cycle failures are reported as `Err` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    AlertSent,
    /// Price was at or below target but at least one notifier failed.
    AlertFailed,
    NoAlert,
    PriceMissing,
    TitleMissing,
    /// Shutdown was signalled before the cycle finished.
    Cancelled,
}

/// Session counters, reported once when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub cycles: u64,
    pub alerts_sent: u64,
    pub notification_failures: u64,
    pub cycle_failures: u64,
    pub price_missing: u64,
}

impl MonitorStats {
    fn record(&mut self, outcome: CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::AlertSent => self.alerts_sent += 1,
            CycleOutcome::AlertFailed => self.notification_failures += 1,
            CycleOutcome::PriceMissing => self.price_missing += 1,
            CycleOutcome::NoAlert | CycleOutcome::TitleMissing | CycleOutcome::Cancelled => {}
        }
    }
}

/// Drives fetch, extract, decide and notify cycles for one product.
pub struct PriceMonitor {
    config: MonitorConfig,
    headers: HashMap<String, String>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: ProductExtractor,
    notifiers: NotifierManager,
    currency_symbol: String,
    state: watch::Sender<MonitorState>,
}

impl PriceMonitor {
    pub fn new(
        config: MonitorConfig,
        headers: HashMap<String, String>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: ProductExtractor,
        notifiers: NotifierManager,
        currency_symbol: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(MonitorState::Idle);

        Self {
            config,
            headers,
            fetcher,
            extractor,
            notifiers,
            currency_symbol: currency_symbol.into(),
            state,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    /// Run cycles until `shutdown` turns `true`.
    ///
    /// A completed cycle is followed by `check_interval`, a failed or
    /// panicking one by `retry_interval`. Shutdown is observed at every
    /// suspension point and a cancelled cycle is abandoned without notifying.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> MonitorStats {
        tracing::info!(
            "Monitoring {} for price <= {}{} every {}s (retry after {}s)",
            self.config.target_url,
            self.currency_symbol,
            self.config.target_price,
            self.config.check_interval.as_secs(),
            self.config.retry_interval.as_secs()
        );

        let mut stats = MonitorStats::default();

        while !is_cancelled(&shutdown) {
            let span = tracing::info_span!("cycle", id = %Uuid::new_v4());
            let wait = match self.guarded_cycle(&mut shutdown).instrument(span).await {
                Ok(CycleOutcome::Cancelled) => break,
                Ok(outcome) => {
                    stats.record(outcome);
                    self.config.check_interval
                }
                Err(e) => {
                    stats.cycles += 1;
                    stats.cycle_failures += 1;
                    metrics::counter!("price_watcher_cycle_failures_total").increment(1);
                    tracing::warn!("Check failed: {}", e);
                    self.config.retry_interval
                }
            };

            if let Ok(wait) = chrono::Duration::from_std(wait) {
                tracing::info!("Next check at {}", (Utc::now() + wait).format("%Y-%m-%d %H:%M:%S UTC"));
            }

            if !sleep_or_cancel(wait, &mut shutdown).await {
                break;
            }
        }

        tracing::info!(
            "Monitoring stopped after {} cycles: {} alerts sent, {} notification failures, {} failed cycles, {} without price",
            stats.cycles,
            stats.alerts_sent,
            stats.notification_failures,
            stats.cycle_failures,
            stats.price_missing
        );

        stats
    }

    async fn guarded_cycle(&self, shutdown: &mut watch::Receiver<bool>) -> Result<CycleOutcome> {
        match AssertUnwindSafe(self.run_cycle(shutdown)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                self.set_state(MonitorState::Idle);
                Err(AppError::Internal(format!("cycle panicked: {}", panic_reason(payload.as_ref()))))
            }
        }
    }

    /// One cycle with no shutdown source.
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        let (_keep_open, mut shutdown) = watch::channel(false);
        self.run_cycle(&mut shutdown).await
    }

    /// One fetch, extract, decide and notify pass.
    ///
    /// `FetchFailed` maps to `AppError::Transport` and `ParseFailed` to
    /// `AppError::Parse`; every other extraction result is a completed cycle.
    pub async fn run_cycle(&self, shutdown: &mut watch::Receiver<bool>) -> Result<CycleOutcome> {
        self.set_state(MonitorState::Checking);
        metrics::counter!("price_watcher_cycles_total").increment(1);

        let outcome = self.check(shutdown).await;

        self.set_state(MonitorState::Idle);
        outcome
    }

    async fn check(&self, shutdown: &mut watch::Receiver<bool>) -> Result<CycleOutcome> {
        let delay = self.politeness_delay();
        tracing::debug!("Waiting {}ms before fetching", delay.as_millis());
        if !sleep_or_cancel(delay, shutdown).await {
            return Ok(CycleOutcome::Cancelled);
        }

        let fetched = self
            .extractor
            .fetch_and_extract(self.fetcher.as_ref(), &self.config.target_url, &self.headers);
        let result = tokio::select! {
            result = fetched => result,
            _ = cancelled(shutdown) => return Ok(CycleOutcome::Cancelled),
        };

        if result.snapshot().is_none() {
            tracing::info!("Extraction ended with {}", result.kind());
        }

        match result {
            ExtractionResult::Snapshot(snapshot) => {
                if snapshot.has_title() {
                    tracing::info!("Product: {}", snapshot.title);
                } else {
                    tracing::warn!("No title found on {}, continuing with price only", snapshot.source_url);
                }

                let Some(event) = NotificationEvent::new(snapshot, self.config.target_price, &self.currency_symbol)
                else {
                    tracing::warn!("Snapshot for {} carried no usable price", self.config.target_url);
                    return Ok(CycleOutcome::PriceMissing);
                };

                if let Some(price) = event.decision.current_price.to_f64() {
                    metrics::gauge!("price_watcher_last_price").set(price);
                }
                tracing::info!("Current price: {}", event.formatted_current());

                if !event.decision.should_alert {
                    tracing::info!(
                        "Price {} is still above target {}",
                        event.formatted_current(),
                        event.formatted_target()
                    );
                    return Ok(CycleOutcome::NoAlert);
                }

                tracing::info!("Price {} reached target, sending alert", event.formatted_current());
                let delivery = self.notifiers.send_notification(&event).await;
                if delivery.success {
                    metrics::counter!("price_watcher_alerts_total").increment(1);
                    Ok(CycleOutcome::AlertSent)
                } else {
                    tracing::error!(
                        "Alert delivery failed: {}",
                        delivery.error.as_deref().unwrap_or("unknown error")
                    );
                    Ok(CycleOutcome::AlertFailed)
                }
            }
            ExtractionResult::TitleMissing => {
                tracing::warn!("Could not find the product title on {}", self.config.target_url);
                Ok(CycleOutcome::TitleMissing)
            }
            ExtractionResult::PriceMissing { title } => {
                tracing::warn!("Could not extract a price for '{}' from {}", title, self.config.target_url);
                Ok(CycleOutcome::PriceMissing)
            }
            ExtractionResult::FetchFailed(reason) => Err(AppError::Transport(reason)),
            ExtractionResult::ParseFailed(reason) => Err(AppError::Parse(reason)),
        }
    }

    fn politeness_delay(&self) -> Duration {
        let min = self.config.politeness.min.as_millis() as u64;
        let max = self.config.politeness.max.as_millis() as u64;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    fn set_state(&self, state: MonitorState) {
        self.state.send_replace(state);
    }
}

fn is_cancelled(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Resolves once `shutdown` reads `true`. A dropped sender never cancels.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    if *shutdown.borrow_and_update() {
        return;
    }
    while shutdown.changed().await.is_ok() {
        if *shutdown.borrow_and_update() {
            return;
        }
    }
    std::future::pending::<()>().await
}

/// `false` when shutdown arrived before `duration` elapsed.
async fn sleep_or_cancel(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancelled(shutdown) => false,
    }
}
