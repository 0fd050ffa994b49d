use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;
use validator::Validate;

const ENV_PREFIX: &str = "PRICE_WATCHER";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";
const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub monitor: MonitorSettings,
    #[validate(nested)]
    pub scraper: ScraperConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorSettings {
    #[validate(url(message = "monitor.target_url must be an absolute URL"))]
    pub target_url: String,
    pub target_price: Decimal,
    #[validate(range(min = 1, message = "monitor.check_interval_secs must be greater than 0"))]
    pub check_interval_secs: u64,
    #[validate(range(min = 1, message = "monitor.retry_interval_secs must be greater than 0"))]
    pub retry_interval_secs: u64,
    pub politeness_min_ms: u64,
    pub politeness_max_ms: u64,
    pub require_title: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScraperConfig {
    #[validate(range(min = 1, message = "scraper.request_timeout must be greater than 0"))]
    pub request_timeout: u64,
    #[validate(length(min = 1, message = "scraper.user_agent must not be empty"))]
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub currency_symbol: String,
    pub smtp: SmtpConfig,
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub from_name: String,
    pub use_tls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Values supplied on the command line. They take precedence over every
/// file and environment source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub target_url: Option<String>,
    pub target_price: Option<Decimal>,
    pub check_interval_minutes: Option<u64>,
    pub retry_interval_minutes: Option<u64>,
}

/// Bounds of the randomized pause taken before every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    pub min: Duration,
    pub max: Duration,
}

impl PolitenessDelay {
    pub fn none() -> Self {
        Self { min: Duration::ZERO, max: Duration::ZERO }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self { min: delay, max: delay }
    }
}

/// Immutable settings for one monitoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub target_url: String,
    pub target_price: Decimal,
    pub check_interval: Duration,
    pub retry_interval: Duration,
    pub politeness: PolitenessDelay,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        matches!((&self.username, &self.password), (Some(u), Some(p)) if !u.is_empty() && !p.is_empty())
    }
}

impl DiscordConfig {
    pub fn is_configured(&self) -> bool {
        self.webhook_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

impl ScraperConfig {
    /// Request headers handed to the fetcher. The monitor treats them as opaque.
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), self.user_agent.clone());
        headers.insert("Accept".to_string(), self.accept.clone());
        headers.insert("Accept-Language".to_string(), self.accept_language.clone());
        headers.insert("Connection".to_string(), "keep-alive".to_string());
        headers.insert("Upgrade-Insecure-Requests".to_string(), "1".to_string());
        if let Some(referer) = &self.referer {
            headers.insert("Referer".to_string(), referer.clone());
        }
        headers
    }
}

impl AppConfig {
    pub fn load(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = legacy_env_defaults(builtin_defaults()?)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local config (ignored by git)
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("monitor.target_url", overrides.target_url.clone())?
            .set_override_option("monitor.target_price", overrides.target_price.map(|p| p.to_string()))?
            .set_override_option(
                "monitor.check_interval_secs",
                overrides.check_interval_minutes.map(|m| m.saturating_mul(60)),
            )?
            .set_override_option(
                "monitor.retry_interval_secs",
                overrides.retry_interval_minutes.map(|m| m.saturating_mul(60)),
            )?
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Validate::validate(self).map_err(|e| ConfigError::Message(e.to_string()))?;

        if Url::parse(&self.monitor.target_url).is_err() {
            return Err(ConfigError::Message("Invalid monitor.target_url format".into()));
        }

        if self.monitor.target_price <= Decimal::ZERO {
            return Err(ConfigError::Message("monitor.target_price must be greater than 0".into()));
        }

        if self.monitor.retry_interval_secs >= self.monitor.check_interval_secs {
            return Err(ConfigError::Message(
                "monitor.retry_interval_secs must be shorter than monitor.check_interval_secs".into(),
            ));
        }

        if self.monitor.politeness_min_ms > self.monitor.politeness_max_ms {
            return Err(ConfigError::Message(
                "monitor.politeness_min_ms cannot exceed monitor.politeness_max_ms".into(),
            ));
        }

        if self.notifications.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if let Some(webhook_url) = &self.notifications.discord.webhook_url {
            if !webhook_url.is_empty() && Url::parse(webhook_url).is_err() {
                return Err(ConfigError::Message("Invalid Discord webhook URL format".into()));
            }
        }

        if !self.notifications.smtp.is_configured() && !self.notifications.discord.is_configured() {
            return Err(ConfigError::Message(
                "No notifier configured: set SMTP username/password or a Discord webhook URL".into(),
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            target_url: self.monitor.target_url.clone(),
            target_price: self.monitor.target_price,
            check_interval: Duration::from_secs(self.monitor.check_interval_secs),
            retry_interval: Duration::from_secs(self.monitor.retry_interval_secs),
            politeness: PolitenessDelay {
                min: Duration::from_millis(self.monitor.politeness_min_ms),
                max: Duration::from_millis(self.monitor.politeness_max_ms),
            },
        }
    }
}

fn builtin_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("monitor.target_url", "")?
        .set_default("monitor.target_price", 0.0)?
        .set_default("monitor.check_interval_secs", 1800)?
        .set_default("monitor.retry_interval_secs", 300)?
        .set_default("monitor.politeness_min_ms", 1000)?
        .set_default("monitor.politeness_max_ms", 3000)?
        .set_default("monitor.require_title", false)?
        .set_default("scraper.request_timeout", 10)?
        .set_default("scraper.user_agent", DEFAULT_USER_AGENT)?
        .set_default("scraper.accept", DEFAULT_ACCEPT)?
        .set_default("scraper.accept_language", "en-US,en;q=0.9")?
        .set_default("notifications.currency_symbol", "₹")?
        .set_default("notifications.smtp.host", "smtp.gmail.com")?
        .set_default("notifications.smtp.port", 587)?
        .set_default("notifications.smtp.from_name", "Price Watcher")?
        .set_default("notifications.smtp.use_tls", true)?
        .set_default("notifications.discord.username", "Price Watcher")?
        .set_default("logging.level", "info")?
        .set_default("metrics.enabled", false)?
        .set_default("metrics.port", 9001)
}

/// `SMTP_ADDRESS`, `EMAIL_ADDRESS` and `EMAIL_PASSWORD` from older `.env`
/// files. They only seed defaults, so any prefixed setting still wins.
fn legacy_env_defaults(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Ok(host) = env::var("SMTP_ADDRESS") {
        builder = builder.set_default("notifications.smtp.host", host)?;
    }
    if let Ok(address) = env::var("EMAIL_ADDRESS") {
        builder = builder.set_default("notifications.smtp.username", address)?;
    }
    if let Ok(password) = env::var("EMAIL_PASSWORD") {
        builder = builder.set_default("notifications.smtp.password", password)?;
    }
    Ok(builder)
}
