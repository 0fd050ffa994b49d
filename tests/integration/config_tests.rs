use super::*;
use price_watcher::config::{AppConfig, ConfigOverrides};
use std::io::Write;

fn write_config(contents: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

const CONFIG_WITH_WEBHOOK: &str = r#"
[monitor]
target_url = "https://www.amazon.in/dp/B0TESTLAPTOP"
target_price = 99999.50
check_interval_secs = 900
retry_interval_secs = 120
politeness_min_ms = 0
politeness_max_ms = 0

[notifications.discord]
webhook_url = "https://discord.com/api/webhooks/1/token"
"#;

#[test]
fn test_load_from_file() -> anyhow::Result<()> {
    let file = write_config(CONFIG_WITH_WEBHOOK)?;

    let config = AppConfig::load(Some(file.path()), &ConfigOverrides::default())?;
    let monitor = config.monitor_config();

    assert_eq!(monitor.target_url, "https://www.amazon.in/dp/B0TESTLAPTOP");
    assert_eq!(monitor.target_price, "99999.50".parse::<Decimal>()?);
    assert_eq!(monitor.check_interval, Duration::from_secs(900));
    assert_eq!(monitor.retry_interval, Duration::from_secs(120));
    assert_eq!(monitor.politeness, PolitenessDelay::none());
    assert!(config.notifications.discord.is_configured());
    Ok(())
}

#[test]
fn test_cli_overrides_win_over_file() -> anyhow::Result<()> {
    let file = write_config(CONFIG_WITH_WEBHOOK)?;
    let overrides = ConfigOverrides {
        target_url: Some("https://www.amazon.in/dp/B0OTHER".to_string()),
        target_price: Some(Decimal::from(50000)),
        check_interval_minutes: Some(45),
        retry_interval_minutes: Some(5),
    };

    let monitor = AppConfig::load(Some(file.path()), &overrides)?.monitor_config();

    assert_eq!(monitor.target_url, "https://www.amazon.in/dp/B0OTHER");
    assert_eq!(monitor.target_price, Decimal::from(50000));
    assert_eq!(monitor.check_interval, Duration::from_secs(45 * 60));
    assert_eq!(monitor.retry_interval, Duration::from_secs(5 * 60));
    Ok(())
}

#[test]
fn test_invalid_intervals_rejected_at_startup() -> anyhow::Result<()> {
    let file = write_config(CONFIG_WITH_WEBHOOK)?;
    let overrides = ConfigOverrides {
        retry_interval_minutes: Some(60),
        ..Default::default()
    };

    let err = AppConfig::load(Some(file.path()), &overrides).unwrap_err();

    assert!(err.to_string().contains("retry_interval_secs must be shorter"));
    Ok(())
}

#[test]
fn test_missing_config_file_is_an_error() {
    let result = AppConfig::load(
        Some(std::path::Path::new("/nonexistent/price-watcher.toml")),
        &ConfigOverrides::default(),
    );

    assert!(result.is_err());
}
