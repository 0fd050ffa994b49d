// Shared fixtures for the integration tests

pub mod config_tests;
pub mod fetch_tests;
pub mod monitor_tests;
pub mod notifier_tests;

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use price_watcher::{
    config::{MonitorConfig, PolitenessDelay, ScraperConfig},
    extractor::ProductExtractor,
    monitor::PriceMonitor,
    plugins::{
        NotifierManager,
        notifiers::{DiscordNotifier, discord::DiscordWebhook},
    },
    scraper::WebScraper,
};

pub const PRODUCT_PATH: &str = "/dp/B0TESTLAPTOP";
pub const WEBHOOK_PATH: &str = "/api/webhooks/1/token";

pub fn get_test_scraper_config() -> ScraperConfig {
    ScraperConfig {
        request_timeout: 5,
        user_agent: "PriceWatcher-Test/1.0".to_string(),
        accept: "text/html".to_string(),
        accept_language: "en-US,en;q=0.9".to_string(),
        referer: None,
    }
}

/// Product page in the split whole/fraction price layout.
pub fn product_page(price_whole: &str) -> String {
    format!(
        r#"<html>
<head><title>Amazon.in</title><script>var price = "₹1";</script></head>
<body>
    <span id="productTitle">  Gaming Laptop  </span>
    <div class="a-section">
        <span class="a-price">
            <span class="a-price-symbol">₹</span>
            <span class="a-price-whole">{}.</span>
            <span class="a-price-fraction">00</span>
        </span>
    </div>
</body>
</html>"#,
        price_whole
    )
}

pub async fn start_product_server(price_whole: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(price_whole)))
        .mount(&server)
        .await;
    server
}

pub fn test_monitor_config(server: &MockServer) -> MonitorConfig {
    MonitorConfig {
        target_url: format!("{}{}", server.uri(), PRODUCT_PATH),
        target_price: Decimal::from(132000),
        check_interval: Duration::from_secs(3600),
        retry_interval: Duration::from_secs(60),
        politeness: PolitenessDelay::none(),
    }
}

/// Monitor wired to the real fetcher and a Discord notifier posting to its own mock server.
pub async fn create_test_monitor(server: &MockServer) -> anyhow::Result<(PriceMonitor, MockServer)> {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&webhook)
        .await;

    let notifiers = NotifierManager::new();
    notifiers
        .register_notifier(Box::new(DiscordNotifier::new(DiscordWebhook {
            webhook_url: format!("{}{}", webhook.uri(), WEBHOOK_PATH),
            username: Some("Price Watcher Test".to_string()),
            avatar_url: None,
        })))
        .await?;

    let scraper_config = get_test_scraper_config();
    let monitor = PriceMonitor::new(
        test_monitor_config(server),
        scraper_config.headers(),
        Arc::new(WebScraper::new(&scraper_config)?),
        ProductExtractor::new()?,
        notifiers,
        "₹",
    );

    Ok((monitor, webhook))
}

/// JSON bodies posted to the webhook server so far.
pub async fn webhook_payloads(webhook: &MockServer) -> Vec<serde_json::Value> {
    webhook
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method == wiremock::http::Method::Post)
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

pub fn empty_headers() -> HashMap<String, String> {
    HashMap::new()
}

/// Helper to wait for async operations
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_seconds: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(timeout_seconds);

    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    false
}
