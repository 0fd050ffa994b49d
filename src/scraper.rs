use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

/// Fetch collaborator: turns a URL plus request headers into raw page bytes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<Vec<u8>>;
}

pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::Transport(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AppError::Transport(format!("Invalid value for header '{}': {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl PageFetcher for WebScraper {
    async fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<Vec<u8>> {
        let start_time = std::time::Instant::now();

        let response = self
            .client
            .get(url)
            .headers(Self::header_map(headers)?)
            .send()
            .await?
            .error_for_status()?;

        let status = response.status();
        let final_url = response.url().to_string();
        let body = response.bytes().await?;

        tracing::debug!(
            "Fetched {} ({}) -> {}: {} bytes in {}ms",
            url,
            status,
            final_url,
            body.len(),
            start_time.elapsed().as_millis()
        );

        Ok(body.to_vec())
    }
}
