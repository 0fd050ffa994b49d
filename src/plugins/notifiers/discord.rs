use crate::config::DiscordConfig;
use crate::plugins::traits::{NotifierPlugin, NotificationEvent, NotificationResult};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const WEBHOOK_PREFIXES: &[&str] = &[
    "https://discord.com/api/webhooks/",
    "https://discordapp.com/api/webhooks/",
];

#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    pub webhook_url: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl DiscordWebhook {
    pub fn from_config(config: &DiscordConfig) -> Result<Self> {
        let webhook_url = config
            .webhook_url
            .clone()
            .ok_or_else(|| AppError::Validation("Missing Discord webhook_url".to_string()))?;

        if !WEBHOOK_PREFIXES.iter().any(|prefix| webhook_url.starts_with(prefix)) {
            return Err(AppError::Validation("Invalid Discord webhook URL format".to_string()));
        }

        Ok(DiscordWebhook {
            webhook_url,
            username: Some(config.username.clone()).filter(|u| !u.is_empty()),
            avatar_url: config.avatar_url.clone(),
        })
    }
}

pub struct DiscordNotifier {
    client: Client,
    webhook: DiscordWebhook,
}

impl DiscordNotifier {
    pub fn new(webhook: DiscordWebhook) -> Self {
        DiscordNotifier {
            client: Client::new(),
            webhook,
        }
    }

    fn get_embed_color(&self, event: &NotificationEvent) -> u32 {
        if event.decision.is_below_target() {
            0x2e8b57 // Green when under target
        } else {
            0xff9900
        }
    }

    fn create_embed(&self, event: &NotificationEvent) -> serde_json::Value {
        json!({
            "title": format!("📉 {}", event.snapshot.short_title(200)),
            "url": event.snapshot.source_url,
            "color": self.get_embed_color(event),
            "timestamp": event.snapshot.captured_at.to_rfc3339(),
            "fields": [
                {
                    "name": "💰 Current Price",
                    "value": event.formatted_current(),
                    "inline": true
                },
                {
                    "name": "🎯 Target Price",
                    "value": event.formatted_target(),
                    "inline": true
                },
                {
                    "name": "Difference",
                    "value": event.formatted_difference(),
                    "inline": false
                }
            ],
            "footer": {
                "text": "Price Watcher"
            }
        })
    }

    fn create_webhook_payload(&self, event: &NotificationEvent) -> serde_json::Value {
        let mut payload = json!({
            "embeds": [self.create_embed(event)]
        });

        if let Some(username) = &self.webhook.username {
            payload["username"] = json!(username);
        }

        if let Some(avatar_url) = &self.webhook.avatar_url {
            payload["avatar_url"] = json!(avatar_url);
        }

        payload
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    fn plugin_type(&self) -> &str {
        "discord"
    }

    fn description(&self) -> &str {
        "Sends price alerts via Discord webhooks with embeds"
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<NotificationResult> {
        let payload = self.create_webhook_payload(event);

        let response = match self.client.post(&self.webhook.webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Discord webhook request failed: {}", e);
                return Ok(NotificationResult::failed(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            Ok(NotificationResult::delivered(format!("discord-{}", chrono::Utc::now().timestamp())))
        } else {
            tracing::warn!("Discord webhook rejected alert with status {}", status);
            Ok(NotificationResult::failed(format!("webhook returned {}", status)))
        }
    }

    async fn test_connection(&self) -> Result<bool> {
        // A GET on a webhook URL returns its metadata without posting anything.
        let response = self
            .client
            .get(&self.webhook.webhook_url)
            .send()
            .await
            .map_err(|e| AppError::notification("discord", e.to_string()))?;

        Ok(response.status().is_success())
    }
}
