use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::notifiers::discord::DiscordWebhook;
use super::notifiers::email::EmailConfig;
use super::notifiers::{DiscordNotifier, EmailNotifier};
use super::traits::{NotifierPlugin, NotificationEvent, NotificationResult};
use crate::config::NotificationsConfig;
use crate::utils::error::AppError;

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Registry of notifiers. Cloning shares the registry, so one manager can be
/// handed to several monitors.
///
/// The lock is only held to copy out the registered notifiers; deliveries and
/// connection tests run without it.
#[derive(Clone)]
pub struct NotifierManager {
    notifiers: Arc<RwLock<HashMap<String, Arc<dyn NotifierPlugin>>>>,
}

impl NotifierManager {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a manager holding every channel that is configured.
    pub async fn from_config(config: &NotificationsConfig) -> Result<Self, AppError> {
        let manager = Self::new();

        if config.smtp.is_configured() {
            let email = EmailNotifier::new(EmailConfig::from_smtp(&config.smtp)?)?;
            manager.register_notifier(Box::new(email)).await?;
        }

        if config.discord.is_configured() {
            let discord = DiscordNotifier::new(DiscordWebhook::from_config(&config.discord)?);
            manager.register_notifier(Box::new(discord)).await?;
        }

        Ok(manager)
    }

    /// Register a notifier plugin
    pub async fn register_notifier(&self, plugin: NotifierPluginBox) -> Result<(), AppError> {
        let plugin_type = plugin.plugin_type().to_string();

        let mut notifiers = self.notifiers.write().await;
        if notifiers.contains_key(&plugin_type) {
            return Err(AppError::Validation(format!("Notifier '{}' is already registered", plugin_type)));
        }
        notifiers.insert(plugin_type, Arc::from(plugin));
        Ok(())
    }

    /// List all available notifier types
    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        notifiers.keys().cloned().collect()
    }

    /// Fan `event` out to every registered notifier.
    ///
    /// The aggregate succeeds only when every notifier delivered. Failures are
    /// logged per channel and never retried here.
    pub async fn send_notification(&self, event: &NotificationEvent) -> NotificationResult {
        let notifiers = self.snapshot().await;
        if notifiers.is_empty() {
            return NotificationResult::failed("no notifiers registered");
        }

        let mut message_ids = Vec::new();
        let mut errors = Vec::new();

        for (plugin_type, notifier) in notifiers.iter() {
            match notifier.notify(event).await {
                Ok(result) if result.success => {
                    tracing::info!("Notifier {} delivered alert", plugin_type);
                    message_ids.extend(result.message_id);
                }
                Ok(result) => {
                    let error = result.error.unwrap_or_else(|| "delivery failed".to_string());
                    tracing::warn!("Notifier {} failed: {}", plugin_type, error);
                    errors.push(format!("{}: {}", plugin_type, error));
                }
                Err(e) => {
                    tracing::warn!("Notifier {} failed: {}", plugin_type, e);
                    errors.push(format!("{}: {}", plugin_type, e));
                }
            }
        }

        NotificationResult {
            success: errors.is_empty(),
            message_id: (!message_ids.is_empty()).then(|| message_ids.join(",")),
            error: (!errors.is_empty()).then(|| errors.join("; ")),
        }
    }

    /// Check connectivity of every notifier. Used once before monitoring starts.
    pub async fn test_connections(&self) -> Result<(), AppError> {
        let notifiers = self.snapshot().await;
        if notifiers.is_empty() {
            return Err(AppError::Validation("No notifiers registered".to_string()));
        }

        for (plugin_type, notifier) in notifiers.iter() {
            match notifier.test_connection().await {
                Ok(true) => tracing::info!("Notifier {} connection verified", plugin_type),
                Ok(false) => {
                    return Err(AppError::notification(plugin_type, "connection test failed"));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Shutdown all plugins
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let drained: Vec<_> = self.notifiers.write().await.drain().collect();
        for (_, plugin) in drained {
            if let Err(e) = plugin.shutdown().await {
                tracing::warn!("Error shutting down notifier plugin: {}", e);
            }
        }

        Ok(())
    }

    async fn snapshot(&self) -> Vec<(String, Arc<dyn NotifierPlugin>)> {
        let notifiers = self.notifiers.read().await;
        notifiers
            .iter()
            .map(|(plugin_type, notifier)| (plugin_type.clone(), notifier.clone()))
            .collect()
    }
}

impl Default for NotifierManager {
    fn default() -> Self {
        Self::new()
    }
}
