use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::alert;
use crate::models::{AlertDecision, ProductSnapshot};
use crate::utils::error::Result;

/// Everything a notifier needs to render one price alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub snapshot: ProductSnapshot,
    pub target_price: Decimal,
    pub decision: AlertDecision,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationEvent {
    /// `None` when the snapshot has no price.
    pub fn new(snapshot: ProductSnapshot, target_price: Decimal, currency_symbol: &str) -> Option<Self> {
        let decision = alert::decide(&snapshot, target_price)?;
        Some(Self {
            snapshot,
            target_price,
            decision,
            currency_symbol: currency_symbol.to_string(),
        })
    }

    pub fn formatted_current(&self) -> String {
        format_amount(self.decision.current_price, &self.currency_symbol)
    }

    pub fn formatted_target(&self) -> String {
        format_amount(self.target_price, &self.currency_symbol)
    }

    pub fn formatted_difference(&self) -> String {
        let side = if self.decision.delta > Decimal::ZERO { "above target" } else { "below target" };
        format!("{} {}", format_amount(self.decision.delta.abs(), &self.currency_symbol), side)
    }

    pub fn captured_at(&self) -> String {
        self.snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

impl NotificationResult {
    pub fn delivered(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Render `amount` with two decimals and `,` thousands grouping, e.g. `₹132,900.00`.
pub fn format_amount(amount: Decimal, currency_symbol: &str) -> String {
    let rendered = format!("{:.2}", amount.abs().round_dp(2));
    let (integer, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}{}.{}", sign, currency_symbol, grouped, fraction)
}

/// Trait for implementing notification methods (email, Discord, etc.)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;
    fn description(&self) -> &str;

    /// Deliver one alert. Delivery failures are reported through
    /// `NotificationResult::success`; `Err` means the message could not be built.
    async fn notify(&self, event: &NotificationEvent) -> Result<NotificationResult>;
    async fn test_connection(&self) -> Result<bool>;

    /// Plugin lifecycle
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
