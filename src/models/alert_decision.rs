use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of comparing one observed price with the target. Derived per
/// cycle and never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertDecision {
    pub should_alert: bool,
    pub current_price: Decimal,
    pub target: Decimal,
    /// `current_price - target`; zero or negative whenever `should_alert` is set.
    pub delta: Decimal,
}

impl AlertDecision {
    pub fn is_below_target(&self) -> bool {
        self.delta.is_sign_negative() && !self.delta.is_zero()
    }
}
