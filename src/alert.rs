use rust_decimal::Decimal;

use crate::models::{AlertDecision, ProductSnapshot};

/// Threshold check between an observed price and the target.
///
/// Equal to target counts as a hit. Returns `None` when the snapshot carries
/// no price, since there is nothing to compare.
pub fn decide(snapshot: &ProductSnapshot, target_price: Decimal) -> Option<AlertDecision> {
    snapshot.price.map(|price| evaluate(price, target_price))
}

pub fn evaluate(current_price: Decimal, target_price: Decimal) -> AlertDecision {
    AlertDecision {
        should_alert: current_price <= target_price,
        current_price,
        target: target_price,
        delta: current_price - target_price,
    }
}
