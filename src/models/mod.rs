pub mod alert_decision;
pub mod snapshot;

// Re-exports for convenience
pub use alert_decision::*;
pub use snapshot::*;

/// Sentinel used when none of the title locators match.
pub const TITLE_NOT_FOUND: &str = "Product Title Not Found";
