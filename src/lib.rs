pub mod alert;
pub mod config;
pub mod extractor;
pub mod models;
pub mod monitor;
pub mod plugins;
pub mod price_parser;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use monitor::{CycleOutcome, MonitorStats, PriceMonitor};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
