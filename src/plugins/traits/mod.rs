pub mod notifier;

pub use notifier::{NotifierPlugin, NotificationEvent, NotificationResult, format_amount};
