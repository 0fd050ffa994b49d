use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Structure error in {strategy}: {message}")]
    Structure { strategy: String, message: String },

    #[error("Numeric format error: '{text}' is not a price")]
    NumericFormat { text: String },

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Notification error: {channel}: {message}")]
    Notification { channel: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn structure(strategy: &str, message: impl Into<String>) -> Self {
        AppError::Structure {
            strategy: strategy.to_string(),
            message: message.into(),
        }
    }

    pub fn notification(channel: &str, message: impl Into<String>) -> Self {
        AppError::Notification {
            channel: channel.to_string(),
            message: message.into(),
        }
    }

    /// Network, timeout and HTTP status failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Http(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::notification("email", err.to_string())
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(err: lettre::address::AddressError) -> Self {
        AppError::notification("email", format!("invalid address: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        AppError::notification("email", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Message carried by a caught panic payload.
pub fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
