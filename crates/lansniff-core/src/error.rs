use thiserror::Error;

/// Errors raised while building core values from user or tool input.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid address range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    #[error("Invalid hardware address: {0}")]
    InvalidHardwareAddress(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
