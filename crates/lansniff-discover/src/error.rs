//! Error types for the lansniff-discover crate.
//!
//! Only `Config` (and core errors raised while validating configuration) stop
//! a scan. Everything else is absorbed by the component that hit it and shows
//! up in the report as a fallback source or an `Unknown` placeholder.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] lansniff_core::CoreError),

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Command not found: {command}")]
    CommandNotFound { command: String },

    #[error("{command} exited with code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("Unexpected output from {source_name}: {detail}")]
    ParseMismatch { source_name: String, detail: String },

    #[error("Timed out after {millis}ms")]
    Timeout { millis: u128 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscoverError {
    /// True for errors that only mean "this capability is not here".
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::CapabilityUnavailable(_) | Self::CommandNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
