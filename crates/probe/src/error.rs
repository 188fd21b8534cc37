//! Error types for bench sessions.

use thiserror::Error;
use timing::{ErrorKind, TimingError};

/// Errors that can occur while measuring or configuring a bench session.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Parsing, rendering or timer state failure
    #[error(transparent)]
    Timing(#[from] TimingError),

    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl ProbeError {
    /// The timing category, if this error came from the timing engines.
    pub fn timing_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Timing(err) => Some(err.kind()),
            Self::Config(_) => None,
        }
    }
}

/// Result type for bench session operations.
pub type ProbeResult<T> = Result<T, ProbeError>;
