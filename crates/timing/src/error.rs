//! Error types for wall-clock and high-resolution timing.

use thiserror::Error;

/// Broad category of a [`TimingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A textual instant or a format string could not be handled
    Format,
    /// The high-resolution timer was read in the wrong state
    State,
    /// Invalid configuration (time zone)
    Config,
}

/// Errors that can occur while parsing, rendering or timing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    /// The input did not match the format it was parsed with
    #[error("Failed to create date object from: {input} (format: {format})")]
    Format {
        /// Offending textual instant
        input: String,
        /// Format the input was parsed with
        format: String,
    },

    /// The format string itself is malformed
    #[error("Invalid format '{pattern}': {reason}")]
    InvalidPattern {
        /// Offending format string
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// `end()` was called on a timer that was never started
    #[error("Missing start time for high resolution bench")]
    MissingStart,

    /// An interval was read before any end mark was taken
    #[error("Missing start/ended time for high resolution bench")]
    MissingEnd,

    /// The configured display time zone is not a known IANA name
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
}

impl TimingError {
    pub(crate) fn format(input: &str, format: &str) -> Self {
        Self::Format {
            input: input.to_string(),
            format: format.to_string(),
        }
    }

    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format { .. } | Self::InvalidPattern { .. } => ErrorKind::Format,
            Self::MissingStart | Self::MissingEnd => ErrorKind::State,
            Self::UnknownTimeZone(_) => ErrorKind::Config,
        }
    }
}

/// Result type for timing operations.
pub type TimingResult<T> = Result<T, TimingError>;
