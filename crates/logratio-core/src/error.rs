//! Error types for `logratio`.
//!
//! Every failure in the aggregation engine is fatal to the run: there is no
//! skip-and-continue path for bad lines and no retry on I/O errors.
//! Error codes follow the pattern `LOGR-XXX` for easy grepping in logs.

use thiserror::Error;

/// Result type alias for `logratio` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while aggregating an access log.
#[derive(Error, Debug)]
pub enum Error {
    /// Line has fewer fields than required (LOGR-001).
    #[error("[LOGR-001] Malformed line {line}: expected at least {expected} fields, found {found}")]
    MalformedLine {
        /// 1-based line number within the input.
        line: u64,
        /// Minimum number of whitespace-separated fields.
        expected: usize,
        /// Number of fields actually present.
        found: usize,
    },

    /// The counting pass disagrees with the sizing pass (LOGR-002).
    ///
    /// Means the input changed between the two reads.
    #[error("[LOGR-002] Pass inconsistency: {0}")]
    PassInconsistency(String),

    /// A counter would exceed its storage width (LOGR-003).
    #[error("[LOGR-003] Counter overflow for user '{uid}' on endpoint '{endpoint}'")]
    CounterOverflow {
        /// User identifier.
        uid: String,
        /// Endpoint path.
        endpoint: String,
    },

    /// Configuration error (LOGR-004).
    #[error("[LOGR-004] Configuration error: {0}")]
    Config(String),

    /// IO error (LOGR-005).
    #[error("[LOGR-005] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line is not valid UTF-8 (LOGR-006).
    #[error("[LOGR-006] Line {0} is not valid UTF-8")]
    InvalidEncoding(u64),
}

impl Error {
    /// Returns the error code (e.g., "LOGR-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedLine { .. } => "LOGR-001",
            Self::PassInconsistency(_) => "LOGR-002",
            Self::CounterOverflow { .. } => "LOGR-003",
            Self::Config(_) => "LOGR-004",
            Self::Io(_) => "LOGR-005",
            Self::InvalidEncoding(_) => "LOGR-006",
        }
    }

    /// Returns true if the error was caused by the contents of the input log
    /// rather than by the environment or the configuration.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedLine { .. } | Self::PassInconsistency(_) | Self::InvalidEncoding(_)
        )
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
