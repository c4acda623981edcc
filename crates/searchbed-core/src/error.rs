//! Error types for the searchbed harness
//!
//! The retry machinery keys off an explicit allow-list of backend-originated
//! variants. Everything else fails fast: a misclassified assertion or config
//! bug silently masked across retries would be far worse than a flaky test.

use thiserror::Error;

/// Result type alias for harness operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Coarse failure classification used by the retrying executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Attributable to the networked search service; eligible for retry.
    Backend,
    /// A test-body assertion failure; never retried.
    Assertion,
    /// A test/config bug (unknown manager, malformed rule); never retried.
    Configuration,
    /// Unexpected harness-internal failure; never retried.
    Internal,
}

/// Errors that can occur while provisioning, populating, or tearing down
/// backend indexes, or while running a test body under the harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The backend refused or dropped the connection (cluster busy, down).
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A backend call did not complete in time.
    #[error("Backend timeout: {0}")]
    BackendTimeout(String),

    /// The backend rejected a bulk submission for a document type.
    #[error("Bulk indexing rejected for type '{doc_type}': {reason}")]
    BulkRejected { doc_type: String, reason: String },

    /// I/O error talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A test-body assertion failed.
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// The resolver has no handle registered under the requested name.
    #[error("Unknown manager '{0}': the resolver has no handle registered under that name")]
    UnknownManager(String),

    /// A skip rule carries an unparseable version or comparator.
    #[error("Invalid version rule: {0}")]
    InvalidRule(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal/unexpected error
    #[error("Internal harness error: {0}")]
    Internal(String),
}

impl HarnessError {
    /// Returns the stable machine-readable code string for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::BackendTimeout(_) => "BACKEND_TIMEOUT",
            Self::BulkRejected { .. } => "BULK_REJECTED",
            Self::Io(_) => "IO_ERROR",
            Self::Assertion(_) => "ASSERTION_FAILED",
            Self::UnknownManager(_) => "UNKNOWN_MANAGER",
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Classify this error for retry purposes.
    ///
    /// This is the single classification predicate in the system. The
    /// `Backend` class is a closed allow-list; new variants default to
    /// non-retryable until explicitly added here.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::BackendUnavailable(_)
            | Self::BackendTimeout(_)
            | Self::BulkRejected { .. }
            | Self::Io(_) => FailureClass::Backend,
            Self::Assertion(_) => FailureClass::Assertion,
            Self::UnknownManager(_) | Self::InvalidRule(_) => FailureClass::Configuration,
            Self::Serialization(_) | Self::Internal(_) => FailureClass::Internal,
        }
    }

    /// Returns whether the retrying executor may re-run a test after this
    /// error. True exactly for backend-originated failures.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.class(), FailureClass::Backend)
    }
}
