//! Transport error types and retry classification.

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Error conditions reported by a transport (the social-media client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TransportErrorKind {
    // Transient: retried by the driver
    /// Network failure talking to the service.
    #[display("Network failure: {}", _0)]
    Network(String),
    /// The service asked us to slow down.
    #[display("Rate limited: retry after {}s", _0)]
    RateLimited(u64),
    /// The service is temporarily unavailable.
    #[display("Service unavailable: {}", _0)]
    Unavailable(String),

    // Permanent: abort the run
    /// Credentials were rejected.
    #[display("Authentication failed: {}", _0)]
    Authentication(String),
    /// The service refused the request (content too long, forbidden, ...).
    #[display("Request rejected: {}", _0)]
    Rejected(String),
    /// The transport has been shut down.
    #[display("Transport closed")]
    Closed,
}

impl TransportErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited(_) | Self::Unavailable(_)
        )
    }
}

/// Trait for errors that support retry logic.
///
/// Transient errors like network faults or rate limits should return true.
/// Permanent errors like rejected credentials should return false.
///
/// # Examples
///
/// ```
/// use gamebook_error::{RetryableError, TransportError, TransportErrorKind};
///
/// let err = TransportError::new(TransportErrorKind::Network("reset".to_string()));
/// assert!(err.is_retryable());
///
/// let err = TransportError::new(TransportErrorKind::Authentication("bad token".to_string()));
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

/// Transport error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", kind, line, file)]
pub struct TransportError {
    /// The kind of error that occurred
    pub kind: TransportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TransportError {
    /// Create a new TransportError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TransportErrorKind {
        &self.kind
    }
}

impl RetryableError for TransportError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<std::io::Error> for TransportError {
    #[track_caller]
    fn from(e: std::io::Error) -> Self {
        Self::new(TransportErrorKind::Network(e.to_string()))
    }
}
