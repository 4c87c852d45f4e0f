//! Game driver error types.

use crate::{JsonError, StoryError, TransportError};

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Error conditions that end a playthrough.
#[derive(Debug, Clone, derive_more::Display)]
pub enum DriverErrorKind {
    /// Polling failed too many times in a row.
    #[display("Gave up after {} consecutive transport failures: {}", attempts, last)]
    TransportExhausted {
        /// Consecutive failures observed
        attempts: u32,
        /// The last failure
        last: TransportError,
    },
    /// A permanent transport failure, or a publish that ran out of retries.
    #[display("{}", _0)]
    Transport(TransportError),
    /// The story rejected an operation the driver cannot recover from.
    #[display("{}", _0)]
    Story(StoryError),
    /// Reading or writing a poll-cycle checkpoint failed.
    #[display("Checkpoint failure: {}", _0)]
    Checkpoint(JsonError),
    /// The driver was built without a required component.
    #[display("Missing driver component: {}", _0)]
    MissingComponent(String),
}

/// Driver error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Driver Error: {} at line {} in {}", kind, line, file)]
pub struct DriverError {
    /// Error kind
    pub kind: DriverErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl DriverError {
    /// Create a new driver error.
    #[track_caller]
    pub fn new(kind: DriverErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DriverErrorKind {
        &self.kind
    }
}

impl From<TransportError> for DriverError {
    #[track_caller]
    fn from(e: TransportError) -> Self {
        Self::new(DriverErrorKind::Transport(e))
    }
}

impl From<StoryError> for DriverError {
    #[track_caller]
    fn from(e: StoryError) -> Self {
        Self::new(DriverErrorKind::Story(e))
    }
}

impl From<JsonError> for DriverError {
    #[track_caller]
    fn from(e: JsonError) -> Self {
        Self::new(DriverErrorKind::Checkpoint(e))
    }
}
