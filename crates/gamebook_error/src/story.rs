//! Story engine error types.

/// Result type for story operations.
pub type StoryResult<T> = Result<T, StoryError>;

/// Specific error conditions for loading and navigating a story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoryErrorKind {
    /// Failed to read a story document from disk.
    #[display("Failed to read story document: {}", _0)]
    FileRead(String),
    /// The document is malformed: missing fields, bad syntax, empty labels
    /// or conditions that can never hold.
    #[display("Failed to parse story document: {}", _0)]
    Parse(String),
    /// Two stitches share the same key.
    #[display("Stitch key '{}' is defined more than once", _0)]
    DuplicateStitch(String),
    /// A stitch, option or divert names a key that does not exist.
    #[display("Stitch '{}' references unknown stitch '{}'", from, target)]
    Reference {
        /// Key of the stitch holding the reference
        from: String,
        /// The key that could not be resolved
        target: String,
    },
    /// No currently visible option carries the chosen label.
    #[display("No visible option '{}' on stitch '{}'", label, stitch)]
    InvalidChoice {
        /// Key of the current stitch
        stitch: String,
        /// Label that was chosen
        label: String,
    },
    /// The story already reached its end sentinel.
    #[display("The story has already ended")]
    Finished,
    /// A lookup by key found nothing (used when restoring a position).
    #[display("Unknown stitch '{}'", _0)]
    UnknownStitch(String),
}

impl StoryErrorKind {
    /// Returns true for errors raised while loading a document.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::FileRead(_)
                | Self::Parse(_)
                | Self::DuplicateStitch(_)
                | Self::Reference { .. }
        )
    }

    /// Returns true when a document references a key that does not exist.
    pub fn is_reference_error(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

/// Error type for story operations.
///
/// # Examples
///
/// ```
/// use gamebook_error::{StoryError, StoryErrorKind};
///
/// let err = StoryError::new(StoryErrorKind::Reference {
///     from: "start".to_string(),
///     target: "nowhere".to_string(),
/// });
/// assert!(err.kind.is_reference_error());
/// assert!(format!("{}", err).contains("nowhere"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Story Error: {} at line {} in {}", kind, line, file)]
pub struct StoryError {
    /// The specific error condition
    pub kind: StoryErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StoryError {
    /// Create a new StoryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoryErrorKind {
        &self.kind
    }
}
