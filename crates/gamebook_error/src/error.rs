//! Top-level error wrapper types.

use crate::{ConfigError, DriverError, HttpError, JsonError, StoryError, TransportError};

/// Every error a gamebook run can surface to the operator.
///
/// # Examples
///
/// ```
/// use gamebook_error::{GamebookError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: GamebookError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum GamebookErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Story document or navigation error
    #[from(StoryError)]
    Story(StoryError),
    /// Transport error
    #[from(TransportError)]
    Transport(TransportError),
    /// Game driver error
    #[from(DriverError)]
    Driver(DriverError),
}

/// Gamebook error with kind discrimination.
///
/// # Examples
///
/// ```
/// use gamebook_error::{ConfigError, GamebookResult};
///
/// fn might_fail() -> GamebookResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Gamebook Error: {}", _0)]
pub struct GamebookError(Box<GamebookErrorKind>);

impl GamebookError {
    /// Create a new error from a kind.
    pub fn new(kind: GamebookErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GamebookErrorKind {
        &self.0
    }
}

impl<T> From<T> for GamebookError
where
    T: Into<GamebookErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for gamebook operations.
pub type GamebookResult<T> = std::result::Result<T, GamebookError>;
