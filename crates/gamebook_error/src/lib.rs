//! Error types for the gamebook workspace.
//!
//! This crate provides the foundation error types used by the story engine,
//! the game driver and the transports that connect them to an audience.
//!
//! # Error Hierarchy
//!
//! Errors with several causes follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Single-cause errors (`ConfigError`, `HttpError`, `JsonError`) carry just
//! a message and the location.
//!
//! # Examples
//!
//! ```
//! use gamebook_error::{GamebookResult, StoryError, StoryErrorKind};
//!
//! fn load() -> GamebookResult<()> {
//!     Err(StoryError::new(StoryErrorKind::Parse("no stitches".to_string())))?
//! }
//!
//! match load() {
//!     Ok(_) => println!("Loaded"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod located;
mod story;
mod transport;

pub use driver::{DriverError, DriverErrorKind, DriverResult};
pub use error::{GamebookError, GamebookErrorKind, GamebookResult};
pub use located::{ConfigError, HttpError, JsonError};
pub use story::{StoryError, StoryErrorKind, StoryResult};
pub use transport::{RetryableError, TransportError, TransportErrorKind, TransportResult};
