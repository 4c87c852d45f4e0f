//! Gamebook - branching stories played by an audience over social media.
//!
//! A gamebook bot narrates one page of a story at a time, lists the
//! choices as hashtags, and waits for the audience to reply with one. The
//! first reply naming a visible choice moves the story on.
//!
//! # Features
//!
//! - **Story engine**: stitches, flags and conditional options, loaded from
//!   native TOML/JSON documents or inklewriter exports
//! - **Game driver**: the render/poll/decide loop with timeouts, bounded
//!   retries, cancellation and resumable poll cycles
//! - **Transports**: anything implementing [`Transport`]; a console
//!   transport ships here for local play
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gamebook::{ConsoleTransport, DriverConfig, GameDriver, StorySource, load_story};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let story = load_story(&StorySource::parse("cave.toml")).await?;
//!     let mut driver = GameDriver::builder()
//!         .story(story)
//!         .transport(Arc::new(ConsoleTransport::new()))
//!         .config(DriverConfig::default())
//!         .build()?;
//!     driver.play().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `gamebook_error` - Error types
//! - `gamebook_interface` - The `Transport` trait
//! - `gamebook_story` - Story engine
//! - `gamebook_driver` - Game driver and reply selection
//!
//! This crate (`gamebook`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod console;
mod observability;
mod period;
mod source;

pub use console::ConsoleTransport;
pub use observability::{ObservabilityConfig, init_observability};
pub use period::parse_period;
pub use source::{StorySource, check_source, fetch_document, load_document, load_story};

pub use gamebook_error::{
    ConfigError, DriverError, DriverErrorKind, DriverResult, GamebookError, GamebookErrorKind,
    GamebookResult, HttpError, JsonError, RetryableError, StoryError, StoryErrorKind, StoryResult,
    TransportError, TransportErrorKind, TransportResult,
};
pub use gamebook_interface::{MessageId, Reply, Transport};
pub use gamebook_story::{
    Advance, Choice, Condition, Destination, DocumentFormat, Hashtag, Page, Stitch, Story,
    StoryDocument,
};
pub use gamebook_driver::{
    CheckpointStore, DriverConfig, DriverState, GameDriver, ReplySelector, RunOutcome, RunReport,
    Selection, SessionCheckpoint, TimeoutPolicy, transports::MemoryTransport,
};
