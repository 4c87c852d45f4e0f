//! Game driver for the gamebook bot.
//!
//! [`GameDriver`] plays one [`Story`](gamebook_story::Story) through a
//! [`Transport`](gamebook_interface::Transport): it publishes the current
//! page, polls for replies carrying a hashtag, applies the matching option
//! and repeats until the story ends, the page times out, or the run is
//! cancelled.
//!
//! ```text
//! Rendering ──▶ Polling ──▶ Deciding ──▶ Rendering
//!     │            │            │
//!     ▼            ▼            ▼
//!   Ended       TimedOut      Ended
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gamebook_driver::{DriverConfig, GameDriver, transports::MemoryTransport};
//! use gamebook_story::Story;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let story = Story::from_file("cave.toml")?;
//! let transport = Arc::new(MemoryTransport::new());
//! let mut driver = GameDriver::builder()
//!     .story(story)
//!     .transport(transport)
//!     .config(DriverConfig::default())
//!     .build()?;
//! let report = driver.play().await?;
//! println!("{:?}", report.outcome());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod checkpoint;
mod compose;
mod config;
mod driver;
mod reply;
pub mod transports;

pub use checkpoint::{CheckpointStore, SessionCheckpoint};
pub use compose::{closing_message, options_message, page_messages, REPLY_PROMPT};
pub use config::{DriverConfig, DriverConfigBuilder, TimeoutPolicy};
pub use driver::{DriverState, GameDriver, GameDriverBuilder, RunOutcome, RunReport};
pub use reply::{ReplySelector, Selection};

pub use gamebook_error::{DriverError, DriverErrorKind, DriverResult};
