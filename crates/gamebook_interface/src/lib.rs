//! Transport contract for the gamebook driver.
//!
//! The driver only needs to publish text and read back the replies posted
//! after a given message. Anything that can do both (a social network client,
//! a console, an in-memory script) implements [`Transport`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::Transport;
pub use types::{MessageId, Reply};
