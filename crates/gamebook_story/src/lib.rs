//! Branching story engine for the gamebook bot.
//!
//! A story is a graph of [`Stitch`]es. Each stitch holds paragraphs of text
//! and an ordered list of options; options lead to other stitches or to the
//! end of the story and may be hidden by a [`Condition`] over the story's
//! flags. Taking an option sets the flags it declares.
//!
//! # Features
//!
//! - **Native documents**: TOML or JSON, see [`StoryDocument`]
//! - **Inklewriter import**: stories exported from inklewriter load directly
//! - **Load-time resolution**: keys, targets and flag names are resolved to
//!   indices once, so navigation never looks strings up
//! - **Hashtags**: every option has a [`Hashtag`] form used for reply matching
//!
//! # Example
//!
//! ```
//! use gamebook_story::{Advance, Story, StoryDocument};
//!
//! # fn main() -> Result<(), gamebook_error::StoryError> {
//! let document: StoryDocument = r##"
//!     title = "The Cave"
//!
//!     [[stitches]]
//!     key = "start"
//!     text = ["You stand at a fork in the tunnel."]
//!     options = [
//!         { label = "Left", target = "end" },
//!         { label = "Right", target = "end" },
//!     ]
//! "##
//! .parse()?;
//!
//! let mut story = Story::load(document)?;
//! let page = story.current_page()?;
//! assert_eq!(page.hashtags().len(), 2);
//! assert_eq!(story.advance("Left")?, Advance::End);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod condition;
mod document;
mod hashtag;
mod inkle;
mod stitch;
mod story;

pub use condition::{Clause, Condition, FlagId, FlagTable};
pub use document::{
    DocumentFormat, DocumentOption, DocumentParagraph, DocumentStitch, END_KEY, StoryDocument,
};
pub use hashtag::Hashtag;
pub use stitch::{Choice, Destination, Page, Paragraph, Stitch, StitchId, StitchOption, Target};
pub use story::{Advance, Story};

pub use gamebook_error::{StoryError, StoryErrorKind, StoryResult};
