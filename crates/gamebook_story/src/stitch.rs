//! Resolved stitches and the pages rendered from them.

use crate::condition::{Condition, FlagId};
use crate::hashtag::Hashtag;

/// Index of a stitch inside its [`Story`](crate::Story).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StitchId(pub usize);

/// Where an option leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Another stitch
    Stitch(StitchId),
    /// The end of the story
    End,
}

/// A paragraph with its visibility rule.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct Paragraph {
    text: String,
    condition: Condition,
}

impl Paragraph {
    pub(crate) fn new(text: String, condition: Condition) -> Self {
        Self { text, condition }
    }
}

/// An option with its target, condition and effects resolved to indices.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct StitchOption {
    label: String,
    hashtag: Hashtag,
    target: Target,
    condition: Condition,
    effects: Vec<FlagId>,
}

impl StitchOption {
    pub(crate) fn new(
        label: String,
        hashtag: Hashtag,
        target: Target,
        condition: Condition,
        effects: Vec<FlagId>,
    ) -> Self {
        Self {
            label,
            hashtag,
            target,
            condition,
            effects,
        }
    }
}

/// One node of the story graph. Immutable once the story is loaded.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct Stitch {
    key: String,
    title: Option<String>,
    paragraphs: Vec<Paragraph>,
    options: Vec<StitchOption>,
}

impl Stitch {
    pub(crate) fn new(
        key: String,
        title: Option<String>,
        paragraphs: Vec<Paragraph>,
        options: Vec<StitchOption>,
    ) -> Self {
        Self {
            key,
            title,
            paragraphs,
            options,
        }
    }

    /// A stitch without options ends the story when reached.
    pub fn is_ending(&self) -> bool {
        self.options.is_empty()
    }
}

/// Where a visible choice leads, by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The stitch with this key
    Stitch(String),
    /// The end of the story
    End,
}

/// A choice currently offered to the audience.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct Choice {
    label: String,
    hashtag: Hashtag,
    destination: Destination,
}

impl Choice {
    /// Creates a choice.
    pub fn new(label: impl Into<String>, hashtag: Hashtag, destination: Destination) -> Self {
        Self {
            label: label.into(),
            hashtag,
            destination,
        }
    }
}

/// The current stitch as the audience sees it: visible text and visible
/// choices, in authoring order.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct Page {
    key: String,
    title: Option<String>,
    paragraphs: Vec<String>,
    choices: Vec<Choice>,
}

impl Page {
    /// Creates a page.
    pub fn new(
        key: impl Into<String>,
        title: Option<String>,
        paragraphs: Vec<String>,
        choices: Vec<Choice>,
    ) -> Self {
        Self {
            key: key.into(),
            title,
            paragraphs,
            choices,
        }
    }

    /// True when nothing can be chosen on this page.
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }

    /// All visible paragraphs joined by blank lines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    /// Hashtags of the visible choices.
    pub fn hashtags(&self) -> Vec<Hashtag> {
        self.choices.iter().map(|c| c.hashtag.clone()).collect()
    }
}
