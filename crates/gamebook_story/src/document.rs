//! Serializable story documents.
//!
//! A [`StoryDocument`] is the unresolved, on-disk shape of a story: keys are
//! strings and nothing has been checked yet. [`Story::load`](crate::Story::load)
//! validates it and resolves every reference.

use crate::hashtag::Hashtag;
use gamebook_error::{StoryError, StoryErrorKind, StoryResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Reserved target key marking the end of the story.
pub const END_KEY: &str = "end";

/// Top-level story document.
///
/// In TOML:
///
/// ```toml
/// title = "The Cave"
/// author = "A. Writer"
/// start = "mouth"
///
/// [[stitches]]
/// key = "mouth"
/// text = ["A cold wind blows from the dark."]
/// options = [{ label = "Enter", target = "hall", set = ["brave"] }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDocument {
    /// Story title
    pub title: String,
    /// Author credited in the closing message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Key of the first stitch; defaults to the first stitch listed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Flags set before the first page is shown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial_flags: Vec<String>,
    /// All stitches, in authoring order
    pub stitches: Vec<DocumentStitch>,
}

/// One stitch as written in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStitch {
    /// Unique key
    pub key: String,
    /// Optional page title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Paragraphs in reading order
    #[serde(default)]
    pub text: Vec<DocumentParagraph>,
    /// Options in authoring order; none makes this an ending page
    #[serde(default)]
    pub options: Vec<DocumentOption>,
}

/// A paragraph: plain text, or text shown only under a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentParagraph {
    /// Always shown
    Plain(String),
    /// Shown when every `if` flag is set and every `unless` flag is unset
    Conditional {
        /// Paragraph text
        text: String,
        /// Flags that must be set
        #[serde(rename = "if", default, skip_serializing_if = "Vec::is_empty")]
        if_flags: Vec<String>,
        /// Flags that must be unset
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        unless: Vec<String>,
    },
}

impl DocumentParagraph {
    /// Creates a conditional paragraph.
    pub fn conditional(text: impl Into<String>, if_flags: Vec<String>, unless: Vec<String>) -> Self {
        Self::Conditional {
            text: text.into(),
            if_flags,
            unless,
        }
    }
}

impl From<&str> for DocumentParagraph {
    fn from(text: &str) -> Self {
        Self::Plain(text.to_string())
    }
}

/// An option as written in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOption {
    /// Display label; its hashtag form is what the audience replies with
    pub label: String,
    /// Explicit hashtag, used instead of the one derived from the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtag: Option<Hashtag>,
    /// Target stitch key, or [`END_KEY`]
    pub target: String,
    /// Flags that must be set for the option to be offered
    #[serde(rename = "if", default, skip_serializing_if = "Vec::is_empty")]
    pub if_flags: Vec<String>,
    /// Flags that must be unset for the option to be offered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unless: Vec<String>,
    /// Flags set when the option is taken
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<String>,
}

impl DocumentOption {
    /// Creates an unconditional option with no effects.
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hashtag: None,
            target: target.into(),
            if_flags: Vec::new(),
            unless: Vec::new(),
            set: Vec::new(),
        }
    }
}

/// The encodings a document can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DocumentFormat {
    /// Native document as TOML
    #[display("toml")]
    Toml,
    /// Native document as JSON
    #[display("json")]
    Json,
    /// Inklewriter JSON export
    #[display("inklewriter")]
    Inklewriter,
}

impl DocumentFormat {
    /// Detects the format from an optional file name and the contents.
    ///
    /// A `.toml` extension wins. Otherwise JSON is told apart from TOML by
    /// its leading brace, and Inklewriter exports by their `data.stitches`
    /// object.
    pub fn detect(path: Option<&Path>, contents: &str) -> Self {
        let is_toml_file = path
            .and_then(|p| p.extension())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml_file || !contents.trim_start().starts_with('{') {
            return Self::Toml;
        }
        match serde_json::from_str::<serde_json::Value>(contents) {
            Ok(value) if value.pointer("/data/stitches").is_some_and(|s| s.is_object()) => {
                Self::Inklewriter
            }
            _ => Self::Json,
        }
    }
}

impl StoryDocument {
    /// Parses a native TOML document.
    pub fn from_toml_str(contents: &str) -> StoryResult<Self> {
        toml::from_str(contents)
            .map_err(|e| StoryError::new(StoryErrorKind::Parse(format!("TOML: {}", e))))
    }

    /// Parses a JSON document, native or Inklewriter.
    pub fn from_json_str(contents: &str) -> StoryResult<Self> {
        let value: serde_json::Value = serde_json::from_str(contents)
            .map_err(|e| StoryError::new(StoryErrorKind::Parse(format!("JSON: {}", e))))?;
        if value.pointer("/data/stitches").is_some_and(|s| s.is_object()) {
            debug!("Detected inklewriter export");
            return crate::inkle::import(value);
        }
        serde_json::from_value(value)
            .map_err(|e| StoryError::new(StoryErrorKind::Parse(format!("JSON: {}", e))))
    }

    /// Parses a document in an already-known format.
    pub fn parse_as(format: DocumentFormat, contents: &str) -> StoryResult<Self> {
        match format {
            DocumentFormat::Toml => Self::from_toml_str(contents),
            DocumentFormat::Json | DocumentFormat::Inklewriter => Self::from_json_str(contents),
        }
    }

    /// Reads and parses a document from disk, detecting its format.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> StoryResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StoryError::new(StoryErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?;
        let format = DocumentFormat::detect(Some(path), &contents);
        debug!(%format, "Parsing story document");
        Self::parse_as(format, &contents)
    }

    /// Key of the start stitch: the declared one, else the first listed.
    pub fn start_key(&self) -> Option<&str> {
        self.start
            .as_deref()
            .or_else(|| self.stitches.first().map(|s| s.key.as_str()))
    }
}

impl FromStr for StoryDocument {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_as(DocumentFormat::detect(None, s), s)
    }
}
