//! Hashtags derived from option labels and found in replies.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9A-Za-z]+)").expect("Valid hashtag regex"));

/// A hashtag token, stored lowercase and without the leading `#`.
///
/// Two hashtags are equal when their bodies match case-insensitively,
/// so `#GoLeft` in a reply matches the option labelled "Go left".
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[display("#{}", _0)]
#[serde(try_from = "String", into = "String")]
pub struct Hashtag(String);

impl Hashtag {
    /// Derives the hashtag for an option label.
    ///
    /// Everything except ASCII letters and digits is stripped and the rest
    /// is lowercased. Returns `None` when nothing is left.
    ///
    /// ```
    /// use gamebook_story::Hashtag;
    ///
    /// let tag = Hashtag::from_label("Go left!").unwrap();
    /// assert_eq!(tag.to_string(), "#goleft");
    /// assert!(Hashtag::from_label("...").is_none());
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let body: String = label
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if body.is_empty() { None } else { Some(Self(body)) }
    }

    /// Finds the first hashtag in free text.
    ///
    /// ```
    /// use gamebook_story::Hashtag;
    ///
    /// let tag = Hashtag::extract("I say #Left, then #right").unwrap();
    /// assert_eq!(tag.as_str(), "left");
    /// assert!(Hashtag::extract("no tags here").is_none());
    /// ```
    pub fn extract(text: &str) -> Option<Self> {
        HASHTAG
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|body| Self(body.as_str().to_ascii_lowercase()))
    }

    /// Splits a label that carries its own hashtag, as in `"Go left #left"`.
    ///
    /// Returns the label with the tag removed and the tag itself. Labels with
    /// no tag, or with more than one, return `None`.
    ///
    /// ```
    /// use gamebook_story::Hashtag;
    ///
    /// let (label, tag) = Hashtag::split_label("Take the left tunnel #Left").unwrap();
    /// assert_eq!(label, "Take the left tunnel");
    /// assert_eq!(tag.as_str(), "left");
    /// assert!(Hashtag::split_label("Go #left or #right").is_none());
    /// ```
    pub fn split_label(label: &str) -> Option<(String, Self)> {
        let mut found = HASHTAG.find_iter(label);
        let tag = found.next()?;
        if found.next().is_some() {
            return None;
        }
        let rest = format!("{}{}", &label[..tag.start()], &label[tag.end()..]);
        let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
        let body = tag.as_str().trim_start_matches('#').to_ascii_lowercase();
        let stripped = if rest.is_empty() { label.trim().to_string() } else { rest };
        Some((stripped, Self(body)))
    }

    /// Parses a single hashtag, with or without the leading `#`.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix('#').unwrap_or(text.trim());
        if !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(Self(body.to_ascii_lowercase()))
        } else {
            None
        }
    }

    /// The lowercase body without the leading `#`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Hashtag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("'{}' is not a hashtag", value))
    }
}

impl From<Hashtag> for String {
    fn from(tag: Hashtag) -> Self {
        tag.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_stops_at_punctuation() {
        let tag = Hashtag::extract("ok #north.").unwrap();
        assert_eq!(tag.as_str(), "north");
    }

    #[test]
    fn extract_ignores_bare_hash() {
        assert!(Hashtag::extract("# north").is_none());
    }

    #[test]
    fn parse_accepts_either_form() {
        assert_eq!(Hashtag::parse("#Left"), Hashtag::parse("left"));
        assert!(Hashtag::parse("#two words").is_none());
        assert!(Hashtag::parse("#").is_none());
    }

    #[test]
    fn split_label_keeps_tag_only_label() {
        let (label, tag) = Hashtag::split_label("#wait").unwrap();
        assert_eq!(label, "#wait");
        assert_eq!(tag.as_str(), "wait");
        assert!(Hashtag::split_label("no tag").is_none());
    }

    #[test]
    fn label_with_digits() {
        assert_eq!(Hashtag::from_label("Door 3").unwrap().as_str(), "door3");
    }
}
