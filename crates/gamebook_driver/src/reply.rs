//! Mapping audience replies to visible choices.

use gamebook_interface::{MessageId, Reply};
use gamebook_story::{Choice, Hashtag};
use std::collections::HashSet;
use tracing::{debug, warn};

/// What the selector made of one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The reply picks this choice.
    Matched(Choice),
    /// The reply was handled before.
    Duplicate,
    /// The reply carries no hashtag.
    NoToken,
    /// The hashtag names no visible choice.
    NoMatch(Hashtag),
    /// The hashtag names more than one visible choice.
    Ambiguous(Hashtag),
}

/// Turns replies into choices, handling each reply id at most once.
#[derive(Debug, Clone, Default)]
pub struct ReplySelector {
    seen: HashSet<MessageId>,
}

impl ReplySelector {
    /// Creates a selector that has seen nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a selector that treats `seen` as already handled.
    pub fn with_seen(seen: impl IntoIterator<Item = MessageId>) -> Self {
        Self {
            seen: seen.into_iter().collect(),
        }
    }

    /// First hashtag in a raw reply, lowercased.
    pub fn extract_token(raw_reply: &str) -> Option<Hashtag> {
        Hashtag::extract(raw_reply)
    }

    /// The single visible choice with this hashtag.
    ///
    /// `None` when no choice matches or when several do.
    pub fn match_token<'a>(token: &Hashtag, choices: &'a [Choice]) -> Option<&'a Choice> {
        let mut matches = choices.iter().filter(|c| c.hashtag() == token);
        match (matches.next(), matches.next()) {
            (Some(choice), None) => Some(choice),
            _ => None,
        }
    }

    /// Classifies a reply against the visible choices and marks it seen.
    pub fn select(&mut self, reply: &Reply, choices: &[Choice]) -> Selection {
        if !self.seen.insert(reply.id.clone()) {
            debug!(id = %reply.id, "Skipping reply already handled");
            return Selection::Duplicate;
        }

        let Some(token) = Self::extract_token(&reply.text) else {
            debug!(id = %reply.id, "Reply has no hashtag");
            return Selection::NoToken;
        };

        if let Some(choice) = Self::match_token(&token, choices) {
            debug!(id = %reply.id, %token, "Reply matches a choice");
            return Selection::Matched(choice.clone());
        }

        if choices.iter().filter(|c| c.hashtag() == &token).count() > 1 {
            warn!(id = %reply.id, %token, "Ignoring reply: hashtag names several choices");
            Selection::Ambiguous(token)
        } else {
            debug!(id = %reply.id, %token, "Reply matches no visible choice");
            Selection::NoMatch(token)
        }
    }

    /// Marks a reply id as handled without looking at it.
    pub fn mark_seen(&mut self, id: MessageId) {
        self.seen.insert(id);
    }

    /// Whether a reply id was already handled.
    pub fn is_seen(&self, id: &MessageId) -> bool {
        self.seen.contains(id)
    }

    /// Handled reply ids, sorted.
    pub fn seen_ids(&self) -> Vec<MessageId> {
        let mut ids: Vec<MessageId> = self.seen.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of handled replies.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
