//! Trait definitions for transports.

use crate::{MessageId, Reply};
use async_trait::async_trait;
use gamebook_error::TransportResult;

/// Narrow contract the game driver depends on.
///
/// Implementations hold their own authenticated session. The driver never
/// issues overlapping calls for the same playthrough, so implementations
/// only need to be safe to share between playthroughs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a message and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns a retryable error for transient faults (network, rate limit)
    /// and a permanent one when the service refuses the message.
    async fn publish(&self, text: &str) -> TransportResult<MessageId>;

    /// Fetch replies posted after `since`, oldest first.
    ///
    /// May return replies that were already returned by an earlier call.
    async fn search_replies(&self, since: &MessageId) -> TransportResult<Vec<Reply>>;

    /// Transport name (e.g., "console", "memory").
    fn name(&self) -> &str;
}
