//! Scripted in-memory transport for tests and dry runs.

use async_trait::async_trait;
use gamebook_error::{TransportError, TransportResult};
use gamebook_interface::{MessageId, Reply, Transport};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    published: Vec<(MessageId, String)>,
    searches: VecDeque<TransportResult<Vec<Reply>>>,
    publish_failures: VecDeque<TransportError>,
    search_calls: Vec<MessageId>,
}

/// Transport that records what is published and answers searches from a
/// script.
///
/// Each call to `search_replies` takes the next scripted result; once the
/// script runs out every search returns no replies. Message ids are
/// `m-1`, `m-2`, ... in publish order.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the replies returned by the next unscripted search.
    pub fn push_replies(&self, replies: Vec<Reply>) {
        self.state().searches.push_back(Ok(replies));
    }

    /// Queues a failure for the next unscripted search.
    pub fn push_search_error(&self, error: TransportError) {
        self.state().searches.push_back(Err(error));
    }

    /// Makes the next publish fail with `error`.
    pub fn push_publish_error(&self, error: TransportError) {
        self.state().publish_failures.push_back(error);
    }

    /// Text of every published message, in order.
    pub fn published(&self) -> Vec<String> {
        self.state()
            .published
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Ids and text of every published message, in order.
    pub fn published_messages(&self) -> Vec<(MessageId, String)> {
        self.state().published.clone()
    }

    /// The `since` argument of every search, in order.
    pub fn search_calls(&self) -> Vec<MessageId> {
        self.state().search_calls.clone()
    }

    /// Scripted search results not yet consumed.
    pub fn pending_searches(&self) -> usize {
        self.state().searches.len()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn publish(&self, text: &str) -> TransportResult<MessageId> {
        let mut state = self.state();
        if let Some(error) = state.publish_failures.pop_front() {
            debug!(error = %error, "MemoryTransport: scripted publish failure");
            return Err(error);
        }
        state.next_id += 1;
        let id = MessageId::new(format!("m-{}", state.next_id));
        debug!(id = %id, text_len = text.len(), "MemoryTransport: published");
        state.published.push((id.clone(), text.to_string()));
        Ok(id)
    }

    async fn search_replies(&self, since: &MessageId) -> TransportResult<Vec<Reply>> {
        let mut state = self.state();
        state.search_calls.push(since.clone());
        state.searches.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
