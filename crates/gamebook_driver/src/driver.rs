//! The playthrough state machine.

use crate::checkpoint::{CheckpointStore, SessionCheckpoint};
use crate::compose::{closing_message, options_message, page_messages};
use crate::config::{DriverConfig, TimeoutPolicy};
use crate::reply::{ReplySelector, Selection};
use derive_getters::Getters;
use gamebook_error::{
    DriverError, DriverErrorKind, DriverResult, JsonError, RetryableError, StoryErrorKind,
};
use gamebook_interface::{MessageId, Transport};
use gamebook_story::{Advance, Choice, Hashtag, Page, Story};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;
use tokio_retry2::strategy::FixedInterval;
use tokio_retry2::{Retry, RetryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Where the driver is in a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DriverState {
    /// Publishing the current page.
    Rendering,
    /// Waiting for a reply that picks a visible choice.
    Polling,
    /// Applying the picked choice to the story.
    Deciding,
    /// The story is over.
    Ended,
    /// No reply picked a choice in time.
    TimedOut,
}

/// How a run finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The story reached its end and the closing message went out.
    Ended,
    /// The page `stitch` got no usable reply in time.
    TimedOut {
        /// Key of the unanswered page
        stitch: String,
    },
    /// The cancellation token fired.
    Cancelled,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RunReport {
    /// How the run finished
    outcome: RunOutcome,
    /// Pages published
    pages_rendered: u32,
    /// Hashtags of the options taken, in order
    choices: Vec<Hashtag>,
    /// Distinct replies examined
    replies_seen: usize,
}

enum PollOutcome {
    Matched(Choice),
    Expired,
    Cancelled,
}

/// Plays one story through one transport.
///
/// Each driver owns its story, flags and seen-reply set, so several drivers
/// can share a transport without sharing any playthrough state.
pub struct GameDriver {
    story: Story,
    transport: Arc<dyn Transport>,
    config: DriverConfig,
    cancel: CancellationToken,
    checkpoints: Option<CheckpointStore>,
    selector: ReplySelector,
    state: DriverState,
    page: Option<Page>,
    options_message: Option<MessageId>,
    pending: Option<Choice>,
    pages_rendered: u32,
    choices: Vec<Hashtag>,
}

impl GameDriver {
    /// Create a builder for a driver.
    pub fn builder() -> GameDriverBuilder {
        GameDriverBuilder::default()
    }

    /// Current state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The story being played.
    pub fn story(&self) -> &Story {
        &self.story
    }

    /// Run configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Token that stops the run between polls.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Play from the current story position until a terminal state.
    ///
    /// Starting flags from the configuration are set first.
    ///
    /// # Errors
    ///
    /// Returns error on a permanent transport failure, when polling or
    /// publishing runs out of retries, or when a checkpoint cannot be
    /// written. No transport call is made after the error.
    #[instrument(skip(self), fields(title = %self.story.title(), transport = %self.transport.name()))]
    pub async fn play(&mut self) -> DriverResult<RunReport> {
        if !self.config.starting_flags().is_empty() {
            let mut flags = self.story.flags();
            for name in self.config.starting_flags() {
                flags.insert(name.clone(), true);
            }
            self.story.set_flags(&flags);
            debug!(count = self.config.starting_flags().len(), "Applied starting flags");
        }
        self.state = DriverState::Rendering;
        self.run().await
    }

    /// Pick up a poll cycle saved in a checkpoint.
    ///
    /// The story is moved to the saved page with the saved flags and the
    /// driver goes straight back to polling the saved options message;
    /// nothing is re-published.
    ///
    /// # Errors
    ///
    /// Returns error if the checkpoint belongs to another story or names a
    /// page this story lacks, and otherwise as [`GameDriver::play`].
    #[instrument(skip_all, fields(title = %self.story.title(), stitch = %checkpoint.stitch()))]
    pub async fn resume(&mut self, checkpoint: SessionCheckpoint) -> DriverResult<RunReport> {
        if checkpoint.title() != self.story.title() {
            return Err(DriverError::from(JsonError::new(format!(
                "Checkpoint is for '{}', not '{}'",
                checkpoint.title(),
                self.story.title()
            ))));
        }
        self.story.restore(checkpoint.stitch(), checkpoint.flags())?;
        self.page = Some(self.story.current_page()?);
        self.options_message = Some(checkpoint.options_message().clone());
        self.selector = ReplySelector::with_seen(checkpoint.seen().iter().cloned());
        self.state = DriverState::Polling;
        info!("Resuming poll cycle");
        self.run().await
    }

    async fn run(&mut self) -> DriverResult<RunReport> {
        let outcome = match self.drive().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, state = %self.state, "Run aborted");
                return Err(e);
            }
        };

        if outcome != RunOutcome::Cancelled {
            if let Some(store) = &self.checkpoints {
                store.clear()?;
            }
        }

        let report = RunReport {
            outcome,
            pages_rendered: self.pages_rendered,
            choices: self.choices.clone(),
            replies_seen: self.selector.seen_count(),
        };
        info!(
            outcome = ?report.outcome,
            pages = report.pages_rendered,
            choices = report.choices.len(),
            "Run finished"
        );
        Ok(report)
    }

    async fn drive(&mut self) -> DriverResult<RunOutcome> {
        loop {
            if self.cancel.is_cancelled()
                && !matches!(self.state, DriverState::Ended | DriverState::TimedOut)
            {
                info!(state = %self.state, "Run cancelled");
                return Ok(RunOutcome::Cancelled);
            }
            debug!(state = %self.state, "Driver step");

            self.state = match self.state {
                DriverState::Rendering => self.render().await?,
                DriverState::Polling => match self.poll().await? {
                    PollOutcome::Matched(choice) => {
                        self.pending = Some(choice);
                        DriverState::Deciding
                    }
                    PollOutcome::Expired => self.on_timeout(),
                    PollOutcome::Cancelled => {
                        info!("Run cancelled while polling");
                        return Ok(RunOutcome::Cancelled);
                    }
                },
                DriverState::Deciding => self.decide()?,
                DriverState::Ended => {
                    let text = closing_message(
                        self.story.title(),
                        self.story.author(),
                        self.config.closing_message().as_deref(),
                    );
                    self.publish(&text).await?;
                    info!("GAMEEND {}", self.story.title());
                    return Ok(RunOutcome::Ended);
                }
                DriverState::TimedOut => {
                    let stitch = self.page_key();
                    info!(stitch = %stitch, "Page timed out, stopping");
                    return Ok(RunOutcome::TimedOut { stitch });
                }
            };
        }
    }

    /// Publishes the current page and decides how to wait on it.
    async fn render(&mut self) -> DriverResult<DriverState> {
        let page = self.story.current_page()?;
        self.pages_rendered += 1;
        self.options_message = None;

        for text in page_messages(&page) {
            self.publish(&text).await?;
        }

        if page.is_ending() {
            info!(stitch = %page.key(), "Page offers no choices");
            self.page = Some(page);
            return Ok(DriverState::Ended);
        }

        info!(stitch = %page.key(), flags = ?self.story.flags(), "Offering choices");

        if *self.config.auto_advance_single_option() && page.choices().len() == 1 {
            debug!(stitch = %page.key(), "Following the only visible choice");
            self.pending = page.choices().first().cloned();
            self.page = Some(page);
            return Ok(DriverState::Deciding);
        }

        let id = self.publish(&options_message(&page)).await?;
        self.options_message = Some(id);
        self.page = Some(page);
        self.save_checkpoint()?;
        Ok(DriverState::Polling)
    }

    /// Searches for a matching reply until one arrives, the page expires,
    /// or the run is cancelled.
    async fn poll(&mut self) -> DriverResult<PollOutcome> {
        let since = self.options_message.clone().ok_or_else(|| {
            DriverError::new(DriverErrorKind::MissingComponent(
                "options message to poll".to_string(),
            ))
        })?;
        let choices = self
            .page
            .as_ref()
            .map(|page| page.choices().clone())
            .unwrap_or_default();

        let sleep_interval = *self.config.sleep_interval();
        let deadline = Instant::now() + *self.config.timeout();
        let max_failures = *self.config.max_consecutive_failures();
        let mut failures = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled);
            }

            match self.transport.search_replies(&since).await {
                Ok(replies) => {
                    failures = 0;
                    let before = self.selector.seen_count();
                    for reply in &replies {
                        if let Selection::Matched(choice) = self.selector.select(reply, &choices) {
                            info!(reply = %reply.id, choice = %choice.hashtag(), "Reply selected a choice");
                            return Ok(PollOutcome::Matched(choice));
                        }
                    }
                    if self.selector.seen_count() != before {
                        self.save_checkpoint()?;
                    }
                }
                Err(e) if e.is_retryable() => {
                    failures += 1;
                    if failures > max_failures {
                        error!(error = %e, failures, "Reply search keeps failing");
                        return Err(DriverError::new(DriverErrorKind::TransportExhausted {
                            attempts: failures,
                            last: e,
                        }));
                    }
                    warn!(error = %e, failures, max_failures, "Reply search failed, will retry");
                }
                Err(e) => {
                    error!(error = %e, "Reply search failed permanently");
                    return Err(e.into());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(PollOutcome::Expired);
            }
            let wait = sleep_interval.min(deadline - now);
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    fn on_timeout(&mut self) -> DriverState {
        let choices = self
            .page
            .as_ref()
            .map(|page| page.choices().clone())
            .unwrap_or_default();

        let fallback = match self.config.on_timeout() {
            TimeoutPolicy::Stop => None,
            TimeoutPolicy::FirstOption => choices.first().cloned(),
            TimeoutPolicy::Hashtag(tag) => {
                let choice = ReplySelector::match_token(tag, &choices).cloned();
                if choice.is_none() {
                    warn!(hashtag = %tag, "Fallback hashtag is not a visible choice");
                }
                choice
            }
        };

        match fallback {
            Some(choice) => {
                warn!(choice = %choice.hashtag(), "No reply in time, taking fallback choice");
                self.pending = Some(choice);
                DriverState::Deciding
            }
            None => DriverState::TimedOut,
        }
    }

    fn decide(&mut self) -> DriverResult<DriverState> {
        let choice = self.pending.take().ok_or_else(|| {
            DriverError::new(DriverErrorKind::MissingComponent(
                "choice to apply".to_string(),
            ))
        })?;

        match self.story.advance(choice.label()) {
            Ok(Advance::Next(_)) => {
                self.choices.push(choice.hashtag().clone());
                Ok(DriverState::Rendering)
            }
            Ok(Advance::End) => {
                self.choices.push(choice.hashtag().clone());
                Ok(DriverState::Ended)
            }
            Err(e) if matches!(e.kind(), StoryErrorKind::InvalidChoice { .. }) => {
                warn!(error = %e, "Choice no longer available, rendering the page again");
                Ok(DriverState::Rendering)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Publishes with retries for transient faults.
    async fn publish(&self, text: &str) -> DriverResult<MessageId> {
        let attempts = *self.config.publish_attempts();
        let strategy = FixedInterval::new(*self.config.sleep_interval())
            .take(attempts.saturating_sub(1) as usize);
        let tried = AtomicU32::new(0);

        let result = Retry::spawn(strategy, || {
            let transport = Arc::clone(&self.transport);
            let text = text.to_string();
            tried.fetch_add(1, Ordering::Relaxed);
            async move {
                match transport.publish(&text).await {
                    Ok(id) => Ok(id),
                    Err(e) if e.is_retryable() => {
                        warn!(error = %e, "Publish failed, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => Err(RetryError::Permanent(e)),
                }
            }
        })
        .await;

        match result {
            Ok(id) => {
                debug!(id = %id, "Published");
                Ok(id)
            }
            Err(e) if e.is_retryable() => Err(DriverError::new(DriverErrorKind::TransportExhausted {
                attempts: tried.load(Ordering::Relaxed),
                last: e,
            })),
            Err(e) => Err(e.into()),
        }
    }

    fn save_checkpoint(&self) -> DriverResult<()> {
        let Some(store) = &self.checkpoints else {
            return Ok(());
        };
        let (Some(page), Some(message)) = (&self.page, &self.options_message) else {
            return Ok(());
        };
        store.save(&SessionCheckpoint::new(
            self.story.title(),
            page.key().clone(),
            self.story.flags(),
            message.clone(),
            self.selector.seen_ids(),
        ))?;
        Ok(())
    }

    fn page_key(&self) -> String {
        self.page
            .as_ref()
            .map(|page| page.key().clone())
            .or_else(|| self.story.current_key().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Builder for creating [`GameDriver`] instances.
#[derive(Default)]
pub struct GameDriverBuilder {
    story: Option<Story>,
    transport: Option<Arc<dyn Transport>>,
    config: Option<DriverConfig>,
    cancel: Option<CancellationToken>,
}

impl GameDriverBuilder {
    /// Set the story to play.
    pub fn story(mut self, story: Story) -> Self {
        self.story = Some(story);
        self
    }

    /// Set the transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the run configuration (defaults otherwise).
    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an external cancellation token.
    pub fn cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the driver.
    ///
    /// # Errors
    ///
    /// Returns error if the story or the transport is missing.
    pub fn build(self) -> DriverResult<GameDriver> {
        let story = self.story.ok_or_else(|| {
            DriverError::new(DriverErrorKind::MissingComponent("story".to_string()))
        })?;
        let transport = self.transport.ok_or_else(|| {
            DriverError::new(DriverErrorKind::MissingComponent("transport".to_string()))
        })?;
        let config = self.config.unwrap_or_default();
        let checkpoints = config.checkpoint_path().as_ref().map(CheckpointStore::new);

        Ok(GameDriver {
            story,
            transport,
            config,
            cancel: self.cancel.unwrap_or_default(),
            checkpoints,
            selector: ReplySelector::new(),
            state: DriverState::Rendering,
            page: None,
            options_message: None,
            pending: None,
            pages_rendered: 0,
            choices: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::MemoryTransport;
    use gamebook_story::Destination;

    const GATE: &str = r#"
title = "The Gate"

[[stitches]]
key = "gate"
text = ["A guard blocks the gate."]
options = [
    { label = "Greet", target = "gate", unless = ["met_guard"], set = ["met_guard"] },
    { label = "Pass", target = "end", if = ["met_guard"] },
]
"#;

    #[tokio::test]
    async fn test_hidden_choice_renders_same_page_again() {
        let transport = Arc::new(MemoryTransport::new());
        let story = Story::load(GATE.parse().unwrap()).unwrap();
        let mut driver = GameDriver::builder()
            .story(story)
            .transport(transport.clone())
            .build()
            .unwrap();

        driver.state = driver.render().await.unwrap();
        assert_eq!(driver.state, DriverState::Polling);
        let first_render = transport.published();

        // "Pass" is hidden until met_guard is set.
        driver.pending = Some(Choice::new(
            "Pass",
            Hashtag::parse("pass").unwrap(),
            Destination::End,
        ));
        driver.state = driver.decide().unwrap();
        assert_eq!(driver.state, DriverState::Rendering);
        assert_eq!(driver.story.current_key(), Some("gate"));
        assert!(!driver.story.flag("met_guard"));
        assert!(driver.choices.is_empty());

        driver.state = driver.render().await.unwrap();
        assert_eq!(driver.state, DriverState::Polling);
        assert_eq!(driver.pages_rendered, 2);
        let published = transport.published();
        assert_eq!(published.len(), first_render.len() * 2);
        assert_eq!(published[first_render.len()..], first_render[..]);
    }
}
