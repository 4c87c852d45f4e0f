//! The story graph and its navigation state.

use crate::condition::{Condition, FlagId, FlagTable};
use crate::document::{DocumentParagraph, END_KEY, StoryDocument};
use crate::hashtag::Hashtag;
use crate::stitch::{
    Choice, Destination, Page, Paragraph, Stitch, StitchId, StitchOption, Target,
};
use gamebook_error::{StoryError, StoryErrorKind, StoryResult};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Result of taking an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The story moved to the stitch with this key
    Next(String),
    /// The option led to the end of the story
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    At(StitchId),
    Ended,
}

/// A loaded story and the state of one playthrough.
///
/// Stitches are fixed after [`Story::load`]. Flags change only through
/// [`Story::advance`] (effects of the chosen option) and the explicit
/// [`Story::set_flags`] / [`Story::restore`] calls.
#[derive(Debug, Clone)]
pub struct Story {
    title: String,
    author: Option<String>,
    stitches: Vec<Stitch>,
    index: HashMap<String, StitchId>,
    start: StitchId,
    flags: FlagTable,
    visit_counts: Vec<u32>,
    position: Position,
    activated: bool,
}

impl Story {
    /// Validates a document and resolves it into a playable story.
    ///
    /// # Errors
    ///
    /// - `Parse` for empty or reserved keys, labels without letters or
    ///   digits, blank flag names and contradictory conditions
    /// - `DuplicateStitch` when two stitches share a key
    /// - `Reference` when the start key or an option target does not exist
    #[instrument(skip_all, fields(title = %document.title))]
    pub fn load(document: StoryDocument) -> StoryResult<Self> {
        if document.stitches.is_empty() {
            return Err(parse_error("story has no stitches"));
        }

        let mut index = HashMap::with_capacity(document.stitches.len());
        for (i, stitch) in document.stitches.iter().enumerate() {
            if stitch.key.trim().is_empty() {
                return Err(parse_error(format!("stitch #{} has an empty key", i + 1)));
            }
            if stitch.key == END_KEY {
                return Err(parse_error(format!(
                    "'{}' is reserved for the end of the story and cannot be a stitch key",
                    END_KEY
                )));
            }
            if index.insert(stitch.key.clone(), StitchId(i)).is_some() {
                return Err(StoryError::new(StoryErrorKind::DuplicateStitch(
                    stitch.key.clone(),
                )));
            }
        }

        let start_key = document
            .start_key()
            .map(str::to_string)
            .unwrap_or_default();
        let start = *index.get(&start_key).ok_or_else(|| {
            StoryError::new(StoryErrorKind::Reference {
                from: document.title.clone(),
                target: start_key.clone(),
            })
        })?;

        let mut flags = FlagTable::new();
        let mut stitches = Vec::with_capacity(document.stitches.len());
        for stitch in document.stitches {
            let key = stitch.key;

            let mut paragraphs = Vec::with_capacity(stitch.text.len());
            for paragraph in stitch.text {
                let (text, condition) = match paragraph {
                    DocumentParagraph::Plain(text) => (text, Condition::Always),
                    DocumentParagraph::Conditional {
                        text,
                        if_flags,
                        unless,
                    } => {
                        let condition =
                            resolve_condition(&mut flags, &key, &if_flags, &unless)?;
                        (text, condition)
                    }
                };
                paragraphs.push(Paragraph::new(text, condition));
            }

            let mut options = Vec::with_capacity(stitch.options.len());
            for option in stitch.options {
                let hashtag = option.hashtag.or_else(|| Hashtag::from_label(&option.label));
                let hashtag = hashtag.ok_or_else(|| {
                    parse_error(format!(
                        "option '{}' on stitch '{}' has no letters or digits to form a hashtag",
                        option.label, key
                    ))
                })?;
                let target = if option.target == END_KEY {
                    Target::End
                } else {
                    let id = index.get(&option.target).ok_or_else(|| {
                        StoryError::new(StoryErrorKind::Reference {
                            from: key.clone(),
                            target: option.target.clone(),
                        })
                    })?;
                    Target::Stitch(*id)
                };
                let condition =
                    resolve_condition(&mut flags, &key, &option.if_flags, &option.unless)?;
                let effects = intern_all(&mut flags, &key, &option.set)?;
                options.push(StitchOption::new(
                    option.label,
                    hashtag,
                    target,
                    condition,
                    effects,
                ));
            }

            stitches.push(Stitch::new(key, stitch.title, paragraphs, options));
        }

        for id in intern_all(&mut flags, &start_key, &document.initial_flags)? {
            flags.set(id, true);
        }

        debug!(
            stitches = stitches.len(),
            flags = flags.len(),
            start = %start_key,
            "Story loaded"
        );

        Ok(Self {
            title: document.title,
            author: document.author,
            visit_counts: vec![0; stitches.len()],
            stitches,
            index,
            start,
            flags,
            position: Position::At(start),
            activated: false,
        })
    }

    /// Reads a document from disk and loads it.
    pub fn from_file(path: impl AsRef<Path>) -> StoryResult<Self> {
        Self::load(StoryDocument::from_file(path)?)
    }

    /// The active stitch's visible text and visible choices.
    ///
    /// The first call after the stitch becomes current counts as a visit;
    /// further calls for the same activation do not.
    ///
    /// # Errors
    ///
    /// `Finished` once the story has reached its end.
    pub fn current_page(&mut self) -> StoryResult<Page> {
        let id = self.current_id()?;
        if !self.activated {
            self.visit_counts[id.0] += 1;
            self.activated = true;
        }
        let stitch = &self.stitches[id.0];

        let paragraphs = stitch
            .paragraphs()
            .iter()
            .filter(|p| p.condition().evaluate(&self.flags))
            .map(|p| p.text().clone())
            .collect();
        let choices = self
            .visible_options(id)
            .map(|option| {
                let destination = match option.target() {
                    Target::Stitch(next) => Destination::Stitch(self.stitches[next.0].key().clone()),
                    Target::End => Destination::End,
                };
                Choice::new(option.label().clone(), option.hashtag().clone(), destination)
            })
            .collect();

        Ok(Page::new(
            stitch.key().clone(),
            stitch.title().clone(),
            paragraphs,
            choices,
        ))
    }

    /// Takes the visible option labelled `chosen_label`.
    ///
    /// Hidden options cannot be taken even if the label matches. The
    /// option's effects are applied before moving.
    ///
    /// # Errors
    ///
    /// `InvalidChoice` if no visible option has that label, `Finished` if
    /// the story already ended. Neither changes any state.
    #[instrument(skip(self), fields(stitch = self.current_key().unwrap_or(END_KEY)))]
    pub fn advance(&mut self, chosen_label: &str) -> StoryResult<Advance> {
        let id = self.current_id()?;
        let option = self
            .visible_options(id)
            .find(|option| option.label() == chosen_label)
            .cloned()
            .ok_or_else(|| {
                StoryError::new(StoryErrorKind::InvalidChoice {
                    stitch: self.stitches[id.0].key().clone(),
                    label: chosen_label.to_string(),
                })
            })?;

        for flag in option.effects() {
            self.flags.set(*flag, true);
        }
        self.activated = false;

        match option.target() {
            Target::Stitch(next) => {
                self.position = Position::At(*next);
                let key = self.stitches[next.0].key().clone();
                info!(choice = %option.hashtag(), next = %key, "Advanced");
                Ok(Advance::Next(key))
            }
            Target::End => {
                self.position = Position::Ended;
                info!(choice = %option.hashtag(), "Reached the end");
                Ok(Advance::End)
            }
        }
    }

    /// Snapshot of every known flag.
    pub fn flags(&self) -> BTreeMap<String, bool> {
        self.flags.to_map()
    }

    /// Whether a flag is set. Unknown names are unset.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.is_set_by_name(name)
    }

    /// Replaces the whole flag table. No option effects are re-run.
    pub fn set_flags(&mut self, flags: &BTreeMap<String, bool>) {
        debug!(count = flags.len(), "Overwriting flags");
        self.flags.overwrite(flags);
    }

    /// Hashtags of the options currently visible; empty once ended.
    pub fn hashtags(&self) -> Vec<Hashtag> {
        match self.position {
            Position::At(id) => self
                .visible_options(id)
                .map(|option| option.hashtag().clone())
                .collect(),
            Position::Ended => Vec::new(),
        }
    }

    /// Moves to `key` with the given flags, as when resuming a session.
    ///
    /// # Errors
    ///
    /// `UnknownStitch` if the key is not part of this story.
    pub fn restore(&mut self, key: &str, flags: &BTreeMap<String, bool>) -> StoryResult<()> {
        let id = *self
            .index
            .get(key)
            .ok_or_else(|| StoryError::new(StoryErrorKind::UnknownStitch(key.to_string())))?;
        self.flags.overwrite(flags);
        self.position = Position::At(id);
        self.activated = false;
        debug!(key, "Restored story position");
        Ok(())
    }

    /// How many times the stitch has become current and been shown.
    pub fn visit_count(&self, key: &str) -> u32 {
        self.index
            .get(key)
            .map(|id| self.visit_counts[id.0])
            .unwrap_or(0)
    }

    /// Key of the active stitch, or `None` once ended.
    pub fn current_key(&self) -> Option<&str> {
        match self.position {
            Position::At(id) => Some(self.stitches[id.0].key().as_str()),
            Position::Ended => None,
        }
    }

    /// True once an option leading to the end has been taken.
    pub fn is_finished(&self) -> bool {
        self.position == Position::Ended
    }

    /// Looks up a stitch by key.
    pub fn stitch(&self, key: &str) -> Option<&Stitch> {
        self.index.get(key).map(|id| &self.stitches[id.0])
    }

    /// All stitches in authoring order.
    pub fn stitches(&self) -> &[Stitch] {
        &self.stitches
    }

    /// Key of the first stitch.
    pub fn start_key(&self) -> &str {
        self.stitches[self.start.0].key()
    }

    /// Story title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Story author, if credited.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    fn current_id(&self) -> StoryResult<StitchId> {
        match self.position {
            Position::At(id) => Ok(id),
            Position::Ended => Err(StoryError::new(StoryErrorKind::Finished)),
        }
    }

    fn visible_options(&self, id: StitchId) -> impl Iterator<Item = &StitchOption> {
        self.stitches[id.0]
            .options()
            .iter()
            .filter(|option| option.condition().evaluate(&self.flags))
    }
}

fn parse_error(message: impl Into<String>) -> StoryError {
    StoryError::new(StoryErrorKind::Parse(message.into()))
}

fn intern_all(flags: &mut FlagTable, key: &str, names: &[String]) -> StoryResult<Vec<FlagId>> {
    names
        .iter()
        .map(|name| {
            if name.trim().is_empty() {
                Err(parse_error(format!("blank flag name on stitch '{}'", key)))
            } else {
                Ok(flags.intern(name))
            }
        })
        .collect()
}

fn resolve_condition(
    flags: &mut FlagTable,
    key: &str,
    if_flags: &[String],
    unless: &[String],
) -> StoryResult<Condition> {
    if let Some(name) = if_flags.iter().find(|name| unless.contains(name)) {
        return Err(parse_error(format!(
            "flag '{}' is both required and forbidden on stitch '{}'",
            name, key
        )));
    }
    let required = intern_all(flags, key, if_flags)?;
    let forbidden = intern_all(flags, key, unless)?;
    Ok(Condition::from_lists(&required, &forbidden))
}
