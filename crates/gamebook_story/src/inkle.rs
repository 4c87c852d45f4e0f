//! Import of inklewriter JSON exports.
//!
//! Inklewriter stitches are smaller than pages: a page is a chain of
//! stitches joined by diverts that ends in a stitch with options (or with
//! nothing, which is an ending). Import walks every chain reachable from the
//! initial stitch and turns it into one [`DocumentStitch`].
//!
//! Flags named anywhere along a chain are set when its page is entered,
//! before any of its paragraphs are evaluated.

use crate::document::{DocumentOption, DocumentParagraph, DocumentStitch, END_KEY, StoryDocument};
use crate::hashtag::Hashtag;
use gamebook_error::{StoryError, StoryErrorKind, StoryResult};
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct InkleFile {
    title: String,
    data: InkleData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InkleData {
    initial: String,
    #[serde(default)]
    editor_data: Option<InkleEditorData>,
    stitches: HashMap<String, InkleStitch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InkleEditorData {
    #[serde(default)]
    author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InkleStitch {
    #[serde(default)]
    content: Vec<InkleContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InkleContent {
    Text(String),
    Item(InkleItem),
}

/// One record of a stitch's content; each carries exactly one of these.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InkleItem {
    divert: Option<String>,
    option: Option<String>,
    link_path: Option<String>,
    if_conditions: Option<Vec<InkleConditionRef>>,
    not_if_conditions: Option<Vec<InkleConditionRef>>,
    flag_name: Option<String>,
    page_label: Option<String>,
    if_condition: Option<String>,
    not_if_condition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InkleConditionRef {
    if_condition: Option<String>,
    not_if_condition: Option<String>,
}

/// A chain of stitches collapsed into one page, before option effects are known.
struct ChainPage {
    stitch: DocumentStitch,
    flags: Vec<String>,
}

/// Converts a parsed inklewriter export into a native document.
#[instrument(skip_all)]
pub(crate) fn import(value: serde_json::Value) -> StoryResult<StoryDocument> {
    let file: InkleFile = serde_json::from_value(value)
        .map_err(|e| StoryError::new(StoryErrorKind::Parse(format!("inklewriter: {}", e))))?;
    let stitches = &file.data.stitches;
    let initial = file.data.initial.clone();

    let mut pages: Vec<ChainPage> = Vec::new();
    let mut queued: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, String)> = VecDeque::new();
    queued.insert(initial.clone());
    queue.push_back((initial.clone(), "initial".to_string()));

    while let Some((head, from)) = queue.pop_front() {
        let page = collapse_chain(stitches, &head, &from)?;
        for option in &page.stitch.options {
            if option.target != END_KEY && queued.insert(option.target.clone()) {
                queue.push_back((option.target.clone(), head.clone()));
            }
        }
        pages.push(page);
    }

    let chain_flags: HashMap<String, Vec<String>> = pages
        .iter()
        .map(|p| (p.stitch.key.clone(), p.flags.clone()))
        .collect();
    let initial_flags = chain_flags.get(&initial).cloned().unwrap_or_default();

    let document_stitches = pages
        .into_iter()
        .map(|page| {
            let mut stitch = page.stitch;
            for option in &mut stitch.options {
                if let Some(flags) = chain_flags.get(&option.target) {
                    option.set = flags.clone();
                }
            }
            stitch
        })
        .collect::<Vec<_>>();

    debug!(
        title = %file.title,
        pages = document_stitches.len(),
        source_stitches = stitches.len(),
        "Imported inklewriter story"
    );

    Ok(StoryDocument {
        title: file.title,
        author: file
            .data
            .editor_data
            .and_then(|e| e.author_name)
            .filter(|name| !name.trim().is_empty()),
        start: Some(initial),
        initial_flags,
        stitches: document_stitches,
    })
}

/// Follows diverts from `head` and merges the chain into a single page.
fn collapse_chain(
    stitches: &HashMap<String, InkleStitch>,
    head: &str,
    from: &str,
) -> StoryResult<ChainPage> {
    let mut page = DocumentStitch {
        key: head.to_string(),
        title: None,
        text: Vec::new(),
        options: Vec::new(),
    };
    let mut flags = Vec::new();
    let mut in_chain = HashSet::new();
    let mut current = head.to_string();
    let mut referrer = from.to_string();

    loop {
        if !in_chain.insert(current.clone()) {
            return Err(StoryError::new(StoryErrorKind::Parse(format!(
                "divert cycle through stitch '{}'",
                current
            ))));
        }
        let stitch = stitches.get(&current).ok_or_else(|| {
            StoryError::new(StoryErrorKind::Reference {
                from: referrer.clone(),
                target: current.clone(),
            })
        })?;

        let mut text = String::new();
        let mut if_flags = Vec::new();
        let mut unless = Vec::new();
        let mut divert = None;
        let mut options = Vec::new();

        for content in &stitch.content {
            match content {
                InkleContent::Text(t) => text.push_str(t),
                InkleContent::Item(item) => {
                    if let Some(target) = &item.divert {
                        divert = Some(target.clone());
                    }
                    if let Some(label) = &item.option {
                        options.push(convert_option(label, item));
                    }
                    if let Some(flag) = &item.flag_name {
                        flags.push(flag.clone());
                    }
                    if let Some(label) = &item.page_label {
                        if page.title.is_none() && !label.trim().is_empty() {
                            page.title = Some(label.clone());
                        }
                    }
                    if let Some(flag) = &item.if_condition {
                        if_flags.push(flag.clone());
                    }
                    if let Some(flag) = &item.not_if_condition {
                        unless.push(flag.clone());
                    }
                }
            }
        }

        if !text.trim().is_empty() {
            let paragraph = if if_flags.is_empty() && unless.is_empty() {
                DocumentParagraph::Plain(text)
            } else {
                DocumentParagraph::conditional(text, if_flags, unless)
            };
            page.text.push(paragraph);
        }

        match divert {
            Some(next) => {
                // A divert wins; options beside it are never reachable.
                if !options.is_empty() {
                    warn!(
                        stitch = %current,
                        ignored = options.len(),
                        "Ignoring options on a stitch that diverts"
                    );
                }
                referrer = current;
                current = next;
            }
            None => {
                page.options = options;
                break;
            }
        }
    }

    Ok(ChainPage {
        stitch: page,
        flags,
    })
}

fn convert_option(label: &str, item: &InkleItem) -> DocumentOption {
    // Stories written for the bot carry their reply tag in the label.
    let (label, hashtag) = match Hashtag::split_label(label) {
        Some((label, tag)) => (label, Some(tag)),
        None => (label.to_string(), None),
    };
    DocumentOption {
        label,
        hashtag,
        target: item.link_path.clone().unwrap_or_else(|| END_KEY.to_string()),
        if_flags: flag_names(&item.if_conditions, |c| c.if_condition.as_ref()),
        unless: flag_names(&item.not_if_conditions, |c| c.not_if_condition.as_ref()),
        set: Vec::new(),
    }
}

fn flag_names(
    refs: &Option<Vec<InkleConditionRef>>,
    pick: impl Fn(&InkleConditionRef) -> Option<&String>,
) -> Vec<String> {
    refs.iter().flatten().filter_map(pick).cloned().collect()
}
