//! Text of the messages the driver publishes.

use gamebook_story::Page;

/// Line closing every options message.
pub const REPLY_PROMPT: &str = "Reply with a hashtag to choose.";

/// One message per visible paragraph; the page title leads the first.
pub fn page_messages(page: &Page) -> Vec<String> {
    let mut messages: Vec<String> = page.paragraphs().clone();
    if let Some(title) = page.title() {
        match messages.first_mut() {
            Some(first) => *first = format!("{}\n\n{}", title, first),
            None => messages.push(title.clone()),
        }
    }
    messages
}

/// The message listing the visible choices with their hashtags.
///
/// ```
/// use gamebook_driver::options_message;
/// use gamebook_story::{Choice, Destination, Hashtag, Page};
///
/// let page = Page::new(
///     "fork",
///     None,
///     vec!["Two paths.".to_string()],
///     vec![Choice::new("Go left", Hashtag::parse("goleft").unwrap(), Destination::End)],
/// );
/// assert!(options_message(&page).starts_with("* Go left (#goleft)"));
/// ```
pub fn options_message(page: &Page) -> String {
    let mut lines: Vec<String> = page
        .choices()
        .iter()
        .map(|choice| format!("* {} ({})", choice.label(), choice.hashtag()))
        .collect();
    lines.push(String::new());
    lines.push(REPLY_PROMPT.to_string());
    lines.join("\n")
}

/// The message published when the story ends.
pub fn closing_message(title: &str, author: Option<&str>, custom: Option<&str>) -> String {
    match (custom, author) {
        (Some(text), _) => text.to_string(),
        (None, Some(author)) => format!("Thank you for playing {} by {}", title, author),
        (None, None) => format!("Thank you for playing {}", title),
    }
}
