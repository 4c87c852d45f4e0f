//! Story validation command handler.

use gamebook::{GamebookResult, StorySource, check_source, load_story};

/// Loads a story, validating every reference, and prints a summary.
pub async fn check_story(source: &str) -> GamebookResult<()> {
    let source = StorySource::parse(source);
    check_source(&source)?;
    let story = load_story(&source).await?;

    let endings = story.stitches().iter().filter(|s| s.is_ending()).count();
    println!("Title:    {}", story.title());
    println!("Author:   {}", story.author().unwrap_or("(none)"));
    println!("Stitches: {} ({} endings)", story.stitches().len(), endings);
    println!("Start:    {}", story.start_key());
    Ok(())
}
