//! Where story documents come from.

use gamebook_error::{ConfigError, GamebookResult, HttpError};
use gamebook_story::{DocumentFormat, Story, StoryDocument};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// A story document location: a local file or an `https://` URL.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum StorySource {
    /// Local file
    #[display("{}", _0.display())]
    File(PathBuf),
    /// Remote document fetched over HTTPS
    #[display("{}", _0)]
    Url(String),
}

impl StorySource {
    /// Classifies a command-line source argument.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("https://") || source.starts_with("http://") {
            Self::Url(source.to_string())
        } else {
            Self::File(PathBuf::from(source))
        }
    }
}

/// Fetches a document body over HTTPS.
///
/// # Errors
///
/// Returns `HttpError` for plain-HTTP URLs, connection failures and any
/// status other than 200.
#[instrument]
pub async fn fetch_document(url: &str) -> GamebookResult<String> {
    if !url.starts_with("https://") {
        return Err(HttpError::new(format!("Refusing non-HTTPS source {}", url)).into());
    }

    let response = reqwest::get(url)
        .await
        .map_err(|e| HttpError::new(format!("Failed to fetch {}: {}", url, e)))?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(HttpError::new(format!("Fetching {} returned {}", url, status)).into());
    }

    let body = response
        .text()
        .await
        .map_err(|e| HttpError::new(format!("Failed to read body of {}: {}", url, e)))?;
    debug!(bytes = body.len(), "Fetched story document");
    Ok(body)
}

/// Reads and parses a document from its source.
#[instrument(skip_all, fields(source = %source))]
pub async fn load_document(source: &StorySource) -> GamebookResult<StoryDocument> {
    let document = match source {
        StorySource::File(path) => StoryDocument::from_file(path)?,
        StorySource::Url(url) => {
            let body = fetch_document(url).await?;
            let name = url.split(['?', '#']).next().unwrap_or(url);
            let format = DocumentFormat::detect(Some(Path::new(name)), &body);
            debug!(%format, "Parsing fetched document");
            StoryDocument::parse_as(format, &body)?
        }
    };
    Ok(document)
}

/// Reads, parses and validates a story from its source.
pub async fn load_story(source: &StorySource) -> GamebookResult<Story> {
    let document = load_document(source).await?;
    let story = Story::load(document)?;
    info!(
        title = story.title(),
        author = story.author().unwrap_or("unknown"),
        stitches = story.stitches().len(),
        "Story loaded"
    );
    Ok(story)
}

/// Rejects a source that cannot be read before anything else starts.
pub fn check_source(source: &StorySource) -> Result<(), ConfigError> {
    match source {
        StorySource::File(path) if !path.exists() => Err(ConfigError::new(format!(
            "Story file {} does not exist",
            path.display()
        ))),
        StorySource::Url(url) if !url.starts_with("https://") => Err(ConfigError::new(format!(
            "Only https:// sources are supported, got {}",
            url
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            StorySource::parse("https://example.com/cave.json"),
            StorySource::Url("https://example.com/cave.json".to_string())
        );
        assert_eq!(
            StorySource::parse("stories/cave.toml"),
            StorySource::File(PathBuf::from("stories/cave.toml"))
        );
    }

    #[test]
    fn test_check_source() {
        assert!(check_source(&StorySource::parse("/no/such/story.toml")).is_err());
        assert!(check_source(&StorySource::parse("http://example.com/a.json")).is_err());
        assert!(check_source(&StorySource::parse("https://example.com/a.json")).is_ok());
    }

    #[tokio::test]
    async fn test_plain_http_refused() {
        let err = fetch_document("http://example.com/story.json")
            .await
            .unwrap_err();
        assert!(format!("{}", err).contains("non-HTTPS"));
    }
}
