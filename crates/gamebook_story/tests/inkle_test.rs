use gamebook_story::{
    Advance, DocumentFormat, DocumentParagraph, Hashtag, Story, StoryDocument, StoryErrorKind,
};
use std::collections::BTreeMap;

const INKLE: &str = r#"{
  "title": "Inkle Cave",
  "data": {
    "initial": "start",
    "editorData": { "authorName": "Jo", "textSize": 0 },
    "allowCheckpoints": false,
    "stitches": {
      "start": { "content": [
        "You wake.",
        { "pageNum": 1 },
        { "pageLabel": "Waking" },
        { "divert": "lookAround" }
      ] },
      "lookAround": { "content": [
        "The room is dark.",
        { "flagName": "awake" },
        { "option": "Light a match", "linkPath": "lit", "ifConditions": null, "notIfConditions": null },
        { "option": "Sleep", "linkPath": null, "ifConditions": null, "notIfConditions": null }
      ] },
      "lit": { "content": [
        "Shadows dance.",
        { "flagName": "has_light" },
        { "divert": "litMore" }
      ] },
      "litMore": { "content": [
        "A door.",
        { "ifCondition": "has_key" },
        { "option": "Open door", "linkPath": "door", "ifConditions": [{ "ifCondition": "has_key" }], "notIfConditions": null },
        { "option": "Wait", "linkPath": null, "ifConditions": null, "notIfConditions": [{ "notIfCondition": "impatient" }] }
      ] },
      "door": { "content": [ "Freedom." ] },
      "orphan": { "content": [ "Never reached." ] }
    }
  }
}"#;

fn inkle_with_stitches(stitches: &str) -> String {
    format!(
        r#"{{ "title": "Broken", "data": {{ "initial": "a", "stitches": {} }} }}"#,
        stitches
    )
}

#[test]
fn test_detects_inklewriter_format() {
    assert_eq!(
        DocumentFormat::detect(None, INKLE),
        DocumentFormat::Inklewriter
    );
}

#[test]
fn test_divert_chains_collapse_into_pages() {
    let document: StoryDocument = INKLE.parse().unwrap();
    assert_eq!(document.title, "Inkle Cave");
    assert_eq!(document.author.as_deref(), Some("Jo"));
    assert_eq!(document.start.as_deref(), Some("start"));
    assert_eq!(document.initial_flags, vec!["awake".to_string()]);

    let keys: Vec<&str> = document.stitches.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["start", "lit", "door"]);

    let start = &document.stitches[0];
    assert_eq!(start.title.as_deref(), Some("Waking"));
    assert_eq!(
        start.text,
        vec![
            DocumentParagraph::from("You wake."),
            DocumentParagraph::from("The room is dark."),
        ]
    );
    assert_eq!(start.options[0].target, "lit");
    assert_eq!(start.options[0].set, vec!["has_light".to_string()]);
    assert_eq!(start.options[1].target, "end");

    let lit = &document.stitches[1];
    assert_eq!(
        lit.text[1],
        DocumentParagraph::conditional("A door.", vec!["has_key".to_string()], vec![])
    );
    assert_eq!(lit.options[0].if_flags, vec!["has_key".to_string()]);
    assert_eq!(lit.options[1].unless, vec!["impatient".to_string()]);
    assert!(document.stitches[2].options.is_empty());
}

#[test]
fn test_imported_story_plays() {
    let mut story = Story::load(INKLE.parse().unwrap()).unwrap();
    assert!(story.flag("awake"));

    let page = story.current_page().unwrap();
    assert_eq!(
        page.hashtags(),
        vec![
            Hashtag::parse("lightamatch").unwrap(),
            Hashtag::parse("sleep").unwrap()
        ]
    );

    assert_eq!(
        story.advance("Light a match").unwrap(),
        Advance::Next("lit".to_string())
    );
    assert!(story.flag("has_light"));

    let page = story.current_page().unwrap();
    assert_eq!(page.paragraphs(), &vec!["Shadows dance.".to_string()]);
    assert_eq!(page.hashtags(), vec![Hashtag::parse("wait").unwrap()]);

    let mut flags = story.flags();
    flags.insert("has_key".to_string(), true);
    story.set_flags(&flags);
    assert_eq!(story.hashtags().len(), 2);

    assert_eq!(story.advance("Wait").unwrap(), Advance::End);
}

#[test]
fn test_divert_cycle_is_parse_error() {
    let source = inkle_with_stitches(
        r#"{
            "a": { "content": ["One.", { "divert": "b" }] },
            "b": { "content": ["Two.", { "divert": "a" }] }
        }"#,
    );
    let err = source.parse::<StoryDocument>().unwrap_err();
    assert!(matches!(err.kind(), StoryErrorKind::Parse(_)));
}

#[test]
fn test_missing_divert_target_is_reference_error() {
    let source = inkle_with_stitches(
        r#"{ "a": { "content": ["One.", { "divert": "ghost" }] } }"#,
    );
    let err = source.parse::<StoryDocument>().unwrap_err();
    assert_eq!(
        err.kind(),
        &StoryErrorKind::Reference {
            from: "a".to_string(),
            target: "ghost".to_string(),
        }
    );
}

#[test]
fn test_missing_link_target_is_reference_error() {
    let source = inkle_with_stitches(
        r#"{ "a": { "content": ["One.", { "option": "Go", "linkPath": "ghost" }] } }"#,
    );
    let err = source.parse::<StoryDocument>().unwrap_err();
    assert!(err.kind().is_reference_error());
    assert!(err.kind().is_load_error());
}

#[test]
fn test_flags_survive_overwrite_roundtrip() {
    let mut story = Story::load(INKLE.parse().unwrap()).unwrap();
    let snapshot: BTreeMap<String, bool> = story.flags();
    story.advance("Light a match").unwrap();
    story.set_flags(&snapshot);
    assert!(!story.flag("has_light"));
    assert!(story.flag("awake"));
}

#[test]
fn test_hashtag_in_label_becomes_the_option_hashtag() {
    let source = inkle_with_stitches(
        r#"{
            "a": { "content": [
                "The tunnel splits.",
                { "option": "Take the left tunnel #left", "linkPath": "b" },
                { "option": "Take the right tunnel #Right", "linkPath": null },
                { "option": "Go #up or #down", "linkPath": null }
            ] },
            "b": { "content": ["A narrow ledge."] }
        }"#,
    );
    let mut story = Story::load(source.parse().unwrap()).unwrap();

    let page = story.current_page().unwrap();
    assert_eq!(
        page.hashtags(),
        vec![
            Hashtag::parse("left").unwrap(),
            Hashtag::parse("right").unwrap(),
            Hashtag::parse("goupordown").unwrap(),
        ]
    );
    let labels: Vec<&str> = page.choices().iter().map(|c| c.label().as_str()).collect();
    assert_eq!(
        labels,
        vec!["Take the left tunnel", "Take the right tunnel", "Go #up or #down"]
    );

    assert_eq!(
        story.advance("Take the left tunnel").unwrap(),
        Advance::Next("b".to_string())
    );
}

#[test]
fn test_options_beside_a_divert_are_ignored() {
    let source = inkle_with_stitches(
        r#"{
            "a": { "content": [
                "One.",
                { "option": "Unreachable", "linkPath": "c" },
                { "divert": "b" }
            ] },
            "b": { "content": ["Two.", { "option": "Go", "linkPath": null }] },
            "c": { "content": ["Never shown."] }
        }"#,
    );
    let document: StoryDocument = source.parse().unwrap();

    assert_eq!(document.stitches.len(), 1);
    let labels: Vec<&str> = document.stitches[0]
        .options
        .iter()
        .map(|o| o.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Go"]);
}

#[test]
fn test_chain_flags_are_set_before_the_page_renders() {
    let source = inkle_with_stitches(
        r#"{
            "a": { "content": [
                "First time here.",
                { "notIfCondition": "visited" },
                { "divert": "b" }
            ] },
            "b": { "content": [
                "The hall.",
                { "flagName": "visited" },
                { "option": "Leave", "linkPath": null }
            ] }
        }"#,
    );
    let mut story = Story::load(source.parse().unwrap()).unwrap();

    assert!(story.flag("visited"));
    let page = story.current_page().unwrap();
    assert_eq!(page.paragraphs(), &vec!["The hall.".to_string()]);
}
