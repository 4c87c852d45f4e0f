use gamebook_story::{Advance, Destination, Hashtag, Story, StoryDocument, StoryErrorKind};
use std::collections::BTreeMap;

const CAVE: &str = r#"
title = "The Cave"
author = "A. Writer"

[[stitches]]
key = "start"
title = "The Fork"
text = ["The tunnel splits in two.", "Water drips somewhere ahead."]
options = [
    { label = "Left", target = "a" },
    { label = "Right", target = "b" },
]

[[stitches]]
key = "a"
text = ["A narrow ledge over a black lake."]
options = [{ label = "Onward", target = "end" }]

[[stitches]]
key = "b"
text = ["A dead end. The torch gutters out."]
"#;

const GUARD: &str = r#"
title = "The Gate"

[[stitches]]
key = "gate"
text = [
    "A guard blocks the gate.",
    { text = "He nods at you.", if = ["met_guard"] },
    { text = "He does not look up.", unless = ["met_guard"] },
]
options = [
    { label = "Greet the guard", target = "gate", unless = ["met_guard"], set = ["met_guard"] },
    { label = "Pass", target = "courtyard", if = ["met_guard"] },
]

[[stitches]]
key = "courtyard"
text = ["Sunlight at last."]
options = [{ label = "Rest", target = "end" }]
"#;

fn load(source: &str) -> Story {
    Story::load(source.parse::<StoryDocument>().unwrap()).unwrap()
}

fn tags(names: &[&str]) -> Vec<Hashtag> {
    names.iter().map(|n| Hashtag::parse(n).unwrap()).collect()
}

#[test]
fn test_three_stitch_playthrough() {
    let mut story = load(CAVE);
    assert_eq!(story.title(), "The Cave");
    assert_eq!(story.author(), Some("A. Writer"));

    let page = story.current_page().unwrap();
    assert_eq!(page.key(), "start");
    assert_eq!(page.title().as_deref(), Some("The Fork"));
    assert_eq!(page.paragraphs().len(), 2);
    assert_eq!(page.hashtags(), tags(&["#left", "#right"]));
    assert_eq!(
        page.choices()[0].destination(),
        &Destination::Stitch("a".to_string())
    );

    assert_eq!(story.advance("Left").unwrap(), Advance::Next("a".to_string()));
    let page = story.current_page().unwrap();
    assert_eq!(page.hashtags(), tags(&["#onward"]));
    assert_eq!(page.choices()[0].destination(), &Destination::End);

    assert_eq!(story.advance("Onward").unwrap(), Advance::End);
    assert!(story.is_finished());
    assert_eq!(story.current_key(), None);
    assert!(story.hashtags().is_empty());

    let err = story.current_page().unwrap_err();
    assert_eq!(err.kind(), &StoryErrorKind::Finished);
    let err = story.advance("Onward").unwrap_err();
    assert_eq!(err.kind(), &StoryErrorKind::Finished);
}

#[test]
fn test_ending_page_has_no_choices() {
    let mut story = load(CAVE);
    story.current_page().unwrap();
    story.advance("Right").unwrap();

    let page = story.current_page().unwrap();
    assert!(page.is_ending());
    assert!(story.stitch("b").unwrap().is_ending());
    assert!(!story.is_finished());
}

#[test]
fn test_dangling_target_is_reference_error() {
    let source = r#"
        title = "Broken"

        [[stitches]]
        key = "start"
        options = [{ label = "Go", target = "nowhere" }]
    "#;
    let document: StoryDocument = source.parse().unwrap();
    let err = Story::load(document).unwrap_err();
    assert!(err.kind().is_reference_error());
    assert_eq!(
        err.kind(),
        &StoryErrorKind::Reference {
            from: "start".to_string(),
            target: "nowhere".to_string(),
        }
    );
}

#[test]
fn test_unknown_start_is_reference_error() {
    let source = r#"
        title = "Lost"
        start = "missing"

        [[stitches]]
        key = "start"
    "#;
    let err = Story::load(source.parse().unwrap()).unwrap_err();
    assert!(err.kind().is_reference_error());
}

#[test]
fn test_duplicate_key_rejected() {
    let source = r#"
        title = "Twice"

        [[stitches]]
        key = "start"

        [[stitches]]
        key = "start"
    "#;
    let err = Story::load(source.parse().unwrap()).unwrap_err();
    assert_eq!(
        err.kind(),
        &StoryErrorKind::DuplicateStitch("start".to_string())
    );
}

#[test]
fn test_structural_problems_are_parse_errors() {
    let cases = [
        r#"
            title = "Empty"
            stitches = []
        "#,
        r#"
            title = "Reserved"
            [[stitches]]
            key = "end"
        "#,
        r#"
            title = "Symbols"
            [[stitches]]
            key = "start"
            options = [{ label = "?!", target = "end" }]
        "#,
        r#"
            title = "Contradiction"
            [[stitches]]
            key = "start"
            options = [{ label = "Go", target = "end", if = ["x"], unless = ["x"] }]
        "#,
        r#"
            title = "Blank flag"
            [[stitches]]
            key = "start"
            options = [{ label = "Go", target = "end", set = [" "] }]
        "#,
    ];
    for source in cases {
        let err = Story::load(source.parse().unwrap()).unwrap_err();
        assert!(
            matches!(err.kind(), StoryErrorKind::Parse(_)),
            "expected parse error, got {:?}",
            err.kind()
        );
    }
}

#[test]
fn test_missing_required_fields_rejected() {
    let err = "[[stitches]]\nkey = \"start\"\n"
        .parse::<StoryDocument>()
        .unwrap_err();
    assert!(matches!(err.kind(), StoryErrorKind::Parse(_)));
}

#[test]
fn test_effect_unlocks_option() {
    let mut story = load(GUARD);

    let page = story.current_page().unwrap();
    assert_eq!(page.hashtags(), tags(&["#greettheguard"]));
    assert_eq!(
        page.paragraphs(),
        &vec![
            "A guard blocks the gate.".to_string(),
            "He does not look up.".to_string()
        ]
    );

    let err = story.advance("Pass").unwrap_err();
    assert!(matches!(err.kind(), StoryErrorKind::InvalidChoice { .. }));
    assert!(!story.flag("met_guard"));

    assert_eq!(
        story.advance("Greet the guard").unwrap(),
        Advance::Next("gate".to_string())
    );
    assert_eq!(story.flags().get("met_guard"), Some(&true));

    let page = story.current_page().unwrap();
    assert_eq!(page.hashtags(), tags(&["#pass"]));
    assert_eq!(page.paragraphs()[1], "He nods at you.");
}

#[test]
fn test_labels_match_exactly() {
    let mut story = load(CAVE);
    let err = story.advance("left").unwrap_err();
    assert!(matches!(err.kind(), StoryErrorKind::InvalidChoice { .. }));
    assert_eq!(story.current_key(), Some("start"));
}

#[test]
fn test_visit_counted_once_per_activation() {
    let mut story = load(GUARD);
    story.current_page().unwrap();
    story.current_page().unwrap();
    assert_eq!(story.visit_count("gate"), 1);

    story.advance("Greet the guard").unwrap();
    assert_eq!(story.visit_count("gate"), 1);
    story.current_page().unwrap();
    assert_eq!(story.visit_count("gate"), 2);
    assert_eq!(story.visit_count("courtyard"), 0);
    assert_eq!(story.visit_count("nowhere"), 0);
}

#[test]
fn test_set_flags_overwrites_without_effects() {
    let mut story = load(GUARD);

    let mut flags = BTreeMap::new();
    flags.insert("met_guard".to_string(), true);
    flags.insert("external".to_string(), true);
    story.set_flags(&flags);

    assert_eq!(story.hashtags(), tags(&["#pass"]));
    assert!(story.flag("external"));

    story.set_flags(&BTreeMap::new());
    assert!(!story.flag("met_guard"));
    assert!(!story.flag("external"));
    assert_eq!(story.hashtags(), tags(&["#greettheguard"]));
}

#[test]
fn test_initial_flags_and_explicit_start() {
    let source = r#"
        title = "Midway"
        start = "second"
        initial_flags = ["met_guard"]

        [[stitches]]
        key = "first"
        options = [{ label = "On", target = "second" }]

        [[stitches]]
        key = "second"
        options = [
            { label = "Wave", target = "end", if = ["met_guard"] },
            { label = "Hide", target = "end", unless = ["met_guard"] },
        ]
    "#;
    let mut story = load(source);
    assert_eq!(story.start_key(), "second");
    assert_eq!(story.current_key(), Some("second"));
    assert_eq!(story.current_page().unwrap().hashtags(), tags(&["#wave"]));
}

#[test]
fn test_restore_position_and_flags() {
    let mut story = load(GUARD);
    let mut flags = BTreeMap::new();
    flags.insert("met_guard".to_string(), true);

    story.restore("courtyard", &flags).unwrap();
    assert_eq!(story.current_key(), Some("courtyard"));
    assert!(story.flag("met_guard"));

    let err = story.restore("attic", &flags).unwrap_err();
    assert_eq!(
        err.kind(),
        &StoryErrorKind::UnknownStitch("attic".to_string())
    );
    assert_eq!(story.current_key(), Some("courtyard"));
}

#[test]
fn test_json_document() {
    let source = r#"{
        "title": "Tiny",
        "stitches": [
            { "key": "only", "text": ["Hi."], "options": [{ "label": "Bye", "target": "end" }] }
        ]
    }"#;
    let mut story = load(source);
    assert_eq!(story.current_page().unwrap().hashtags(), tags(&["#bye"]));
}

#[test]
fn test_explicit_hashtag_replaces_derived_one() {
    let story = load(
        r##"
title = "Tags"

[[stitches]]
key = "start"
text = ["Two doors."]
options = [
    { label = "The red door", hashtag = "#Red", target = "end" },
    { label = "The blue door", target = "end" },
]
"##,
    );
    assert_eq!(
        story.hashtags(),
        vec![
            Hashtag::parse("red").unwrap(),
            Hashtag::parse("thebluedoor").unwrap()
        ]
    );
}
