use gamebook_driver::{DriverConfig, TimeoutPolicy};
use gamebook_story::Hashtag;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r##"
[game]
sleep_interval_secs = 600
timeout_secs = 7200
max_consecutive_failures = 8
on_timeout = {{ hashtag = "#wait" }}
starting_flags = ["prologue_done"]
closing_message = "The end."
"##
    )
    .unwrap();

    let config = DriverConfig::from_file(file.path()).unwrap();
    assert_eq!(*config.sleep_interval(), Duration::from_secs(600));
    assert_eq!(*config.timeout(), Duration::from_secs(7200));
    assert_eq!(*config.max_consecutive_failures(), 8);
    assert_eq!(*config.publish_attempts(), 3);
    assert_eq!(
        config.on_timeout(),
        &TimeoutPolicy::Hashtag(Hashtag::parse("wait").unwrap())
    );
    assert_eq!(config.starting_flags(), &vec!["prologue_done".to_string()]);
    assert_eq!(config.closing_message().as_deref(), Some("The end."));
    assert!(config.checkpoint_path().is_none());
}

#[test]
fn test_empty_game_section_uses_defaults() {
    let config = DriverConfig::from_toml_str("[game]\n").unwrap();
    assert_eq!(config, DriverConfig::default());
    assert_eq!(config.on_timeout(), &TimeoutPolicy::Stop);
}

#[test]
fn test_policy_names_in_toml() {
    let config =
        DriverConfig::from_toml_str("[game]\non_timeout = \"first_option\"\n").unwrap();
    assert_eq!(config.on_timeout(), &TimeoutPolicy::FirstOption);
}

#[test]
fn test_rejects_unusable_settings() {
    let cases = [
        "[game]\nsleep_interval_secs = 0\n",
        "[game]\nsleep_interval_secs = 600\ntimeout_secs = 60\n",
        "[game]\nmax_consecutive_failures = 0\n",
        "[game]\npublish_attempts = 0\n",
        "[game]\nsleep_intervall_secs = 60\n",
        "[actor]\nname = \"wrong file\"\n",
    ];
    for source in cases {
        assert!(
            DriverConfig::from_toml_str(source).is_err(),
            "accepted {:?}",
            source
        );
    }
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DriverConfig::from_file(dir.path().join("game.toml")).is_err());
}

#[test]
fn test_validate_warnings() {
    assert!(DriverConfig::default().validate().is_empty());

    let config = DriverConfig::builder()
        .sleep_interval(Duration::from_secs(1))
        .timeout(Duration::from_secs(10_000))
        .starting_flags(vec!["a".to_string(), "a".to_string()])
        .build()
        .unwrap();
    let warnings = config.validate();
    assert!(warnings.iter().any(|w| w.contains("rate limits")));
    assert!(warnings.iter().any(|w| w.contains("10000 times")));
    assert!(warnings.iter().any(|w| w.contains("listed twice")));
}

#[test]
fn test_to_builder_keeps_settings() {
    let config = DriverConfig::from_toml_str(
        r#"
[game]
sleep_interval_secs = 120
timeout_secs = 3600
on_timeout = "first_option"
closing_message = "Fin."
checkpoint_path = "state/cave.json"
"#,
    )
    .unwrap();

    assert_eq!(config.to_builder().build().unwrap(), config);

    let faster = config
        .to_builder()
        .sleep_interval(Duration::from_secs(30))
        .build()
        .unwrap();
    assert_eq!(*faster.sleep_interval(), Duration::from_secs(30));
    assert_eq!(faster.closing_message().as_deref(), Some("Fin."));
    assert_eq!(*faster.on_timeout(), TimeoutPolicy::FirstOption);
}
