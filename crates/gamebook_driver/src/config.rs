//! Run configuration for a playthrough.

use derive_getters::Getters;
use gamebook_error::ConfigError;
use gamebook_story::Hashtag;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// What the driver does when a page gets no matching reply in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// End the run with `TimedOut`.
    #[default]
    Stop,
    /// Take the first visible option.
    FirstOption,
    /// Take the option with this hashtag; stop if it is not visible.
    Hashtag(Hashtag),
}

impl FromStr for TimeoutPolicy {
    type Err = ConfigError;

    /// Parses `stop`, `first` (or `first_option`), or a hashtag such as `#wait`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "first" | "first_option" => Ok(Self::FirstOption),
            other if other.starts_with('#') => Hashtag::parse(other)
                .map(Self::Hashtag)
                .ok_or_else(|| ConfigError::new(format!("Invalid timeout hashtag '{}'", s))),
            _ => Err(ConfigError::new(format!(
                "Unknown timeout policy '{}' (expected stop, first or #tag)",
                s
            ))),
        }
    }
}

fn default_sleep_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_timeout() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_publish_attempts() -> u32 {
    3
}

/// Settings the driver consumes for one playthrough.
///
/// Build one with [`DriverConfig::builder`] or load it with
/// [`DriverConfig::from_file`]. Both reject settings the driver cannot run
/// with; [`DriverConfig::validate`] reports the merely questionable ones.
#[derive(Debug, Clone, PartialEq, Getters, derive_builder::Builder)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct DriverConfig {
    /// Wait between reply searches.
    #[builder(default = "default_sleep_interval()")]
    sleep_interval: Duration,

    /// How long a page may wait for a matching reply.
    #[builder(default = "default_timeout()")]
    timeout: Duration,

    /// Consecutive failed searches tolerated before the run aborts.
    #[builder(default = "default_max_consecutive_failures()")]
    max_consecutive_failures: u32,

    /// Total attempts for each publish.
    #[builder(default = "default_publish_attempts()")]
    publish_attempts: u32,

    /// Behaviour when a page times out.
    #[builder(default)]
    on_timeout: TimeoutPolicy,

    /// Flags set before the first page.
    #[builder(default)]
    starting_flags: Vec<String>,

    /// Take a lone visible option without polling.
    #[builder(default)]
    auto_advance_single_option: bool,

    /// Replaces the default closing message.
    #[builder(default, setter(into, strip_option))]
    closing_message: Option<String>,

    /// Where to keep the poll-cycle checkpoint.
    #[builder(default, setter(into, strip_option))]
    checkpoint_path: Option<PathBuf>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            sleep_interval: default_sleep_interval(),
            timeout: default_timeout(),
            max_consecutive_failures: default_max_consecutive_failures(),
            publish_attempts: default_publish_attempts(),
            on_timeout: TimeoutPolicy::default(),
            starting_flags: Vec::new(),
            auto_advance_single_option: false,
            closing_message: None,
            checkpoint_path: None,
        }
    }
}

impl DriverConfigBuilder {
    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the settings cannot drive a run (zero intervals,
    /// a timeout shorter than one poll, zero retry bounds).
    pub fn build(&self) -> Result<DriverConfig, ConfigError> {
        let config = self
            .build_internal()
            .map_err(|e| ConfigError::new(e.to_string()))?;
        config.check()?;
        Ok(config)
    }
}

impl DriverConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// A builder seeded with every setting of this configuration.
    ///
    /// Used to layer overrides (command-line flags) on top of a loaded file.
    pub fn to_builder(&self) -> DriverConfigBuilder {
        let mut builder = DriverConfigBuilder::default();
        builder
            .sleep_interval(self.sleep_interval)
            .timeout(self.timeout)
            .max_consecutive_failures(self.max_consecutive_failures)
            .publish_attempts(self.publish_attempts)
            .on_timeout(self.on_timeout.clone())
            .starting_flags(self.starting_flags.clone())
            .auto_advance_single_option(self.auto_advance_single_option);
        if let Some(message) = &self.closing_message {
            builder.closing_message(message.clone());
        }
        if let Some(path) = &self.checkpoint_path {
            builder.checkpoint_path(path.clone());
        }
        builder
    }

    /// Load a configuration from the `[game]` section of a TOML file.
    ///
    /// ```toml
    /// [game]
    /// sleep_interval_secs = 600
    /// timeout_secs = 86400
    /// on_timeout = "first_option"
    /// starting_flags = ["prologue_done"]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - The settings cannot drive a run
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!("Loading driver config from file");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse a configuration from TOML text with a `[game]` section.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| ConfigError::new(format!("Invalid driver config: {}", e)))?;
        let game = file.game;

        let config = Self {
            sleep_interval: game
                .sleep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(default_sleep_interval),
            timeout: game
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(default_timeout),
            max_consecutive_failures: game
                .max_consecutive_failures
                .unwrap_or_else(default_max_consecutive_failures),
            publish_attempts: game
                .publish_attempts
                .unwrap_or_else(default_publish_attempts),
            on_timeout: game.on_timeout.unwrap_or_default(),
            starting_flags: game.starting_flags,
            auto_advance_single_option: game.auto_advance_single_option,
            closing_message: game.closing_message,
            checkpoint_path: game.checkpoint_path,
        };
        config.check()?;

        tracing::info!(
            sleep_interval_secs = config.sleep_interval.as_secs(),
            timeout_secs = config.timeout.as_secs(),
            on_timeout = ?config.on_timeout,
            "Loaded driver configuration"
        );
        Ok(config)
    }

    /// Rejects settings the driver cannot run with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.sleep_interval.is_zero() {
            return Err(ConfigError::new("sleep_interval must be greater than zero"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::new("timeout must be greater than zero"));
        }
        if self.timeout < self.sleep_interval {
            return Err(ConfigError::new(format!(
                "timeout ({}s) is shorter than sleep_interval ({}s)",
                self.timeout.as_secs(),
                self.sleep_interval.as_secs()
            )));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::new("max_consecutive_failures must be at least 1"));
        }
        if self.publish_attempts == 0 {
            return Err(ConfigError::new("publish_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Validate configuration.
    ///
    /// # Returns
    ///
    /// List of validation warnings (empty if nothing looks off).
    #[tracing::instrument(skip(self))]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.sleep_interval < Duration::from_secs(10) {
            warnings.push(format!(
                "sleep_interval is {}s, searches may hit rate limits",
                self.sleep_interval.as_secs_f64()
            ));
        }

        let polls = self.timeout.as_secs() / self.sleep_interval.as_secs().max(1);
        if polls > 1000 {
            warnings.push(format!("each page may be polled {} times before timing out", polls));
        }

        if self.auto_advance_single_option && self.on_timeout == TimeoutPolicy::FirstOption {
            warnings.push(
                "auto_advance_single_option with on_timeout = first_option never waits on single-option pages"
                    .to_string(),
            );
        }

        let mut unique = HashSet::new();
        for flag in &self.starting_flags {
            if flag.trim().is_empty() {
                warnings.push("starting_flags contains a blank name".to_string());
            } else if !unique.insert(flag) {
                warnings.push(format!("starting flag '{}' is listed twice", flag));
            }
        }

        if let Some(path) = &self.checkpoint_path {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    warnings.push(format!(
                        "checkpoint directory {} does not exist",
                        parent.display()
                    ));
                }
            }
        }

        tracing::debug!(warnings = warnings.len(), "Configuration validated");
        warnings
    }
}

/// Internal TOML file structure.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    game: GameSection,
}

/// Game section in TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GameSection {
    #[serde(default)]
    sleep_interval_secs: Option<u64>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    max_consecutive_failures: Option<u32>,
    #[serde(default)]
    publish_attempts: Option<u32>,
    #[serde(default)]
    on_timeout: Option<TimeoutPolicy>,
    #[serde(default)]
    starting_flags: Vec<String>,
    #[serde(default)]
    auto_advance_single_option: bool,
    #[serde(default)]
    closing_message: Option<String>,
    #[serde(default)]
    checkpoint_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_policy_from_str() {
        assert_eq!("stop".parse::<TimeoutPolicy>().unwrap(), TimeoutPolicy::Stop);
        assert_eq!(
            "First".parse::<TimeoutPolicy>().unwrap(),
            TimeoutPolicy::FirstOption
        );
        assert_eq!(
            "#Wait".parse::<TimeoutPolicy>().unwrap(),
            TimeoutPolicy::Hashtag(Hashtag::parse("wait").unwrap())
        );
        assert!("sometimes".parse::<TimeoutPolicy>().is_err());
        assert!("#".parse::<TimeoutPolicy>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = DriverConfig::builder().build().unwrap();
        assert_eq!(config, DriverConfig::default());
        assert_eq!(*config.max_consecutive_failures(), 5);
        assert_eq!(*config.publish_attempts(), 3);
        assert!(!config.auto_advance_single_option());
    }

    #[test]
    fn test_builder_rejects_short_timeout() {
        let result = DriverConfig::builder()
            .sleep_interval(Duration::from_secs(60))
            .timeout(Duration::from_secs(30))
            .build();
        assert!(result.is_err());
    }
}
