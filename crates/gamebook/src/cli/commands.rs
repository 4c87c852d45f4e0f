//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use gamebook::{TimeoutPolicy, parse_period};
use std::path::PathBuf;
use std::time::Duration;

/// Gamebook - play branching stories with an audience
#[derive(Parser, Debug)]
#[command(name = "gamebook")]
#[command(about = "Play branching stories with an audience that replies in hashtags", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a story on the console
    Play(PlayArgs),

    /// Load a story and report what it contains
    Check {
        /// Story file path or https:// URL
        #[arg(long)]
        source: String,
    },
}

/// Options for `gamebook play`.
#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    /// Story file path or https:// URL
    #[arg(long)]
    pub source: String,

    /// Driver settings file with a [game] section
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Wait between reply searches (e.g. 30s, 15m, 1h)
    #[arg(long, value_parser = parse_period_arg)]
    pub sleep_time: Option<Duration>,

    /// How long a page waits for a reply (e.g. 24h, 3d)
    #[arg(long, value_parser = parse_period_arg)]
    pub timeout: Option<Duration>,

    /// What to do on timeout: stop, first, or a #hashtag
    #[arg(long, value_parser = parse_policy_arg)]
    pub on_timeout: Option<TimeoutPolicy>,

    /// Flag to set before the first page (repeatable)
    #[arg(long = "flag", value_name = "NAME")]
    pub flags: Vec<String>,

    /// Where to keep the poll-cycle checkpoint
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Continue from the checkpoint instead of starting over
    #[arg(long)]
    pub resume: bool,
}

fn parse_period_arg(value: &str) -> Result<Duration, String> {
    parse_period(value).map_err(|e| e.message)
}

fn parse_policy_arg(value: &str) -> Result<TimeoutPolicy, String> {
    value.parse::<TimeoutPolicy>().map_err(|e| e.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_arguments() {
        let cli = Cli::try_parse_from([
            "gamebook",
            "--verbose",
            "play",
            "--source",
            "cave.toml",
            "--sleep-time",
            "15m",
            "--timeout",
            "1d",
            "--on-timeout",
            "#wait",
            "--flag",
            "lamp",
            "--flag",
            "rope",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.source, "cave.toml");
        assert_eq!(args.sleep_time, Some(Duration::from_secs(900)));
        assert_eq!(args.timeout, Some(Duration::from_secs(86_400)));
        assert!(matches!(args.on_timeout, Some(TimeoutPolicy::Hashtag(_))));
        assert_eq!(args.flags, vec!["lamp", "rope"]);
        assert!(!args.resume);
    }

    #[test]
    fn test_rejects_bad_period() {
        let result = Cli::try_parse_from([
            "gamebook",
            "play",
            "--source",
            "cave.toml",
            "--sleep-time",
            "soon",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["gamebook", "check", "--source", "cave.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { source } if source == "cave.json"));
    }
}
