//! Story playthrough command handler.

use super::PlayArgs;
use gamebook::{
    CheckpointStore, ConfigError, ConsoleTransport, DriverConfig, GameDriver, GamebookResult,
    RunReport, StorySource, Transport, check_source, load_story,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Layers the command-line overrides over the config file (or defaults).
pub fn driver_config(args: &PlayArgs) -> Result<DriverConfig, ConfigError> {
    let base = match &args.config {
        Some(path) => DriverConfig::from_file(path)?,
        None => DriverConfig::default(),
    };

    let mut builder = base.to_builder();
    if let Some(sleep) = args.sleep_time {
        builder.sleep_interval(sleep);
    }
    if let Some(timeout) = args.timeout {
        builder.timeout(timeout);
    }
    if let Some(policy) = &args.on_timeout {
        builder.on_timeout(policy.clone());
    }
    if !args.flags.is_empty() {
        let mut flags = base.starting_flags().clone();
        flags.extend(args.flags.iter().cloned());
        builder.starting_flags(flags);
    }
    if let Some(path) = &args.checkpoint {
        builder.checkpoint_path(path.clone());
    }

    let config = builder.build()?;
    if args.resume && config.checkpoint_path().is_none() {
        return Err(ConfigError::new(
            "--resume needs a checkpoint path (--checkpoint or checkpoint_path in the config)",
        ));
    }
    Ok(config)
}

/// Plays a story on the console until it ends, times out or is cancelled.
pub async fn play_story(args: PlayArgs, cancel: CancellationToken) -> GamebookResult<RunReport> {
    let source = StorySource::parse(&args.source);
    check_source(&source)?;

    let config = driver_config(&args)?;
    for warning in config.validate() {
        warn!(%warning, "Questionable configuration");
    }

    let checkpoint = match (args.resume, config.checkpoint_path()) {
        (true, Some(path)) => CheckpointStore::new(path).load()?,
        _ => None,
    };

    let story = load_story(&source).await?;
    let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport::new());
    let mut driver = GameDriver::builder()
        .story(story)
        .transport(transport)
        .config(config)
        .cancellation_token(cancel)
        .build()?;

    let report = match checkpoint {
        Some(checkpoint) => {
            info!(stitch = %checkpoint.stitch(), "Resuming from checkpoint");
            driver.resume(checkpoint).await?
        }
        None => {
            if args.resume {
                warn!("No checkpoint found, starting from the beginning");
            }
            driver.play().await?
        }
    };

    info!(
        outcome = ?report.outcome(),
        pages = *report.pages_rendered(),
        replies = *report.replies_seen(),
        "Run finished"
    );
    Ok(report)
}
