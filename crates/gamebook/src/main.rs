//! Gamebook CLI binary.
//!
//! This binary plays a story on the console or checks a story document:
//! - `gamebook play --source cave.toml` narrates pages to stdout and reads
//!   hashtag replies from stdin
//! - `gamebook check --source cave.json` validates a document

use clap::Parser;
use gamebook::{ObservabilityConfig, RunOutcome, init_observability};
use tokio_util::sync::CancellationToken;

mod cli;

/// Cancels the token on Ctrl-C or SIGTERM.
fn setup_shutdown_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl-C, stopping after the current step");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, stopping after the current step");
            }
        }

        cancel.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, check_story, play_story};

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut observability = ObservabilityConfig::new()
        .with_json_logs(cli.json_logs)
        .with_log_file(cli.log_file.clone());
    if cli.verbose {
        observability = observability.with_log_level("debug");
    }
    init_observability(&observability)?;

    match cli.command {
        Commands::Play(args) => {
            let cancel = CancellationToken::new();
            setup_shutdown_signal(cancel.clone());

            let report = play_story(args, cancel).await?;
            match report.outcome() {
                RunOutcome::Ended => {}
                RunOutcome::TimedOut { stitch } => {
                    eprintln!("No reply arrived in time on page '{}'", stitch);
                }
                RunOutcome::Cancelled => {
                    eprintln!("Stopped; run again with --resume to continue");
                }
            }
        }

        Commands::Check { source } => {
            check_story(&source).await?;
        }
    }

    Ok(())
}
