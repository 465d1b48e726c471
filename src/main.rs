//! Command-line entry point.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use l10n_sync::config::ConfigManager;
use l10n_sync::pipeline::{
    Pipeline,
    RunOptions,
};
use l10n_sync::report::PlatformStatus;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Sync native UI strings into the translation store and write localized
/// resources for every platform.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Working root; relative config paths resolve against it.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Config file. Defaults to `<ROOT>/.l10n-sync.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process only this platform.
    #[arg(long)]
    platform: Option<String>,

    /// Do not stage or revert anything in version control.
    #[arg(long)]
    no_vcs: bool,

    /// Commit and push after each successful platform.
    #[arg(long, conflicts_with = "no_vcs")]
    commit_vcs: bool,

    /// Default log filter; `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Installs the subscriber. The returned guard flushes the log file on drop.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let file = cli.log_file.as_ref().map(|path| {
        (path, OpenOptions::new().create(true).append(true).open(path))
    });

    match file {
        Some((_, Ok(file))) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            Some(guard)
        }
        Some((path, Err(err))) => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
            tracing::warn!(path = %path.display(), error = %err, "Failed to open log file; using stderr");
            None
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
            None
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_logging(&cli);

    let config = match ConfigManager::load_settings(&cli.root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let queue = match config.platform_queue(cli.platform.as_deref()) {
        Ok(queue) => queue,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions { no_vcs: cli.no_vcs, commit_vcs: cli.commit_vcs };
    let report = Pipeline::new(&config, options).run(&queue);

    for outcome in report.platforms() {
        let stats = outcome.stats.unwrap_or_default();
        tracing::info!(
            platform = %outcome.platform,
            succeeded = outcome.status == PlatformStatus::Succeeded,
            inserted = stats.inserted,
            updated = stats.updated,
            deleted = stats.deleted,
            purged = outcome.purged,
            "Summary"
        );
    }
    tracing::info!(
        warnings = report.warnings().count(),
        errors = report.errors().count(),
        severity = %report.max_severity(),
        "Run finished"
    );

    ExitCode::from(report.exit_code())
}
