//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{
    Parser,
    Subcommand,
};
use lingo_sync::SyncError;
use lingo_sync::config::{
    CONFIG_FILE_NAME,
    ConfigError,
    ConfigManager,
    find_project_root,
};
use lingo_sync::pipeline::stages;
use lingo_sync::pipeline::{
    ImportSource,
    StepRunner,
};
use tracing_subscriber::EnvFilter;

/// Keeps translation documents, the feature template and the service locale files in sync.
#[derive(Debug, Parser)]
#[command(name = "lingo-sync", version, about, long_about = None)]
struct Cli {
    /// Project root. Defaults to the nearest directory containing `as_i18n.yaml`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the keys the generated fragments add to the source locale.
    Diff,
    /// Convert the diff and its translation into the service record list.
    Export,
    /// Replace the canonical documents with the service content.
    Import {
        /// Read a flat record list instead of the service locale files.
        #[arg(long)]
        records: Option<PathBuf>,
    },
    /// Add feature-owned source keys to the template.
    Template,
    /// Check parity, value types and placeholders, then rewrite in canonical order.
    Validate,
    /// Pull service records and write them into the locale files.
    Apply,
    /// Generate, diff, and translate and export any new keys.
    Sync,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directive = if cli.verbose { "lingo_sync=debug" } else { "lingo_sync=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), SyncError> {
    let root = resolve_root(cli.root)?;
    tracing::debug!(root = %root.display(), "Using project root");

    let config = ConfigManager::load(&root)?;
    let runner = StepRunner::new(&root, &config.settings().pipeline);

    match cli.command {
        Command::Diff => {
            stages::diff(&config)?;
        }
        Command::Export => {
            stages::export(&config)?;
        }
        Command::Import { records } => {
            let source = records.map_or(ImportSource::LocaleFiles, ImportSource::Records);
            stages::import(&config, &source)?;
        }
        Command::Template => {
            stages::template(&config)?;
        }
        Command::Validate => {
            stages::validate(&config)?;
        }
        Command::Apply => {
            stages::apply(&config, &runner).await?;
        }
        Command::Sync => {
            stages::sync(&config, &runner).await?;
        }
    }
    Ok(())
}

fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf, SyncError> {
    if let Some(root) = explicit {
        return Ok(root);
    }
    let cwd = std::env::current_dir().map_err(ConfigError::IoError)?;
    find_project_root(&cwd).ok_or_else(|| ConfigError::NotFound(cwd.join(CONFIG_FILE_NAME)).into())
}
