//! archive-import - WAV batch import tool
//!
//! Imports the WAV files of a source tree into the archive database:
//! one collection per subdirectory, one item per file, with optional
//! `<collection>.csv` manifests renaming legacy item codes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{error, info};

use archive_common::config::TomlConfig;
use archive_import::logging::init_logging;
use archive_import::{ImportLogger, ImportOptions, Importer, MediaStorage};

/// Command-line arguments for archive-import
#[derive(Parser, Debug)]
#[command(name = "archive-import")]
#[command(about = "Import WAV collections into the archive database")]
#[command(version)]
struct Args {
    /// The project directory holding archive.toml, the database and media
    project_dir: PathBuf,

    /// The directory containing the wav files to include
    source_dir: PathBuf,

    /// A pattern to match the collection names
    pattern: String,

    /// A log file to write logs
    log_file: PathBuf,

    /// Account recorded on revisions (overrides archive.toml)
    #[arg(short, long, env = "ARCHIVE_IMPORT_USER")]
    user: Option<String>,

    /// Replace files already attached to items
    #[arg(long)]
    overwrite: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

/// Parse arguments; usage errors exit with status 1
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            println!();
            let _ = Args::command().print_help();
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    let mut config = TomlConfig::load(&args.project_dir)
        .context("Failed to load project configuration")?
        .resolve(&args.project_dir);
    if let Some(user) = args.user {
        config.username = user;
    }
    if args.overwrite {
        config.overwrite = true;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    let _log_guard = init_logging(&args.log_file, &config.log_level)?;

    info!("Starting archive-import {}", env!("CARGO_PKG_VERSION"));
    info!("Source: {}", args.source_dir.display());
    info!("Media root: {}", config.media_root.display());

    let pool = archive_common::db::init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    let options = ImportOptions {
        source_dir: args.source_dir,
        pattern: args.pattern,
        username: config.username,
        overwrite: config.overwrite,
    };

    let mut importer = Importer::new(
        pool.clone(),
        MediaStorage::new(config.media_root),
        options,
        ImportLogger::new(),
    )
    .await
    .context("Failed to prepare import")?;

    let result = importer.run().await;
    pool.close().await;

    match result {
        Ok(report) => {
            info!("Import complete: {}", report);
            println!("{}", report);
            Ok(())
        }
        Err(e) if e.is_fatal_data_error() => {
            error!("Import aborted: {}", e);
            Err(e.into())
        }
        Err(e) => Err(e).context("Import failed"),
    }
}
