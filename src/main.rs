//! # desiderata CLI
//!
//! Record digests for a directory tree, then check or verify it later.
//!
//! ## Usage
//! ```bash
//! desiderata record ~/archive -o archive.tar
//! desiderata verify ~/archive -o archive.tar
//! desiderata convert archive.tar -o archive.json
//! desiderata dupes archive.json -o duplicates.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use desiderata::hash::algorithm::parse_algorithm_list;
use desiderata::hash::{
    CheckEngine, DedupEngine, IndexEngine, PipelineMode, RecordEngine, UnmatchedEngine, VerifyEngine,
};
use desiderata::{Config, HashUtilityError};

/// Record and verify content digests for a directory tree
#[derive(Parser, Debug)]
#[command(name = "desiderata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show all log output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Comma separated hash algorithms, e.g. md5,sha1,sha512
    #[arg(long, global = true)]
    algorithms: Option<String>,

    /// Read block size in bytes
    #[arg(long, global = true)]
    block_size: Option<usize>,

    /// Hash algorithms one after another on a single thread
    #[arg(long, global = true)]
    sequential: bool,

    /// Show a progress spinner while recording
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record hashes for all files
    Record {
        /// Target directory
        target: PathBuf,
        /// Manifest to create
        #[arg(short, long, default_value = "hashes.tar")]
        outfile: PathBuf,
    },
    /// Check directory for missing or added files
    Check {
        /// Target directory
        target: PathBuf,
        /// Manifest to check against
        #[arg(short, long, default_value = "hashes.tar")]
        outfile: PathBuf,
    },
    /// Verify hashes for all files
    Verify {
        /// Target directory
        target: PathBuf,
        /// Manifest to verify against
        #[arg(short, long, default_value = "hashes.tar")]
        outfile: PathBuf,
    },
    /// List all files in a manifest as a json hashmap
    Convert {
        /// Manifest to convert
        reference: PathBuf,
        #[arg(short, long, default_value = "result.json")]
        outfile: PathBuf,
    },
    /// Show all hashes in an index with multiple files
    Dupes {
        /// Index produced by convert
        reference: PathBuf,
        #[arg(short, long, default_value = "result.json")]
        outfile: PathBuf,
    },
    /// Show all hashes in a target index that are not in the reference index
    Unmatched {
        /// Reference index
        reference: PathBuf,
        /// Target index
        target: PathBuf,
        #[arg(short, long, default_value = "result.json")]
        outfile: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            if is_usage_error(&e) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

/// Only usage errors change the exit status; failed operations are reported in the log
fn is_usage_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<HashUtilityError>()
        .is_some_and(HashUtilityError::is_usage)
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(list) = &cli.algorithms {
        config.algorithms = parse_algorithm_list(list)?;
    }
    if let Some(block_size) = cli.block_size {
        config.block_size = block_size;
    }
    if cli.sequential {
        config.mode = PipelineMode::Sequential;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Record { target, outfile } => {
            let engine = RecordEngine::new(config.pipeline()?).with_progress(cli.progress);
            let stats = engine.record(target, outfile)?;
            info!(
                "{} files, {} directories, {} bytes in {:.2}s ({} unreadable)",
                stats.files_hashed,
                stats.directories,
                stats.total_bytes,
                stats.duration.as_secs_f64(),
                stats.files_failed
            );
        }
        Commands::Check { target, outfile } => {
            let report = CheckEngine::new().check(target, outfile)?;
            info!(
                "{} hashes missing, {} files not found",
                report.missing_hashes.len(),
                report.missing_files.len()
            );
        }
        Commands::Verify { target, outfile } => {
            let report = VerifyEngine::new(config.pipeline()?).verify(target, outfile)?;
            summarize_verify(&report);
        }
        Commands::Convert { reference, outfile } => {
            IndexEngine::new().convert(reference, outfile)?;
        }
        Commands::Dupes { reference, outfile } => {
            DedupEngine::new().run(reference, outfile)?;
        }
        Commands::Unmatched {
            reference,
            target,
            outfile,
        } => {
            UnmatchedEngine::new().run(reference, target, outfile)?;
        }
    }

    Ok(())
}

fn summarize_verify(report: &desiderata::hash::VerifyReport) {
    if report.is_clean() {
        info!("All {} files match the manifest", report.files_checked);
    } else {
        info!(
            "{} matched, {} mismatched, {} not found, {} unreadable",
            report.matches(),
            report.mismatches.len(),
            report.missing_files.len(),
            report.read_failures.len()
        );
    }
}
