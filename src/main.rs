//! code-scribe: CLI entry point for the Fortran → C++ annotator.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use code_scribe::annotator::{annotate_fortran_file, extract_fortran_meta};
use code_scribe::batch::{BatchReport, BatchRunner, FileStatus};
use code_scribe::config::Config;
use code_scribe::error::ScribeError;
use code_scribe::generator::select_generator;
use code_scribe::indexer::{CombinedIndex, ScribeIndexer, query_construct};
use code_scribe::prompt::{ChatTemplate, create_src_mapping, save_prompts, translate};

#[derive(Parser)]
#[command(
    name = "code-scribe",
    about = "Software development tool for converting code from Fortran to C++"
)]
#[command(version, propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./code-scribe.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index modules, subroutines and functions along a directory tree
    Index {
        /// Project root (defaults to current directory)
        #[arg(short, long)]
        root_dir: Option<PathBuf>,
    },

    /// Write a rule-based C++ draft next to each Fortran file
    Draft {
        /// Fortran files, directories or glob patterns
        #[arg(required = true)]
        files: Vec<String>,

        /// Directory holding the top-level scribe.yaml (defaults to current directory)
        #[arg(short, long)]
        root_dir: Option<PathBuf>,

        /// Stop at the first failing file
        #[arg(long)]
        fail_fast: bool,
    },

    /// Look up the file defining a module, subroutine or function
    Query {
        /// Construct name (case-insensitive)
        name: String,

        /// Directory holding the top-level scribe.yaml (defaults to current directory)
        #[arg(short, long)]
        root_dir: Option<PathBuf>,
    },

    /// Print construct metadata for a Fortran file as JSON
    Meta {
        /// Fortran source file
        file: PathBuf,
    },

    /// Save the rendered chat prompt for each file as a JSON record
    SavePrompts {
        /// Fortran files, directories or glob patterns
        #[arg(required = true)]
        files: Vec<String>,

        /// Chat template (TOML with [[chat]] tables)
        #[arg(short, long)]
        prompt: Option<PathBuf>,

        /// Stop at the first failing file
        #[arg(long)]
        fail_fast: bool,
    },

    /// Translate each file to C++ through a generator backend
    Translate {
        /// Fortran files, directories or glob patterns
        #[arg(required = true)]
        files: Vec<String>,

        /// Chat template (TOML with [[chat]] tables)
        #[arg(short, long)]
        prompt: Option<PathBuf>,

        /// Use the echo generator instead of a model
        #[arg(long)]
        dry_run: bool,

        /// Stop at the first failing file
        #[arg(long)]
        fail_fast: bool,
    },
}

fn env_filter(verbose: bool, default_level: &str) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    }
}

fn log_subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .finish()
}

/// Load the config under a provisional subscriber so its warnings are shown
/// before the configured log level is known.
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let provisional = log_subscriber(env_filter(verbose, "info"), std::io::stderr);
    tracing::subscriber::with_default(provisional, || Config::load(path))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.verbose) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let subscriber = log_subscriber(env_filter(cli.verbose, &config.log_level), std::io::stderr);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: failed to install logger: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatch a subcommand. `Ok(false)` means some file in a batch failed.
fn run(command: Commands, config: &Config) -> Result<bool> {
    config.validate().context("invalid configuration")?;

    match command {
        Commands::Index { root_dir } => {
            let root = root_dir.unwrap_or_else(|| PathBuf::from("."));
            let summary = ScribeIndexer::new(config.extensions.clone())
                .index_directory(&root)
                .with_context(|| format!("failed to index {}", root.display()))?;
            info!(
                "Indexed {} files into {} directories",
                summary.files, summary.directories
            );
            println!("Project structure saved to scribe.yaml.");
            Ok(true)
        }

        Commands::Draft {
            files,
            root_dir,
            fail_fast,
        } => {
            let files = config.expand_inputs(&files)?;
            let index = load_index_optional(root_dir.as_deref())?;
            let runner = BatchRunner::new(fail_fast || config.fail_fast).with_progress(files.len());
            let report = runner.run(&files, |sfile| {
                annotate_fortran_file(sfile, index.as_ref()).map(FileStatus::from)
            });
            Ok(finish(&report))
        }

        Commands::Query { name, root_dir } => {
            let index = load_index(root_dir.as_deref())?;
            match query_construct(&name, &index) {
                Some(paths) => {
                    for path in paths {
                        println!("{}", path.display());
                    }
                    Ok(true)
                }
                None => {
                    println!("{name} not found in index");
                    Ok(false)
                }
            }
        }

        Commands::Meta { file } => {
            let meta = extract_fortran_meta(&file)?;
            let json = serde_json::to_string_pretty(&meta).context("failed to encode metadata")?;
            println!("{json}");
            Ok(true)
        }

        Commands::SavePrompts {
            files,
            prompt,
            fail_fast,
        } => {
            let template = load_template(prompt.as_deref(), config)?;
            let mapping = create_src_mapping(config.expand_inputs(&files)?);
            let runner =
                BatchRunner::new(fail_fast || config.fail_fast).with_progress(mapping.len());
            let report = save_prompts(&mapping, &template, &runner);
            Ok(finish(&report))
        }

        Commands::Translate {
            files,
            prompt,
            dry_run,
            fail_fast,
        } => {
            let generator = select_generator(dry_run)?;
            let template = load_template(prompt.as_deref(), config)?;
            let mapping = create_src_mapping(config.expand_inputs(&files)?);
            let runner =
                BatchRunner::new(fail_fast || config.fail_fast).with_progress(mapping.len());
            let report = translate(&mapping, &template, generator.as_ref(), &runner);
            Ok(finish(&report))
        }
    }
}

fn index_dir(root_dir: Option<&Path>) -> Result<PathBuf> {
    match root_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("failed to resolve current directory"),
    }
}

fn load_index(root_dir: Option<&Path>) -> Result<CombinedIndex> {
    let dir = index_dir(root_dir)?;
    Ok(CombinedIndex::load_from(&dir)?)
}

/// Drafting works without an index; a missing one is only reported.
fn load_index_optional(root_dir: Option<&Path>) -> Result<Option<CombinedIndex>> {
    let dir = index_dir(root_dir)?;
    match CombinedIndex::load_from(&dir) {
        Ok(index) => Ok(Some(index)),
        Err(e @ ScribeError::MissingIndex { .. }) => {
            warn!("{e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn load_template(prompt: Option<&Path>, config: &Config) -> Result<ChatTemplate> {
    let path = prompt
        .or(config.chat_template.as_deref())
        .context("no chat template given; pass --prompt or set chat_template in code-scribe.json")?;
    Ok(ChatTemplate::load(path)?)
}

/// Print each outcome and the summary; `false` when anything failed.
fn finish(report: &BatchReport) -> bool {
    for outcome in &report.outcomes {
        println!("{outcome}");
    }
    println!("{report}");
    !report.has_failures()
}
