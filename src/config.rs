/// Configuration module for code-scribe.
///
/// Handles loading, validating, and providing default configuration values,
/// plus expansion of the file/directory/glob inputs given on the command line.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::indexer::DEFAULT_EXTENSIONS;
use crate::indexer::sidecar::sorted_walk;

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "code-scribe.json";

// ── Default value functions ──────────────────────────────────────────

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Fortran extensions picked up by `index` and directory inputs.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Stop a batch at the first failing file.
    #[serde(default)]
    pub fail_fast: bool,

    /// Chat template used when `--prompt` is not given.
    #[serde(default)]
    pub chat_template: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            fail_fast: false,
            chat_template: None,
            log_level: default_log_level(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is `None`, defaults to [`CONFIG_FILE_NAME`].
    /// A missing file yields the defaults; invalid JSON is reported and
    /// also falls back to the defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path.unwrap_or_else(|| Path::new(CONFIG_FILE_NAME));

        if !path.exists() {
            if config_path.is_some() {
                info!("{} not found, using defaults", path.display());
            }
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let mut cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {}: {e}", path.display());
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", path.display());

        // Strip leading dots so ".f90" and "f90" both work
        for ext in &mut cfg.extensions {
            *ext = ext.trim_start_matches('.').to_string();
        }

        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.extensions.is_empty(),
            "at least one source extension must be specified"
        );
        anyhow::ensure!(
            self.extensions.iter().all(|e| !e.is_empty()),
            "source extensions must not be empty"
        );
        Ok(())
    }

    fn is_source(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Expand command-line inputs into a sorted, de-duplicated file list.
    ///
    /// Plain files are taken as given, directories are walked for sources,
    /// anything with `*` or `?` is treated as a glob.
    pub fn expand_inputs<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for input in inputs {
            let input = input.as_ref();
            if input.contains('*') || input.contains('?') {
                match expand_glob(input) {
                    Ok(matches) => files.extend(matches.into_iter().filter(|p| self.is_source(p))),
                    Err(e) => warn!("Failed to expand pattern {input}: {e}"),
                }
                continue;
            }

            let path = Path::new(input);
            if path.is_dir() {
                files.extend(
                    sorted_walk(path)
                        .map(|entry| entry.into_path())
                        .filter(|p| self.is_source(p)),
                );
            } else {
                // Missing files are kept so the batch reports them
                files.insert(path.to_path_buf());
            }
        }

        Ok(files.into_iter().collect())
    }
}

// ── Pattern helpers ──────────────────────────────────────────────────

/// Expand a glob pattern (`**` supported by the glob crate).
fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let matches = glob::glob(pattern).context("invalid glob pattern")?;
    Ok(matches.flatten().collect())
}

// ── Tests ────────────────────────────────────────────────────────────
