/// Error types shared by the indexer, annotator and prompt pipeline.
use std::path::PathBuf;

use thiserror::Error;

use crate::generator::GeneratorError;

/// Errors that can occur while indexing, annotating or assembling prompts.
///
/// Every variant carries the offending path so the caller can act on it.
#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("no scribe.yaml found in {}; run `code-scribe index` first", dir.display())]
    MissingIndex { dir: PathBuf },

    #[error("no 'root' entry found in {}", path.display())]
    MissingRootField { path: PathBuf },

    #[error("cannot read source file {}: {source}", path.display())]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed sidecar index {}: {source}", path.display())]
    MalformedSidecar {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("malformed chat template {}: {reason}", path.display())]
    MalformedTemplate { path: PathBuf, reason: String },

    #[error("generation failed for {}: {source}", path.display())]
    Generator {
        path: PathBuf,
        #[source]
        source: GeneratorError,
    },

    #[error("failed to serialize {}: {reason}", path.display())]
    Serialize { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScribeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScribeError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScribeError::UnreadableSource {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScribeError>;
