use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::info::{ConstructInfo, extract_fortran_info};
use crate::error::{Result, ScribeError};
use crate::fsutil;

/// Name of the per-directory index file.
pub const SIDECAR_FILE_NAME: &str = "scribe.yaml";

/// Fortran extensions picked up by the indexer (case-sensitive).
pub const DEFAULT_EXTENSIONS: &[&str] = &["f", "f90", "F90"];

/// Contents of one `scribe.yaml`.
///
/// `root` points at the tree the index was built from; it is optional on
/// load so a sidecar without it can be reported instead of panicking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryIndex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub directory: PathBuf,
    #[serde(default)]
    pub files: BTreeMap<String, ConstructInfo>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Sidecar files written
    pub directories: usize,
    /// Fortran files scanned
    pub files: usize,
}

/// Builds `scribe.yaml` sidecars for a directory tree.
pub struct ScribeIndexer {
    extensions: Vec<String>,
}

impl Default for ScribeIndexer {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }
}

impl ScribeIndexer {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Checks if a file extension is on the allow-list
    fn is_supported_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    /// Index every directory under `root`, overwriting existing sidecars.
    ///
    /// Directories without a matching source get no sidecar. Any source
    /// that cannot be read aborts the run.
    pub fn index_directory<P: AsRef<Path>>(&self, root: P) -> Result<IndexSummary> {
        let root = std::path::absolute(root.as_ref())
            .map_err(|e| ScribeError::io(root.as_ref(), e))?;

        let mut per_dir: BTreeMap<PathBuf, BTreeMap<String, ConstructInfo>> = BTreeMap::new();
        let mut summary = IndexSummary::default();

        for entry in sorted_walk(&root) {
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
            if !self.is_supported_extension(ext) {
                continue;
            }

            let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
                continue;
            };

            let info = extract_fortran_info(path)?;
            debug!(
                "Indexed {}: {} constructs",
                path.display(),
                info.names().count()
            );
            per_dir
                .entry(dir.to_path_buf())
                .or_default()
                .insert(name.to_string_lossy().into_owned(), info);
            summary.files += 1;
        }

        for (directory, files) in per_dir {
            let index = DirectoryIndex {
                root: Some(root.clone()),
                directory,
                files,
            };
            write_scribe_yaml(&index)?;
            summary.directories += 1;
        }

        info!(
            "Indexed {} files into {} sidecars under {}",
            summary.files,
            summary.directories,
            root.display()
        );
        Ok(summary)
    }
}

/// Traverse `root_directory` and write `scribe.yaml` files for Fortran sources.
pub fn create_scribe_yaml<P: AsRef<Path>>(root_directory: P) -> Result<IndexSummary> {
    ScribeIndexer::default().index_directory(root_directory)
}

/// Serialize `index` into `directory/scribe.yaml`.
pub fn write_scribe_yaml(index: &DirectoryIndex) -> Result<PathBuf> {
    let yaml_path = index.directory.join(SIDECAR_FILE_NAME);
    if index.files.is_empty() {
        return Ok(yaml_path);
    }

    let data = serde_yaml::to_string(index).map_err(|e| ScribeError::Serialize {
        path: yaml_path.clone(),
        reason: e.to_string(),
    })?;
    fsutil::write_atomic(&yaml_path, &data)?;
    debug!("Wrote {}", yaml_path.display());
    Ok(yaml_path)
}

/// Load the content of a `scribe.yaml` file.
pub fn load_scribe_yaml<P: AsRef<Path>>(file_path: P) -> Result<DirectoryIndex> {
    let file_path = file_path.as_ref();
    let data = fs::read_to_string(file_path).map_err(|e| ScribeError::io(file_path, e))?;
    serde_yaml::from_str(&data).map_err(|source| ScribeError::MalformedSidecar {
        path: file_path.to_path_buf(),
        source,
    })
}

/// Depth-first walk with siblings in file-name order.
///
/// Hidden and ignored files are included; the order is what makes
/// combined-index tie breaks reproducible.
pub(crate) fn sorted_walk(root: &Path) -> impl Iterator<Item = ignore::DirEntry> {
    WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                None
            }
        })
}
