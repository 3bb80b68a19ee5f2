use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::sidecar::{SIDECAR_FILE_NAME, load_scribe_yaml, sorted_walk};
use crate::error::{Result, ScribeError};

/// A name that was bound to more than one file while merging sidecars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub name: String,
    /// Path the name resolves to after the merge
    pub kept: PathBuf,
    /// Path that was overwritten
    pub replaced: PathBuf,
}

/// Tree-wide merge of every `scribe.yaml`: construct name → file path.
///
/// Sidecars are merged in depth-first, file-name order and the last binding
/// of a name wins. Overwritten bindings are kept in `collisions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedIndex {
    pub root: PathBuf,
    pub entries: BTreeMap<String, PathBuf>,
    pub collisions: Vec<Collision>,
}

impl CombinedIndex {
    /// Build the combined index starting from the sidecar in `dir`.
    ///
    /// The sidecar in `dir` only supplies the tree root; it is re-read along
    /// with every other sidecar under that root.
    pub fn load_from<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let yaml_path = dir.join(SIDECAR_FILE_NAME);
        if !yaml_path.is_file() {
            return Err(ScribeError::MissingIndex {
                dir: dir.to_path_buf(),
            });
        }

        let root = load_scribe_yaml(&yaml_path)?
            .root
            .filter(|r| !r.as_os_str().is_empty())
            .ok_or_else(|| ScribeError::MissingRootField {
                path: yaml_path.clone(),
            })?;

        let mut index = CombinedIndex {
            root: root.clone(),
            ..Default::default()
        };

        for entry in sorted_walk(&root) {
            if entry.file_name() != SIDECAR_FILE_NAME
                || !entry.file_type().is_some_and(|t| t.is_file())
            {
                continue;
            }
            let Some(dirpath) = entry.path().parent() else {
                continue;
            };

            let sidecar = load_scribe_yaml(entry.path())?;
            for (file, info) in &sidecar.files {
                let file_path = dirpath.join(file);
                for name in info.names() {
                    index.insert(name, &file_path);
                }
            }
        }

        debug!(
            "Combined index under {}: {} names, {} collisions",
            root.display(),
            index.entries.len(),
            index.collisions.len()
        );
        Ok(index)
    }

    fn insert(&mut self, name: &str, file_path: &Path) {
        if let Some(previous) = self
            .entries
            .insert(name.to_string(), file_path.to_path_buf())
        {
            if previous != file_path {
                warn!(
                    "'{name}' declared in both {} and {}; using the latter",
                    previous.display(),
                    file_path.display()
                );
                self.collisions.push(Collision {
                    name: name.to_string(),
                    kept: file_path.to_path_buf(),
                    replaced: previous,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }
}

/// Create the combined index from the `scribe.yaml` in the working directory.
pub fn create_file_indexes() -> Result<CombinedIndex> {
    let cwd = std::env::current_dir().map_err(|e| ScribeError::io(".", e))?;
    CombinedIndex::load_from(cwd)
}

/// Query the file paths of a module, subroutine or function.
///
/// Fortran names are case-insensitive and indexed lower-cased, so `name` is
/// matched the same way. `None` means nothing matched; a returned list is
/// never empty.
pub fn query_construct(name: &str, file_index: &CombinedIndex) -> Option<Vec<PathBuf>> {
    let name = name.to_lowercase();
    let matches: Vec<PathBuf> = file_index
        .entries
        .iter()
        .filter(|(construct, _)| **construct == name)
        .map(|(_, path)| path.clone())
        .collect();

    if matches.is_empty() { None } else { Some(matches) }
}
