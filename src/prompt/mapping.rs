use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::annotator::draft_path_for;

pub const TARGET_SUFFIX: &str = ".cpp";
pub const INTERFACE_SUFFIX: &str = "_fi.f90";
pub const PROMPT_SUFFIX: &str = ".json";

/// Sibling artifact paths for a list of sources, as five index-aligned lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMapping {
    pub sources: Vec<PathBuf>,
    /// C++ translation
    pub targets: Vec<PathBuf>,
    /// Fortran/C interface
    pub interfaces: Vec<PathBuf>,
    pub drafts: Vec<PathBuf>,
    /// Saved prompt record
    pub prompts: Vec<PathBuf>,
}

/// One row of a [`SourceMapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry<'a> {
    pub source: &'a Path,
    pub target: &'a Path,
    pub interface: &'a Path,
    pub draft: &'a Path,
    pub prompt: &'a Path,
}

impl AsRef<Path> for MappingEntry<'_> {
    fn as_ref(&self) -> &Path {
        self.source
    }
}

impl SourceMapping {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = MappingEntry<'_>> {
        (0..self.len()).map(|i| MappingEntry {
            source: &self.sources[i],
            target: &self.targets[i],
            interface: &self.interfaces[i],
            draft: &self.drafts[i],
            prompt: &self.prompts[i],
        })
    }
}

/// Replace the extension of `path` with `suffix`, e.g. `a/b.f90` + `_fi.f90`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut stem: OsString = path.with_extension("").into_os_string();
    stem.push(suffix);
    PathBuf::from(stem)
}

/// Build the source → artifact mapping for `filelist`.
pub fn create_src_mapping<I, P>(filelist: I) -> SourceMapping
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut mapping = SourceMapping::default();

    for sfile in filelist {
        let sfile = sfile.as_ref();
        mapping.sources.push(sfile.to_path_buf());
        mapping.targets.push(with_suffix(sfile, TARGET_SUFFIX));
        mapping.interfaces.push(with_suffix(sfile, INTERFACE_SUFFIX));
        mapping.drafts.push(draft_path_for(sfile));
        mapping.prompts.push(with_suffix(sfile, PROMPT_SUFFIX));
    }

    mapping
}
