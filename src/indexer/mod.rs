//! Symbol indexer: per-directory `scribe.yaml` sidecars and the combined
//! name → file lookup built from them.
pub mod combined;
pub mod info;
pub mod sidecar;

pub use combined::{Collision, CombinedIndex, create_file_indexes, query_construct};
pub use info::{ConstructInfo, extract_fortran_info};
pub use sidecar::{
    DEFAULT_EXTENSIONS, DirectoryIndex, IndexSummary, SIDECAR_FILE_NAME, ScribeIndexer,
    create_scribe_yaml, load_scribe_yaml,
};
