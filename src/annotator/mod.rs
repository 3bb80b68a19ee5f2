//! Source annotator: construct metadata and `.scribe` draft generation.
pub mod draft;
pub mod meta;
pub mod rules;

pub use draft::{
    AnnotateOutcome, DRAFT_EXTENSION, Draft, HeaderIncludeSet, annotate_fortran_file,
    draft_path_for,
};
pub use meta::{ConstructKind, ConstructMeta, extract_fortran_meta};
