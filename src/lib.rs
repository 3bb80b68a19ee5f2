//! # code-scribe: Fortran to C++ source annotator
//!
//! Indexes the modules, subroutines and functions of a Fortran tree, writes
//! rule-based C++ drafts next to each source, and assembles chat prompts for
//! a model-backed translation step.
//!
//! ## Architecture
//!
//! - **[`indexer`]**: Per-directory `scribe.yaml` sidecars and the combined symbol index
//! - **[`annotator`]**: Construct metadata and the `.scribe` draft rewriter
//! - **[`prompt`]**: Source → artifact mapping, chat templates, prompt records, translation
//! - **[`generator`]**: Chat-completion boundary and the echo backend
//! - **[`batch`]**: Per-file batch runner with progress and summary reports
//! - **[`config`]**: Configuration loading, validation, and input expansion
//! - **[`error`]**: Shared error type

pub mod annotator;
pub mod batch;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod generator;
pub mod indexer;
pub mod prompt;
