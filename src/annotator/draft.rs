use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::rules;
use crate::error::Result;
use crate::fsutil;
use crate::indexer::CombinedIndex;

/// Extension of the draft written next to each source.
pub const DRAFT_EXTENSION: &str = "scribe";

/// Advisory lines at the top of every draft.
pub const PROMPT_LINES: [&str; 3] = [
    "scribe-prompt: Write corresponding extern \"C\" with _wrapper added to the name. Refer to the template for treating Farray and scalars",
    "scribe-prompt: When variables are used as function. They should be treated as external or statement functions. External functions are available in header files",
    "scribe-prompt: Statement functions should be converted to equivalent lambda functions in C++. Include [&] in capture clause to use variables by reference",
];

/// Includes every draft starts with.
const BASELINE_INCLUDES: [&str; 2] = ["#include <cmath>", "#include <complex>"];

/// Result of [`annotate_fortran_file`]; both variants are successes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotateOutcome {
    Generated(PathBuf),
    Skipped(PathBuf),
}

impl AnnotateOutcome {
    pub fn draft_path(&self) -> &Path {
        match self {
            AnnotateOutcome::Generated(p) | AnnotateOutcome::Skipped(p) => p,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, AnnotateOutcome::Skipped(_))
    }
}

impl fmt::Display for AnnotateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotateOutcome::Generated(p) => {
                write!(f, "Generated draft file for LLM consumption {}", p.display())
            }
            AnnotateOutcome::Skipped(p) => write!(f, "Skipping! File exists {}...", p.display()),
        }
    }
}

/// Sorted, de-duplicated `#include` lines for one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIncludeSet(BTreeSet<String>);

impl Default for HeaderIncludeSet {
    fn default() -> Self {
        Self(BASELINE_INCLUDES.iter().map(|s| s.to_string()).collect())
    }
}

impl HeaderIncludeSet {
    pub fn add_module(&mut self, module_name: &str) {
        self.0.insert(format!("#include <{module_name}.hpp>"));
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Annotated draft of one source, before it is written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub includes: HeaderIncludeSet,
    pub lines: Vec<String>,
    /// Modules pulled in with `use`, in order of appearance
    pub used_modules: Vec<String>,
}

impl Draft {
    /// Run the comment filter, `use` handling and rewrite rules over `source`.
    pub fn from_source(source: &str) -> Self {
        let mut draft = Draft::default();

        for line in source.lines() {
            if rules::is_comment(line) {
                continue;
            }

            if let Some(module_name) = rules::match_use(line) {
                draft.includes.add_module(module_name);
                draft.lines.push(format!("using namespace {module_name};"));
                draft.used_modules.push(module_name.to_string());
                continue;
            }

            draft.lines.push(rules::apply_rules(line).trim().to_string());
        }

        draft
    }

    /// Advisory lines, blank line, includes, blank line, body.
    pub fn render(&self) -> String {
        let mut out = PROMPT_LINES.join("\n");
        out.push_str("\n\n");

        if !self.includes.is_empty() {
            out.push_str(&self.includes.iter().collect::<Vec<_>>().join("\n"));
            out.push_str("\n\n");
        }

        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Path of the draft for `source`: same stem, `.scribe` extension.
pub fn draft_path_for(source: &Path) -> PathBuf {
    source.with_extension(DRAFT_EXTENSION)
}

/// Annotate a Fortran file into a `.scribe` draft for LLM consumption.
///
/// An existing draft is never touched. The combined index, when given, is
/// only consulted to report where `use`d modules live.
pub fn annotate_fortran_file<P: AsRef<Path>>(
    sfile: P,
    index: Option<&CombinedIndex>,
) -> Result<AnnotateOutcome> {
    let sfile = sfile.as_ref();
    let scribe_filename = draft_path_for(sfile);

    if scribe_filename.is_file() {
        debug!("Draft exists, skipping {}", scribe_filename.display());
        return Ok(AnnotateOutcome::Skipped(scribe_filename));
    }

    let source = fsutil::read_source(sfile)?;
    let draft = Draft::from_source(&source);

    if let Some(index) = index {
        for module_name in &draft.used_modules {
            match index.get(&module_name.to_lowercase()) {
                Some(path) => debug!("use {module_name} -> {}", path.display()),
                None => debug!("use {module_name} not found in index"),
            }
        }
    }

    fsutil::write_atomic(&scribe_filename, &draft.render())?;
    info!("Wrote draft {}", scribe_filename.display());
    Ok(AnnotateOutcome::Generated(scribe_filename))
}
