use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fsutil;

static SUBROUTINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^subroutine\s+(\w+)").unwrap());
static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^function\s+(\w+)").unwrap());

/// Top-level constructs declared in one Fortran file, in declaration order.
///
/// Names are lower-cased. Duplicates are kept as found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructInfo {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub subroutines: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
}

impl ConstructInfo {
    /// All declared names, modules first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .chain(&self.subroutines)
            .chain(&self.functions)
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.subroutines.is_empty() && self.functions.is_empty()
    }
}

/// Extract module, subroutine and function names from a Fortran file.
pub fn extract_fortran_info<P: AsRef<Path>>(filepath: P) -> Result<ConstructInfo> {
    let content = fsutil::read_source(filepath.as_ref())?;
    Ok(extract_from_content(&content))
}

/// Line scan behind [`extract_fortran_info`].
pub fn extract_from_content(content: &str) -> ConstructInfo {
    let mut info = ConstructInfo::default();

    for line in content.lines() {
        let line = line.trim().to_lowercase();

        if line.starts_with("module ") {
            if let Some(name) = line.split_whitespace().nth(1) {
                info.modules.push(name.to_string());
            }
        } else if line.starts_with("subroutine ") {
            if let Some(caps) = SUBROUTINE_RE.captures(&line) {
                info.subroutines.push(caps[1].to_string());
            }
        } else if line.starts_with("function ") {
            if let Some(caps) = FUNCTION_RE.captures(&line) {
                info.functions.push(caps[1].to_string());
            }
        }
    }

    info
}
