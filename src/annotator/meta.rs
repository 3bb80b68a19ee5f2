use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::fsutil;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(subroutine|function|module)\s+(\w+)").unwrap());
static ARGS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((.*?)\)").unwrap());
static DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(integer|real|double\s*precision|character|logical)\b(.*)$").unwrap()
});
// Kind/length qualifier directly after the type keyword: `*8`, `(kind=dp)`, `(len=*)`
static QUALIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\*\s*\d+|\([^)]*\))").unwrap());
static NAMES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\s,]*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructKind {
    Module,
    Subroutine,
    Function,
}

impl ConstructKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "module" => Some(ConstructKind::Module),
            "subroutine" => Some(ConstructKind::Subroutine),
            "function" => Some(ConstructKind::Function),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructKind::Module => "module",
            ConstructKind::Subroutine => "subroutine",
            ConstructKind::Function => "function",
        }
    }

    fn takes_arguments(&self) -> bool {
        matches!(self, ConstructKind::Subroutine | ConstructKind::Function)
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-construct record gathered by [`extract_fortran_meta`].
///
/// The scope of a construct runs from its header to the next header or the
/// end of the file; `end` statements are not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConstructKind,
    pub variables_declared: Vec<String>,
    pub argument_list: Vec<String>,
}

impl ConstructMeta {
    fn new(name: &str, kind: ConstructKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            variables_declared: Vec::new(),
            argument_list: Vec::new(),
        }
    }
}

enum ScanState {
    Idle,
    InConstruct(ConstructMeta),
}

/// Accumulator with one open construct at a time.
struct MetaScanner {
    state: ScanState,
    finished: Vec<ConstructMeta>,
}

impl MetaScanner {
    fn new() -> Self {
        Self {
            state: ScanState::Idle,
            finished: Vec::new(),
        }
    }

    /// A new header closes whatever construct is open.
    fn header_seen(&mut self, meta: ConstructMeta) {
        if let ScanState::InConstruct(done) =
            std::mem::replace(&mut self.state, ScanState::InConstruct(meta))
        {
            self.finished.push(done);
        }
    }

    /// Declarations outside any construct are dropped.
    fn declaration(&mut self, names: Vec<String>) {
        if let ScanState::InConstruct(meta) = &mut self.state {
            meta.variables_declared.extend(names);
        }
    }

    fn end_of_input(mut self) -> Vec<ConstructMeta> {
        if let ScanState::InConstruct(done) = self.state {
            self.finished.push(done);
        }
        self.finished
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a construct header, including the argument list for procedures.
fn parse_header(line: &str) -> Option<ConstructMeta> {
    let caps = HEADER_RE.captures(line)?;
    let kind = ConstructKind::from_keyword(&caps[1])?;
    let mut meta = ConstructMeta::new(&caps[2], kind);

    if kind.takes_arguments() {
        if let Some(args) = ARGS_RE.captures(line) {
            meta.argument_list = split_list(&args[1]);
        }
    }
    Some(meta)
}

/// Raw name fragments from a type declaration line.
fn parse_declaration(line: &str) -> Option<Vec<String>> {
    let caps = DECL_RE.captures(line)?;
    let rest = caps.get(2).map_or("", |m| m.as_str());

    let rest = match rest.split_once("::") {
        Some((_, names)) => names,
        None => QUALIFIER_RE
            .find(rest)
            .map_or(rest, |m| &rest[m.end()..]),
    };

    let names = NAMES_RE.find(rest).map_or("", |m| m.as_str());
    Some(split_list(names))
}

/// Extract construct names, kinds, declared variables and argument lists.
pub fn extract_fortran_meta<P: AsRef<Path>>(sfile: P) -> Result<Vec<ConstructMeta>> {
    let content = fsutil::read_source(sfile.as_ref())?;
    Ok(extract_meta_from_content(&content))
}

/// Line scan behind [`extract_fortran_meta`].
pub fn extract_meta_from_content(content: &str) -> Vec<ConstructMeta> {
    let mut scanner = MetaScanner::new();

    for line in content.lines() {
        let line = line.trim();

        if let Some(meta) = parse_header(line) {
            scanner.header_seen(meta);
        }
        if let Some(names) = parse_declaration(line) {
            scanner.declaration(names);
        }
    }

    scanner.end_of_input()
}
