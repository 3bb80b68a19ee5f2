//! Line rewrite rules for the draft annotator.
//!
//! Each rule is a pure `&str -> String` function. They run in the order of
//! [`REWRITE_RULES`] on the output of the previous rule, so later patterns
//! may rely on earlier rewrites:
//!
//! * the array rules only know the normalized type spellings (`int`,
//!   `double`, `bool`, `complex<T>`) produced by [`convert_type_keywords`];
//! * [`rewrite_dimension_arrays`] expects `::` to be gone already.
//!
//! Comment filtering and `use` handling happen before any of these run, see
//! [`is_comment`] and [`match_use`].
use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};

/// One named step of the rewrite pipeline.
pub struct LineRule {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Rewrites applied to every surviving line, in order.
pub const REWRITE_RULES: &[LineRule] = &[
    LineRule {
        name: "implicit-none",
        apply: strip_implicit_none,
    },
    LineRule {
        name: "type-keywords",
        apply: convert_type_keywords,
    },
    LineRule {
        name: "attribute-separator",
        apply: strip_attribute_separator,
    },
    LineRule {
        name: "complex-arrays",
        apply: rewrite_complex_arrays,
    },
    LineRule {
        name: "dimension-arrays",
        apply: rewrite_dimension_arrays,
    },
    LineRule {
        name: "shaped-declarations",
        apply: rewrite_shaped_declarations,
    },
    LineRule {
        name: "continuations",
        apply: convert_continuations,
    },
    LineRule {
        name: "power-operator",
        apply: convert_power_operator,
    },
];

static USE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^use\s+(\w+)").unwrap());
static IMPLICIT_NONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bimplicit\s+none\b").unwrap());

static COMPLEX_DP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcomplex\s*\(\s*(?:kind\s*=\s*)?dp\s*\)\s*").unwrap()
});
static COMPLEX_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcomplex\s*\(\s*integer\s*\)\s*").unwrap());
static COMPLEX_BOOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcomplex\s*\(\s*logical\s*\)\s*").unwrap());
static DOUBLE_PRECISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdouble\s*precision\b\s*").unwrap());
static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\binteger\b\s*(?:\(\s*kind\s*=\s*\w+\s*\)|\(\s*\w+\s*\)|\*\s*\d+)?\s*").unwrap()
});
static REAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\breal\b\s*(?:\(\s*kind\s*=\s*\w+\s*\)|\(\s*\w+\s*\)|\*\s*\d+)?\s*").unwrap()
});
static LOGICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blogical\b\s*(?:\(\s*kind\s*=\s*\w+\s*\)|\(\s*\w+\s*\))?\s*").unwrap()
});

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*::\s*").unwrap());

static COMPLEX_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcomplex<([^>]+)>\s*(\w+)\s*\((.*?)\)\s*").unwrap());
// Dims may hold one level of nested parens; attributes such as `intent(in)`
// between the dims and the name are dropped.
static DIMENSION_ARRAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(real|double|int|bool|complex<[^>]+>)\s*,?\s*",
        r"dimension\s*\(([^()]*(?:\([^()]*\)[^()]*)*)\)",
        r"(?:\s*,\s*\w+(?:\s*\([^()]*\))?)*",
        r"\s*(\w+)\s*;?",
    ))
    .unwrap()
});
static SHAPED_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\s*)(real|double|int|bool|complex<[^>]+>)\s*(\w+)\s*\(([^()]*)\)\s*;?\s*$")
        .unwrap()
});

static LEADING_AMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*&").unwrap());
static TRAILING_AMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*&\s*$").unwrap());

// Real literal with optional exponent and kind: `2`, `1.5d0`, `.5`, `1.0e-3_dp`
const REAL_LITERAL: &str = r"(?:\d*\.\d+|\d+)(?:[eEdD][-+]?\d+)?(?:_\w+)?";
// As a base the literal needs a leading digit, so `.eq.2` is not read as `.2`
const BASE_LITERAL: &str = r"(?:\d+\.\d+|\d+)(?:[eEdD][-+]?\d+)?(?:_\w+)?";

/// Operand ending right before a `**`.
static POWER_BASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(\w*\([^()]*\)|{BASE_LITERAL}|\w+)\s*$")).unwrap()
});
/// Operand starting right after a `**`.
static POWER_EXP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(-?(?:\w*\([^()]*\)|{REAL_LITERAL}|\w+))")).unwrap()
});

/// Comment lines are dropped from the draft.
///
/// A trimmed line starting with `c` or `!` is a comment, except
/// declarations starting with `complex`.
pub fn is_comment(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    (lower.starts_with('c') || lower.starts_with('!')) && !lower.starts_with("complex")
}

/// Module name of a `use <module>` statement.
pub fn match_use(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    USE_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn strip_implicit_none(line: &str) -> String {
    IMPLICIT_NONE_RE.replace_all(line, "").into_owned()
}

/// `real(y)` inside an expression is the intrinsic, not a declaration.
fn in_expression(line: &str, start: usize) -> bool {
    matches!(
        line[..start].trim_end().chars().last(),
        Some('=' | '(' | ',' | '+' | '-' | '*' | '/')
    )
}

/// Map Fortran type keywords to their C++ spelling.
///
/// The `complex(...)` forms go first so their inner `integer`/`logical`
/// are still intact when matched.
pub fn convert_type_keywords(line: &str) -> String {
    let line = COMPLEX_DP_RE.replace_all(line, "complex<double> ");
    let line = COMPLEX_INT_RE.replace_all(&line, "complex<int> ");
    let line = COMPLEX_BOOL_RE.replace_all(&line, "complex<bool> ");
    let line = DOUBLE_PRECISION_RE.replace_all(&line, "double ");
    let line = INTEGER_RE.replace_all(&line, "int ");
    let line = REAL_RE.replace_all(&line, |caps: &Captures| {
        let m = caps.get(0).map_or(0..0, |m| m.range());
        if in_expression(&line, m.start) {
            caps[0].to_string()
        } else {
            "double ".to_string()
        }
    });
    LOGICAL_RE.replace_all(&line, "bool ").into_owned()
}

/// Drop `::` separators, leaving `std::` qualified names alone.
pub fn strip_attribute_separator(line: &str) -> String {
    SEPARATOR_RE
        .replace_all(line, |caps: &Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            if line[..start].ends_with("std") {
                caps[0].to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}

/// `complex<T> z(n)` → `FArray<std::complex<T>> z(n)`
pub fn rewrite_complex_arrays(line: &str) -> String {
    COMPLEX_ARRAY_RE
        .replace_all(line, "FArray<std::complex<${1}>> ${2}(${3})")
        .into_owned()
}

/// `double, dimension(n, m) a` → `FArray<double> a(n, m)`
pub fn rewrite_dimension_arrays(line: &str) -> String {
    DIMENSION_ARRAY_RE
        .replace_all(line, "FArray<${1}> ${3}(${2})")
        .into_owned()
}

/// `int idx(n)` on its own line → `FArray<int> idx(n)`
pub fn rewrite_shaped_declarations(line: &str) -> String {
    SHAPED_DECL_RE
        .replace(line, "${1}FArray<${2}> ${3}(${4})")
        .into_owned()
}

/// Fortran `&` continuations become C++ backslash continuations.
pub fn convert_continuations(line: &str) -> String {
    let line = LEADING_AMP_RE.replace(line, NoExpand("\\"));
    TRAILING_AMP_RE.replace(&line, NoExpand(" \\")).into_owned()
}

/// Rewrite the rightmost `**` that has a recognizable base and exponent.
fn rewrite_rightmost_power(line: &str) -> Option<String> {
    line.rmatch_indices("**").find_map(|(op, _)| {
        let base = POWER_BASE_RE.captures(&line[..op])?.get(1)?;
        let rest = &line[op + 2..];
        let exp = POWER_EXP_RE.captures(rest)?;
        let (whole, exponent) = (exp.get(0)?, exp.get(1)?);
        Some(format!(
            "{}pow({},{}){}",
            &line[..base.start()],
            base.as_str(),
            exponent.as_str(),
            &rest[whole.end()..]
        ))
    })
}

/// `x**y` → `pow(x,y)`
///
/// `**` binds right to left, so `a**b**c` becomes `pow(a,pow(b,c))`.
pub fn convert_power_operator(line: &str) -> String {
    let mut current = line.to_string();
    // Each rewrite consumes one `**`
    while let Some(next) = rewrite_rightmost_power(&current) {
        current = next;
    }
    current
}

/// Run every rewrite rule over `line`, in order.
pub fn apply_rules(line: &str) -> String {
    REWRITE_RULES
        .iter()
        .fold(line.to_string(), |acc, rule| (rule.apply)(&acc))
}
