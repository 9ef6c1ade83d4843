//! `$name` reference extraction from configuration strings.

use regex::Regex;
use std::sync::LazyLock;

/// Reserved loop variable: the current range key.
pub const KEY: &str = "KEY";
/// Reserved loop variable: the current range value.
pub const VALUE: &str = "VALUE";
/// Reserved loop variable: the current range index.
pub const INDEX: &str = "INDEX";

/// A `$` token ends at the next `.`, space, `)` or `[`, or at end of string.
/// An unterminated token is captured in full; a second `$` before a boundary
/// restarts the token. There is no escaping mechanism.
static REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^$. )\[]*)(?:[. )\[]|$)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// One of the reserved loop variables `KEY`/`VALUE`/`INDEX`, valid only
    /// inside a range block.
    Range,
    Regular,
}

/// A parsed occurrence of a `$name` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub name: String,
}

impl Reference {
    fn new(name: &str) -> Self {
        let kind = match name {
            KEY | VALUE | INDEX => ReferenceKind::Range,
            _ => ReferenceKind::Regular,
        };
        Self {
            kind,
            name: name.to_string(),
        }
    }

    /// Whether this reference participates in graph-edge wiring.
    ///
    /// Range references denote loop state, and names starting with `_` are
    /// consumed only inside query expressions; neither becomes an edge.
    pub fn is_wireable(&self) -> bool {
        self.kind == ReferenceKind::Regular && !self.name.starts_with('_')
    }
}

/// Extract every `$`-introduced token from a string, in order of occurrence.
///
/// Filtering (range references, underscore-prefixed names) is the caller's
/// responsibility.
pub fn parse_references(s: &str) -> Vec<Reference> {
    REF_REGEX
        .captures_iter(s)
        .map(|caps| Reference::new(caps.get(1).map_or("", |m| m.as_str())))
        .collect()
}
