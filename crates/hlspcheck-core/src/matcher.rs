//! Keyword pattern matching.
//!
//! FITS keywords are case-insensitive. In a keyword pattern `*` matches any
//! run of characters (including none); every other character is literal and
//! the whole candidate must match.

use crate::dictionary::Rule;
use globset::{GlobBuilder, GlobMatcher};

/// A compiled keyword name or wildcard family (e.g. `CD*_*`).
#[derive(Debug, Clone)]
pub struct KeywordPattern {
    source: String,
    matcher: GlobMatcher,
}

impl KeywordPattern {
    pub fn new(pattern: &str) -> Result<Self, globset::Error> {
        let source = pattern.trim().to_string();
        let glob = GlobBuilder::new(&to_glob(&source))
            .case_insensitive(true)
            .literal_separator(false)
            .backslash_escape(true)
            .build()?;
        Ok(Self {
            source,
            matcher: glob.compile_matcher(),
        })
    }

    /// The pattern as declared.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_wildcard(&self) -> bool {
        self.source.contains('*')
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate.trim())
    }
}

impl std::fmt::Display for KeywordPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Match a single pattern against a candidate keyword.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    match KeywordPattern::new(pattern) {
        Ok(compiled) => compiled.is_match(candidate),
        Err(e) => {
            tracing::debug!(pattern, error = %e, "keyword pattern does not compile");
            false
        }
    }
}

/// Every name that satisfies `rule`: the primary name, then each alternate.
pub fn resolve_names(rule: &Rule) -> &[KeywordPattern] {
    rule.patterns()
}

/// First pattern in `patterns` matching `candidate`.
pub fn first_match<'p>(patterns: &'p [KeywordPattern], candidate: &str) -> Option<&'p KeywordPattern> {
    patterns.iter().find(|p| p.is_match(candidate))
}

/// Translate a keyword pattern into globset syntax: only `*` stays special,
/// and runs of `*` collapse (globset reserves `**` for path components).
fn to_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut previous_star = false;
    for ch in pattern.chars() {
        match ch {
            '*' => {
                if !previous_star {
                    out.push('*');
                }
                previous_star = true;
                continue;
            }
            '?' | '[' | ']' | '{' | '}' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
        previous_star = false;
    }
    out
}
