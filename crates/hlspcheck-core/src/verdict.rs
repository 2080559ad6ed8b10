//! Per-rule verdicts produced by the engine.

use crate::dictionary::{Axis, Rule, StatusLevel};
use serde::Serialize;

/// How a satisfied rule was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SatisfiedBy {
    /// At least one observed keyword matched.
    Observed,
    /// Nothing matched, but the rule declares a default value.
    ByDefault,
}

/// Why a rule is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingReason {
    /// The HDU the rule targets is not in the file.
    HduAbsent,
    /// The HDU is present but no keyword matched.
    NoMatch,
}

/// One observed keyword that satisfied a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordMatch {
    pub hdu: u32,
    /// Keyword as it appears in the header.
    pub keyword: String,
    /// Rule name (primary or alternate) that matched it.
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Verdict {
    Satisfied {
        by: SatisfiedBy,
        matches: Vec<KeywordMatch>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Missing {
        reason: MissingReason,
    },
    NotApplicable,
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied { .. })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Verdict::Missing { .. })
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Verdict::NotApplicable)
    }

    pub fn satisfied_by(&self) -> Option<SatisfiedBy> {
        match self {
            Verdict::Satisfied { by, .. } => Some(*by),
            _ => None,
        }
    }

    /// Observed keyword names that matched, in header order.
    pub fn matched_keywords(&self) -> Vec<&str> {
        match self {
            Verdict::Satisfied { matches, .. } => matches.iter().map(|m| m.keyword.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Satisfied {
                by: SatisfiedBy::Observed,
                ..
            } => "satisfied",
            Verdict::Satisfied {
                by: SatisfiedBy::ByDefault,
                ..
            } => "satisfied (by default)",
            Verdict::Missing {
                reason: MissingReason::HduAbsent,
            } => "missing (HDU absent)",
            Verdict::Missing {
                reason: MissingReason::NoMatch,
            } => "missing",
            Verdict::NotApplicable => "not-applicable",
        }
    }
}

/// Sub-verdict for one target HDU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HduVerdict {
    pub hdu: u32,
    pub satisfied: bool,
    pub matches: Vec<String>,
}

/// Ambiguity in the dictionary or file, reported alongside the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoftInconsistency {
    /// A rule that does not allow multiple keywords matched several records
    /// in one HDU.
    MultipleMatches { hdu: u32, keywords: Vec<String> },
}

impl std::fmt::Display for SoftInconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoftInconsistency::MultipleMatches { hdu, keywords } => write!(
                f,
                "HDU {} has {} matching keywords ({}) but multiple is false",
                hdu,
                keywords.len(),
                keywords.join(", ")
            ),
        }
    }
}

/// Verdict for one rule, with the rule's levels on both axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleVerdict {
    pub keyword: String,
    pub hlsp_status: StatusLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caom_status: Option<StatusLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caom_keyword: Option<String>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub per_hdu: Vec<HduVerdict>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inconsistencies: Vec<SoftInconsistency>,
}

impl RuleVerdict {
    pub fn new(
        rule: &Rule,
        verdict: Verdict,
        per_hdu: Vec<HduVerdict>,
        inconsistencies: Vec<SoftInconsistency>,
    ) -> Self {
        Self {
            keyword: rule.keyword().to_string(),
            hlsp_status: rule.hlsp_status(),
            caom_status: rule.caom_status(),
            caom_keyword: rule.caom_keyword().map(str::to_string),
            verdict,
            per_hdu,
            inconsistencies,
        }
    }

    pub fn status(&self, axis: Axis) -> Option<StatusLevel> {
        match axis {
            Axis::Hlsp => Some(self.hlsp_status),
            Axis::Caom => self.caom_status,
        }
    }

    /// Stricter view for rules spanning several HDUs: every target HDU must
    /// match on its own. A default still satisfies.
    pub fn satisfied_in_every_hdu(&self) -> bool {
        match &self.verdict {
            Verdict::Satisfied {
                by: SatisfiedBy::ByDefault,
                ..
            } => true,
            Verdict::Satisfied { .. } => self.per_hdu.iter().all(|h| h.satisfied),
            _ => false,
        }
    }
}
