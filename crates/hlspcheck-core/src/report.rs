//! Verdict aggregation into per-axis compliance summaries.
//!
//! The summary is derived data. The ordered verdict sequence stays the
//! authoritative per-rule record.

use crate::dictionary::{Axis, StatusLevel};
use crate::verdict::{RuleVerdict, SatisfiedBy, Verdict};
use serde::{Deserialize, Serialize};

/// Which per-HDU view decides rules that span several HDUs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HduView {
    /// Satisfied in at least one target HDU.
    #[default]
    Any,
    /// Satisfied in every target HDU.
    Every,
}

impl std::fmt::Display for HduView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HduView::Any => write!(f, "any"),
            HduView::Every => write!(f, "every"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub hdu_view: HduView,
    /// Count rules satisfied only through a declared default as passing.
    pub default_counts_as_pass: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            hdu_view: HduView::Any,
            default_counts_as_pass: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub satisfied: usize,
    pub satisfied_by_default: usize,
    pub missing: usize,
    pub not_applicable: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.satisfied + self.satisfied_by_default + self.missing + self.not_applicable
    }
}

/// Counts and missing keywords on one compliance axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisReport {
    pub axis: Axis,
    pub required: LevelCounts,
    pub recommended: LevelCounts,
    pub omitted: LevelCounts,
    /// Required keywords that are missing. Any entry makes the file
    /// non-compliant on this axis.
    pub missing_required: Vec<String>,
    pub missing_recommended: Vec<String>,
}

impl AxisReport {
    fn new(axis: Axis) -> Self {
        Self {
            axis,
            required: LevelCounts::default(),
            recommended: LevelCounts::default(),
            omitted: LevelCounts::default(),
            missing_required: Vec::new(),
            missing_recommended: Vec::new(),
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.missing_required.is_empty()
    }

    pub fn counts(&self, level: StatusLevel) -> &LevelCounts {
        match level {
            StatusLevel::Required => &self.required,
            StatusLevel::Recommended => &self.recommended,
            StatusLevel::Omitted => &self.omitted,
        }
    }

    fn counts_mut(&mut self, level: StatusLevel) -> &mut LevelCounts {
        match level {
            StatusLevel::Required => &mut self.required,
            StatusLevel::Recommended => &mut self.recommended,
            StatusLevel::Omitted => &mut self.omitted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InconsistencyNote {
    pub keyword: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceSummary {
    pub hdu_view: HduView,
    pub rules: usize,
    pub hlsp: AxisReport,
    pub caom: AxisReport,
    /// Keywords satisfied only through their declared default.
    pub satisfied_by_default: Vec<String>,
    pub soft_inconsistencies: Vec<InconsistencyNote>,
}

impl ComplianceSummary {
    pub fn axis(&self, axis: Axis) -> &AxisReport {
        match axis {
            Axis::Hlsp => &self.hlsp,
            Axis::Caom => &self.caom,
        }
    }

    pub fn is_compliant(&self, axis: Axis) -> bool {
        self.axis(axis).is_compliant()
    }
}

/// Outcome of one verdict after applying the aggregation options.
#[derive(Clone, Copy)]
enum Tally {
    Satisfied,
    SatisfiedByDefault,
    Missing,
    NotApplicable,
}

fn tally(verdict: &RuleVerdict, options: &AggregateOptions) -> Tally {
    match &verdict.verdict {
        Verdict::NotApplicable => Tally::NotApplicable,
        Verdict::Missing { .. } => Tally::Missing,
        Verdict::Satisfied {
            by: SatisfiedBy::ByDefault,
            ..
        } => {
            if options.default_counts_as_pass {
                Tally::SatisfiedByDefault
            } else {
                Tally::Missing
            }
        }
        Verdict::Satisfied {
            by: SatisfiedBy::Observed,
            ..
        } => {
            if options.hdu_view == HduView::Every && !verdict.satisfied_in_every_hdu() {
                Tally::Missing
            } else {
                Tally::Satisfied
            }
        }
    }
}

/// Aggregate with default options (any-HDU view, defaults pass).
pub fn aggregate(verdicts: &[RuleVerdict]) -> ComplianceSummary {
    aggregate_with_options(verdicts, &AggregateOptions::default())
}

pub fn aggregate_with_options(
    verdicts: &[RuleVerdict],
    options: &AggregateOptions,
) -> ComplianceSummary {
    let mut hlsp = AxisReport::new(Axis::Hlsp);
    let mut caom = AxisReport::new(Axis::Caom);
    let mut satisfied_by_default = Vec::new();
    let mut soft_inconsistencies = Vec::new();

    for verdict in verdicts {
        let outcome = tally(verdict, options);

        if matches!(outcome, Tally::SatisfiedByDefault) {
            satisfied_by_default.push(verdict.keyword.clone());
        }
        for note in &verdict.inconsistencies {
            soft_inconsistencies.push(InconsistencyNote {
                keyword: verdict.keyword.clone(),
                detail: note.to_string(),
            });
        }

        for report in [&mut hlsp, &mut caom] {
            let Some(level) = verdict.status(report.axis) else {
                continue;
            };
            let counts = report.counts_mut(level);
            match outcome {
                Tally::Satisfied => counts.satisfied += 1,
                Tally::SatisfiedByDefault => counts.satisfied_by_default += 1,
                Tally::NotApplicable => counts.not_applicable += 1,
                Tally::Missing => {
                    counts.missing += 1;
                    match level {
                        StatusLevel::Required => {
                            report.missing_required.push(verdict.keyword.clone())
                        }
                        StatusLevel::Recommended => {
                            report.missing_recommended.push(verdict.keyword.clone())
                        }
                        StatusLevel::Omitted => {}
                    }
                }
            }
        }
    }

    ComplianceSummary {
        hdu_view: options.hdu_view,
        rules: verdicts.len(),
        hlsp,
        caom,
        satisfied_by_default,
        soft_inconsistencies,
    }
}
