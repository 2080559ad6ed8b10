//! Validation runs: one dictionary against one file, and batches of them.
//!
//! A failing unit in a batch (for example an observed-header document that
//! is not HDU-indexed) is recorded and the batch continues.

use crate::config::CheckOptions;
use crate::dictionary::{Axis, LoadedDictionary};
use crate::engine::{evaluate, EvaluationError};
use crate::header::ObservedHeader;
use crate::report::{aggregate_with_options, ComplianceSummary};
use crate::verdict::RuleVerdict;
use serde::Serialize;
use serde_yaml::Value;

/// Result of validating one file against one dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub product: String,
    pub standard: String,
    pub dictionary_digest: String,
    /// Per-rule verdicts in dictionary declaration order.
    pub verdicts: Vec<RuleVerdict>,
    pub summary: ComplianceSummary,
}

impl ValidationOutcome {
    /// Enforced axes on which the file fails, in axis order.
    pub fn failing_axes(&self, options: &CheckOptions) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|axis| options.is_enforced(*axis))
            .filter(|axis| {
                let report = self.summary.axis(*axis);
                !report.is_compliant()
                    || (options.fail_on_recommended && !report.missing_recommended.is_empty())
            })
            .collect()
    }

    pub fn is_compliant(&self, options: &CheckOptions) -> bool {
        self.failing_axes(options).is_empty()
    }
}

pub fn validate(
    dictionary: &LoadedDictionary,
    observed: &ObservedHeader,
    options: &CheckOptions,
) -> ValidationOutcome {
    let verdicts = evaluate(&dictionary.dictionary, observed);
    let summary = aggregate_with_options(&verdicts, &options.aggregate_options());

    ValidationOutcome {
        product: dictionary.dictionary.product().to_string(),
        standard: dictionary.dictionary.standard().to_string(),
        dictionary_digest: dictionary.digest.clone(),
        verdicts,
        summary,
    }
}

/// Validate a raw observed-header document.
pub fn validate_raw(
    dictionary: &LoadedDictionary,
    observed: &Value,
    options: &CheckOptions,
) -> Result<ValidationOutcome, EvaluationError> {
    let observed = ObservedHeader::from_raw(observed)?;
    Ok(validate(dictionary, &observed, options))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UnitOutcome {
    Completed(Box<ValidationOutcome>),
    Failed { error: String },
}

impl UnitOutcome {
    pub fn outcome(&self) -> Option<&ValidationOutcome> {
        match self {
            UnitOutcome::Completed(outcome) => Some(outcome),
            UnitOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UnitOutcome::Failed { .. })
    }
}

/// One (file, dictionary) unit of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub file: String,
    /// `product/standard` of the dictionary.
    pub dictionary: String,
    pub outcome: UnitOutcome,
}

/// Validate every file against every dictionary. Files are parsed once;
/// a file that cannot be parsed yields one failed entry per dictionary.
pub fn validate_batch(
    dictionaries: &[LoadedDictionary],
    files: &[(String, Value)],
    options: &CheckOptions,
) -> Vec<BatchEntry> {
    let mut entries = Vec::with_capacity(dictionaries.len() * files.len());

    for (file, raw) in files {
        let observed = ObservedHeader::from_raw(raw);
        if let Err(e) = &observed {
            tracing::warn!(file = %file, error = %e, "skipping file with malformed headers");
        }

        for dictionary in dictionaries {
            let outcome = match &observed {
                Ok(observed) => {
                    UnitOutcome::Completed(Box::new(validate(dictionary, observed, options)))
                }
                Err(e) => UnitOutcome::Failed {
                    error: e.to_string(),
                },
            };
            entries.push(BatchEntry {
                file: file.clone(),
                dictionary: dictionary.dictionary.id().to_string(),
                outcome,
            });
        }
    }

    entries
}
