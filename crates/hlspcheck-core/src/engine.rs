//! Compliance rule engine.
//!
//! Evaluates every rule of a dictionary against one file's observed headers.
//! Verdicts come back in dictionary declaration order, so identical inputs
//! always give identical output.

use crate::dictionary::{Dictionary, Rule};
use crate::header::ObservedHeader;
use crate::locator::target_hdus;
use crate::matcher::{first_match, resolve_names};
use crate::verdict::{
    HduVerdict, KeywordMatch, MissingReason, RuleVerdict, SatisfiedBy, SoftInconsistency, Verdict,
};
use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Unknown HDU '{hdu}' in observed headers: {reason}")]
    UnknownHdu { hdu: String, reason: String },
}

/// Evaluate all rules of `dictionary` against `observed`.
pub fn evaluate(dictionary: &Dictionary, observed: &ObservedHeader) -> Vec<RuleVerdict> {
    let verdicts: Vec<RuleVerdict> = dictionary
        .rules()
        .iter()
        .map(|rule| evaluate_rule(rule, observed))
        .collect();

    tracing::debug!(
        dictionary = %dictionary.id(),
        rules = verdicts.len(),
        hdus = observed.len(),
        "evaluated dictionary"
    );
    verdicts
}

/// Evaluate against a raw observed-header document.
pub fn evaluate_raw(
    dictionary: &Dictionary,
    observed: &Value,
) -> Result<Vec<RuleVerdict>, EvaluationError> {
    let observed = ObservedHeader::from_raw(observed)?;
    Ok(evaluate(dictionary, &observed))
}

/// Evaluate a single rule.
pub fn evaluate_rule(rule: &Rule, observed: &ObservedHeader) -> RuleVerdict {
    let target = target_hdus(rule, observed);

    if target.is_not_applicable() {
        return RuleVerdict::new(rule, Verdict::NotApplicable, Vec::new(), Vec::new());
    }
    if target.is_empty() {
        let verdict = Verdict::Missing {
            reason: MissingReason::HduAbsent,
        };
        return RuleVerdict::new(rule, verdict, Vec::new(), Vec::new());
    }

    let patterns = resolve_names(rule);
    let mut matches = Vec::new();
    let mut per_hdu = Vec::with_capacity(target.indices().len());
    let mut inconsistencies = Vec::new();

    for &index in target.indices() {
        let Some(header) = observed.hdu(index) else {
            continue;
        };

        let mut hdu_matches = Vec::new();
        // Matches through wildcard-free names; wildcard families may repeat.
        let mut named = Vec::new();
        for keyword in header.keywords() {
            let Some(pattern) = first_match(patterns, keyword) else {
                continue;
            };
            if !pattern.is_wildcard() {
                named.push(keyword.clone());
            }
            hdu_matches.push(KeywordMatch {
                hdu: index,
                keyword: keyword.clone(),
                pattern: pattern.as_str().to_string(),
            });
        }

        if !rule.multiple() && named.len() > 1 {
            tracing::warn!(
                keyword = rule.keyword(),
                hdu = index,
                matched = ?named,
                "several keywords match a rule that does not allow multiple"
            );
            inconsistencies.push(SoftInconsistency::MultipleMatches {
                hdu: index,
                keywords: named,
            });
        }

        per_hdu.push(HduVerdict {
            hdu: index,
            satisfied: !hdu_matches.is_empty(),
            matches: hdu_matches.iter().map(|m| m.keyword.clone()).collect(),
        });
        matches.extend(hdu_matches);
    }

    let verdict = if !matches.is_empty() {
        Verdict::Satisfied {
            by: SatisfiedBy::Observed,
            matches,
            default: None,
        }
    } else if let Some(default) = rule.default_value() {
        Verdict::Satisfied {
            by: SatisfiedBy::ByDefault,
            matches: Vec::new(),
            default: Some(default.to_string()),
        }
    } else {
        Verdict::Missing {
            reason: MissingReason::NoMatch,
        }
    };

    RuleVerdict::new(rule, verdict, per_hdu, inconsistencies)
}
