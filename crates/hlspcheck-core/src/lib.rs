//! Keyword-compliance checks for FITS headers of high-level science
//! products.
//!
//! A [`Dictionary`] declares which keywords a product/standard expects, in
//! which HDU, and at what level on two independent axes (`hlsp_status` and
//! `caom_status`). The engine matches those rules against an
//! [`ObservedHeader`] and the aggregator rolls the per-rule verdicts into a
//! [`ComplianceSummary`].

pub mod config;
pub mod dictionary;
pub mod engine;
pub mod header;
pub mod locator;
pub mod matcher;
pub mod report;
pub mod validation;
pub mod verdict;

// Convenience re-exports
pub use config::{CheckOptions, ConfigError};
pub use dictionary::{
    load_dictionaries, load_dictionary, load_dictionary_from_file, load_dictionary_from_str,
    Axis, Dictionary, DictionaryError, DictionaryId, DictionarySource, HduTarget, KeywordUpdate,
    LoadedDictionary, Rule, StatusLevel,
};
pub use engine::{evaluate, evaluate_raw, evaluate_rule, EvaluationError};
pub use header::{HduHeader, ObservedHeader};
pub use locator::{target_hdus, TargetHdus};
pub use matcher::{matches, resolve_names, KeywordPattern};
pub use report::{aggregate, aggregate_with_options, AggregateOptions, AxisReport, ComplianceSummary, HduView};
pub use validation::{validate, validate_batch, validate_raw, BatchEntry, UnitOutcome, ValidationOutcome};
pub use verdict::{MissingReason, RuleVerdict, SatisfiedBy, SoftInconsistency, Verdict};
