use super::super::args::{CheckArgs, OutputFormat};
use crate::exit_codes::{DICTIONARY_ERROR, INTERNAL_ERROR, NON_COMPLIANT, SUCCESS};
use anyhow::{Context, Result};
use hlspcheck_core::dictionary::load_updates_from_file;
use hlspcheck_core::report::AxisReport;
use hlspcheck_core::{
    load_dictionaries, validate_batch, BatchEntry, CheckOptions, LoadedDictionary, UnitOutcome,
    ValidationOutcome,
};
use std::path::Path;

pub fn cmd_check(args: CheckArgs) -> Result<i32> {
    let mut options = match &args.config {
        Some(path) => match CheckOptions::from_yaml_file(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Config loading failed: {}", e);
                return Ok(INTERNAL_ERROR);
            }
        },
        None => CheckOptions::default(),
    };
    if let Some(view) = args.hdu_view {
        options.hdu_view = view.into();
    }

    let dictionaries = match load_with_updates(&args.dictionaries, args.updates.as_deref()) {
        Ok(dictionaries) => dictionaries,
        Err(e) => {
            eprintln!("Dictionary loading failed: {}", e);
            return Ok(DICTIONARY_ERROR);
        }
    };

    let mut entries: Vec<BatchEntry> = Vec::new();
    for path in &args.headers {
        let file = path.display().to_string();
        match read_header_document(path) {
            Ok(raw) => entries.extend(validate_batch(&dictionaries, &[(file, raw)], &options)),
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "could not read header document");
                for dictionary in &dictionaries {
                    entries.push(BatchEntry {
                        file: file.clone(),
                        dictionary: dictionary.dictionary.id().to_string(),
                        outcome: UnitOutcome::Failed {
                            error: format!("{:#}", e),
                        },
                    });
                }
            }
        }
    }

    match args.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "tool_version": env!("CARGO_PKG_VERSION"),
                "options": options,
                "results": entries,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_text(&entries, &options),
    }

    Ok(exit_code(&entries, &options))
}

fn load_with_updates(
    references: &[String],
    updates: Option<&Path>,
) -> Result<Vec<LoadedDictionary>, hlspcheck_core::DictionaryError> {
    let dictionaries = load_dictionaries(references)?;
    let Some(path) = updates else {
        return Ok(dictionaries);
    };

    let updates = load_updates_from_file(path)?;
    dictionaries
        .iter()
        .map(|dictionary| dictionary.with_updates(&updates))
        .collect()
}

fn read_header_document(path: &Path) -> Result<serde_yaml::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read header document {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse header document {}", path.display()))
}

/// 2 if any unit failed outright, else 1 if any file fails an enforced axis.
fn exit_code(entries: &[BatchEntry], options: &CheckOptions) -> i32 {
    if entries.iter().any(|e| e.outcome.is_failed()) {
        return INTERNAL_ERROR;
    }
    let non_compliant = entries
        .iter()
        .filter_map(|e| e.outcome.outcome())
        .any(|outcome| !outcome.is_compliant(options));
    if non_compliant {
        NON_COMPLIANT
    } else {
        SUCCESS
    }
}

fn print_text(entries: &[BatchEntry], options: &CheckOptions) {
    eprintln!("HLSP Keyword Check");
    eprintln!("==================");

    for entry in entries {
        eprintln!();
        match &entry.outcome {
            UnitOutcome::Failed { error } => {
                eprintln!("{} [{}]: ERROR", entry.file, entry.dictionary);
                eprintln!("  {}", error);
            }
            UnitOutcome::Completed(outcome) => print_outcome(&entry.file, outcome, options),
        }
    }
}

fn print_outcome(file: &str, outcome: &ValidationOutcome, options: &CheckOptions) {
    let failing = outcome.failing_axes(options);
    eprintln!(
        "{} [{}/{}]: {}",
        file,
        outcome.product,
        outcome.standard,
        if failing.is_empty() { "PASS" } else { "FAIL" }
    );
    eprintln!("  dictionary: {}", outcome.dictionary_digest);

    let summary = &outcome.summary;
    for report in [&summary.hlsp, &summary.caom] {
        print_axis(report, options.is_enforced(report.axis));
    }

    if !summary.satisfied_by_default.is_empty() {
        eprintln!("  by default: {}", summary.satisfied_by_default.join(", "));
    }
    for note in &summary.soft_inconsistencies {
        eprintln!("  warning: {}: {}", note.keyword, note.detail);
    }
}

fn print_axis(report: &AxisReport, enforced: bool) {
    let required = &report.required;
    let met = required.satisfied + required.satisfied_by_default;
    let checked = met + required.missing;
    eprintln!(
        "  {}: {}/{} required present{}",
        report.axis,
        met,
        checked,
        if enforced { "" } else { " (not enforced)" }
    );
    if !report.missing_required.is_empty() {
        eprintln!("    missing required: {}", report.missing_required.join(", "));
    }
    if !report.missing_recommended.is_empty() {
        eprintln!(
            "    missing recommended: {}",
            report.missing_recommended.join(", ")
        );
    }
}
