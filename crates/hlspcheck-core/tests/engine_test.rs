//! Rule engine behaviour against hand-written dictionaries.

use hlspcheck_core::dictionary::load;
use hlspcheck_core::{
    aggregate, evaluate, Axis, Dictionary, HduHeader, MissingReason, ObservedHeader,
    SatisfiedBy, SoftInconsistency, Verdict,
};

fn dictionary(yaml: &str) -> Dictionary {
    let raw: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    load(&raw).unwrap()
}

const RULES: &str = r#"
PRODUCT: timeseries
STANDARD: test
KEYWORDS:
  TELESCOP:
    header: 0
    hlsp_status: required
    caom_status: required
  MJD-AVG:
    header: -999
    hlsp_status: required
    caom_status: required
  DATE-OBS:
    header: 1
    hlsp_status: required
    caom_status: required
    alternates: [TIME-OBS]
  FILTER:
    header: 0
    hlsp_status: required
    caom_status: required
    default: TESS
  CD*_*:
    header: 1
    hlsp_status: recommended
    caom_status: omitted
    multiple: true
"#;

fn verdict_for<'a>(verdicts: &'a [hlspcheck_core::RuleVerdict], keyword: &str) -> &'a Verdict {
    &verdicts
        .iter()
        .find(|v| v.keyword == keyword)
        .unwrap_or_else(|| panic!("no verdict for {keyword}"))
        .verdict
}

#[test]
fn test_not_applicable_regardless_of_headers() {
    let dict = dictionary(RULES);
    for observed in [
        ObservedHeader::new(),
        ObservedHeader::new().with_hdu(0, HduHeader::new(["MJD-AVG"])),
        ObservedHeader::new()
            .with_hdu(0, HduHeader::new(["MJD-AVG"]))
            .with_hdu(1, HduHeader::new(["MJD-AVG"])),
    ] {
        let verdicts = evaluate(&dict, &observed);
        assert_eq!(*verdict_for(&verdicts, "MJD-AVG"), Verdict::NotApplicable);
    }
}

#[test]
fn test_absent_hdu_is_missing_not_not_applicable() {
    let dict = dictionary(RULES);
    let observed = ObservedHeader::new().with_hdu(0, HduHeader::new(["TELESCOP"]));
    let verdicts = evaluate(&dict, &observed);
    assert_eq!(
        *verdict_for(&verdicts, "DATE-OBS"),
        Verdict::Missing {
            reason: MissingReason::HduAbsent
        }
    );
}

#[test]
fn test_alternate_satisfies_rule() {
    let dict = dictionary(RULES);
    let observed = ObservedHeader::new()
        .with_hdu(0, HduHeader::new(["SIMPLE"]))
        .with_hdu(1, HduHeader::new(["XTENSION", "TIME-OBS"]));
    let verdicts = evaluate(&dict, &observed);
    let verdict = verdict_for(&verdicts, "DATE-OBS");
    assert_eq!(verdict.satisfied_by(), Some(SatisfiedBy::Observed));
    assert_eq!(verdict.matched_keywords(), vec!["TIME-OBS"]);
}

#[test]
fn test_default_versus_observed() {
    let dict = dictionary(RULES);

    let without = evaluate(
        &dict,
        &ObservedHeader::new().with_hdu(0, HduHeader::new(["TELESCOP"])),
    );
    assert_eq!(
        *verdict_for(&without, "FILTER"),
        Verdict::Satisfied {
            by: SatisfiedBy::ByDefault,
            matches: Vec::new(),
            default: Some("TESS".to_string()),
        }
    );

    let with = evaluate(
        &dict,
        &ObservedHeader::new().with_hdu(0, HduHeader::new(["TELESCOP", "FILTER"])),
    );
    assert_eq!(
        verdict_for(&with, "FILTER").satisfied_by(),
        Some(SatisfiedBy::Observed)
    );
}

#[test]
fn test_wildcard_family_in_rule() {
    let dict = dictionary(RULES);
    let observed = ObservedHeader::new()
        .with_hdu(0, HduHeader::new(["TELESCOP"]))
        .with_hdu(1, HduHeader::new(["CDELT1", "CD1_1", "CD2_2"]));
    let verdicts = evaluate(&dict, &observed);
    let verdict = verdict_for(&verdicts, "CD*_*");
    assert_eq!(verdict.matched_keywords(), vec!["CD1_1", "CD2_2"]);

    let only_cdelt = ObservedHeader::new().with_hdu(1, HduHeader::new(["CDELT1"]));
    let verdicts = evaluate(&dict, &only_cdelt);
    assert!(verdict_for(&verdicts, "CD*_*").is_missing());
}

#[test]
fn test_verdicts_follow_declaration_order() {
    let dict = dictionary(RULES);
    let verdicts = evaluate(&dict, &ObservedHeader::new());
    let names: Vec<&str> = verdicts.iter().map(|v| v.keyword.as_str()).collect();
    assert_eq!(names, vec!["TELESCOP", "MJD-AVG", "DATE-OBS", "FILTER", "CD*_*"]);
}

#[test]
fn test_soft_inconsistency_surfaces_in_summary() {
    let dict = dictionary(RULES);
    let observed = ObservedHeader::new()
        .with_hdu(0, HduHeader::new(["TELESCOP"]))
        .with_hdu(1, HduHeader::new(["DATE-OBS", "TIME-OBS"]));
    let verdicts = evaluate(&dict, &observed);

    let date_obs = verdicts.iter().find(|v| v.keyword == "DATE-OBS").unwrap();
    assert!(date_obs.verdict.is_satisfied());
    assert!(matches!(
        date_obs.inconsistencies.as_slice(),
        [SoftInconsistency::MultipleMatches { hdu: 1, .. }]
    ));

    let summary = aggregate(&verdicts);
    assert_eq!(summary.soft_inconsistencies.len(), 1);
    assert_eq!(summary.soft_inconsistencies[0].keyword, "DATE-OBS");
    assert!(summary.is_compliant(Axis::Hlsp));
}

#[test]
fn test_named_hdu_any_view() {
    let dict = dictionary(
        "PRODUCT: image\nSTANDARD: test\nSCI:\n  required: [BUNIT]\nAll:\n  recommended: [CHECKSUM]\n",
    );
    let observed = ObservedHeader::new()
        .with_hdu(0, HduHeader::new(["CHECKSUM"]))
        .with_hdu(1, HduHeader::new(["XTENSION"]).with_extname("SCI"))
        .with_hdu(2, HduHeader::new(["BUNIT"]).with_extname("SCI"));
    let verdicts = evaluate(&dict, &observed);

    let bunit = verdicts.iter().find(|v| v.keyword == "BUNIT").unwrap();
    assert!(bunit.verdict.is_satisfied());
    assert_eq!(bunit.per_hdu.len(), 2);
    assert!(!bunit.satisfied_in_every_hdu());

    let checksum = verdicts.iter().find(|v| v.keyword == "CHECKSUM").unwrap();
    assert_eq!(checksum.per_hdu.len(), 3);

    let no_sci = ObservedHeader::new().with_hdu(0, HduHeader::new(["BUNIT"]));
    let verdicts = evaluate(&dict, &no_sci);
    assert_eq!(
        *verdict_for(&verdicts, "BUNIT"),
        Verdict::Missing {
            reason: MissingReason::HduAbsent
        }
    );
}

#[test]
fn test_not_applicable_required_rule_in_summary() {
    let dict = dictionary(RULES);
    let observed = ObservedHeader::new()
        .with_hdu(0, HduHeader::new(["TELESCOP"]))
        .with_hdu(1, HduHeader::new(["DATE-OBS"]));
    let summary = aggregate(&evaluate(&dict, &observed));

    for axis in [&summary.hlsp, &summary.caom] {
        assert_eq!(axis.required.not_applicable, 1);
        assert!(axis.missing_required.is_empty());
        assert!(axis.is_compliant());
    }
}

#[test]
fn test_quoted_not_applicable_header() {
    let dict = dictionary(
        "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  MJD-AVG:\n    header: '-999'\n    hlsp_status: required\n    caom_status: required\n",
    );
    let verdicts = evaluate(&dict, &ObservedHeader::new());
    assert_eq!(*verdict_for(&verdicts, "MJD-AVG"), Verdict::NotApplicable);
}

#[test]
fn test_wildcard_rule_without_multiple_is_consistent() {
    let dict = dictionary(
        "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  CTYPE*:\n    header: 1\n    hlsp_status: required\n    caom_status: omitted\n",
    );
    let observed = ObservedHeader::new().with_hdu(1, HduHeader::new(["CTYPE1", "CTYPE2"]));
    let verdicts = evaluate(&dict, &observed);

    assert!(verdicts[0].verdict.is_satisfied());
    assert!(verdicts[0].inconsistencies.is_empty());
    assert!(aggregate(&verdicts).soft_inconsistencies.is_empty());
}
