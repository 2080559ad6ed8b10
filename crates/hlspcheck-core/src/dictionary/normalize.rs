//! Normalization of raw dictionary documents into [`Dictionary`] values.
//!
//! Accepted shapes:
//! - rule map: `PRODUCT`, `STANDARD` and `KEYWORDS` (keyword -> rule fields)
//! - status lists: one section per HDU name (`PHDU`, `SCI`, `All`, ...)
//!   holding `required` / `recommended` / `suggested` keyword lists, plus an
//!   optional `extname` overriding the section name
//!
//! The shape is decided once, here. Everything downstream sees [`Rule`]s.

use super::loader::DictionaryError;
use super::schema::{
    Dictionary, DictionaryId, DictionaryShape, HduTarget, Rule, RuleDraft, StatusLevel,
    NOT_APPLICABLE_HDU,
};
use serde_yaml::{Mapping, Value};

const PRODUCT_KEY: &str = "PRODUCT";
const STANDARD_KEY: &str = "STANDARD";
const KEYWORDS_KEY: &str = "KEYWORDS";
const EXTNAME_KEY: &str = "extname";

/// List names of the status-list shape and the level each maps to.
/// `suggested` has no level of its own on the hlsp axis.
const STATUS_LISTS: &[(&str, StatusLevel)] = &[
    ("required", StatusLevel::Required),
    ("recommended", StatusLevel::Recommended),
    ("suggested", StatusLevel::Recommended),
];

/// Normalize a raw dictionary document that declares its own identity.
pub fn load(raw: &Value) -> Result<Dictionary, DictionaryError> {
    load_with_id(raw, None)
}

/// Normalize a raw dictionary document. `fallback` supplies the identity
/// when the document has no `PRODUCT` / `STANDARD`.
pub fn load_with_id(
    raw: &Value,
    fallback: Option<&DictionaryId>,
) -> Result<Dictionary, DictionaryError> {
    let label = fallback
        .map(|id| id.to_string())
        .unwrap_or_else(|| "<inline>".to_string());

    let root = raw
        .as_mapping()
        .ok_or_else(|| malformed(&label, "top level must be a mapping"))?;

    let id = read_identity(root, fallback, &label)?;
    let label = id.to_string();

    let (shape, rules) = if root.contains_key(KEYWORDS_KEY) {
        (DictionaryShape::RuleMap, normalize_rule_map(root, &label)?)
    } else {
        (
            DictionaryShape::StatusLists,
            normalize_status_lists(root, &label)?,
        )
    };

    let dictionary = Dictionary::new(id, shape, rules)?;
    tracing::debug!(
        dictionary = %dictionary.id(),
        shape = ?dictionary.shape(),
        rules = dictionary.len(),
        "normalized dictionary"
    );
    Ok(dictionary)
}

/// Partially specified rule fields, as written in a rule map entry or a
/// keyword update. Absent and null fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFields {
    pub header: Option<HduTarget>,
    pub hlsp_status: Option<StatusLevel>,
    pub caom_status: Option<StatusLevel>,
    pub caom_keyword: Option<String>,
    pub xml_parent: Option<String>,
    pub multiple: Option<bool>,
    pub alternates: Option<Vec<String>>,
    pub default: Option<String>,
}

impl RuleFields {
    /// Parse the fields of one keyword entry. Unknown field names are rejected.
    pub fn parse(fields: &Mapping, keyword: &str, dictionary: &str) -> Result<Self, DictionaryError> {
        let mut out = RuleFields::default();

        for (key, value) in fields {
            let name = key.as_str().ok_or_else(|| {
                malformed(
                    dictionary,
                    format!("keyword '{}' has a non-string field name", keyword),
                )
            })?;

            match name {
                "header" => out.header = Some(parse_header(value, keyword, dictionary)?),
                "hlsp_status" => {
                    out.hlsp_status = Some(parse_status(value, keyword, name, dictionary)?)
                }
                "caom_status" => {
                    out.caom_status = Some(parse_status(value, keyword, name, dictionary)?)
                }
                "caom_keyword" => {
                    out.caom_keyword = optional_scalar(value, keyword, name, dictionary)?
                }
                "xml_parent" => out.xml_parent = optional_scalar(value, keyword, name, dictionary)?,
                "multiple" => {
                    let flag = value.as_bool().ok_or_else(|| {
                        malformed(
                            dictionary,
                            format!("keyword '{}': 'multiple' must be a boolean", keyword),
                        )
                    })?;
                    out.multiple = Some(flag);
                }
                "alternates" => out.alternates = Some(parse_alternates(value, keyword, dictionary)?),
                "default" => out.default = optional_scalar(value, keyword, name, dictionary)?,
                other => {
                    return Err(malformed(
                        dictionary,
                        format!("keyword '{}' has unknown field '{}'", keyword, other),
                    ))
                }
            }
        }

        Ok(out)
    }

    /// Overwrite the fields of `draft` that are set here.
    pub fn apply_to(&self, draft: &mut RuleDraft) {
        if let Some(header) = &self.header {
            draft.header = header.clone();
        }
        if let Some(level) = self.hlsp_status {
            draft.hlsp_status = level;
        }
        if let Some(level) = self.caom_status {
            draft.caom_status = Some(level);
        }
        if let Some(caom_keyword) = &self.caom_keyword {
            draft.caom_keyword = Some(caom_keyword.clone());
        }
        if let Some(xml_parent) = &self.xml_parent {
            draft.xml_parent = Some(xml_parent.clone());
        }
        if let Some(multiple) = self.multiple {
            draft.multiple = multiple;
        }
        if let Some(alternates) = &self.alternates {
            draft.alternates = alternates.clone();
        }
        if let Some(default) = &self.default {
            draft.default = Some(default.clone());
        }
    }

    /// Build a full rule draft. `header` and `hlsp_status` are always
    /// required; `caom_status` only when `require_caom` is set.
    pub fn into_draft(
        self,
        keyword: &str,
        dictionary: &str,
        require_caom: bool,
    ) -> Result<RuleDraft, DictionaryError> {
        let header = self
            .header
            .ok_or_else(|| missing_field(dictionary, keyword, "header"))?;
        let hlsp_status = self
            .hlsp_status
            .ok_or_else(|| missing_field(dictionary, keyword, "hlsp_status"))?;
        if require_caom && self.caom_status.is_none() {
            return Err(missing_field(dictionary, keyword, "caom_status"));
        }

        Ok(RuleDraft {
            keyword: keyword.to_string(),
            header,
            hlsp_status,
            caom_status: self.caom_status,
            caom_keyword: self.caom_keyword,
            xml_parent: self.xml_parent,
            multiple: self.multiple.unwrap_or(false),
            alternates: self.alternates.unwrap_or_default(),
            default: self.default,
        })
    }
}

fn read_identity(
    root: &Mapping,
    fallback: Option<&DictionaryId>,
    label: &str,
) -> Result<DictionaryId, DictionaryError> {
    let product = identity_field(root, PRODUCT_KEY, label)?;
    let standard = identity_field(root, STANDARD_KEY, label)?;

    match (product, standard) {
        (Some(product), Some(standard)) => Ok(DictionaryId::new(product, standard)),
        (None, None) => fallback.cloned().ok_or_else(|| {
            malformed(
                label,
                "missing PRODUCT and STANDARD, and the source name implies no identity",
            )
        }),
        _ => Err(malformed(label, "PRODUCT and STANDARD must be declared together")),
    }
}

fn identity_field<'a>(
    root: &'a Mapping,
    key: &str,
    label: &str,
) -> Result<Option<&'a str>, DictionaryError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.as_str())),
        Some(_) => Err(malformed(label, format!("{} must be a non-empty string", key))),
    }
}

fn normalize_rule_map(root: &Mapping, label: &str) -> Result<Vec<Rule>, DictionaryError> {
    for key in root.keys() {
        match key.as_str() {
            Some(PRODUCT_KEY) | Some(STANDARD_KEY) | Some(KEYWORDS_KEY) => {}
            _ => {
                return Err(malformed(
                    label,
                    format!(
                        "unexpected top-level key '{}' next to KEYWORDS",
                        describe_key(key)
                    ),
                ))
            }
        }
    }

    let keywords = root
        .get(KEYWORDS_KEY)
        .and_then(Value::as_mapping)
        .ok_or_else(|| malformed(label, "KEYWORDS must be a mapping of keyword name to rule fields"))?;

    let mut rules = Vec::with_capacity(keywords.len());
    for (key, value) in keywords {
        let keyword = keyword_name(key, label)?;
        let fields = value.as_mapping().ok_or_else(|| {
            malformed(label, format!("rule for keyword '{}' must be a mapping", keyword))
        })?;
        let draft = RuleFields::parse(fields, &keyword, label)?.into_draft(&keyword, label, true)?;
        rules.push(draft.compile(label)?);
    }

    Ok(rules)
}

fn normalize_status_lists(root: &Mapping, label: &str) -> Result<Vec<Rule>, DictionaryError> {
    let mut rules = Vec::new();
    let mut sections = 0usize;

    for (key, value) in root {
        let section_name = keyword_name(key, label)?;
        if section_name == PRODUCT_KEY || section_name == STANDARD_KEY {
            continue;
        }
        sections += 1;

        let section = value.as_mapping().ok_or_else(|| {
            malformed(
                label,
                format!(
                    "section '{}' must be a mapping of required/recommended/suggested lists",
                    section_name
                ),
            )
        })?;
        let target = section_target(&section_name, section, label)?;

        let mut has_list = false;
        for (list_key, list_value) in section {
            let list_name = keyword_name(list_key, label)?;
            if list_name.eq_ignore_ascii_case(EXTNAME_KEY) {
                continue;
            }

            let level = STATUS_LISTS
                .iter()
                .find(|(name, _)| list_name.eq_ignore_ascii_case(name))
                .map(|(_, level)| *level)
                .ok_or_else(|| {
                    malformed(
                        label,
                        format!("section '{}' has unknown key '{}'", section_name, list_name),
                    )
                })?;
            has_list = true;

            for keyword in keyword_list(list_value, &section_name, &list_name, label)? {
                // Wildcard entries name keyword families.
                let multiple = keyword.contains('*');
                let rule = RuleDraft::new(keyword, target.clone(), level)
                    .allow_multiple(multiple)
                    .compile(label)?;
                rules.push(rule);
            }
        }

        if !has_list {
            return Err(malformed(
                label,
                format!(
                    "section '{}' declares none of required, recommended or suggested",
                    section_name
                ),
            ));
        }
    }

    if sections == 0 {
        return Err(malformed(
            label,
            "document has neither KEYWORDS nor any HDU section",
        ));
    }

    Ok(rules)
}

fn section_target(
    section_name: &str,
    section: &Mapping,
    label: &str,
) -> Result<HduTarget, DictionaryError> {
    let extname = section
        .iter()
        .find(|(k, _)| k.as_str().is_some_and(|k| k.eq_ignore_ascii_case(EXTNAME_KEY)))
        .map(|(_, v)| v);

    match extname {
        None | Some(Value::Null) => Ok(HduTarget::from_name(section_name)),
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(HduTarget::from_name(name)),
        Some(_) => Err(malformed(
            label,
            format!("section '{}': extname must be a non-empty string", section_name),
        )),
    }
}

fn keyword_list(
    value: &Value,
    section_name: &str,
    list_name: &str,
    label: &str,
) -> Result<Vec<String>, DictionaryError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                _ => Err(malformed(
                    label,
                    format!(
                        "section '{}' list '{}' must contain only keyword names",
                        section_name, list_name
                    ),
                )),
            })
            .collect(),
        _ => Err(malformed(
            label,
            format!(
                "section '{}' list '{}' must be a sequence of keyword names",
                section_name, list_name
            ),
        )),
    }
}

/// Rule-map `header`: an integer, or a string holding one. HDU names are
/// only valid as status-list section names.
fn parse_header(value: &Value, keyword: &str, label: &str) -> Result<HduTarget, DictionaryError> {
    let index = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    index.and_then(HduTarget::from_index).ok_or_else(|| {
        malformed(
            label,
            format!(
                "keyword '{}': header must be a non-negative integer HDU index or {}, got '{}'",
                keyword,
                NOT_APPLICABLE_HDU,
                describe_key(value)
            ),
        )
    })
}

fn parse_status(
    value: &Value,
    keyword: &str,
    field: &str,
    label: &str,
) -> Result<StatusLevel, DictionaryError> {
    let unknown = |value: String| DictionaryError::UnknownStatusLevel {
        dictionary: label.to_string(),
        keyword: keyword.to_string(),
        field: field.to_string(),
        value,
    };

    match value {
        Value::String(s) => StatusLevel::parse(s).ok_or_else(|| unknown(s.clone())),
        Value::Null => Err(missing_field(label, keyword, field)),
        Value::Bool(b) => Err(unknown(b.to_string())),
        Value::Number(n) => Err(unknown(n.to_string())),
        _ => Err(malformed(
            label,
            format!("keyword '{}': {} must be a string", keyword, field),
        )),
    }
}

fn parse_alternates(value: &Value, keyword: &str, label: &str) -> Result<Vec<String>, DictionaryError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.trim().to_string()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                    malformed(
                        label,
                        format!("keyword '{}': alternates must be keyword names", keyword),
                    )
                })
            })
            .collect(),
        _ => Err(malformed(
            label,
            format!("keyword '{}': alternates must be a sequence", keyword),
        )),
    }
}

fn optional_scalar(
    value: &Value,
    keyword: &str,
    field: &str,
    label: &str,
) -> Result<Option<String>, DictionaryError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(malformed(
            label,
            format!("keyword '{}': {} must be a scalar", keyword, field),
        )),
    }
}

fn keyword_name(key: &Value, label: &str) -> Result<String, DictionaryError> {
    match key.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => Err(malformed(
            label,
            format!("expected a keyword name, found '{}'", describe_key(key)),
        )),
    }
}

pub(crate) fn describe_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => "<non-scalar>".to_string(),
    }
}

fn missing_field(label: &str, keyword: &str, field: &str) -> DictionaryError {
    malformed(
        label,
        format!("keyword '{}' is missing required field '{}'", keyword, field),
    )
}

fn malformed(label: &str, reason: impl Into<String>) -> DictionaryError {
    DictionaryError::MalformedDictionary {
        dictionary: label.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(content: &str) -> Value {
        serde_yaml::from_str(content).unwrap()
    }

    const RULE_MAP: &str = r#"
PRODUCT: timeseries
STANDARD: tess
KEYWORDS:
  TELESCOP:
    header: 0
    hlsp_status: required
    caom_status: required
    caom_keyword: telescope_name
    xml_parent: metadataList
    multiple: false
    alternates: []
  FILTER:
    header: 0
    hlsp_status: required
    caom_status: recommended
    caom_keyword: energy_bandpassName
    default: TESS
  DATE-OBS:
    header: 1
    hlsp_status: required
    caom_status: required
    alternates: [TIME-OBS]
  MJD-AVG:
    header: -999
    hlsp_status: omitted
    caom_status: required
"#;

    #[test]
    fn test_rule_map_shape() {
        let dict = load(&yaml(RULE_MAP)).unwrap();
        assert_eq!(dict.id().to_string(), "timeseries/tess");
        assert_eq!(dict.shape(), DictionaryShape::RuleMap);

        let names: Vec<&str> = dict.rules().iter().map(|r| r.keyword()).collect();
        assert_eq!(names, vec!["TELESCOP", "FILTER", "DATE-OBS", "MJD-AVG"]);

        let filter = dict.get("filter").unwrap();
        assert_eq!(filter.default_value(), Some("TESS"));
        assert_eq!(filter.caom_status(), Some(StatusLevel::Recommended));

        assert_eq!(dict.get("DATE-OBS").unwrap().alternates(), ["TIME-OBS"]);
        assert_eq!(*dict.get("MJD-AVG").unwrap().header(), HduTarget::NotApplicable);
    }

    #[test]
    fn test_status_list_shape() {
        let doc = yaml(
            r#"
PRODUCT: image
STANDARD: hst
PHDU:
  required: [TELESCOP, INSTRUME]
  recommended: [PROPOSID]
  suggested: [HLSPLEAD]
SCI:
  required: ["CD*_*"]
All:
  suggested: [CHECKSUM]
"#,
        );
        let dict = load(&doc).unwrap();
        assert_eq!(dict.shape(), DictionaryShape::StatusLists);
        assert_eq!(dict.len(), 6);

        let telescop = dict.get("TELESCOP").unwrap();
        assert_eq!(*telescop.header(), HduTarget::Index(0));
        assert_eq!(telescop.caom_status(), None);

        let hlsplead = dict.get("HLSPLEAD").unwrap();
        assert_eq!(hlsplead.hlsp_status(), StatusLevel::Recommended);

        let cd = dict.get("CD*_*").unwrap();
        assert_eq!(*cd.header(), HduTarget::ExtName("SCI".to_string()));
        assert!(cd.multiple());

        assert_eq!(*dict.get("CHECKSUM").unwrap().header(), HduTarget::All);
    }

    #[test]
    fn test_status_list_extname_override() {
        let doc = yaml(
            r#"
PRODUCT: image
STANDARD: test
EXTENSIONS:
  extname: All
  required: [EXTNAME]
"#,
        );
        let dict = load(&doc).unwrap();
        assert_eq!(*dict.get("EXTNAME").unwrap().header(), HduTarget::All);
    }

    #[test]
    fn test_status_list_identity_from_fallback() {
        let doc = yaml("PHDU:\n  required: [TELESCOP]\n");
        assert!(matches!(
            load(&doc),
            Err(DictionaryError::MalformedDictionary { .. })
        ));

        let id = DictionaryId::new("image", "hst");
        let dict = load_with_id(&doc, Some(&id)).unwrap();
        assert_eq!(dict.id(), &id);
    }

    #[test]
    fn test_unknown_status_level() {
        let doc = yaml(
            r#"
PRODUCT: timeseries
STANDARD: tess
KEYWORDS:
  TELESCOP:
    header: 0
    hlsp_status: mandatory
    caom_status: required
"#,
        );
        match load(&doc).unwrap_err() {
            DictionaryError::UnknownStatusLevel {
                keyword,
                field,
                value,
                ..
            } => {
                assert_eq!(keyword, "TELESCOP");
                assert_eq!(field, "hlsp_status");
                assert_eq!(value, "mandatory");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_required_fields() {
        for body in [
            "    hlsp_status: required\n    caom_status: required\n",
            "    header: 0\n    caom_status: required\n",
            "    header: 0\n    hlsp_status: required\n",
        ] {
            let doc = yaml(&format!(
                "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  OBJECT:\n{}",
                body
            ));
            let err = load(&doc).unwrap_err();
            assert!(
                matches!(err, DictionaryError::MalformedDictionary { .. }),
                "{err}"
            );
            assert!(err.to_string().contains("missing required field"), "{err}");
        }
    }

    #[test]
    fn test_wrong_shapes_rejected() {
        let cases = [
            "- not a mapping\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS: [TELESCOP]\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  TELESCOP: required\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  X:\n    header: -3\n    hlsp_status: required\n    caom_status: required\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  X:\n    header: 0\n    hlsp_status: required\n    caom_status: required\n    units: deg\n",
            "PRODUCT: a\nSTANDARD: b\nPHDU:\n  optional: [X]\n",
            "PRODUCT: a\nSTANDARD: b\nPHDU:\n  extname: PRIMARY\n",
            "PRODUCT: a\nSTANDARD: b\nPHDU: [TELESCOP]\n",
            "PRODUCT: a\nSTANDARD: b\n",
            "PRODUCT: a\nPHDU:\n  required: [X]\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  X:\n    header: primary_hdu_typo\n    hlsp_status: required\n    caom_status: required\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  X:\n    header: SCI\n    hlsp_status: required\n    caom_status: required\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  X:\n    header: 1.5\n    hlsp_status: required\n    caom_status: required\n",
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  X:\n    header: [0]\n    hlsp_status: required\n    caom_status: required\n",
        ];
        for case in cases {
            let err = load(&yaml(case)).unwrap_err();
            assert!(
                matches!(err, DictionaryError::MalformedDictionary { .. }),
                "case {case:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_header_integer_strings() {
        let doc = yaml(
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  MJD-AVG:\n    header: '-999'\n    hlsp_status: required\n    caom_status: required\n  DATE-OBS:\n    header: '1'\n    hlsp_status: required\n    caom_status: required\n",
        );
        let dict = load(&doc).unwrap();
        assert_eq!(*dict.get("MJD-AVG").unwrap().header(), HduTarget::NotApplicable);
        assert_eq!(*dict.get("DATE-OBS").unwrap().header(), HduTarget::Index(1));
    }

    #[test]
    fn test_duplicate_across_lists_rejected() {
        let doc = yaml("PRODUCT: a\nSTANDARD: b\nPHDU:\n  required: [OBJECT]\n  suggested: [object]\n");
        let err = load(&doc).unwrap_err();
        assert!(err.to_string().contains("duplicate keyword"), "{err}");
    }

    #[test]
    fn test_scalar_defaults_stringified() {
        let doc = yaml(
            "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  EQUINOX:\n    header: 0\n    hlsp_status: recommended\n    caom_status: omitted\n    default: 2000.0\n",
        );
        let dict = load(&doc).unwrap();
        assert_eq!(dict.get("EQUINOX").unwrap().default_value(), Some("2000.0"));
    }
}
