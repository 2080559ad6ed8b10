//! Dictionary schema types.
//!
//! Both source shapes (per-keyword rule maps and status-grouped keyword
//! lists) normalize into the same [`Rule`] representation defined here.

use super::loader::DictionaryError;
use crate::matcher::KeywordPattern;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

/// `header` value for keywords that are never checked against a physical HDU.
pub const NOT_APPLICABLE_HDU: i64 = -999;

/// Compliance level of a keyword on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Required,
    Recommended,
    /// Documentation only; never part of a pass/fail decision.
    Omitted,
}

impl StatusLevel {
    /// Parse a status level, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "required" => Some(StatusLevel::Required),
            "recommended" => Some(StatusLevel::Recommended),
            "omitted" => Some(StatusLevel::Omitted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Required => "required",
            StatusLevel::Recommended => "recommended",
            StatusLevel::Omitted => "omitted",
        }
    }

    /// Whether rules at this level take part in compliance decisions.
    pub fn is_enforced(&self) -> bool {
        !matches!(self, StatusLevel::Omitted)
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent compliance axis a keyword is judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// The data product's own standard.
    #[serde(rename = "hlsp_status", alias = "hlsp")]
    Hlsp,
    /// The secondary metadata standard.
    #[serde(rename = "caom_status", alias = "caom")]
    Caom,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Hlsp, Axis::Caom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Hlsp => "hlsp_status",
            Axis::Caom => "caom_status",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hlsp" | "hlsp_status" => Some(Axis::Hlsp),
            "caom" | "caom_status" => Some(Axis::Caom),
            _ => None,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HDU a rule targets, as declared by the dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HduTarget {
    /// `header: -999`; the keyword is never looked up in a FITS header.
    NotApplicable,
    /// A numeric HDU index (0 is the primary HDU).
    Index(u32),
    /// An HDU located by EXTNAME in the observed file.
    ExtName(String),
    /// Every HDU present in the observed file.
    All,
}

impl HduTarget {
    /// Interpret a numeric `header` value. Negative values other than the
    /// sentinel are rejected.
    pub fn from_index(value: i64) -> Option<Self> {
        if value == NOT_APPLICABLE_HDU {
            return Some(HduTarget::NotApplicable);
        }
        u32::try_from(value).ok().map(HduTarget::Index)
    }

    /// Interpret an HDU name from a list-shape section or `extname` entry.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("all") {
            return HduTarget::All;
        }
        if name.eq_ignore_ascii_case("phdu") || name.eq_ignore_ascii_case("primary") {
            return HduTarget::Index(0);
        }
        if let Ok(index) = name.parse::<u32>() {
            return HduTarget::Index(index);
        }
        HduTarget::ExtName(name.to_ascii_uppercase())
    }
}

impl std::fmt::Display for HduTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HduTarget::NotApplicable => write!(f, "{}", NOT_APPLICABLE_HDU),
            HduTarget::Index(index) => write!(f, "{}", index),
            HduTarget::ExtName(name) => write!(f, "{}", name),
            HduTarget::All => write!(f, "All"),
        }
    }
}

// Serialized the way dictionaries spell it, so digests follow the source form.
impl Serialize for HduTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HduTarget::NotApplicable => serializer.serialize_i64(NOT_APPLICABLE_HDU),
            HduTarget::Index(index) => serializer.serialize_u32(*index),
            HduTarget::ExtName(name) => serializer.serialize_str(name),
            HduTarget::All => serializer.serialize_str("All"),
        }
    }
}

/// Product type and standard a dictionary applies to (e.g. `timeseries/tess`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DictionaryId {
    pub product: String,
    pub standard: String,
}

impl DictionaryId {
    pub fn new(product: impl AsRef<str>, standard: impl AsRef<str>) -> Self {
        Self {
            product: product.as_ref().trim().to_ascii_lowercase(),
            standard: standard.as_ref().trim().to_ascii_lowercase(),
        }
    }

    /// Parse `product/standard` or `product_standard`.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        let (product, standard) = reference
            .split_once('/')
            .or_else(|| reference.split_once('_'))?;
        if product.trim().is_empty() || standard.trim().is_empty() {
            return None;
        }
        Some(Self::new(product, standard))
    }

    /// Name used for bundled dictionary files: `product_standard`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.product, self.standard)
    }
}

impl std::fmt::Display for DictionaryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.product, self.standard)
    }
}

/// Source shape a dictionary was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryShape {
    /// `KEYWORDS` mapping of keyword name to rule fields.
    RuleMap,
    /// HDU sections of `required` / `recommended` / `suggested` lists.
    StatusLists,
}

/// Uncompiled rule fields. Compile with [`RuleDraft::compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    pub keyword: String,
    pub header: HduTarget,
    pub hlsp_status: StatusLevel,
    pub caom_status: Option<StatusLevel>,
    pub caom_keyword: Option<String>,
    pub xml_parent: Option<String>,
    pub multiple: bool,
    pub alternates: Vec<String>,
    pub default: Option<String>,
}

impl RuleDraft {
    pub fn new(keyword: impl Into<String>, header: HduTarget, hlsp_status: StatusLevel) -> Self {
        Self {
            keyword: keyword.into(),
            header,
            hlsp_status,
            caom_status: None,
            caom_keyword: None,
            xml_parent: None,
            multiple: false,
            alternates: Vec::new(),
            default: None,
        }
    }

    pub fn with_caom(mut self, status: StatusLevel, caom_keyword: Option<&str>) -> Self {
        self.caom_status = Some(status);
        self.caom_keyword = caom_keyword.map(str::to_string);
        self
    }

    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternates = alternates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn allow_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Validate names and compile the primary name plus alternates into
    /// patterns. `dictionary` labels errors.
    pub fn compile(self, dictionary: &str) -> Result<Rule, DictionaryError> {
        let keyword = self.keyword.trim().to_string();
        if keyword.is_empty() {
            return Err(DictionaryError::MalformedDictionary {
                dictionary: dictionary.to_string(),
                reason: "empty keyword name".to_string(),
            });
        }

        let mut patterns = Vec::with_capacity(1 + self.alternates.len());
        for name in std::iter::once(&keyword).chain(self.alternates.iter()) {
            if name.trim().is_empty() {
                return Err(DictionaryError::MalformedDictionary {
                    dictionary: dictionary.to_string(),
                    reason: format!("keyword '{}' has an empty alternate name", keyword),
                });
            }
            let pattern =
                KeywordPattern::new(name).map_err(|e| DictionaryError::MalformedDictionary {
                    dictionary: dictionary.to_string(),
                    reason: format!("keyword '{}' has invalid pattern '{}': {}", keyword, name, e),
                })?;
            patterns.push(pattern);
        }

        Ok(Rule {
            keyword,
            header: self.header,
            hlsp_status: self.hlsp_status,
            caom_status: self.caom_status,
            caom_keyword: self.caom_keyword,
            xml_parent: self.xml_parent,
            multiple: self.multiple,
            alternates: self.alternates.iter().map(|a| a.trim().to_string()).collect(),
            default: self.default,
            patterns,
        })
    }
}

/// A compiled keyword rule.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    keyword: String,
    header: HduTarget,
    hlsp_status: StatusLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    caom_status: Option<StatusLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caom_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xml_parent: Option<String>,
    multiple: bool,
    alternates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(skip)]
    patterns: Vec<KeywordPattern>,
}

impl Rule {
    /// Primary keyword name (may contain `*`).
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn header(&self) -> &HduTarget {
        &self.header
    }

    pub fn hlsp_status(&self) -> StatusLevel {
        self.hlsp_status
    }

    /// `None` for rules from list-shape dictionaries.
    pub fn caom_status(&self) -> Option<StatusLevel> {
        self.caom_status
    }

    /// Level on the given axis, if the rule participates in it.
    pub fn status(&self, axis: Axis) -> Option<StatusLevel> {
        match axis {
            Axis::Hlsp => Some(self.hlsp_status),
            Axis::Caom => self.caom_status,
        }
    }

    pub fn caom_keyword(&self) -> Option<&str> {
        self.caom_keyword.as_deref()
    }

    pub fn xml_parent(&self) -> Option<&str> {
        self.xml_parent.as_deref()
    }

    pub fn multiple(&self) -> bool {
        self.multiple
    }

    pub fn alternates(&self) -> &[String] {
        &self.alternates
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Primary name followed by every alternate, compiled.
    pub fn patterns(&self) -> &[KeywordPattern] {
        &self.patterns
    }

    pub fn to_draft(&self) -> RuleDraft {
        RuleDraft {
            keyword: self.keyword.clone(),
            header: self.header.clone(),
            hlsp_status: self.hlsp_status,
            caom_status: self.caom_status,
            caom_keyword: self.caom_keyword.clone(),
            xml_parent: self.xml_parent.clone(),
            multiple: self.multiple,
            alternates: self.alternates.clone(),
            default: self.default.clone(),
        }
    }
}

/// A product/standard keyword dictionary. Read-only once built.
#[derive(Debug, Clone, Serialize)]
pub struct Dictionary {
    id: DictionaryId,
    shape: DictionaryShape,
    rules: Vec<Rule>,
}

impl Dictionary {
    /// Build a dictionary, rejecting keyword names that repeat
    /// case-insensitively.
    pub fn new(
        id: DictionaryId,
        shape: DictionaryShape,
        rules: Vec<Rule>,
    ) -> Result<Self, DictionaryError> {
        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if !seen.insert(rule.keyword.to_ascii_uppercase()) {
                return Err(DictionaryError::MalformedDictionary {
                    dictionary: id.to_string(),
                    reason: format!("duplicate keyword '{}'", rule.keyword),
                });
            }
        }
        Ok(Self { id, shape, rules })
    }

    pub fn id(&self) -> &DictionaryId {
        &self.id
    }

    pub fn product(&self) -> &str {
        &self.id.product
    }

    pub fn standard(&self) -> &str {
        &self.id.standard
    }

    pub fn shape(&self) -> DictionaryShape {
        self.shape
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by primary keyword name, case-insensitively.
    pub fn get(&self, keyword: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.keyword.eq_ignore_ascii_case(keyword.trim()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
