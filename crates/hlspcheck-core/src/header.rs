//! Observed FITS headers: which keywords are present in which HDU.
//!
//! The physical FITS reader lives outside this crate. It hands over either
//! an [`ObservedHeader`] built directly, or a raw document:
//!
//! ```yaml
//! 0: [SIMPLE, TELESCOP, INSTRUME]
//! 1:
//!   extname: SCI
//!   keywords: [XTENSION, BUNIT, CD1_1]
//! ```

use crate::engine::EvaluationError;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Keywords present in one HDU, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HduHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    extname: Option<String>,
    keywords: Vec<String>,
}

impl HduHeader {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extname: None,
            keywords: keywords
                .into_iter()
                .map(|k| k.into().trim().to_string())
                .collect(),
        }
    }

    pub fn with_extname(mut self, extname: impl Into<String>) -> Self {
        self.extname = Some(extname.into().trim().to_string());
        self
    }

    pub fn extname(&self) -> Option<&str> {
        self.extname.as_deref()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Snapshot of one file's headers, keyed by HDU index (0 = primary).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ObservedHeader {
    hdus: BTreeMap<u32, HduHeader>,
}

impl ObservedHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ObservedHeader::insert`].
    pub fn with_hdu(mut self, index: u32, hdu: HduHeader) -> Self {
        self.insert(index, hdu);
        self
    }

    /// Insert or replace the header of HDU `index`.
    pub fn insert(&mut self, index: u32, hdu: HduHeader) -> Option<HduHeader> {
        self.hdus.insert(index, hdu)
    }

    pub fn hdu(&self, index: u32) -> Option<&HduHeader> {
        self.hdus.get(&index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.hdus.contains_key(&index)
    }

    /// HDU indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.hdus.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &HduHeader)> {
        self.hdus.iter().map(|(index, hdu)| (*index, hdu))
    }

    pub fn len(&self) -> usize {
        self.hdus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hdus.is_empty()
    }

    /// First HDU whose EXTNAME equals `extname` (case-insensitive).
    pub fn index_of_extname(&self, extname: &str) -> Option<u32> {
        self.indices_with_extname(extname).into_iter().next()
    }

    /// Every HDU whose EXTNAME equals `extname` (case-insensitive).
    pub fn indices_with_extname(&self, extname: &str) -> Vec<u32> {
        let wanted = extname.trim();
        self.iter()
            .filter(|(_, hdu)| {
                hdu.extname()
                    .is_some_and(|name| name.eq_ignore_ascii_case(wanted))
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Build from a raw document. Anything that is not an HDU-indexed
    /// mapping of keyword lists fails with [`EvaluationError::UnknownHdu`].
    pub fn from_raw(raw: &Value) -> Result<Self, EvaluationError> {
        let root = raw.as_mapping().ok_or_else(|| EvaluationError::UnknownHdu {
            hdu: "<root>".to_string(),
            reason: "observed headers must be a mapping of HDU index to keywords".to_string(),
        })?;

        let mut observed = ObservedHeader::new();
        for (key, value) in root {
            let index = parse_index(key)?;
            let hdu = parse_hdu(index, value)?;
            if observed.insert(index, hdu).is_some() {
                return Err(EvaluationError::UnknownHdu {
                    hdu: index.to_string(),
                    reason: "HDU index listed more than once".to_string(),
                });
            }
        }

        tracing::debug!(hdus = observed.len(), "parsed observed headers");
        Ok(observed)
    }
}

fn parse_index(key: &Value) -> Result<u32, EvaluationError> {
    let index = match key {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    index.ok_or_else(|| EvaluationError::UnknownHdu {
        hdu: crate::dictionary::normalize::describe_key(key),
        reason: "HDU key must be a non-negative integer".to_string(),
    })
}

fn parse_hdu(index: u32, value: &Value) -> Result<HduHeader, EvaluationError> {
    match value {
        Value::Sequence(items) => Ok(HduHeader::new(keyword_names(index, items)?)),
        Value::Mapping(fields) => parse_hdu_mapping(index, fields),
        _ => Err(EvaluationError::UnknownHdu {
            hdu: index.to_string(),
            reason: "expected a keyword list or a mapping with 'keywords'".to_string(),
        }),
    }
}

fn parse_hdu_mapping(index: u32, fields: &Mapping) -> Result<HduHeader, EvaluationError> {
    let mut extname = None;
    let mut keywords = None;

    for (key, value) in fields {
        match (key.as_str(), value) {
            (Some("extname"), Value::Null) => {}
            (Some("extname"), Value::String(name)) => extname = Some(name.clone()),
            (Some("keywords"), Value::Sequence(items)) => {
                keywords = Some(keyword_names(index, items)?)
            }
            (Some("keywords"), Value::Null) => keywords = Some(Vec::new()),
            _ => {
                return Err(EvaluationError::UnknownHdu {
                    hdu: index.to_string(),
                    reason: format!(
                        "unexpected entry '{}'",
                        crate::dictionary::normalize::describe_key(key)
                    ),
                })
            }
        }
    }

    let keywords = keywords.ok_or_else(|| EvaluationError::UnknownHdu {
        hdu: index.to_string(),
        reason: "missing 'keywords' list".to_string(),
    })?;

    let hdu = HduHeader::new(keywords);
    Ok(match extname {
        Some(name) => hdu.with_extname(name),
        None => hdu,
    })
}

fn keyword_names(index: u32, items: &[Value]) -> Result<Vec<String>, EvaluationError> {
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| EvaluationError::UnknownHdu {
                    hdu: index.to_string(),
                    reason: "keyword names must be strings".to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(content: &str) -> Value {
        serde_yaml::from_str(content).unwrap()
    }

    #[test]
    fn test_from_raw_both_hdu_forms() {
        let observed = ObservedHeader::from_raw(&raw(
            "0: [SIMPLE, TELESCOP]\n'1':\n  extname: sci\n  keywords: [BUNIT, CD1_1]\n",
        ))
        .unwrap();

        assert_eq!(observed.indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(observed.hdu(0).unwrap().keywords(), ["SIMPLE", "TELESCOP"]);
        assert_eq!(observed.hdu(1).unwrap().extname(), Some("sci"));
        assert_eq!(observed.index_of_extname("SCI"), Some(1));
        assert_eq!(observed.index_of_extname("ERR"), None);
    }

    #[test]
    fn test_indices_with_extname_repeats() {
        let observed = ObservedHeader::new()
            .with_hdu(0, HduHeader::new(["SIMPLE"]))
            .with_hdu(1, HduHeader::new(["BUNIT"]).with_extname("SCI"))
            .with_hdu(2, HduHeader::new(["BUNIT"]).with_extname("ERR"))
            .with_hdu(3, HduHeader::new(["BUNIT"]).with_extname("SCI"));
        assert_eq!(observed.indices_with_extname("sci"), vec![1, 3]);
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            "[TELESCOP]\n",
            "primary: [TELESCOP]\n",
            "-1: [TELESCOP]\n",
            "0: TELESCOP\n",
            "0: [TELESCOP, 3]\n",
            "0:\n  extname: SCI\n",
            "0:\n  keywords: [A]\n  values: [1]\n",
            "0: [A]\n'0': [B]\n",
        ];
        for case in cases {
            let err = ObservedHeader::from_raw(&raw(case)).unwrap_err();
            assert!(
                matches!(err, EvaluationError::UnknownHdu { .. }),
                "case {case:?}"
            );
        }
    }

    #[test]
    fn test_empty_document_is_empty_snapshot() {
        let observed = ObservedHeader::from_raw(&raw("{}")).unwrap();
        assert!(observed.is_empty());
    }
}
