//! Keyword updates layered over a loaded dictionary.
//!
//! An update document is either a bare mapping of keyword name to partial
//! rule fields, or the same mapping under a `KEYWORDS` key. Fields left out
//! keep the dictionary's value; keywords the dictionary lacks become new
//! rules and must then declare `header` and `hlsp_status`.

use super::loader::{format_yaml_error, DictionaryError};
use super::normalize::{describe_key, RuleFields};
use super::schema::{Dictionary, Rule};
use serde_yaml::Value;
use std::path::Path;

/// One keyword's override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordUpdate {
    pub keyword: String,
    pub fields: RuleFields,
}

impl KeywordUpdate {
    pub fn new(keyword: impl Into<String>, fields: RuleFields) -> Self {
        Self {
            keyword: keyword.into().trim().to_string(),
            fields,
        }
    }
}

/// Parse an update document. `label` names the document in errors.
pub fn parse_updates(raw: &Value, label: &str) -> Result<Vec<KeywordUpdate>, DictionaryError> {
    let root = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(map) => map,
        _ => {
            return Err(DictionaryError::MalformedDictionary {
                dictionary: label.to_string(),
                reason: "keyword updates must be a mapping of keyword name to fields".to_string(),
            })
        }
    };

    let keywords = match root.get("KEYWORDS") {
        Some(Value::Mapping(inner)) => inner,
        Some(_) => {
            return Err(DictionaryError::MalformedDictionary {
                dictionary: label.to_string(),
                reason: "KEYWORDS must be a mapping".to_string(),
            })
        }
        None => root,
    };

    let mut updates = Vec::with_capacity(keywords.len());
    for (key, value) in keywords {
        let keyword = match key.as_str() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                return Err(DictionaryError::MalformedDictionary {
                    dictionary: label.to_string(),
                    reason: format!("expected a keyword name, found '{}'", describe_key(key)),
                })
            }
        };
        let fields = match value {
            Value::Null => RuleFields::default(),
            Value::Mapping(fields) => RuleFields::parse(fields, &keyword, label)?,
            _ => {
                return Err(DictionaryError::MalformedDictionary {
                    dictionary: label.to_string(),
                    reason: format!("update for keyword '{}' must be a mapping", keyword),
                })
            }
        };
        updates.push(KeywordUpdate::new(keyword, fields));
    }

    Ok(updates)
}

/// Read and parse an update document from disk.
pub fn load_updates_from_file(path: &Path) -> Result<Vec<KeywordUpdate>, DictionaryError> {
    let content = std::fs::read_to_string(path).map_err(|e| DictionaryError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw: Value =
        serde_yaml::from_str(&content).map_err(|e| DictionaryError::YamlParseError {
            message: format_yaml_error(e),
        })?;
    parse_updates(&raw, &path.display().to_string())
}

impl Dictionary {
    /// A new dictionary with `updates` applied in order. Existing keywords
    /// are matched case-insensitively and keep their position; new keywords
    /// are appended.
    pub fn with_updates(&self, updates: &[KeywordUpdate]) -> Result<Dictionary, DictionaryError> {
        let label = self.id().to_string();
        let mut rules: Vec<Rule> = self.rules().to_vec();

        for update in updates {
            let existing = rules
                .iter()
                .position(|r| r.keyword().eq_ignore_ascii_case(&update.keyword));

            match existing {
                Some(index) => {
                    let mut draft = rules[index].to_draft();
                    update.fields.apply_to(&mut draft);
                    rules[index] = draft.compile(&label)?;
                    tracing::debug!(dictionary = %label, keyword = %update.keyword, "updated keyword rule");
                }
                None => {
                    let draft = update
                        .fields
                        .clone()
                        .into_draft(&update.keyword, &label, false)?;
                    rules.push(draft.compile(&label)?);
                    tracing::debug!(dictionary = %label, keyword = %update.keyword, "added keyword rule");
                }
            }
        }

        Dictionary::new(self.id().clone(), self.shape(), rules)
    }
}
