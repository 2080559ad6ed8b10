//! Dictionary loader with reference resolution, YAML parsing and digests.
//!
//! Resolution order for a reference:
//! 1. an existing filesystem path is loaded as a file
//! 2. a built-in dictionary (`product/standard` or `product_standard`)
//! 3. otherwise `NotFound`, with a suggestion
//!
//! Every loaded dictionary carries `sha256(JSON(dictionary))` so reports can
//! name the exact rule set they were produced from.

use super::normalize::load_with_id;
use super::schema::{Dictionary, DictionaryId};
use super::updates::KeywordUpdate;
use super::BUILTIN_DICTIONARIES;
use serde_yaml::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a loaded dictionary came from.
#[derive(Debug, Clone)]
pub enum DictionarySource {
    /// Embedded at compile time.
    BuiltIn(&'static str),
    /// Loaded from a file.
    File(PathBuf),
    /// Built from an in-memory document.
    Inline,
}

impl DictionarySource {
    /// Identity implied by the source name, used when a list-shape document
    /// does not declare `PRODUCT` / `STANDARD`.
    pub fn identity_hint(&self) -> Option<DictionaryId> {
        match self {
            DictionarySource::BuiltIn(name) => DictionaryId::parse(name),
            DictionarySource::File(path) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(DictionaryId::parse),
            DictionarySource::Inline => None,
        }
    }
}

impl std::fmt::Display for DictionarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictionarySource::BuiltIn(name) => write!(f, "builtin:{}", name),
            DictionarySource::File(path) => write!(f, "file:{}", path.display()),
            DictionarySource::Inline => write!(f, "inline"),
        }
    }
}

/// A loaded and validated dictionary.
#[derive(Debug, Clone)]
pub struct LoadedDictionary {
    pub dictionary: Dictionary,
    /// `sha256:<hex>` of the canonical JSON form.
    pub digest: String,
    pub source: DictionarySource,
}

impl LoadedDictionary {
    pub fn new(dictionary: Dictionary, source: DictionarySource) -> Result<Self, DictionaryError> {
        let digest = compute_dictionary_digest(&dictionary)?;
        Ok(Self {
            dictionary,
            digest,
            source,
        })
    }

    /// Layer keyword updates over this dictionary; the result gets a fresh digest.
    pub fn with_updates(&self, updates: &[KeywordUpdate]) -> Result<Self, DictionaryError> {
        let dictionary = self.dictionary.with_updates(updates)?;
        Self::new(dictionary, self.source.clone())
    }
}

/// Dictionary loading error.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Malformed dictionary '{dictionary}': {reason}")]
    MalformedDictionary { dictionary: String, reason: String },

    #[error(
        "Dictionary '{dictionary}' keyword '{keyword}' has unknown {field} '{value}' (expected required, recommended or omitted)"
    )]
    UnknownStatusLevel {
        dictionary: String,
        keyword: String,
        field: String,
        value: String,
    },

    #[error("Dictionary '{reference}' not found. {suggestion}")]
    NotFound {
        reference: String,
        suggestion: String,
    },

    #[error("Failed to read dictionary file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse dictionary YAML: {message}")]
    YamlParseError { message: String },
}

/// Load a dictionary from a reference (file path or built-in name).
pub fn load_dictionary(reference: &str) -> Result<LoadedDictionary, DictionaryError> {
    let path = Path::new(reference);

    if path.exists() {
        return load_dictionary_from_file(path);
    }

    if let Some((name, content)) = get_builtin_dictionary_with_name(reference) {
        tracing::debug!(reference, builtin = name, "resolved built-in dictionary");
        return load_dictionary_from_str(content, DictionarySource::BuiltIn(name));
    }

    Err(DictionaryError::NotFound {
        reference: reference.to_string(),
        suggestion: suggest_similar_dictionary(reference),
    })
}

/// Load multiple dictionaries from references.
pub fn load_dictionaries(references: &[String]) -> Result<Vec<LoadedDictionary>, DictionaryError> {
    let mut dictionaries = Vec::with_capacity(references.len());
    for reference in references {
        dictionaries.push(load_dictionary(reference)?);
    }
    Ok(dictionaries)
}

/// Load a dictionary from a file path.
pub fn load_dictionary_from_file(path: &Path) -> Result<LoadedDictionary, DictionaryError> {
    let content = std::fs::read_to_string(path).map_err(|e| DictionaryError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_dictionary_from_str(&content, DictionarySource::File(path.to_path_buf()))
}

/// Load a dictionary from YAML (or JSON) content.
pub fn load_dictionary_from_str(
    content: &str,
    source: DictionarySource,
) -> Result<LoadedDictionary, DictionaryError> {
    let raw: Value = serde_yaml::from_str(content).map_err(|e| DictionaryError::YamlParseError {
        message: format_yaml_error(e),
    })?;

    let hint = source.identity_hint();
    let dictionary = load_with_id(&raw, hint.as_ref())?;
    let loaded = LoadedDictionary::new(dictionary, source)?;

    tracing::debug!(
        dictionary = %loaded.dictionary.id(),
        source = %loaded.source,
        digest = %loaded.digest,
        "loaded dictionary"
    );
    Ok(loaded)
}

/// Compute dictionary digest: sha256(JSON(dictionary)).
///
/// Field order is fixed by the type definitions and rule order by the
/// source document, so the compact JSON form is canonical.
pub fn compute_dictionary_digest(dictionary: &Dictionary) -> Result<String, DictionaryError> {
    let canonical =
        serde_json::to_string(dictionary).map_err(|e| DictionaryError::MalformedDictionary {
            dictionary: dictionary.id().to_string(),
            reason: format!("failed to canonicalize dictionary: {}", e),
        })?;

    let hash = Sha256::digest(canonical.as_bytes());
    Ok(format!("sha256:{}", hex::encode(hash)))
}

/// Look up a built-in dictionary, accepting either reference spelling.
fn get_builtin_dictionary_with_name(reference: &str) -> Option<(&'static str, &'static str)> {
    let wanted = DictionaryId::parse(reference)
        .map(|id| id.file_stem())
        .unwrap_or_else(|| reference.trim().to_ascii_lowercase());

    BUILTIN_DICTIONARIES
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(name, content)| (*name, *content))
}

pub(crate) fn format_yaml_error(e: serde_yaml::Error) -> String {
    let msg = e.to_string();

    if msg.contains("duplicate") {
        return format!("Duplicate key detected (keywords must be unique): {}", msg);
    }

    msg
}

fn suggest_similar_dictionary(reference: &str) -> String {
    let wanted = reference.trim().to_ascii_lowercase().replace('/', "_");

    let suggestions: Vec<&str> = BUILTIN_DICTIONARIES
        .iter()
        .filter(|(name, _)| {
            name.starts_with(&wanted)
                || wanted.starts_with(*name)
                || strsim::levenshtein(name, &wanted) <= 3
        })
        .map(|(name, _)| *name)
        .collect();

    if suggestions.is_empty() {
        format!(
            "Available built-in dictionaries: {}. Or specify a file path: --dictionary ./my_standard.yaml",
            BUILTIN_DICTIONARIES
                .iter()
                .map(|(n, _)| *n)
                .collect::<Vec<_>>()
                .join(", ")
        )
    } else {
        format!("Did you mean '{}'?", suggestions.join("' or '"))
    }
}
