//! Loading dictionaries and keyword updates from disk.

use hlspcheck_core::dictionary::{
    load_updates_from_file, DictionaryShape, HduTarget, StatusLevel,
};
use hlspcheck_core::{load_dictionary, load_dictionaries, DictionaryError, DictionarySource};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_file_takes_precedence_over_builtin() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("timeseries_tess");
    fs::write(
        &path,
        "PRODUCT: timeseries\nSTANDARD: tess\nKEYWORDS:\n  OBJECT:\n    header: 0\n    hlsp_status: required\n    caom_status: required\n",
    )
    .unwrap();

    let loaded = load_dictionary(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.dictionary.len(), 1);
    assert!(matches!(loaded.source, DictionarySource::File(_)));
}

#[test]
fn test_list_dictionary_identity_from_file_stem() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spectrum_jwst.yaml");
    fs::write(&path, "PHDU:\n  required: [TELESCOP]\n  suggested: [HLSPVER]\n").unwrap();

    let loaded = load_dictionary(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.dictionary.product(), "spectrum");
    assert_eq!(loaded.dictionary.standard(), "jwst");
    assert_eq!(loaded.dictionary.shape(), DictionaryShape::StatusLists);
}

#[test]
fn test_list_dictionary_without_identity_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keywords.yaml");
    fs::write(&path, "PHDU:\n  required: [TELESCOP]\n").unwrap();

    let err = load_dictionary(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, DictionaryError::MalformedDictionary { .. }));
}

#[test]
fn test_unknown_status_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(
        &path,
        "PRODUCT: a\nSTANDARD: b\nKEYWORDS:\n  OBJECT:\n    header: 0\n    hlsp_status: required\n    caom_status: optional\n",
    )
    .unwrap();

    let err = load_dictionary(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, DictionaryError::UnknownStatusLevel { .. }));
    assert!(err.to_string().contains("optional"));
}

#[test]
fn test_load_dictionaries_stops_at_first_error() {
    let refs = vec!["timeseries/tess".to_string(), "nope/nothing".to_string()];
    assert!(matches!(
        load_dictionaries(&refs),
        Err(DictionaryError::NotFound { .. })
    ));
}

#[test]
fn test_updates_from_file_refresh_digest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("updates.yaml");
    fs::write(
        &path,
        "KEYWORDS:\n  FILTER:\n    default: null\n    hlsp_status: recommended\n  HLSPVER:\n    header: 0\n    hlsp_status: required\n    caom_status: omitted\n",
    )
    .unwrap();

    let base = load_dictionary("timeseries/tess").unwrap();
    let updates = load_updates_from_file(&path).unwrap();
    let updated = base.with_updates(&updates).unwrap();

    assert_ne!(base.digest, updated.digest);
    assert_eq!(updated.dictionary.len(), 12);

    let filter = updated.dictionary.get("FILTER").unwrap();
    assert_eq!(filter.hlsp_status(), StatusLevel::Recommended);
    // A null field leaves the existing value in place.
    assert_eq!(filter.default_value(), Some("TESS"));

    let hlspver = updated.dictionary.get("HLSPVER").unwrap();
    assert_eq!(*hlspver.header(), HduTarget::Index(0));
    assert_eq!(hlspver.caom_status(), Some(StatusLevel::Omitted));
}

#[test]
fn test_missing_file_is_read_error() {
    let err = load_updates_from_file(std::path::Path::new("/nonexistent/updates.yaml"))
        .unwrap_err();
    assert!(matches!(err, DictionaryError::ReadError { .. }));
}

#[test]
fn test_duplicate_keys_reported_alike() {
    let dir = TempDir::new().unwrap();
    let updates = dir.path().join("updates.yaml");
    fs::write(
        &updates,
        "HLSPVER:\n  header: 0\nHLSPVER:\n  hlsp_status: required\n",
    )
    .unwrap();
    let dictionary = dir.path().join("image_dup.yaml");
    fs::write(&dictionary, "PHDU:\n  required: [X]\nPHDU:\n  required: [Y]\n").unwrap();

    for err in [
        load_updates_from_file(&updates).unwrap_err(),
        load_dictionary(dictionary.to_str().unwrap()).unwrap_err(),
    ] {
        match err {
            DictionaryError::YamlParseError { message } => {
                assert!(message.starts_with("Duplicate key detected"), "{message}");
            }
            other => panic!("expected YamlParseError, got {other:?}"),
        }
    }
}
