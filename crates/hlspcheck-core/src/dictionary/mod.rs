//! Keyword dictionaries: which FITS keywords a product/standard expects,
//! in which HDU, and at what level on each compliance axis.

pub mod loader;
pub mod normalize;
pub mod schema;
pub mod updates;

pub use loader::{
    load_dictionaries, load_dictionary, load_dictionary_from_file, load_dictionary_from_str,
    DictionaryError, DictionarySource, LoadedDictionary,
};
pub use normalize::{load, load_with_id, RuleFields};
pub use schema::{
    Axis, Dictionary, DictionaryId, DictionaryShape, HduTarget, Rule, RuleDraft, StatusLevel,
    NOT_APPLICABLE_HDU,
};
pub use updates::{load_updates_from_file, parse_updates, KeywordUpdate};

/// Built-in dictionaries embedded at compile time.
///
/// Format: (`product_standard`, dictionary_yaml_content)
pub static BUILTIN_DICTIONARIES: &[(&str, &str)] = &[
    (
        "image_hst",
        include_str!("../../dictionaries/image_hst.yaml"),
    ),
    (
        "timeseries_tess",
        include_str!("../../dictionaries/timeseries_tess.yaml"),
    ),
];

/// Look up a built-in dictionary by its `product_standard` name.
pub fn get_builtin_dictionary(name: &str) -> Option<&'static str> {
    BUILTIN_DICTIONARIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, content)| *content)
}

pub fn builtin_dictionary_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_DICTIONARIES.iter().map(|(name, _)| *name)
}
