use super::super::args::{DictionariesArgs, DictionariesSub};
use crate::exit_codes::{DICTIONARY_ERROR, SUCCESS};
use anyhow::Result;
use hlspcheck_core::dictionary::{builtin_dictionary_names, load_updates_from_file};
use hlspcheck_core::load_dictionary;
use std::path::Path;

pub fn run(args: DictionariesArgs) -> Result<i32> {
    match args.cmd {
        DictionariesSub::List => cmd_list(),
        DictionariesSub::Show { reference, updates } => cmd_show(&reference, updates.as_deref()),
    }
}

fn cmd_list() -> Result<i32> {
    for name in builtin_dictionary_names() {
        match load_dictionary(name) {
            Ok(loaded) => println!(
                "{:<20} {:<20} {:>3} rules",
                name,
                loaded.dictionary.id().to_string(),
                loaded.dictionary.len()
            ),
            Err(e) => {
                eprintln!("Built-in dictionary '{}' failed to load: {}", name, e);
                return Ok(DICTIONARY_ERROR);
            }
        }
    }
    Ok(SUCCESS)
}

fn cmd_show(reference: &str, updates: Option<&Path>) -> Result<i32> {
    let loaded = match load_dictionary(reference) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Dictionary loading failed: {}", e);
            return Ok(DICTIONARY_ERROR);
        }
    };

    let loaded = match updates {
        Some(path) => match load_updates_from_file(path).and_then(|u| loaded.with_updates(&u)) {
            Ok(updated) => updated,
            Err(e) => {
                eprintln!("Keyword updates failed: {}", e);
                return Ok(DICTIONARY_ERROR);
            }
        },
        None => loaded,
    };

    let out = serde_json::json!({
        "source": loaded.source.to_string(),
        "digest": loaded.digest,
        "dictionary": loaded.dictionary,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(SUCCESS)
}
