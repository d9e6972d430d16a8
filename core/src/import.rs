//! Import orchestration: archive in, translated archive out.
//!
//! Sequences parse → exchange-text parse → mission briefing update →
//! dictionary regeneration → archive rebuild. DEFAULT text is read-only
//! input throughout; every target locale is produced fresh from it.
use std::collections::HashMap;

use thiserror::Error;

use crate::archive::{
    dictionary_locale, dictionary_path, ArchiveError, MizArchive, DEFAULT_LOCALE, MISSION_ENTRY,
};
use crate::exchange::parse_imported_text;
use crate::extract::{extract_text, ExtractOptions, ExtractionResult, BRIEFING_FIELDS};
use crate::lua::{parse_document, LuaTable, ParseError};
use crate::regen::{generate_dictionary, update_mission_briefings};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("required entry `{0}` missing from archive")]
    MissingEntry(String),

    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Parsed view of a mission archive: the mission tree, the raw mission
/// text, and every locale dictionary that parsed cleanly.
#[derive(Debug, Clone)]
pub struct MizData {
    pub mission_raw: String,
    pub mission: LuaTable,
    pub dictionaries: HashMap<String, LuaTable>,
    pub available_locales: Vec<String>,
}

/// Read and parse an archive. The `mission` entry and the DEFAULT
/// dictionary must parse; a broken non-DEFAULT locale dictionary is
/// reported and skipped, that locale is simply unavailable.
pub fn parse_miz(miz_bytes: &[u8]) -> Result<MizData, ImportError> {
    let mut archive = MizArchive::open(miz_bytes.to_vec())?;
    let names = archive.entry_names();

    let mission_raw = read_required(&mut archive, MISSION_ENTRY)?;
    let (_, mission) = parse_document(&mission_raw).map_err(|source| ImportError::Parse {
        path: MISSION_ENTRY.to_string(),
        source,
    })?;

    let mut dictionaries = HashMap::new();
    let mut available_locales = Vec::new();
    for name in &names {
        let Some(locale) = dictionary_locale(name) else {
            continue;
        };
        available_locales.push(locale.to_string());
        let raw = archive.read_string(name)?;
        match parse_document(&raw) {
            Ok((_, table)) => {
                dictionaries.insert(locale.to_string(), table);
            }
            Err(err) if locale == DEFAULT_LOCALE => {
                return Err(ImportError::Parse {
                    path: name.clone(),
                    source: err,
                });
            }
            Err(err) => {
                log::warn!("skipping unparsable dictionary for locale {locale}: {err}");
            }
        }
    }

    if !dictionaries.contains_key(DEFAULT_LOCALE) {
        return Err(ImportError::MissingEntry(dictionary_path(DEFAULT_LOCALE)));
    }

    Ok(MizData {
        mission_raw,
        mission,
        dictionaries,
        available_locales,
    })
}

/// Parse an archive and extract its translatable strings in one step.
pub fn extract_from_miz(
    miz_bytes: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractionResult, ImportError> {
    let data = parse_miz(miz_bytes)?;
    Ok(extract_text(&data.mission, &data.dictionaries, options))
}

/// Build a new archive with `translated_text` imported as `target_locale`.
///
/// Every original entry is copied byte-identical except the mission file
/// (briefing fields substituted) and `l10n/<target_locale>/dictionary`
/// (regenerated from the DEFAULT dictionary's raw text). The progress
/// callback is cosmetic: non-decreasing percentage plus a stage label.
pub fn import_to_miz(
    miz_bytes: &[u8],
    translated_text: &str,
    target_locale: &str,
    mut progress: Option<&mut dyn FnMut(u8, &str)>,
) -> Result<Vec<u8>, ImportError> {
    let mut report = |pct: u8, stage: &str| {
        if let Some(cb) = progress.as_mut() {
            cb(pct, stage);
        }
    };

    report(0, "Reading archive");
    let mut archive = MizArchive::open(miz_bytes.to_vec())?;
    let names = archive.entry_names();
    let mission_raw = read_required(&mut archive, MISSION_ENTRY)?;
    let default_dict_path = dictionary_path(DEFAULT_LOCALE);
    let default_dict_raw = read_required(&mut archive, &default_dict_path)?;

    report(20, "Parsing translated text");
    let imported = parse_imported_text(translated_text);

    report(40, "Updating mission briefings");
    let new_mission = update_mission_briefings(&mission_raw, &imported.briefings);

    report(60, "Regenerating dictionary");
    let mut mappings = imported.key_mappings.clone();
    fold_briefings_into_mappings(&default_dict_raw, &imported.briefings, &mut mappings);
    let update = generate_dictionary(&default_dict_raw, &mappings, target_locale);

    report(80, "Writing archive");
    let target_dict_path = dictionary_path(target_locale);
    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(names.len() + 1);
    let mut wrote_target = false;
    for name in &names {
        let bytes = if name == MISSION_ENTRY {
            new_mission.clone().into_bytes()
        } else if *name == target_dict_path {
            wrote_target = true;
            update.text.clone().into_bytes()
        } else {
            archive.read(name)?
        };
        entries.push((name.clone(), bytes));
    }
    if !wrote_target {
        entries.push((target_dict_path, update.text.into_bytes()));
    }

    let out = MizArchive::write(&entries)?;
    report(100, "Done");
    Ok(out)
}

fn read_required(archive: &mut MizArchive, path: &str) -> Result<String, ImportError> {
    archive.read_string(path).map_err(|err| match err {
        ArchiveError::EntryNotFound(path) => ImportError::MissingEntry(path),
        other => ImportError::Archive(other),
    })
}

/// Briefing translations reach the dictionary only through keys that
/// already exist there (`DictKey_sortie*`, `DictKey_descriptionText*`, …).
/// New entries are never materialized: a mission carrying its briefing text
/// literally keeps its dictionary untouched.
fn fold_briefings_into_mappings(
    default_dict_raw: &str,
    briefings: &HashMap<String, String>,
    mappings: &mut HashMap<String, String>,
) {
    if briefings.is_empty() {
        return;
    }
    for key in crate::regen::dictionary_keys(default_dict_raw) {
        for (field, _) in BRIEFING_FIELDS {
            if key.starts_with(&format!("DictKey_{field}")) {
                if let Some(translation) = briefings.get(*field) {
                    mappings.insert(key.clone(), translation.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_miz(mission: &str, dictionary: &str) -> Vec<u8> {
        MizArchive::write(&[
            (MISSION_ENTRY.to_string(), mission.as_bytes().to_vec()),
            ("options".to_string(), b"options = {}".to_vec()),
            (
                dictionary_path(DEFAULT_LOCALE),
                dictionary.as_bytes().to_vec(),
            ),
        ])
        .expect("test archive builds")
    }

    #[test]
    fn test_parse_miz_reads_mission_and_dictionaries() {
        let bytes = build_miz(
            "mission = { [\"sortie\"] = \"Test\" }",
            "dictionary = { [\"DictKey_ActionText_1\"] = \"Check in.\" }",
        );
        let data = parse_miz(&bytes).unwrap();
        assert_eq!(data.mission.field_str("sortie"), Some("Test"));
        assert_eq!(data.available_locales, vec!["DEFAULT"]);
        assert!(data.dictionaries.contains_key("DEFAULT"));
    }

    #[test]
    fn test_parse_miz_missing_mission_is_fatal() {
        let bytes = MizArchive::write(&[(
            dictionary_path(DEFAULT_LOCALE),
            b"dictionary = {}".to_vec(),
        )])
        .unwrap();
        let err = parse_miz(&bytes).unwrap_err();
        assert!(matches!(err, ImportError::MissingEntry(entry) if entry == "mission"));
    }

    #[test]
    fn test_parse_miz_skips_broken_secondary_locale() {
        let bytes = MizArchive::write(&[
            (MISSION_ENTRY.to_string(), b"mission = {}".to_vec()),
            (dictionary_path(DEFAULT_LOCALE), b"dictionary = {}".to_vec()),
            (
                dictionary_path("RU"),
                b"dictionary = { broken ".to_vec(),
            ),
        ])
        .unwrap();
        let data = parse_miz(&bytes).unwrap();
        assert!(data.dictionaries.contains_key("DEFAULT"));
        assert!(!data.dictionaries.contains_key("RU"));
        // the locale is still listed as present in the archive
        assert!(data.available_locales.contains(&"RU".to_string()));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let bytes = build_miz("mission = {}", "dictionary = {}");
        let mut seen: Vec<u8> = Vec::new();
        let mut cb = |pct: u8, _stage: &str| seen.push(pct);
        import_to_miz(&bytes, "", "RU", Some(&mut cb)).unwrap();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100);
    }
}
