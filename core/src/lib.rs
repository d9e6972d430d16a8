pub mod archive;
pub mod exchange;
pub mod extract;
pub mod filter;
pub mod import;
pub mod lua;
pub mod regen;

pub use archive::{
    dictionary_locale, dictionary_path, ArchiveError, MizArchive, DEFAULT_LOCALE, MISSION_ENTRY,
};
pub use exchange::{format_as_text, parse_imported_text, ImportedText};
pub use extract::{
    extract_text, Category, CategoryCounts, ExtractMode, ExtractOptions, ExtractedItem,
    ExtractionResult, ExtractionStats,
};
pub use filter::is_system_message;
pub use import::{extract_from_miz, import_to_miz, parse_miz, ImportError, MizData};
pub use lua::{parse_document, LuaKey, LuaTable, LuaValue, ParseError};
pub use regen::{generate_dictionary, update_mission_briefings, DictionaryUpdate};
