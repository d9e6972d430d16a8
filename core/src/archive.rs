//! `.miz` container access.
//!
//! A mission archive is a plain zip; this module treats it as an opaque
//! path→bytes store with list/read/write. Everything above it works on
//! entry text, never on zip internals.
use std::io::{Cursor, Read, Write};

use zip::read::ZipArchive;
use zip::write::FileOptions;
use zip::CompressionMethod;

pub const MISSION_ENTRY: &str = "mission";
pub const DEFAULT_LOCALE: &str = "DEFAULT";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Path of a locale's dictionary entry inside the archive.
pub fn dictionary_path(locale: &str) -> String {
    format!("l10n/{locale}/dictionary")
}

/// Locale name if `path` is a dictionary entry (`l10n/<LOCALE>/dictionary`).
pub fn dictionary_locale(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("l10n/")?;
    let (locale, tail) = rest.split_once('/')?;
    (tail == "dictionary").then_some(locale)
}

/// Read-side view over a mission archive held in memory.
pub struct MizArchive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl MizArchive {
    pub fn open(bytes: Vec<u8>) -> ArchiveResult<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    /// All file entry paths, in archive order. Directory entries are
    /// skipped; files carry their full path anyway.
    pub fn entry_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(String::from)
            .collect()
    }

    pub fn read(&mut self, path: &str) -> ArchiveResult<Vec<u8>> {
        let mut entry = self
            .archive
            .by_name(path)
            .map_err(|_| ArchiveError::EntryNotFound(path.to_string()))?;
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Read an entry as text, tolerating a UTF-8 BOM.
    pub fn read_string(&mut self, path: &str) -> ArchiveResult<String> {
        let bytes = self.read(path)?;
        let content = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            String::from_utf8_lossy(&bytes[3..]).to_string()
        } else {
            String::from_utf8_lossy(&bytes).to_string()
        };
        Ok(content)
    }

    /// Build a fresh archive from the given entries, deflate-compressed.
    pub fn write(entries: &[(String, Vec<u8>)]) -> ArchiveResult<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (path, content) in entries {
            writer.start_file(path, options.clone())?;
            writer.write_all(content)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
