//! Human-editable text exchange format.
//!
//! The export is the sole surface translators touch, so the layout is
//! stable: three fixed sections, one `key: text` line per item, keys being
//! the exact extraction contexts. Translations come back through the inverse
//! parser keyed by those same strings; nothing is ever matched by position.
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::{ExtractionResult, BRIEFING_FIELDS};

pub const BRIEFING_HEADER: &str = "БРИФИНГ: / BRIEFING:";
pub const TRIGGERS_HEADER: &str = "ТРИГГЕРЫ: / TRIGGERS:";
pub const RADIO_HEADER: &str = "РАДИОСООБЩЕНИЯ: / RADIO MESSAGES:";

/// A line that starts a new entry. Everything else (headers aside) is a
/// continuation of the previous entry's value.
static KEY_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Briefing_[A-Za-z]+|DictKey_\w+|MissionTrigger_\d+|MissionRadio_\d+): ?(.*)$")
        .expect("valid key line regex")
});

/// Parsed translated exchange text.
///
/// `key_mappings` is the only write-back channel; `briefings` mirrors the
/// five fixed labels onto mission field names, and `triggers`/`radio` keep
/// the per-section texts in order for legacy consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedText {
    pub briefings: HashMap<String, String>,
    pub triggers: Vec<String>,
    pub radio: Vec<String>,
    pub key_mappings: HashMap<String, String>,
}

/// Serialize an extraction result to the flat exchange document.
pub fn format_as_text(result: &ExtractionResult) -> String {
    let mut out = String::new();

    out.push_str(BRIEFING_HEADER);
    out.push_str("\n\n");
    for item in &result.briefings {
        out.push_str(&format!("{}: {}\n", item.context, item.text));
    }

    out.push('\n');
    out.push_str(TRIGGERS_HEADER);
    out.push_str("\n\n");
    for item in &result.triggers {
        out.push_str(&format!("{}: {}\n", item.context, item.text));
    }

    out.push('\n');
    out.push_str(RADIO_HEADER);
    out.push_str("\n\n");
    for item in &result.radio {
        out.push_str(&format!("{}: {}\n", item.context, item.text));
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Briefing,
    Triggers,
    Radio,
}

fn header_section(line: &str) -> Option<Section> {
    let trimmed = line.trim();
    if trimmed.contains("BRIEFING:") {
        Some(Section::Briefing)
    } else if trimmed.contains("TRIGGERS:") {
        Some(Section::Triggers)
    } else if trimmed.contains("RADIO MESSAGES:") {
        Some(Section::Radio)
    } else {
        None
    }
}

fn briefing_field_for_label(label: &str) -> Option<&'static str> {
    BRIEFING_FIELDS
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(field, _)| *field)
}

/// Parse a (possibly translated) exchange document back into key→text
/// mappings. Headers are skipped; non-key lines continue the previous
/// entry's value, joined with a newline. Blank lines inside an open entry
/// are held back and restored only when another continuation line follows,
/// so paragraph breaks in briefing descriptions survive the round trip
/// while trailing blanks before the next key or header do not.
pub fn parse_imported_text(text: &str) -> ImportedText {
    let mut parsed = ImportedText::default();
    let mut section = Section::None;
    let mut current_key: Option<String> = None;
    let mut pending_blanks = 0usize;

    for line in text.lines() {
        if let Some(next) = header_section(line) {
            section = next;
            current_key = None;
            pending_blanks = 0;
            continue;
        }
        if line.trim().is_empty() {
            if current_key.is_some() {
                pending_blanks += 1;
            }
            continue;
        }

        if let Some(caps) = KEY_LINE_RE.captures(line) {
            pending_blanks = 0;
            let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            parsed
                .key_mappings
                .insert(key.to_string(), value.to_string());
            if let Some(field) = briefing_field_for_label(key) {
                parsed.briefings.insert(field.to_string(), value.to_string());
            } else {
                match section {
                    Section::Radio => parsed.radio.push(value.to_string()),
                    _ => parsed.triggers.push(value.to_string()),
                }
            }
            current_key = Some(key.to_string());
            continue;
        }

        // continuation line; restore any blank lines held back since the
        // last text line
        if let Some(key) = &current_key {
            let mut tail = "\n".repeat(pending_blanks + 1);
            tail.push_str(line);
            pending_blanks = 0;

            if let Some(value) = parsed.key_mappings.get_mut(key) {
                value.push_str(&tail);
            }
            if let Some(field) = briefing_field_for_label(key) {
                if let Some(value) = parsed.briefings.get_mut(field) {
                    value.push_str(&tail);
                }
            } else {
                let list = match section {
                    Section::Radio => &mut parsed.radio,
                    _ => &mut parsed.triggers,
                };
                if let Some(last) = list.last_mut() {
                    last.push_str(&tail);
                }
            }
        }
    }

    parsed
}
