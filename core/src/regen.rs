//! Format-preserving regeneration of dictionary and mission text.
//!
//! Write-back never re-serializes a parsed tree: rebuilding loses comments,
//! whitespace and key order, which is exactly the corruption this module
//! exists to prevent. Instead the original raw text is scanned for the
//! literal source span of each targeted value and only that span is
//! replaced; every other byte is copied through untouched.
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::BRIEFING_FIELDS;

/// `["<key>"] = "` — start of a bracket-keyed string entry. Group 1 is the
/// raw key text, group 2 the value's opening quote (double or single).
static DICT_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[\s*"((?:\\.|[^"\\])*)"\s*\]\s*=\s*(["'])"#).expect("valid dict entry regex")
});

/// Result of regenerating a dictionary from the DEFAULT raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryUpdate {
    pub text: String,
    /// Mapped DictKeys that never appeared in the raw text; reported, not
    /// fatal — the corresponding entries are simply left as they were.
    pub missing_keys: Vec<String>,
}

/// Produce the dictionary text for `target_locale` by copying
/// `default_raw` and substituting only the value spans of mapped keys.
///
/// An empty mapping value is written as an empty string: that is a
/// deliberate "no text" state, not "not translated". Keys absent from
/// `mappings` keep their original value byte-for-byte.
pub fn generate_dictionary(
    default_raw: &str,
    mappings: &HashMap<String, String>,
    target_locale: &str,
) -> DictionaryUpdate {
    let mut out = String::with_capacity(default_raw.len());
    let mut copied_to = 0usize; // byte offset copied into `out` so far
    let mut scan_pos = 0usize; // end of the last consumed value span
    let mut matched = std::collections::HashSet::new();

    for caps in DICT_ENTRY_RE.captures_iter(default_raw) {
        let whole = caps.get(0).expect("match");
        // a match starting inside a previous value span is value content,
        // not an entry
        if whole.start() < scan_pos {
            continue;
        }

        let key = unescape_key(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
        let quote_match = caps.get(2).expect("quote group");
        let quote = quote_match.as_str().chars().next().expect("quote char");
        let value_start = quote_match.end();

        let Some(value_end) = find_closing_quote(default_raw, value_start, quote) else {
            // malformed tail; stop substituting and copy the rest verbatim
            break;
        };
        scan_pos = value_end + quote.len_utf8();

        if let Some(translation) = mappings.get(&key) {
            out.push_str(&default_raw[copied_to..value_start]);
            out.push_str(&escape_lua_string(translation));
            copied_to = value_end;
            matched.insert(key);
        }
    }

    out.push_str(&default_raw[copied_to..]);

    let mut missing_keys: Vec<String> = mappings
        .keys()
        .filter(|k| k.starts_with("DictKey_") && !matched.contains(*k))
        .cloned()
        .collect();
    missing_keys.sort();
    for key in &missing_keys {
        log::warn!("dictionary for {target_locale}: mapped key `{key}` not found in DEFAULT text");
    }

    DictionaryUpdate {
        text: out,
        missing_keys,
    }
}

/// Substitute translated briefing fields into the raw mission text.
///
/// Only the five known top-level fields are touched; a field whose current
/// value is a `DictKey_*` reference is left alone — its translation reaches
/// the player through the locale dictionary instead.
pub fn update_mission_briefings(
    mission_raw: &str,
    briefings: &HashMap<String, String>,
) -> String {
    let mut current = mission_raw.to_string();

    for (field, _) in BRIEFING_FIELDS {
        let Some(translation) = briefings.get(*field) else {
            continue;
        };

        let pattern = Regex::new(&format!(r#"\["{field}"\]\s*=\s*(["'])"#))
            .expect("valid briefing field regex");
        let Some(caps) = pattern.captures(&current) else {
            log::warn!("mission briefing field `{field}` not found in mission text");
            continue;
        };
        let quote_match = caps.get(1).expect("quote group");
        let quote = quote_match.as_str().chars().next().expect("quote char");
        let value_start = quote_match.end();
        let Some(value_end) = find_closing_quote(&current, value_start, quote) else {
            log::warn!("mission briefing field `{field}` has an unterminated value, skipping");
            continue;
        };

        if current[value_start..value_end].starts_with("DictKey_") {
            continue;
        }

        let mut next = String::with_capacity(current.len());
        next.push_str(&current[..value_start]);
        next.push_str(&escape_lua_string(translation));
        next.push_str(&current[value_end..]);
        current = next;
    }

    current
}

/// Byte offset of the closing quote, honoring backslash escapes.
fn find_closing_quote(text: &str, from: usize, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (offset, c) in text[from..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(from + offset);
        }
    }
    None
}

/// Keys of every bracket-keyed string entry in the raw text, in source
/// order. Entry-lookalike text inside value spans is not counted.
pub(crate) fn dictionary_keys(raw: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut scan_pos = 0usize;
    for caps in DICT_ENTRY_RE.captures_iter(raw) {
        let whole = caps.get(0).expect("match");
        if whole.start() < scan_pos {
            continue;
        }
        let quote_match = caps.get(2).expect("quote group");
        let quote = quote_match.as_str().chars().next().expect("quote char");
        let Some(value_end) = find_closing_quote(raw, quote_match.end(), quote) else {
            break;
        };
        scan_pos = value_end + quote.len_utf8();
        keys.push(unescape_key(caps.get(1).map(|m| m.as_str()).unwrap_or_default()));
    }
    keys
}

fn unescape_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape translated text per Lua string rules. Unknown C0 controls become
/// decimal escapes rather than being dropped or truncated.
pub fn escape_lua_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\{}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
