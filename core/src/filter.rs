//! System-message filter for trigger/radio candidates.
//!
//! Mission scripts are full of avionics status strings ("JAMMER COOLING 11
//! MINUTE", "BUTTON 5 ON"), bare numbers, script placeholders ("INSERT ON
//! COURSE AUDIO") and F10 radio menu labels ("Request Takeoff") that must not
//! reach the translator. The filter is a table of independent rules; a string
//! is a system message as soon as one rule fires.
//!
//! The rule set is heuristic and grown from misclassification reports: false
//! negatives are tolerable, wrongly filtering long natural-language text is
//! not. New cases get a new rule plus a test, never a pipeline change.
use once_cell::sync::Lazy;
use regex::Regex;

/// Purely numeric strings, optionally with a trailing `+` ("240+").
static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\+?$").expect("valid numeric regex"));

/// Numbered technical labels: "COMM 1", "ASK 3", "RESP 2".
static NUMBERED_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]+\s+\d+$").expect("valid numbered label regex"));

/// Script placeholder phrasing left by mission designers.
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(INSERT|ADD|SET)\b|^HOLD UNTIL CLEAR$").expect("valid placeholder regex")
});

/// Support-purchase radio menu labels: "AWACS - 3 POINTS".
static POINTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+\s+POINTS?\b").expect("valid points regex"));

/// Avionics acronyms that mark a status string even in mixed case
/// ("ECM Power OFF").
static ACRONYM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(ECM|CMS|JAMMER|XMIT|WEPS)\b").expect("valid acronym regex"));

/// Jargon substrings that mark an all-caps string as a cockpit/status
/// message. Substring match on purpose: the corpus contains typos
/// ("JUAMMER OVERHEATED") that still carry the marker.
const CAPS_JARGON: &[&str] = &[
    "JAMMER", "OVERHEAT", "HEAT", "BUTTON", "POWER", "MASTER", "ARM", "XMIT", "LASER", "ECM",
    "CMS", "COMM", "WEPS", "TARGET",
];

/// Sentence punctuation that disqualifies the short-menu-label rule.
const SENTENCE_PUNCTUATION: &[char] = &['.', '!', '?', ':', ';', ','];

struct Candidate<'a> {
    text: &'a str,
    key: &'a str,
    words: usize,
    /// no lowercase letters anywhere (digits/punctuation ignored)
    all_caps: bool,
}

struct FilterRule {
    name: &'static str,
    fires: fn(&Candidate) -> bool,
}

static RULES: &[FilterRule] = &[
    FilterRule {
        name: "empty",
        fires: |c| c.text.is_empty(),
    },
    FilterRule {
        name: "numeric",
        fires: |c| NUMERIC_RE.is_match(c.text),
    },
    FilterRule {
        name: "caps-single-token",
        fires: |c| c.all_caps && c.words == 1,
    },
    FilterRule {
        name: "numbered-label",
        fires: |c| NUMBERED_LABEL_RE.is_match(c.text),
    },
    FilterRule {
        name: "caps-placeholder",
        fires: |c| c.all_caps && PLACEHOLDER_RE.is_match(c.text),
    },
    FilterRule {
        name: "caps-jargon",
        fires: |c| {
            c.all_caps && c.words <= 6 && CAPS_JARGON.iter().any(|j| c.text.contains(j))
        },
    },
    FilterRule {
        name: "avionics-acronym",
        fires: |c| c.words <= 5 && ACRONYM_RE.is_match(c.text),
    },
    FilterRule {
        name: "radio-menu-points",
        fires: |c| c.key.contains("ActionRadioText") && POINTS_RE.is_match(c.text),
    },
    FilterRule {
        name: "radio-menu-label",
        fires: |c| {
            c.key.contains("ActionRadioText")
                && c.words <= 4
                && !c.text.contains(SENTENCE_PUNCTUATION)
        },
    },
];

/// Returns true when `text` is a system message to be excluded from
/// translation. `key` is the originating dictionary key (empty when the
/// string came straight from the mission tree); some rules only apply to
/// particular key categories.
pub fn is_system_message(text: &str, key: &str) -> bool {
    let trimmed = text.trim();
    let candidate = Candidate {
        text: trimmed,
        key,
        words: trimmed.split_whitespace().count(),
        all_caps: !trimmed.chars().any(|c| c.is_lowercase()),
    };

    match RULES.iter().find(|r| (r.fires)(&candidate)) {
        Some(rule) => {
            log::debug!("filtered system message via rule `{}`: {:?}", rule.name, trimmed);
            true
        }
        None => false,
    }
}
