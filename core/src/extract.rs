//! Classification & extraction engine
//!
//! Walks a parsed mission tree plus the locale dictionaries and produces the
//! flat, categorized list of translatable strings. Three mission shapes are
//! supported (modern `triggers.triggers`, transitional `trig.actions`, legacy
//! `trigrules`); when none of them carries text the dictionary itself is the
//! source, which is the normal case for missions built after ~2020.
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter::is_system_message;
use crate::lua::{LuaTable, LuaValue};

/// Fixed briefing labels; these double as exchange-format keys.
pub const BRIEFING_FIELDS: &[(&str, &str)] = &[
    ("sortie", "Briefing_Mission"),
    ("descriptionText", "Briefing_Description"),
    ("descriptionBlueTask", "Briefing_Blue"),
    ("descriptionRedTask", "Briefing_Red"),
    ("descriptionNeutralsTask", "Briefing_Neutral"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Briefing,
    Trigger,
    Radio,
}

/// One translatable string. `context` is the sole write-back address: a
/// fixed briefing label or an original dictionary key, never a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub category: Category,
    pub context: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractMode {
    Auto,
    MissionOnly,
    DictionaryOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub mode: ExtractMode,
    /// Locale whose dictionary resolves DictKey references; `DEFAULT` is the
    /// authoritative source language.
    pub preferred_locale: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: ExtractMode::Auto,
            preferred_locale: "DEFAULT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub briefings: usize,
    pub triggers: usize,
    pub radio: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_strings: usize,
    pub unique_strings: usize,
    pub by_category: CategoryCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub locale: String,
    pub briefings: Vec<ExtractedItem>,
    pub triggers: Vec<ExtractedItem>,
    pub radio: Vec<ExtractedItem>,
    pub stats: ExtractionStats,
}

/// outText / outTextForCoalition / outTextForGroup call with its first
/// string-literal argument, optionally wrapped in getValueDictByKey (the
/// legacy indirection through the dictionary).
static OUT_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"outText(?:ForCoalition|ForGroup|ForUnit)?\s*\(\s*(?:-?\d+\s*,\s*)*(?:getValueDictByKey\s*\(\s*)?(?:"((?:\\.|[^"\\])*)"|'((?:\\.|[^'\\])*)')"#,
    )
    .expect("valid outText regex")
});

/// Any quoted DictKey reference inside an action script. Legacy scripts call
/// `a_out_text_delay(getValueDictByKey("DictKey_ActionText_123"), 10)` and
/// never spell out `outText`, so dictionary references are scanned on their
/// own.
static DICT_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["'](DictKey_\w+)["']"#).expect("valid dict key regex"));

/// Extract all translatable strings from a parsed archive.
pub fn extract_text(
    mission: &LuaTable,
    dictionaries: &HashMap<String, LuaTable>,
    options: &ExtractOptions,
) -> ExtractionResult {
    let dictionary = dictionaries.get(&options.preferred_locale);

    let briefings = extract_briefings(mission, dictionary);

    let mut triggers = Vec::new();
    let mut radio = Vec::new();

    if options.mode != ExtractMode::DictionaryOnly {
        extract_from_mission(mission, dictionary, &mut triggers, &mut radio);
    }

    // Dictionary fallback: modern archives keep trigger/radio text only in
    // the dictionary, with empty action lists in the mission tree.
    if triggers.is_empty() && radio.is_empty() && options.mode != ExtractMode::MissionOnly {
        if let Some(dict) = dictionary {
            extract_from_dictionary(dict, &mut triggers, &mut radio);
        }
    }

    dedup_by_context(&mut triggers);
    dedup_by_context(&mut radio);

    let stats = compute_stats(&briefings, &triggers, &radio);

    ExtractionResult {
        locale: options.preferred_locale.clone(),
        briefings,
        triggers,
        radio,
        stats,
    }
}

/// Mission briefing fields. A field holding a `DictKey_*` reference is
/// resolved through the dictionary; the item still carries the fixed label.
fn extract_briefings(mission: &LuaTable, dictionary: Option<&LuaTable>) -> Vec<ExtractedItem> {
    let mut items = Vec::new();

    for (field, label) in BRIEFING_FIELDS {
        let Some(raw) = mission.field_str(field) else {
            continue;
        };
        let text = match resolve_dict_ref(raw, dictionary) {
            Some(text) => text,
            None => continue,
        };
        if text.trim().is_empty() {
            continue;
        }
        items.push(ExtractedItem {
            category: Category::Briefing,
            context: (*label).to_string(),
            text,
        });
    }

    items
}

/// Resolve a possible DictKey reference. Literal text passes through; an
/// unresolvable reference yields nothing rather than leaking the key.
fn resolve_dict_ref(raw: &str, dictionary: Option<&LuaTable>) -> Option<String> {
    if !raw.starts_with("DictKey_") {
        return Some(raw.to_string());
    }
    dictionary
        .and_then(|d| d.field_str(raw))
        .map(|s| s.to_string())
}

fn extract_from_mission(
    mission: &LuaTable,
    dictionary: Option<&LuaTable>,
    triggers: &mut Vec<ExtractedItem>,
    radio: &mut Vec<ExtractedItem>,
) {
    // shape detectors in priority order; first non-empty shape wins
    let detectors: &[fn(&LuaTable) -> Option<Vec<String>>] = &[
        detect_modern_triggers,
        detect_trig_actions,
        detect_legacy_trigrules,
    ];
    let scripts = detectors.iter().find_map(|detect| detect(mission));
    let Some(scripts) = scripts else {
        return;
    };

    let mut trigger_seq = 0usize;
    let mut radio_seq = 0usize;

    let mut push = |category: Category, context: String, text: String| {
        if text.trim().is_empty() || is_system_message(&text, &context) {
            return;
        }
        let item = ExtractedItem {
            category,
            context,
            text,
        };
        match category {
            Category::Radio => radio.push(item),
            _ => triggers.push(item),
        }
    };

    for script in &scripts {
        let is_radio =
            script.contains("radioTransmission") || script.contains("a_radio_transmission");

        // dictionary references, legacy and modern call styles alike
        for caps in DICT_KEY_RE.captures_iter(script) {
            let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let Some(text) = resolve_dict_ref(key, dictionary) else {
                continue;
            };
            push(category_for_key(key, is_radio), key.to_string(), text);
        }

        // inline literal arguments: export-only, never matched at write-back
        for caps in OUT_TEXT_RE.captures_iter(script) {
            let raw = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if raw.starts_with("DictKey_") {
                continue;
            }
            let label = if is_radio {
                radio_seq += 1;
                format!("MissionRadio_{radio_seq}")
            } else {
                trigger_seq += 1;
                format!("MissionTrigger_{trigger_seq}")
            };
            let category = if is_radio {
                Category::Radio
            } else {
                Category::Trigger
            };
            push(category, label, unescape_script_literal(raw));
        }
    }
}

/// Classify a dictionary key; falls back to the surrounding script's radio
/// flag for keys outside the known categories.
fn category_for_key(key: &str, is_radio: bool) -> Category {
    if key.starts_with("DictKey_ActionRadioText_") || key.starts_with("DictKey_subtitle_") {
        Category::Radio
    } else if key.starts_with("DictKey_ActionText_") {
        Category::Trigger
    } else if is_radio {
        Category::Radio
    } else {
        Category::Trigger
    }
}

/// Modern shape: `mission.triggers.triggers[n].actions[*]`.
fn detect_modern_triggers(mission: &LuaTable) -> Option<Vec<String>> {
    let triggers = mission.field_table("triggers")?.field_table("triggers")?;
    let mut scripts = Vec::new();
    for entry in triggers.values() {
        if let Some(actions) = entry.as_table().and_then(|t| t.field_table("actions")) {
            collect_action_scripts(actions, &mut scripts);
        }
    }
    non_empty(scripts)
}

/// Transitional shape: `mission.trig.actions[*]`.
fn detect_trig_actions(mission: &LuaTable) -> Option<Vec<String>> {
    let actions = mission.field_table("trig")?.field_table("actions")?;
    let mut scripts = Vec::new();
    collect_action_scripts(actions, &mut scripts);
    non_empty(scripts)
}

/// Legacy shape: `mission.trigrules[n].actions[*]`, where each action is
/// either a script string or a table with a `text` field.
fn detect_legacy_trigrules(mission: &LuaTable) -> Option<Vec<String>> {
    let rules = mission.field_table("trigrules")?;
    let mut scripts = Vec::new();
    for rule in rules.values() {
        if let Some(actions) = rule.as_table().and_then(|t| t.field_table("actions")) {
            collect_action_scripts(actions, &mut scripts);
        }
    }
    non_empty(scripts)
}

fn collect_action_scripts(actions: &LuaTable, out: &mut Vec<String>) {
    for action in actions.values() {
        match action {
            LuaValue::Str(s) => out.push(s.clone()),
            LuaValue::Table(t) => {
                if let Some(s) = t.field_str("text") {
                    out.push(s.to_string());
                }
            }
            _ => {}
        }
    }
}

fn non_empty(scripts: Vec<String>) -> Option<Vec<String>> {
    if scripts.is_empty() {
        None
    } else {
        Some(scripts)
    }
}

/// Dictionary fallback: classify straight off the key prefix, with the
/// exact dictionary key as context.
fn extract_from_dictionary(
    dict: &LuaTable,
    triggers: &mut Vec<ExtractedItem>,
    radio: &mut Vec<ExtractedItem>,
) {
    for (key, value) in dict.iter() {
        let crate::lua::LuaKey::Str(key) = key else {
            continue;
        };
        let Some(text) = value.as_str() else {
            continue;
        };

        let category = if key.starts_with("DictKey_ActionText_") {
            Category::Trigger
        } else if key.starts_with("DictKey_ActionRadioText_") || key.starts_with("DictKey_subtitle_")
        {
            Category::Radio
        } else {
            continue;
        };

        if text.trim().is_empty() || is_system_message(text, key) {
            continue;
        }

        let item = ExtractedItem {
            category,
            context: key.clone(),
            text: text.to_string(),
        };
        match category {
            Category::Trigger => triggers.push(item),
            Category::Radio => radio.push(item),
            Category::Briefing => unreachable!(),
        }
    }
}

fn dedup_by_context(items: &mut Vec<ExtractedItem>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.context.clone()));
}

fn compute_stats(
    briefings: &[ExtractedItem],
    triggers: &[ExtractedItem],
    radio: &[ExtractedItem],
) -> ExtractionStats {
    let by_category = CategoryCounts {
        briefings: briefings.len(),
        triggers: triggers.len(),
        radio: radio.len(),
    };
    let unique_strings = briefings
        .iter()
        .chain(triggers)
        .chain(radio)
        .map(|i| i.text.as_str())
        .collect::<HashSet<_>>()
        .len();

    ExtractionStats {
        total_strings: by_category.briefings + by_category.triggers + by_category.radio,
        unique_strings,
        by_category,
    }
}

/// Undo Lua string escaping in a captured script literal.
fn unescape_script_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::parse_document;

    fn parse_mission(text: &str) -> LuaTable {
        parse_document(text).expect("mission parses").1
    }

    fn dicts(entries: &[(&str, &str)]) -> HashMap<String, LuaTable> {
        let mut dict = LuaTable::new();
        for (k, v) in entries {
            dict.insert(
                crate::lua::LuaKey::str(*k),
                LuaValue::Str((*v).to_string()),
            );
        }
        HashMap::from([("DEFAULT".to_string(), dict)])
    }

    const MODERN_MISSION: &str = r#"mission =
{
    ["sortie"] = "Modern DCS Mission 2025",
    ["descriptionText"] = "This mission uses the modern format",
    ["descriptionBlueTask"] = "Test modern trigger and radio extraction",
    ["triggers"] =
    {
        ["zones"] = {},
        ["triggers"] =
        {
            [1] =
            {
                ["actions"] =
                {
                    [1] = 'trigger.action.outText("Welcome to modern DCS mission! Press F10 for radio menu.", 15)',
                },
            },
            [2] =
            {
                ["actions"] =
                {
                    [1] = 'trigger.action.radioTransmission("l10n/DEFAULT/radio1.ogg", pos, 251000000, true, 30000, true); trigger.action.outTextForCoalition(1, "Tower: Flight 123, you are cleared for takeoff runway 24.", 10)',
                },
            },
            [3] =
            {
                ["actions"] =
                {
                    [1] = 'trigger.action.outTextForGroup(10, "Group Leader: Form up on me, maintain heading 270.", 15)',
                },
            },
            [4] =
            {
                ["actions"] =
                {
                    [1] = 'trigger.action.outTextForCoalition(2, "Excellent work! All objectives completed. RTB.", 20)',
                },
            },
        },
    },
}
"#;

    #[test]
    fn test_briefings_extracted_with_fixed_labels() {
        let mission = parse_mission(MODERN_MISSION);
        let result = extract_text(&mission, &HashMap::new(), &ExtractOptions::default());

        let contexts: Vec<_> = result.briefings.iter().map(|i| i.context.as_str()).collect();
        assert_eq!(
            contexts,
            vec!["Briefing_Mission", "Briefing_Description", "Briefing_Blue"]
        );
        assert_eq!(result.briefings[0].text, "Modern DCS Mission 2025");
    }

    #[test]
    fn test_modern_format_extraction() {
        let mission = parse_mission(MODERN_MISSION);
        let result = extract_text(&mission, &HashMap::new(), &ExtractOptions::default());

        assert_eq!(result.stats.by_category.triggers, 3);
        assert_eq!(result.stats.by_category.radio, 1);
        assert!(result
            .triggers
            .iter()
            .any(|i| i.text.starts_with("Welcome to modern DCS mission")));
        assert!(result
            .radio
            .iter()
            .any(|i| i.text.starts_with("Tower: Flight 123")));
        // "Group Leader: ..." rides a plain outTextForGroup, so it is a trigger
        assert!(result
            .triggers
            .iter()
            .any(|i| i.context.starts_with("MissionTrigger_")));
    }

    #[test]
    fn test_trig_actions_shape() {
        let mission = parse_mission(
            r#"mission =
{
    ["sortie"] = "Alternative Modern Format",
    ["trig"] =
    {
        ["actions"] =
        {
            [1] = 'trigger.action.outText("Mission started. All pilots check in.", 10)',
            [2] = 'trigger.action.radioTransmission("l10n/DEFAULT/awacs.ogg", pos, 251000000, true); trigger.action.outText("AWACS: All aircraft, this is Magic. Picture clean.", 15)',
        },
        ["func"] = "some_compressed_lua_code_here",
    },
}
"#,
        );
        let result = extract_text(&mission, &HashMap::new(), &ExtractOptions::default());
        assert_eq!(result.stats.by_category.triggers, 1);
        assert_eq!(result.stats.by_category.radio, 1);
    }

    #[test]
    fn test_legacy_trigrules_resolves_dict_keys() {
        let mission = parse_mission(
            r#"mission =
{
    ["trigrules"] =
    {
        [1] =
        {
            ["actions"] =
            {
                [1] =
                {
                    ["text"] = 'a_out_text_delay(getValueDictByKey("DictKey_ActionText_123"), 10)',
                },
            },
        },
    },
}
"#,
        );
        let dictionaries = dicts(&[("DictKey_ActionText_123", "Enemy SAM site detected.")]);
        let result = extract_text(&mission, &dictionaries, &ExtractOptions::default());

        assert_eq!(result.triggers.len(), 1);
        assert_eq!(result.triggers[0].context, "DictKey_ActionText_123");
        assert_eq!(result.triggers[0].text, "Enemy SAM site detected.");
    }

    #[test]
    fn test_dictionary_fallback_when_mission_empty() {
        let mission = parse_mission(
            r#"mission =
{
    ["sortie"] = "DictKey_sortie_1",
    ["triggers"] = { ["triggers"] = {} },
    ["trigrules"] = {},
    ["trig"] = { ["actions"] = {} },
}
"#,
        );
        let dictionaries = dicts(&[
            ("DictKey_sortie_1", "Operation Desert Storm 2025"),
            ("DictKey_ActionText_001", "Mission started. All pilots check in."),
            ("DictKey_ActionText_002", "Enemy SAM site detected at grid 1234-5678"),
            ("DictKey_subtitle_001", "Tower: Flight 123, you are cleared for takeoff runway 24."),
            ("DictKey_ActionRadioText_001", "Tower: Wind is 240 at 15 knots, cleared to land."),
            ("DictKey_UnitName_1", "Viper 1-1"),
        ]);
        let result = extract_text(&mission, &dictionaries, &ExtractOptions::default());

        // briefing resolved through the dictionary reference
        assert_eq!(result.briefings[0].context, "Briefing_Mission");
        assert_eq!(result.briefings[0].text, "Operation Desert Storm 2025");

        assert_eq!(result.stats.by_category.triggers, 2);
        assert_eq!(result.stats.by_category.radio, 2);
        // contexts are the original dictionary keys
        assert!(result
            .triggers
            .iter()
            .all(|i| i.context.starts_with("DictKey_ActionText_")));
        // untouched categories never surface
        assert!(!result
            .triggers
            .iter()
            .chain(&result.radio)
            .any(|i| i.context.contains("UnitName")));
    }

    #[test]
    fn test_modern_format_parity_with_dictionary_only() {
        let mission = parse_mission(MODERN_MISSION);
        let from_mission = extract_text(&mission, &HashMap::new(), &ExtractOptions::default());

        let empty_mission = parse_mission(r#"mission = { ["trig"] = { ["actions"] = {} } }"#);
        let dictionaries = dicts(&[
            (
                "DictKey_ActionText_1",
                "Welcome to modern DCS mission! Press F10 for radio menu.",
            ),
            (
                "DictKey_ActionText_2",
                "Group Leader: Form up on me, maintain heading 270.",
            ),
            (
                "DictKey_ActionText_3",
                "Excellent work! All objectives completed. RTB.",
            ),
            (
                "DictKey_subtitle_1",
                "Tower: Flight 123, you are cleared for takeoff runway 24.",
            ),
        ]);
        let from_dict = extract_text(&empty_mission, &dictionaries, &ExtractOptions::default());

        let texts = |r: &ExtractionResult| {
            let mut v: Vec<String> = r
                .triggers
                .iter()
                .chain(&r.radio)
                .map(|i| i.text.clone())
                .collect();
            v.sort();
            v
        };
        assert_eq!(texts(&from_mission), texts(&from_dict));
    }

    #[test]
    fn test_mission_only_mode_skips_fallback() {
        let mission = parse_mission(r#"mission = { ["trig"] = { ["actions"] = {} } }"#);
        let dictionaries = dicts(&[("DictKey_ActionText_001", "Mission started, check in.")]);
        let options = ExtractOptions {
            mode: ExtractMode::MissionOnly,
            ..Default::default()
        };
        let result = extract_text(&mission, &dictionaries, &options);
        assert!(result.triggers.is_empty());
        assert!(result.radio.is_empty());
    }

    #[test]
    fn test_system_messages_filtered_from_dictionary() {
        let mission = parse_mission(r#"mission = {}"#);
        let dictionaries = dicts(&[
            ("DictKey_ActionText_1", "JAMMER COOLING 11 MINUTE"),
            ("DictKey_ActionText_2", "100"),
            ("DictKey_ActionText_3", "Proceed to the rally point at waypoint 5."),
            ("DictKey_ActionRadioText_4", "Request Takeoff"),
        ]);
        let result = extract_text(&mission, &dictionaries, &ExtractOptions::default());
        assert_eq!(result.triggers.len(), 1);
        assert_eq!(
            result.triggers[0].text,
            "Proceed to the rally point at waypoint 5."
        );
        assert!(result.radio.is_empty());
    }

    #[test]
    fn test_duplicate_contexts_merged() {
        let mission = parse_mission(
            r#"mission =
{
    ["trig"] =
    {
        ["actions"] =
        {
            [1] = 'trigger.action.outText(getValueDictByKey("DictKey_ActionText_9"), 10)',
            [2] = 'trigger.action.outText(getValueDictByKey("DictKey_ActionText_9"), 10)',
        },
    },
}
"#,
        );
        let dictionaries = dicts(&[("DictKey_ActionText_9", "Mission complete. Please exit when ready.")]);
        let result = extract_text(&mission, &dictionaries, &ExtractOptions::default());
        assert_eq!(result.triggers.len(), 1);
    }

    #[test]
    fn test_result_serializes_for_frontends() {
        let mission = parse_mission(MODERN_MISSION);
        let result = extract_text(&mission, &HashMap::new(), &ExtractOptions::default());
        let json = serde_json::to_value(&result).expect("result serializes");

        assert_eq!(json["locale"], "DEFAULT");
        assert_eq!(json["briefings"][0]["category"], "briefing");
        assert_eq!(json["briefings"][0]["context"], "Briefing_Mission");
        assert_eq!(json["stats"]["by_category"]["radio"], 1);

        let options: ExtractOptions =
            serde_json::from_str(r#"{"mode":"dictionary-only","preferred_locale":"RU"}"#)
                .expect("options deserialize");
        assert_eq!(options.mode, ExtractMode::DictionaryOnly);
    }

    #[test]
    fn test_stats_counts() {
        let mission = parse_mission(MODERN_MISSION);
        let result = extract_text(&mission, &HashMap::new(), &ExtractOptions::default());
        assert_eq!(result.stats.total_strings, 3 + 3 + 1);
        assert_eq!(result.stats.unique_strings, 7);
    }
}
