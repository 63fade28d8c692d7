//! Board settings carried in the frontmatter block.
//!
//! The raw frontmatter text stays the source of truth for serialization.
//! Settings are the subset of `key: value` lines we can interpret: a key from
//! [`RECOGNIZED_KEYS`] with a scalar value. Anything else (lists, nested
//! maps, unknown keys) only survives through the raw capture.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const FRONTMATTER_KEY: &str = "kanban-plugin";

pub const RECOGNIZED_KEYS: &[&str] = &[
    "kanban-plugin",
    "date-format",
    "date-display-format",
    "time-format",
    "date-trigger",
    "time-trigger",
    "new-line-trigger",
    "new-card-insertion-method",
    "show-checkboxes",
    "show-relative-date",
    "archive-date-format",
    "archive-date-separator",
    "max-archive-size",
    "show-add-list",
    "show-archive-all",
    "show-view-as-markdown",
    "show-board-settings",
    "show-search",
    "show-set-view",
    "lane-width",
    "list-collapse",
    "inline-metadata-position",
    "move-dates",
    "move-tags",
    "move-task-metadata",
    "link-date-to-daily-note",
    "tag-action",
    "new-note-folder",
    "new-note-template",
    "table-sizing",
];

pub fn is_recognized(key: &str) -> bool {
    RECOGNIZED_KEYS.contains(&key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl SettingValue {
    /// Interpret a scalar frontmatter value. Returns `None` for values that
    /// open a nested structure.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('[') || raw.starts_with('{') {
            return None;
        }
        match raw {
            "true" => return Some(Self::Bool(true)),
            "false" => return Some(Self::Bool(false)),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Some(Self::Number(n));
        }
        Some(Self::Text(unquote(raw).to_string()))
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Recognized settings, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, SettingValue>);

impl Settings {
    /// Settings written into a freshly created board.
    pub fn defaults() -> Self {
        let mut settings = Self::default();
        settings.insert(FRONTMATTER_KEY, SettingValue::Text("board".into()));
        settings.insert("date-format", SettingValue::Text("YYYY-MM-DD".into()));
        settings
    }

    /// Extract recognized scalar settings from a raw frontmatter block.
    pub fn from_frontmatter(raw: &str) -> Self {
        let mut settings = Self::default();
        for line in raw.lines() {
            let line = line.trim();
            if line == "---" || line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if !is_recognized(key) {
                continue;
            }
            if let Some(value) = SettingValue::parse(value) {
                settings.insert(key, value);
            }
        }
        settings
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: SettingValue) {
        self.0.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys that are not in [`RECOGNIZED_KEYS`].
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|k| !is_recognized(k))
            .collect()
    }

    /// Whether the document declares itself a kanban board.
    pub fn is_board(&self) -> bool {
        self.get(FRONTMATTER_KEY).is_some()
    }
}
