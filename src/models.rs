use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Flag name -> optional value. Names are unique and iterate in order.
pub type FlagMap = BTreeMap<String, Option<String>>;

/// Format SQLite's `CURRENT_TIMESTAMP` produces.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

// ── Presets ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// `None` until the preset has been saved.
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub flags: FlagMap,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Preset { name: name.into(), ..Default::default() }
    }

    pub fn with_flag(mut self, name: &str, value: Option<&str>) -> Self {
        self.set_flag(name, value);
        self
    }

    pub fn set_flag(&mut self, name: &str, value: Option<&str>) {
        self.flags.insert(normalize_flag_name(name), value.map(str::to_string));
    }

    pub fn remove_flag(&mut self, name: &str) -> bool {
        self.flags.remove(&normalize_flag_name(name)).is_some()
    }

    /// Value of a flag if it is present and non-empty.
    pub fn flag_value(&self, name: &str) -> Option<&str> {
        self.flags
            .get(name)
            .and_then(|v| v.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// The primary model (`--model`), if one is set.
    pub fn model(&self) -> Option<&str> {
        self.flag_value("model")
    }
}

/// Row shown in the preset list.
#[derive(Clone, Debug, PartialEq)]
pub struct PresetSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub flag_count: usize,
    pub updated_at: Option<NaiveDateTime>,
}

/// Flag names are stored without leading dashes and with `-` as the word
/// separator, so `--auto_commits` and `auto-commits` are the same flag.
pub fn normalize_flag_name(name: &str) -> String {
    name.trim().trim_start_matches('-').replace('_', "-")
}

// ── Flag metadata ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Boolean,
    /// A boolean the user must set explicitly to true or false.
    BooleanExplicit,
    Integer,
    Float,
    Path,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::BooleanExplicit => "boolean_explicit",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Path => "path",
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ValueType::Boolean | ValueType::BooleanExplicit)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "" => Ok(ValueType::String),
            "boolean" | "bool" => Ok(ValueType::Boolean),
            "boolean_explicit" => Ok(ValueType::BooleanExplicit),
            "integer" | "int" => Ok(ValueType::Integer),
            "float" | "number" => Ok(ValueType::Float),
            "path" | "file" => Ok(ValueType::Path),
            other => Err(AppError::Validation(format!("unknown value type '{other}'"))),
        }
    }
}

/// Parses the boolean spellings the flag editor accepts.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlagMetadata {
    pub name: String,
    pub description: String,
    pub category: String,
    pub value_type: ValueType,
    pub default_value: Option<String>,
    pub requires_value: bool,
    pub is_deprecated: bool,
    pub wizard_visible: bool,
}

// ── Advanced model settings ───────────────────────────────────────────────────

/// One `model_settings` or `model_metadata` row.
#[derive(Clone, Debug, PartialEq)]
pub struct AdvancedEntry {
    pub preset_id: Option<i64>,
    pub model_name: Option<String>,
    pub json: String,
    pub file_path: Option<String>,
}

impl AdvancedEntry {
    pub fn value(&self) -> serde_json::Value {
        serde_json::from_str(&self.json).unwrap_or(serde_json::Value::Null)
    }
}

/// All settings and metadata stored for one preset, keyed by model name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdvancedSettings {
    pub settings: BTreeMap<String, AdvancedEntry>,
    pub metadata: BTreeMap<String, AdvancedEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ManagedModel {
    pub name: String,
    pub settings_path: Option<String>,
    pub metadata_path: Option<String>,
    pub has_settings: bool,
    pub has_metadata: bool,
}

impl AdvancedSettings {
    /// Models with settings or metadata, sorted by name.
    pub fn models(&self) -> Vec<ManagedModel> {
        let mut names: Vec<&String> = self.settings.keys().chain(self.metadata.keys()).collect();
        names.sort();
        names.dedup();
        names
            .into_iter()
            .map(|name| {
                let settings = self.settings.get(name);
                let metadata = self.metadata.get(name);
                ManagedModel {
                    name: name.clone(),
                    settings_path: settings.and_then(|s| s.file_path.clone()),
                    metadata_path: metadata.and_then(|m| m.file_path.clone()),
                    has_settings: settings.is_some(),
                    has_metadata: metadata.is_some(),
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty() && self.metadata.is_empty()
    }
}

// ── Settings templates ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct SettingsTemplate {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub settings_json: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}
