//! Per-model advanced settings: the YAML settings and JSON metadata files
//! aider reads through `--model-settings-file` / `--model-metadata-file`.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::validate::is_valid_file_path;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::paths::sanitize_file_stem;

/// What the model editor submits.
#[derive(Clone, Debug, Default)]
pub struct ModelConfigInput {
    pub model_name: String,
    pub settings_yaml: String,
    pub settings_path: String,
    pub metadata_json: String,
    pub metadata_path: String,
}

/// JSON stored in the database plus the file aider will be pointed at.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedEntry {
    pub json: String,
    pub path: String,
}

pub fn settings_file_name(model: &str) -> String {
    format!("{}.model.settings.yml", sanitize_file_stem(model))
}

pub fn metadata_file_name(model: &str) -> String {
    format!("{}.model.metadata.json", sanitize_file_stem(model))
}

fn optional_path(raw: &str) -> Result<Option<PathBuf>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if !is_valid_file_path(raw) {
        return Err(AppError::Validation(format!("invalid file path '{raw}'")));
    }
    Ok(Some(PathBuf::from(raw)))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::file_access(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| AppError::file_access(path, e))?;
    tracing::info!(path = %path.display(), "Wrote model config file");
    Ok(())
}

// ── Settings (YAML) ───────────────────────────────────────────────────────────

/// Parses editor text into a settings mapping.
pub fn parse_settings_yaml(text: &str) -> Result<Map<String, Value>> {
    match serde_yaml::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Validation("settings YAML must be a mapping".into())),
    }
}

/// aider's settings file is a list of entries keyed by `name`.
fn settings_file_contents(model: &str, settings: &Map<String, Value>) -> Result<String> {
    let mut entry = Map::new();
    entry.insert("name".into(), Value::String(model.to_string()));
    for (k, v) in settings {
        if k != "name" {
            entry.insert(k.clone(), v.clone());
        }
    }
    Ok(serde_yaml::to_string(&vec![Value::Object(entry)])?)
}

/// Reads settings for `model` back from a file in either aider's list form
/// or as a bare mapping.
fn settings_from_file(path: &Path, model: &str) -> Result<Map<String, Value>> {
    let raw = fs::read_to_string(path).map_err(|e| AppError::file_access(path, e))?;
    let parsed: Value = serde_yaml::from_str(&raw)?;
    let found = match parsed {
        Value::Object(map) => Some(map),
        Value::Array(items) => {
            let all: Vec<Map<String, Value>> = items
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            all.iter()
                .find(|m| m.get("name").and_then(Value::as_str) == Some(model))
                .or_else(|| all.first())
                .cloned()
        }
        _ => None,
    };
    let mut settings = found
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation(format!("no usable settings in {}", path.display())))?;
    settings.remove("name");
    Ok(settings)
}

/// Settings for one model.
///
/// Text given: parse it, write it to `path` (or `default_dir`) and return
/// both. Only a path given: load the file. Neither: `None`.
pub fn process_settings(
    model: &str,
    text: &str,
    path: &str,
    default_dir: &Path,
) -> Result<Option<ProcessedEntry>> {
    let path = optional_path(path)?;
    if !text.trim().is_empty() {
        let settings = parse_settings_yaml(text)?;
        let path = path.unwrap_or_else(|| default_dir.join(settings_file_name(model)));
        write_file(&path, &settings_file_contents(model, &settings)?)?;
        return Ok(Some(ProcessedEntry {
            json: serde_json::to_string(&settings)?,
            path: path.display().to_string(),
        }));
    }
    match path {
        Some(path) => {
            let settings = settings_from_file(&path, model)?;
            Ok(Some(ProcessedEntry {
                json: serde_json::to_string(&settings)?,
                path: path.display().to_string(),
            }))
        }
        None => Ok(None),
    }
}

/// Stored settings JSON rendered back as editable YAML.
pub fn settings_json_to_yaml(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Object(ref map) if map.is_empty() => Ok(String::new()),
        other => Ok(serde_yaml::to_string(&other)?),
    }
}

// ── Metadata (JSON) ───────────────────────────────────────────────────────────

pub fn parse_metadata_json(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Validation("metadata JSON must be an object".into())),
    }
}

/// aider's metadata file maps model name -> metadata.
fn metadata_file_contents(model: &str, metadata: &Map<String, Value>) -> Result<String> {
    let mut wrapper = Map::new();
    wrapper.insert(model.to_string(), Value::Object(metadata.clone()));
    Ok(serde_json::to_string_pretty(&Value::Object(wrapper))?)
}

fn metadata_from_file(path: &Path, model: &str) -> Result<Map<String, Value>> {
    let raw = fs::read_to_string(path).map_err(|e| AppError::file_access(path, e))?;
    let mut map = parse_metadata_json(&raw).map_err(|e| match e {
        AppError::Serde(source) => AppError::JsonParse { path: path.to_path_buf(), source },
        other => other,
    })?;
    if let Some(Value::Object(inner)) = map.remove(model) {
        return Ok(inner);
    }
    if map.is_empty() {
        return Err(AppError::Validation(format!("no usable metadata in {}", path.display())));
    }
    Ok(map)
}

/// Same contract as [`process_settings`], for metadata.
pub fn process_metadata(
    model: &str,
    text: &str,
    path: &str,
    default_dir: &Path,
) -> Result<Option<ProcessedEntry>> {
    let path = optional_path(path)?;
    if !text.trim().is_empty() {
        let metadata = parse_metadata_json(text)?;
        let path = path.unwrap_or_else(|| default_dir.join(metadata_file_name(model)));
        write_file(&path, &metadata_file_contents(model, &metadata)?)?;
        return Ok(Some(ProcessedEntry {
            json: serde_json::to_string(&metadata)?,
            path: path.display().to_string(),
        }));
    }
    match path {
        Some(path) => {
            let metadata = metadata_from_file(&path, model)?;
            Ok(Some(ProcessedEntry {
                json: serde_json::to_string(&metadata)?,
                path: path.display().to_string(),
            }))
        }
        None => Ok(None),
    }
}

pub fn pretty_json(json: &str) -> String {
    serde_json::from_str::<Value>(json)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| json.to_string())
}

// ── Saving ────────────────────────────────────────────────────────────────────

/// Processes editor input for one model and stores the result. An entry
/// left blank is removed. Returns what was stored.
pub fn save_model_config(
    db: &Database,
    preset_id: i64,
    input: &ModelConfigInput,
    preset_dir: &Path,
) -> Result<(Option<ProcessedEntry>, Option<ProcessedEntry>)> {
    let model = input.model_name.trim();
    if model.is_empty() {
        return Err(AppError::Validation("model name cannot be empty".into()));
    }
    let settings = process_settings(model, &input.settings_yaml, &input.settings_path, preset_dir)?;
    let metadata = process_metadata(model, &input.metadata_json, &input.metadata_path, preset_dir)?;
    if settings.is_none() && metadata.is_none() {
        return Err(AppError::Validation(
            "enter settings or metadata (or a file path to load them from)".into(),
        ));
    }

    match &settings {
        Some(entry) => db.upsert_model_settings(Some(preset_id), Some(model), &entry.json, Some(&entry.path))?,
        None => {
            db.delete_model_settings(Some(preset_id), Some(model))?;
        }
    }
    match &metadata {
        Some(entry) => db.upsert_model_metadata(preset_id, model, &entry.json, Some(&entry.path))?,
        None => {
            db.delete_model_metadata(preset_id, model)?;
        }
    }
    Ok((settings, metadata))
}
