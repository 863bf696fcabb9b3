//! Legacy JSON configuration (`~/.aider-start/config.json`).
//!
//! Holds profiles, providers and custom endpoints. A corrupt file is moved
//! aside and the last good copy restored; with neither available the store
//! starts empty.

pub mod quick;
pub mod validate;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env_var: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    /// Older files stored keys inline. Read for migration, never written.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl ProviderRecord {
    pub fn new(api_url: &str, models: &[&str], description: &str) -> Self {
        ProviderRecord {
            description: description.to_string(),
            api_url: api_url.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

/// A legacy profile: backend references plus free-form aider parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default)]
    pub profiles: BTreeMap<String, LegacyProfile>,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderRecord>,
    #[serde(default)]
    pub custom_endpoints: BTreeMap<String, EndpointRecord>,
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct ConfigStore {
    path: PathBuf,
    data: ConfigData,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_config(path: &Path) -> Result<ConfigData> {
    let raw = fs::read_to_string(path).map_err(|e| AppError::file_access(path, e))?;
    serde_json::from_str(&raw).map_err(|source| AppError::JsonParse { path: path.to_path_buf(), source })
}

impl ConfigStore {
    /// Loads `path`, falling back to `.lastgood`, then to an empty config.
    pub fn load(path: &Path) -> Self {
        let data = Self::load_with_fallback(path);
        ConfigStore { path: path.to_path_buf(), data }
    }

    fn load_with_fallback(path: &Path) -> ConfigData {
        if path.exists() {
            match read_config(path) {
                Ok(data) => return data,
                Err(e) => {
                    tracing::warn!(error = %e, "Config unreadable, moving it aside");
                    let backup = with_suffix(path, ".bak");
                    if let Err(e) = fs::rename(path, &backup) {
                        tracing::warn!(error = %e, "Could not move bad config to {}", backup.display());
                    }
                }
            }
        }

        let last_good = with_suffix(path, ".lastgood");
        if last_good.exists() {
            match read_config(&last_good) {
                Ok(data) => {
                    tracing::info!("Restored config from {}", last_good.display());
                    if let Err(e) = fs::copy(&last_good, path) {
                        tracing::warn!(error = %e, "Could not restore {}", path.display());
                    }
                    return data;
                }
                Err(e) => tracing::warn!(error = %e, "Last good config unusable"),
            }
        }

        tracing::info!("Using default configuration");
        ConfigData::default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ConfigData {
        &mut self.data
    }

    /// Writes the config. The previous file is kept as `.prev` until the new
    /// one is written, and a successful write refreshes `.lastgood`.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::file_access(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        let prev = with_suffix(&self.path, ".prev");
        let had_previous = self.path.exists();
        if had_previous {
            fs::rename(&self.path, &prev).map_err(|e| AppError::file_access(&self.path, e))?;
        }

        if let Err(e) = fs::write(&self.path, json) {
            if had_previous {
                let _ = fs::rename(&prev, &self.path);
            }
            return Err(AppError::file_access(&self.path, e));
        }

        let last_good = with_suffix(&self.path, ".lastgood");
        if let Err(e) = fs::copy(&self.path, &last_good) {
            tracing::warn!(error = %e, "Could not refresh {}", last_good.display());
        }
        if had_previous {
            let _ = fs::remove_file(&prev);
        }
        tracing::debug!(path = %self.path.display(), "Saved config");
        Ok(())
    }

    // ── Profiles ──────────────────────────────────────────────────────────────

    pub fn profiles(&self) -> &BTreeMap<String, LegacyProfile> {
        &self.data.profiles
    }

    pub fn profile(&self, name: &str) -> Result<&LegacyProfile> {
        self.data
            .profiles
            .get(name)
            .ok_or_else(|| AppError::ProfileNotFound(name.to_string()))
    }

    pub fn add_profile(&mut self, name: &str, profile: LegacyProfile) -> Result<()> {
        validate::validate_name("profile", name)?;
        self.data.profiles.insert(name.to_string(), profile);
        self.save()
    }

    pub fn delete_profile(&mut self, name: &str) -> Result<()> {
        if self.data.profiles.remove(name).is_none() {
            return Err(AppError::ProfileNotFound(name.to_string()));
        }
        self.save()
    }
}
