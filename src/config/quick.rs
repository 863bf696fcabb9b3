use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// `presets.json`: preset name -> complete command line.
pub struct QuickPresets {
    path: PathBuf,
    presets: BTreeMap<String, String>,
}

impl QuickPresets {
    /// A missing file is an empty set; an unreadable one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let presets = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|e| AppError::file_access(path, e))?;
            serde_json::from_str(&raw)
                .map_err(|source| AppError::JsonParse { path: path.to_path_buf(), source })?
        } else {
            BTreeMap::new()
        };
        Ok(QuickPresets { path: path.to_path_buf(), presets })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::file_access(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.presets)?;
        fs::write(&self.path, json).map_err(|e| AppError::file_access(&self.path, e))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.presets.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, command: &str) {
        self.presets.insert(name.to_string(), command.to_string());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.presets.remove(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.presets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Splits a stored command into argv with shell rules.
    pub fn argv(&self, name: &str) -> Result<Vec<String>> {
        let command = self
            .get(name)
            .ok_or_else(|| AppError::ProfileNotFound(name.to_string()))?;
        let argv = shell_words::split(command)
            .map_err(|e| AppError::CommandBuild(format!("cannot parse '{command}': {e}")))?;
        if argv.is_empty() {
            return Err(AppError::CommandBuild(format!("quick preset '{name}' is empty")));
        }
        Ok(argv)
    }
}
