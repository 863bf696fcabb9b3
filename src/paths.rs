use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "aider-start";
pub const DB_FILE: &str = "aider_start.db";
pub const LOG_FILE: &str = "aider-start.log";

/// Overrides the data directory (database, per-preset config files, logs).
pub const HOME_ENV: &str = "AIDER_START_HOME";
/// Overrides the legacy JSON directory (`~/.aider-start`).
pub const LEGACY_DIR_ENV: &str = "AIDER_START_LEGACY_DIR";

// ── Locations ─────────────────────────────────────────────────────────────────

/// All on-disk locations the tool reads or writes.
#[derive(Clone, Debug, PartialEq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub legacy_dir: PathBuf,
}

impl AppPaths {
    /// Resolves paths from the environment and OS conventions.
    pub fn resolve() -> Self {
        let data_dir = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let legacy_dir = std::env::var_os(LEGACY_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_legacy_dir);
        Self::with_dirs(data_dir, legacy_dir)
    }

    pub fn with_dirs(data_dir: impl Into<PathBuf>, legacy_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        AppPaths {
            db_path: data_dir.join(DB_FILE),
            data_dir,
            legacy_dir: legacy_dir.into(),
        }
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Root for generated `*.model.settings.yml` / `*.model.metadata.json` files.
    pub fn presets_config_dir(&self) -> PathBuf {
        self.data_dir.join("presets_config")
    }

    pub fn preset_config_dir(&self, preset_id: i64) -> PathBuf {
        self.presets_config_dir().join(preset_id.to_string())
    }

    pub fn legacy_config_file(&self) -> PathBuf {
        self.legacy_dir.join("config.json")
    }

    pub fn quick_presets_file(&self) -> PathBuf {
        self.legacy_dir.join("presets.json")
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `~/.config/aider-start` on Linux, `~/Library/Application Support/aider-start`
/// on macOS, `~/AppData/Local/aider-start` on Windows.
pub fn default_data_dir() -> PathBuf {
    data_dir_under(&home())
}

fn data_dir_under(home: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        home.join("Library").join("Application Support").join(APP_NAME)
    } else if cfg!(windows) {
        home.join("AppData").join("Local").join(APP_NAME)
    } else {
        home.join(".config").join(APP_NAME)
    }
}

pub fn default_legacy_dir() -> PathBuf {
    home().join(".aider-start")
}

/// Filesystem-safe form of a model name, e.g. `openai/gpt-4o` -> `openai_gpt-4o`.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}
