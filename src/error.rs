use std::path::PathBuf;

/// Crate-wide error type. Library functions return `Result<T, AppError>`;
/// the binary and the TUI loop wrap it in `anyhow` with context.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("A preset named '{0}' already exists")]
    PresetExists(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not build command: {0}")]
    CommandBuild(String),

    #[error("Could not run command: {0}")]
    CommandExecution(String),

    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::FileAccess { path: path.into(), source }
    }

    /// True for errors the user can fix by changing their input.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::PresetExists(_))
    }
}

impl From<keyring::Error> for AppError {
    fn from(e: keyring::Error) -> Self {
        AppError::Keyring(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
