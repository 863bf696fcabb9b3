use std::path::PathBuf;
use std::process::Command;

use super::CommandLine;
use crate::error::{AppError, Result};
use crate::models::Preset;
use crate::providers::ProviderManager;

/// How the assembled command is started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchMode {
    /// Replace this process with aider (Unix only; falls back to `Spawn`).
    Exec,
    /// Run aider as a child and wait for it.
    Spawn,
}

impl Default for LaunchMode {
    fn default() -> Self {
        if cfg!(unix) {
            LaunchMode::Exec
        } else {
            LaunchMode::Spawn
        }
    }
}

pub struct Executor {
    mode: LaunchMode,
}

impl Executor {
    pub fn new(mode: LaunchMode) -> Self {
        Executor { mode }
    }

    /// Location of `program` on `PATH`, if installed.
    pub fn locate(program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    pub fn is_installed(program: &str) -> bool {
        Self::locate(program).is_some()
    }

    /// API keys aider needs, read from the credential store. Missing keys
    /// are logged and skipped.
    pub fn prepare_env(
        &self,
        preset: &Preset,
        providers: &ProviderManager,
    ) -> Vec<(String, String)> {
        self.backend_env(preset.provider.as_deref(), preset.endpoint.as_deref(), providers)
    }

    pub fn backend_env(
        &self,
        provider: Option<&str>,
        endpoint: Option<&str>,
        providers: &ProviderManager,
    ) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if let Some(provider) = provider.filter(|p| !p.is_empty()) {
            match providers.api_key(provider) {
                Ok(Some(key)) => env.push((providers.env_var(provider), key)),
                Ok(None) => tracing::warn!(provider, "No API key stored for provider"),
                Err(e) => tracing::warn!(provider, error = %e, "Could not read provider API key"),
            }
        }
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            match providers.endpoint_api_key(endpoint) {
                Ok(Some(key)) => env.push(("OPENAI_API_KEY".to_string(), key)),
                Ok(None) => tracing::warn!(endpoint, "No API key stored for endpoint"),
                Err(e) => tracing::warn!(endpoint, error = %e, "Could not read endpoint API key"),
            }
        }
        env
    }

    /// Starts the command. In `Exec` mode on Unix this only returns on
    /// failure; otherwise it returns the child's exit code.
    pub fn launch(&self, command: &CommandLine, env: &[(String, String)]) -> Result<i32> {
        if !Self::is_installed(&command.program) {
            return Err(AppError::CommandExecution(format!(
                "'{}' is not installed or not on PATH",
                command.program
            )));
        }
        tracing::info!(command = %command, mode = ?self.mode, "Launching");

        let mut process = Command::new(&command.program);
        process.args(&command.args).envs(env.iter().map(|(k, v)| (k, v)));

        #[cfg(unix)]
        {
            if self.mode == LaunchMode::Exec {
                use std::os::unix::process::CommandExt;
                let err = process.exec();
                return Err(AppError::CommandExecution(format!(
                    "exec {} failed: {err}",
                    command.program
                )));
            }
        }

        let status = process
            .status()
            .map_err(|e| AppError::CommandExecution(format!("failed to start {}: {e}", command.program)))?;
        let code = status.code().unwrap_or(1);
        if !status.success() {
            tracing::warn!(code, "aider exited with an error");
        }
        Ok(code)
    }
}
