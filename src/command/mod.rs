//! Turns a preset (or a legacy profile) into the aider command line.

pub mod executor;

use serde_json::Value;
use std::fmt;

use crate::config::LegacyProfile;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::flags::catalog;
use crate::models::{normalize_flag_name, parse_bool, Preset};
use crate::providers::ProviderManager;

pub use executor::{Executor, LaunchMode};

pub const DEFAULT_EXECUTABLE: &str = "aider";
pub const EXECUTABLE_ENV: &str = "AIDER_START_EXECUTABLE";

/// Preset keys passed as bare file arguments instead of `--key value`.
const POSITIONAL_KEYS: &[&str] = &["fnames"];
/// Legacy profile keys that select a backend rather than map to a flag.
const CONTROL_KEYS: &[&str] = &["name", "provider", "endpoint"];

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        CommandLine { program: program.into(), args: Vec::new() }
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone()).chain(self.args.iter().cloned()).collect()
    }

    /// Shell-quoted form shown in previews and logs.
    pub fn to_shell_string(&self) -> String {
        shell_words::join(self.argv())
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value following `arg`, if present.
    pub fn arg_value(&self, arg: &str) -> Option<&str> {
        let pos = self.args.iter().position(|a| a == arg)?;
        self.args.get(pos + 1).map(String::as_str)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_string())
    }
}

// ── Flag rendering ────────────────────────────────────────────────────────────

fn negate(arg: &str) -> String {
    match arg.strip_prefix("--no-") {
        Some(positive) => format!("--{positive}"),
        None => format!("--no-{}", arg.trim_start_matches('-')),
    }
}

fn push_switch(out: &mut Vec<String>, arg: String, on: bool) {
    out.push(if on { arg } else { negate(&arg) });
}

fn split_files(value: &str) -> Vec<String> {
    shell_words::split(value)
        .unwrap_or_else(|_| value.split_whitespace().map(str::to_string).collect())
}

/// Options and positional files rendered from preset flags, in map order.
fn render_flags<'a>(
    flags: impl IntoIterator<Item = (&'a String, &'a Option<String>)>,
) -> (Vec<String>, Vec<String>) {
    let mut options = Vec::new();
    let mut files = Vec::new();
    for (name, value) in flags {
        let value = value.as_deref().map(str::trim).unwrap_or("");
        let key = normalize_flag_name(name);
        let key = key.as_str();
        if POSITIONAL_KEYS.contains(&key) {
            files.extend(split_files(value));
            continue;
        }
        let arg = catalog::cli_arg(key);
        if catalog::is_boolean(key) {
            let on = value.is_empty() || parse_bool(value).unwrap_or(true);
            push_switch(&mut options, arg, on);
        } else if value.is_empty() {
            options.push(arg);
        } else {
            options.push(arg);
            options.push(value.to_string());
        }
    }
    (options, files)
}

/// Pure rendering: `aider` followed by the preset's flags.
pub fn build_command(preset: &Preset) -> CommandLine {
    let (options, files) = render_flags(&preset.flags);
    let mut command = CommandLine::new(DEFAULT_EXECUTABLE);
    command.args.extend(options);
    command.args.extend(files);
    command
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Full builder: resolves stored model config files, endpoints and
/// providers on top of [`build_command`].
pub struct CommandBuilder<'a> {
    executable: String,
    db: Option<&'a Database>,
    providers: Option<&'a ProviderManager>,
}

impl Default for CommandBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandBuilder<'a> {
    pub fn new() -> Self {
        let executable = std::env::var(EXECUTABLE_ENV)
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string());
        CommandBuilder { executable, db: None, providers: None }
    }

    pub fn executable(mut self, executable: &str) -> Self {
        self.executable = executable.to_string();
        self
    }

    pub fn with_database(mut self, db: &'a Database) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_providers(mut self, providers: &'a ProviderManager) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn build(&self, preset: &Preset) -> Result<CommandLine> {
        let (options, files) = render_flags(&preset.flags);
        let mut command = CommandLine::new(&self.executable);
        command.args.extend(options);

        if let (Some(db), Some(id), Some(model)) = (self.db, preset.id, preset.model()) {
            self.append_model_files(db, id, model, preset, &mut command)?;
        }
        if let Some(provider) = preset.provider.as_deref().filter(|p| !p.is_empty()) {
            self.append_provider(provider, &mut command)?;
        }
        if let Some(endpoint) = preset.endpoint.as_deref().filter(|e| !e.is_empty()) {
            self.append_endpoint(endpoint, &mut command)?;
        }

        command.args.extend(files);
        tracing::debug!(preset = %preset.name, command = %command, "Built command");
        Ok(command)
    }

    fn append_model_files(
        &self,
        db: &Database,
        preset_id: i64,
        model: &str,
        preset: &Preset,
        command: &mut CommandLine,
    ) -> Result<()> {
        if !preset.has_flag("model-settings-file") {
            let entry = match db.model_settings(Some(preset_id), Some(model))? {
                Some(entry) => Some(entry),
                None => db.model_settings(None, Some(model))?,
            };
            if let Some(path) = entry.and_then(|e| e.file_path).filter(|p| !p.is_empty()) {
                command.args.push("--model-settings-file".into());
                command.args.push(path);
            }
        }
        if !preset.has_flag("model-metadata-file") {
            let entry = db.model_metadata(preset_id, model)?;
            if let Some(path) = entry.and_then(|e| e.file_path).filter(|p| !p.is_empty()) {
                command.args.push("--model-metadata-file".into());
                command.args.push(path);
            }
        }
        Ok(())
    }

    fn providers(&self) -> Result<&'a ProviderManager> {
        self.providers
            .ok_or_else(|| AppError::CommandBuild("no provider configuration available".into()))
    }

    fn append_provider(&self, name: &str, command: &mut CommandLine) -> Result<()> {
        let record = self.providers()?.provider(name).map_err(|e| {
            tracing::error!(provider = name, "Unknown provider");
            AppError::CommandBuild(e.to_string())
        })?;
        for (key, param) in &record.params {
            let Some(obj) = param.as_object() else { continue };
            let (Some(arg), Some(value)) = (obj.get("cli_arg").and_then(Value::as_str), obj.get("value")) else {
                continue;
            };
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::String(s) if s.is_empty() => {}
                Value::Bool(true) => command.args.push(arg.to_string()),
                Value::String(s) => command.args.extend([arg.to_string(), s.clone()]),
                other => command.args.extend([arg.to_string(), other.to_string()]),
            }
            tracing::debug!(provider = name, param = %key, "Applied provider param");
        }
        Ok(())
    }

    fn append_endpoint(&self, name: &str, command: &mut CommandLine) -> Result<()> {
        let record = self.providers()?.endpoint(name).map_err(|e| {
            tracing::error!(endpoint = name, "Unknown endpoint");
            AppError::CommandBuild(e.to_string())
        })?;
        if !record.api_url.is_empty() {
            match command.arg_value("--openai-api-base") {
                None => command.args.extend(["--openai-api-base".to_string(), record.api_url.clone()]),
                Some(existing) if existing != record.api_url => {
                    tracing::warn!(endpoint = name, "api base set on preset and endpoint, keeping preset value")
                }
                Some(_) => {}
            }
        }
        if let Some(api_type) = record.api_type.as_deref().filter(|t| !t.is_empty()) {
            if !command.has_arg("--openai-api-type") {
                command.args.extend(["--openai-api-type".to_string(), api_type.to_string()]);
            }
        }
        Ok(())
    }

    /// Builds the command for a legacy JSON profile.
    pub fn build_profile(&self, profile: &LegacyProfile) -> Result<CommandLine> {
        let mut command = CommandLine::new(&self.executable);
        let mut files = Vec::new();

        for (key, value) in &profile.params {
            if CONTROL_KEYS.contains(&key.as_str()) {
                continue;
            }
            if key == "fnames" || key == "file" {
                match value {
                    Value::Array(items) => {
                        files.extend(items.iter().filter_map(Value::as_str).map(str::to_string))
                    }
                    Value::String(s) if !s.trim().is_empty() => files.push(s.trim().to_string()),
                    _ => {}
                }
                continue;
            }
            let arg = catalog::cli_arg(key);
            match value {
                Value::Bool(on) => push_switch(&mut command.args, arg, *on),
                Value::Null => {}
                Value::String(s) if s.trim().is_empty() => {}
                Value::String(s) => command.args.extend([arg, s.clone()]),
                Value::Array(items) => {
                    for item in items {
                        let item = item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string());
                        command.args.extend([arg.clone(), item]);
                    }
                }
                other => command.args.extend([arg, other.to_string()]),
            }
        }

        if let Some(provider) = profile.provider.as_deref().filter(|p| !p.is_empty()) {
            self.append_provider(provider, &mut command)?;
        }
        if let Some(endpoint) = profile.endpoint.as_deref().filter(|e| !e.is_empty()) {
            self.append_endpoint(endpoint, &mut command)?;
        }
        command.args.extend(files);
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation() {
        assert_eq!(negate("--stream"), "--no-stream");
        assert_eq!(negate("--no-browser"), "--browser");
    }

    #[test]
    fn split_files_respects_quotes() {
        assert_eq!(split_files("a.py 'my file.py'"), vec!["a.py", "my file.py"]);
    }
}
