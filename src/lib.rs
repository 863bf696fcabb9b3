pub mod advanced;
pub mod command;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod flags;
pub mod logging;
pub mod models;
pub mod paths;
pub mod providers;
pub mod secrets;
pub mod tui;

pub use command::{build_command, CommandBuilder, CommandLine, Executor, LaunchMode};
pub use context::Context;
pub use error::{AppError, Result};
pub use models::{FlagMap, FlagMetadata, Preset, PresetSummary, ValueType};
pub use tui::{render_to_buffer, App, Outcome, Screen};

use anyhow::Context as _;

use crate::config::quick::QuickPresets;
use crate::config::LegacyProfile;
use std::collections::BTreeMap;

pub fn greeting(name: &str) -> String {
    format!("Hello {name}! aider-start {} is installed.", env!("CARGO_PKG_VERSION"))
}

pub fn hello(name: &str) -> anyhow::Result<()> {
    println!("{}", greeting(name));
    Ok(())
}

// ── Presets ───────────────────────────────────────────────────────────────────

pub fn format_preset_table(presets: &[PresetSummary]) -> String {
    if presets.is_empty() {
        return "No presets yet. Run `aider-start` to create one.".to_string();
    }
    let width = presets.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    let mut out = format!("{:<width$}  {:>5}  DESCRIPTION\n", "NAME", "FLAGS");
    for p in presets {
        out.push_str(&format!("{:<width$}  {:>5}  {}\n", p.name, p.flag_count, p.description));
    }
    out
}

pub fn list_presets(ctx: &Context) -> anyhow::Result<()> {
    let presets = ctx.db.list_presets().context("Failed to list presets")?;
    print!("{}", format_preset_table(&presets));
    Ok(())
}

/// Builds the command for a stored preset and its environment.
pub fn prepare_preset(ctx: &Context, name: &str) -> anyhow::Result<(CommandLine, Vec<(String, String)>)> {
    let preset = ctx
        .db
        .preset_by_name(name)?
        .ok_or_else(|| AppError::PresetNotFound(name.to_string()))?;
    let command = CommandBuilder::new()
        .with_database(&ctx.db)
        .with_providers(&ctx.providers)
        .build(&preset)
        .with_context(|| format!("Failed to build command for preset '{name}'"))?;
    let env = Executor::new(LaunchMode::Spawn).prepare_env(&preset, &ctx.providers);
    Ok((command, env))
}

/// Runs a stored preset without the TUI. Returns aider's exit code.
pub fn run_preset(ctx: &Context, name: &str, dry_run: bool, mode: LaunchMode) -> anyhow::Result<i32> {
    let (command, env) = prepare_preset(ctx, name)?;
    if dry_run {
        println!("{command}");
        return Ok(0);
    }
    println!("Running: {command}");
    Ok(Executor::new(mode).launch(&command, &env)?)
}

// ── Legacy profiles ───────────────────────────────────────────────────────────

pub fn format_legacy_listing(
    profiles: &BTreeMap<String, LegacyProfile>,
    quick: &QuickPresets,
) -> String {
    let mut out = String::new();
    if profiles.is_empty() && quick.is_empty() {
        out.push_str("No legacy profiles or quick presets found.\n");
        return out;
    }
    if !profiles.is_empty() {
        out.push_str("Profiles:\n");
        for (name, profile) in profiles {
            let model = profile.params.get("model").and_then(|m| m.as_str()).unwrap_or("-");
            let backend = profile
                .provider
                .as_deref()
                .or(profile.endpoint.as_deref())
                .unwrap_or("-");
            out.push_str(&format!("  {name}  (model: {model}, backend: {backend})\n"));
        }
    }
    if !quick.is_empty() {
        out.push_str("Quick presets:\n");
        for (name, command) in quick.iter() {
            out.push_str(&format!("  {name}  {command}\n"));
        }
    }
    out
}

pub fn list_legacy(ctx: &Context) -> anyhow::Result<()> {
    let quick = ctx.quick_presets().context("Failed to read quick presets")?;
    print!("{}", format_legacy_listing(ctx.providers.config().profiles(), &quick));
    Ok(())
}

/// Command and environment for a legacy profile, falling back to a quick
/// preset of the same name.
pub fn prepare_legacy(ctx: &Context, name: &str) -> anyhow::Result<(CommandLine, Vec<(String, String)>)> {
    let executor = Executor::new(LaunchMode::Spawn);
    if let Ok(profile) = ctx.providers.config().profile(name) {
        let command = CommandBuilder::new()
            .with_providers(&ctx.providers)
            .build_profile(profile)
            .with_context(|| format!("Failed to build command for profile '{name}'"))?;
        let env = executor.backend_env(
            profile.provider.as_deref(),
            profile.endpoint.as_deref(),
            &ctx.providers,
        );
        return Ok((command, env));
    }
    let quick = ctx.quick_presets()?;
    let argv = quick.argv(name)?;
    let mut command = CommandLine::new(&argv[0]);
    command.args.extend(argv[1..].iter().cloned());
    Ok((command, Vec::new()))
}

pub fn run_legacy(ctx: &Context, name: &str, dry_run: bool, mode: LaunchMode) -> anyhow::Result<i32> {
    let (command, env) = prepare_legacy(ctx, name)?;
    if dry_run {
        println!("{command}");
        return Ok(0);
    }
    println!("Running: {command}");
    Ok(Executor::new(mode).launch(&command, &env)?)
}
