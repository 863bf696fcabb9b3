use arboard::Clipboard;
use crossterm::event::{KeyCode, KeyEvent};

use crate::command::{CommandBuilder, CommandLine, Executor, LaunchMode};
use crate::error::Result;
use crate::models::Preset;
use crate::tui::state::{App, Outcome, Screen};

/// The command about to be launched, shown for confirmation.
pub struct PreviewState {
    pub preset: Preset,
    pub command: CommandLine,
    pub env: Vec<(String, String)>,
    pub installed: bool,
}

impl PreviewState {
    /// Names of the environment variables that will be set (values hidden).
    pub fn env_names(&self) -> Vec<&str> {
        self.env.iter().map(|(k, _)| k.as_str()).collect()
    }
}

pub fn open_preview(app: &mut App, preset_id: i64) -> Result<()> {
    let preset = app.ctx.db.preset(preset_id)?;
    let command = CommandBuilder::new()
        .with_database(&app.ctx.db)
        .with_providers(&app.ctx.providers)
        .build(&preset)?;
    let env = Executor::new(LaunchMode::default()).prepare_env(&preset, &app.ctx.providers);
    let installed = Executor::is_installed(&command.program);
    app.preview = Some(PreviewState { preset, command, env, installed });
    app.status.clear();
    app.screen = Screen::Preview;
    Ok(())
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let Some(preview) = app.preview.as_ref() else {
        app.go_home();
        return Ok(None);
    };
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') => {
            tracing::info!(preset = %preview.preset.name, "Launch confirmed");
            return Ok(Some(Outcome::Launch {
                command: preview.command.clone(),
                env: preview.env.clone(),
            }));
        }
        KeyCode::Char('c') => {
            let text = preview.command.to_shell_string();
            match Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
                Ok(()) => app.status = "✓ Command copied to clipboard".to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "Clipboard unavailable");
                    app.status = format!("Clipboard unavailable: {e}");
                }
            }
        }
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => app.go_home(),
        _ => {}
    }
    Ok(None)
}
