use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::context::Context;
use crate::tui::advanced::{self, refresh_models};
use crate::tui::draw::draw;
use crate::tui::providers::{self, clear_api_key, delete_backend, open_providers};
use crate::tui::state::{App, Dialog, Outcome, PendingAction, Screen};
use crate::tui::{editor, preset_list, preview, wizard, wizard_flags};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Runs the interactive UI until the user quits or picks a preset to launch.
/// The terminal is restored before the outcome is returned.
pub async fn run(ctx: Context, start: Screen) -> Result<Outcome> {
    let mut app = App::new(ctx);
    if start == Screen::Providers {
        open_providers(&mut app);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

// ── Event loop ────────────────────────────────────────────────────────────────

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<Outcome> {
    let mut event_stream = EventStream::new();
    let mut tick = tokio::time::interval(std::time::Duration::from_millis(250));

    loop {
        terminal.draw(|f| draw(f, app))?;

        tokio::select! {
            _ = tick.tick() => {}

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(outcome) = handle_key(app, key) {
                            return Ok(outcome);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(Outcome::Quit),
                }
            }
        }

        if let Some(backend) = app.pending_check.take() {
            // Show the "Checking…" status while the request runs.
            terminal.draw(|f| draw(f, app))?;
            match app.ctx.providers.check_connection(&backend).await {
                Ok(count) => {
                    app.status.clear();
                    app.message(
                        "Connection OK",
                        format!("{} responded and lists {count} models.", backend.name()),
                    );
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "Connection check failed");
                    app.status.clear();
                    app.dialog = Some(Dialog::Message {
                        title: "Connection failed".to_string(),
                        body: e.to_string(),
                        is_error: true,
                    });
                }
            }
        }
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Routes one key press. Returns the outcome when the UI should exit.
pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<Outcome> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Outcome::Quit);
    }
    if app.dialog.is_some() {
        handle_dialog_key(app, key);
        return None;
    }

    let result = match app.screen {
        Screen::PresetList => preset_list::handle_key(app, key),
        Screen::Preview => preview::handle_key(app, key),
        Screen::Wizard => wizard::handle_key(app, key),
        Screen::Editor => editor::handle_key(app, key),
        Screen::Advanced => advanced::handle_list_key(app, key),
        Screen::ModelEditor => advanced::handle_editor_key(app, key),
        Screen::Providers => providers::handle_list_key(app, key),
        Screen::ProviderForm => providers::handle_form_key(app, key),
        Screen::WizardFlags => wizard_flags::handle_key(app, key),
    };
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            app.report(e);
            None
        }
    }
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let Some(dialog) = app.dialog.take() else { return };
    match dialog {
        Dialog::Message { .. } => {
            if !matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('q')) {
                app.dialog = Some(dialog);
            }
        }
        Dialog::Confirm { action, .. } if matches!(key.code, KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y')) => {
            if let Err(e) = perform(app, action) {
                app.report(e);
            }
        }
        Dialog::Confirm { .. } if matches!(key.code, KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N')) => {
            app.status = "Cancelled".to_string();
        }
        other => app.dialog = Some(other),
    }
}

fn perform(app: &mut App, action: PendingAction) -> crate::Result<()> {
    match action {
        PendingAction::DeletePreset { id, name } => {
            if app.ctx.db.delete_preset(id)? {
                tracing::info!(id, %name, "Preset deleted");
                app.status = format!("✓ Deleted preset '{name}'");
            }
            app.refresh_presets();
        }
        PendingAction::DeleteModel { preset_id, model } => {
            app.ctx.db.delete_model_entries(preset_id, &model)?;
            app.status = format!("✓ Deleted settings for '{model}'");
            refresh_models(app)?;
        }
        PendingAction::DeleteBackend(backend) => delete_backend(app, &backend)?,
        PendingAction::ClearApiKey(backend) => clear_api_key(app, &backend)?,
        PendingAction::DiscardEdits => {
            app.go_home();
            app.status = "Changes discarded".to_string();
        }
    }
    Ok(())
}
