use crossterm::event::{KeyCode, KeyEvent};

use crate::error::Result;
use crate::tui::advanced::open_advanced;
use crate::tui::editor::open_editor;
use crate::tui::input::handle_text_input_key;
use crate::tui::preview::open_preview;
use crate::tui::providers::open_providers;
use crate::tui::state::{step_selection, App, Outcome, PendingAction};
use crate::tui::wizard::open_wizard;
use crate::tui::wizard_flags::open_wizard_flags;

fn handle_filter_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.filter.clear();
            app.filtering = false;
        }
        KeyCode::Enter => app.filtering = false,
        KeyCode::Up => {
            let len = app.visible_presets().len();
            step_selection(&mut app.preset_list_state, len, -1);
        }
        KeyCode::Down => {
            let len = app.visible_presets().len();
            step_selection(&mut app.preset_list_state, len, 1);
        }
        _ => {
            if handle_text_input_key(&mut app.filter, key) {
                app.preset_list_state.select(Some(0));
            }
        }
    }
    app.clamp_selection();
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    if app.filtering {
        handle_filter_key(app, key);
        return Ok(None);
    }

    let len = app.visible_presets().len();
    let selected = app.selected_preset().map(|p| (p.id, p.name.clone()));
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => step_selection(&mut app.preset_list_state, len, -1),
        KeyCode::Down | KeyCode::Char('j') => step_selection(&mut app.preset_list_state, len, 1),
        KeyCode::Home | KeyCode::Char('g') if len > 0 => app.preset_list_state.select(Some(0)),
        KeyCode::End | KeyCode::Char('G') if len > 0 => app.preset_list_state.select(Some(len - 1)),
        KeyCode::Char('/') => {
            app.filtering = true;
            app.status.clear();
        }
        KeyCode::Enter => {
            if let Some((id, _)) = selected {
                open_preview(app, id)?;
            }
        }
        KeyCode::Char('n') => open_wizard(app),
        KeyCode::Char('e') => {
            if let Some((id, _)) = selected {
                open_editor(app, id)?;
            }
        }
        KeyCode::Char('a') => {
            if let Some((id, _)) = selected {
                open_advanced(app, id)?;
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some((id, name)) = selected {
                app.confirm(
                    "Delete preset?",
                    format!("Delete preset '{name}' with its flags and model settings?"),
                    PendingAction::DeletePreset { id, name },
                );
            }
        }
        KeyCode::Char('w') => open_wizard_flags(app),
        KeyCode::Char('p') => open_providers(app),
        KeyCode::Char('r') => {
            app.ctx.flags.load(true)?;
            app.refresh_presets();
            app.status = "Reloaded".to_string();
        }
        KeyCode::Esc if !app.filter.is_blank() => {
            app.filter.clear();
            app.clamp_selection();
        }
        KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(Outcome::Quit)),
        _ => {}
    }
    Ok(None)
}
