//! Which catalog flags the creation wizard offers.

use crossterm::event::{KeyCode, KeyEvent};

use crate::error::Result;
use crate::tui::state::{step_selection, App, Outcome, Screen};

pub fn open_wizard_flags(app: &mut App) {
    let len = app.ctx.flags.all_flags().len();
    if app.wizard_flags_state.selected().map_or(true, |i| i >= len) {
        app.wizard_flags_state.select((len > 0).then_some(0));
    }
    app.status.clear();
    app.screen = Screen::WizardFlags;
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let len = app.ctx.flags.all_flags().len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => step_selection(&mut app.wizard_flags_state, len, -1),
        KeyCode::Down | KeyCode::Char('j') => step_selection(&mut app.wizard_flags_state, len, 1),
        KeyCode::PageUp => step_selection(&mut app.wizard_flags_state, len, -10),
        KeyCode::PageDown => step_selection(&mut app.wizard_flags_state, len, 10),
        KeyCode::Char(' ') | KeyCode::Enter => {
            let Some(flag) = app
                .wizard_flags_state
                .selected()
                .and_then(|i| app.ctx.flags.all_flags().get(i))
                .map(|f| (f.name.clone(), f.wizard_visible))
            else {
                return Ok(None);
            };
            let (name, visible) = flag;
            app.ctx.flags.set_wizard_visibility(&name, !visible)?;
            app.status = if visible {
                format!("--{name} hidden from the wizard")
            } else {
                format!("--{name} shown in the wizard")
            };
        }
        KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
        _ => {}
    }
    Ok(None)
}
