//! Guided preset creation: name, description, categories, flags per
//! category, backend, review.

use crossterm::event::{KeyCode, KeyEvent};

use crate::command::{build_command, CommandLine};
use crate::error::{AppError, Result};
use crate::flags::{validate_value, FlagManager};
use crate::models::{FlagMap, FlagMetadata, Preset};
use crate::providers::ProviderManager;
use crate::tui::input::{handle_text_input_key, TextInput};
use crate::tui::state::{step_index, App, BackendChoice, Outcome, Screen};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    Name,
    Description,
    Categories,
    Flags,
    Backend,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::Name,
        WizardStep::Description,
        WizardStep::Categories,
        WizardStep::Flags,
        WizardStep::Backend,
        WizardStep::Review,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Name => "Name",
            WizardStep::Description => "Description",
            WizardStep::Categories => "Categories",
            WizardStep::Flags => "Flags",
            WizardStep::Backend => "Backend",
            WizardStep::Review => "Review",
        }
    }

    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }
}

pub struct WizardState {
    pub step: WizardStep,
    pub name: TextInput,
    pub description: TextInput,
    pub categories: Vec<String>,
    pub selected: Vec<bool>,
    pub category_cursor: usize,
    /// Wizard-visible flags of the selected categories.
    pub flags: Vec<FlagMetadata>,
    pub flag_cursor: usize,
    pub values: FlagMap,
    /// Value being typed for the flag under the cursor.
    pub editing: Option<TextInput>,
    pub backends: Vec<BackendChoice>,
    pub backend_cursor: usize,
}

impl WizardState {
    pub fn new(flags: &FlagManager, providers: &ProviderManager) -> Self {
        let categories: Vec<String> =
            flags.wizard_categories().into_iter().map(str::to_string).collect();
        WizardState {
            step: WizardStep::Name,
            name: TextInput::new(),
            description: TextInput::new(),
            selected: vec![false; categories.len()],
            categories,
            category_cursor: 0,
            flags: Vec::new(),
            flag_cursor: 0,
            values: FlagMap::new(),
            editing: None,
            backends: BackendChoice::all(providers),
            backend_cursor: 0,
        }
    }

    pub fn selected_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .zip(&self.selected)
            .filter(|(_, on)| **on)
            .map(|(c, _)| c.as_str())
            .collect()
    }

    pub fn toggle_category(&mut self) {
        if let Some(on) = self.selected.get_mut(self.category_cursor) {
            *on = !*on;
        }
    }

    /// Rebuilds the flag list from the selected categories. Values of
    /// flags that dropped out are discarded.
    pub fn collect_flags(&mut self, manager: &FlagManager) {
        self.flags = self
            .selected_categories()
            .into_iter()
            .flat_map(|c| manager.wizard_flags(c).into_iter().cloned())
            .collect();
        let names: Vec<&str> = self.flags.iter().map(|f| f.name.as_str()).collect();
        self.values.retain(|k, _| names.contains(&k.as_str()));
        self.flag_cursor = self.flag_cursor.min(self.flags.len().saturating_sub(1));
    }

    pub fn current_flag(&self) -> Option<&FlagMetadata> {
        self.flags.get(self.flag_cursor)
    }

    pub fn value_of(&self, flag: &str) -> Option<&Option<String>> {
        self.values.get(flag)
    }

    /// Cycles a boolean flag through unset, true and false.
    pub fn cycle_boolean(&mut self) {
        let Some(flag) = self.current_flag() else { return };
        let name = flag.name.clone();
        let next = match self.values.get(&name).and_then(|v| v.as_deref()) {
            None if !self.values.contains_key(&name) => Some("true"),
            Some("true") | None => Some("false"),
            _ => None,
        };
        match next {
            Some(v) => {
                self.values.insert(name, Some(v.to_string()));
            }
            None => {
                self.values.remove(&name);
            }
        }
    }

    pub fn backend(&self) -> &BackendChoice {
        self.backends.get(self.backend_cursor).unwrap_or(&BackendChoice::None)
    }

    /// The preset as it would be saved.
    pub fn preset(&self) -> Preset {
        let mut preset = Preset::new(self.name.trimmed());
        preset.description = self.description.trimmed().to_string();
        preset.flags = self.values.clone();
        self.backend().apply(&mut preset);
        preset
    }

    pub fn command_preview(&self) -> CommandLine {
        build_command(&self.preset())
    }
}

pub fn open_wizard(app: &mut App) {
    app.wizard = Some(WizardState::new(&app.ctx.flags, &app.ctx.providers));
    app.status.clear();
    app.screen = Screen::Wizard;
}

// ── Navigation ────────────────────────────────────────────────────────────────

fn advance(app: &mut App, wizard: &mut WizardState) -> Result<bool> {
    wizard.step = match wizard.step {
        WizardStep::Name => {
            let name = wizard.name.trimmed();
            if name.is_empty() {
                return Err(AppError::Validation("preset name cannot be empty".into()));
            }
            if app.ctx.db.preset_by_name(name)?.is_some() {
                return Err(AppError::PresetExists(name.to_string()));
            }
            WizardStep::Description
        }
        WizardStep::Description => WizardStep::Categories,
        WizardStep::Categories => {
            wizard.collect_flags(&app.ctx.flags);
            if wizard.flags.is_empty() {
                WizardStep::Backend
            } else {
                WizardStep::Flags
            }
        }
        WizardStep::Flags => WizardStep::Backend,
        WizardStep::Backend => WizardStep::Review,
        WizardStep::Review => {
            save(app, wizard)?;
            return Ok(true);
        }
    };
    app.status.clear();
    Ok(false)
}

fn retreat(wizard: &mut WizardState) -> bool {
    wizard.step = match wizard.step {
        WizardStep::Name => return true,
        WizardStep::Description => WizardStep::Name,
        WizardStep::Categories => WizardStep::Description,
        WizardStep::Flags => WizardStep::Categories,
        WizardStep::Backend if wizard.flags.is_empty() => WizardStep::Categories,
        WizardStep::Backend => WizardStep::Flags,
        WizardStep::Review => WizardStep::Backend,
    };
    false
}

fn save(app: &mut App, wizard: &WizardState) -> Result<()> {
    let preset = wizard.preset();
    for (name, value) in &preset.flags {
        if app.ctx.flags.flag(name).is_some() {
            app.ctx.flags.validate_flag(name, value.as_deref())?;
        }
    }
    let id = app.ctx.db.save_preset(&preset)?;
    tracing::info!(id, name = %preset.name, "Preset created from wizard");
    app.go_home();
    app.select_preset_id(id);
    app.status = format!("✓ Created preset '{}'", preset.name);
    Ok(())
}

// ── Keys ──────────────────────────────────────────────────────────────────────

fn handle_flag_keys(wizard: &mut WizardState, key: KeyEvent) -> Result<()> {
    if let Some(input) = wizard.editing.as_mut() {
        match key.code {
            KeyCode::Enter => {
                let value = input.trimmed().to_string();
                let Some(flag) = wizard.current_flag().cloned() else { return Ok(()) };
                if value.is_empty() {
                    wizard.values.remove(&flag.name);
                } else {
                    validate_value(&flag, Some(&value))?;
                    wizard.values.insert(flag.name, Some(value));
                }
                wizard.editing = None;
            }
            KeyCode::Esc => wizard.editing = None,
            _ => {
                handle_text_input_key(input, key);
            }
        }
        return Ok(());
    }

    let len = wizard.flags.len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => wizard.flag_cursor = step_index(wizard.flag_cursor, len, -1),
        KeyCode::Down | KeyCode::Char('j') => wizard.flag_cursor = step_index(wizard.flag_cursor, len, 1),
        KeyCode::Char(' ') | KeyCode::Enter => {
            let Some(flag) = wizard.current_flag() else { return Ok(()) };
            if flag.value_type.is_boolean() {
                wizard.cycle_boolean();
            } else {
                let current = wizard
                    .values
                    .get(&flag.name)
                    .and_then(|v| v.clone())
                    .or_else(|| flag.default_value.clone())
                    .unwrap_or_default();
                wizard.editing = Some(TextInput::with_value(&current));
            }
        }
        KeyCode::Backspace | KeyCode::Delete => {
            if let Some(flag) = wizard.current_flag().map(|f| f.name.clone()) {
                wizard.values.remove(&flag);
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_step_keys(app: &mut App, wizard: &mut WizardState, key: KeyEvent) -> Result<bool> {
    match wizard.step {
        WizardStep::Name | WizardStep::Description => {
            if key.code == KeyCode::Enter {
                return advance(app, wizard);
            }
            let input = if wizard.step == WizardStep::Name {
                &mut wizard.name
            } else {
                &mut wizard.description
            };
            handle_text_input_key(input, key);
        }
        WizardStep::Categories => {
            let len = wizard.categories.len();
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    wizard.category_cursor = step_index(wizard.category_cursor, len, -1)
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    wizard.category_cursor = step_index(wizard.category_cursor, len, 1)
                }
                KeyCode::Char(' ') => wizard.toggle_category(),
                KeyCode::Enter => return advance(app, wizard),
                _ => {}
            }
        }
        WizardStep::Flags => {
            if key.code == KeyCode::Char('n') && wizard.editing.is_none() {
                return advance(app, wizard);
            }
            handle_flag_keys(wizard, key)?;
        }
        WizardStep::Backend => {
            let len = wizard.backends.len();
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    wizard.backend_cursor = step_index(wizard.backend_cursor, len, -1)
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    wizard.backend_cursor = step_index(wizard.backend_cursor, len, 1)
                }
                KeyCode::Enter => return advance(app, wizard),
                _ => {}
            }
        }
        WizardStep::Review => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('s')) {
                return advance(app, wizard);
            }
        }
    }
    Ok(false)
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let Some(mut wizard) = app.wizard.take() else {
        app.go_home();
        return Ok(None);
    };

    let editing = wizard.editing.is_some();
    let result = match key.code {
        KeyCode::Esc if !editing => {
            if retreat(&mut wizard) {
                app.go_home();
                app.status = "Preset creation cancelled".to_string();
                return Ok(None);
            }
            Ok(false)
        }
        KeyCode::Tab if !editing => advance(app, &mut wizard),
        KeyCode::BackTab if !editing => {
            if retreat(&mut wizard) {
                app.go_home();
                return Ok(None);
            }
            Ok(false)
        }
        _ => handle_step_keys(app, &mut wizard, key),
    };

    match result {
        Ok(true) => {}
        Ok(false) => app.wizard = Some(wizard),
        Err(e) => {
            app.wizard = Some(wizard);
            app.report(e);
        }
    }
    Ok(None)
}
