//! Per-model settings and metadata of one preset.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::fs;
use std::path::Path;

use crate::advanced::{
    metadata_file_name, parse_settings_yaml, pretty_json, save_model_config, settings_file_name,
    settings_json_to_yaml, ModelConfigInput,
};
use crate::error::{AppError, Result};
use crate::models::{ManagedModel, SettingsTemplate};
use crate::tui::input::{handle_multiline_key, handle_text_input_key, TextInput};
use crate::tui::state::{step_selection, App, Outcome, PendingAction, Screen};

// ── Model list ────────────────────────────────────────────────────────────────

pub struct AdvancedState {
    pub preset_id: i64,
    pub preset_name: String,
    pub models: Vec<ManagedModel>,
    pub list_state: ListState,
}

impl AdvancedState {
    pub fn selected(&self) -> Option<&ManagedModel> {
        self.models.get(self.list_state.selected()?)
    }
}

pub fn open_advanced(app: &mut App, preset_id: i64) -> Result<()> {
    let preset = app.ctx.db.preset(preset_id)?;
    let models = app.ctx.db.advanced_settings(preset_id)?.models();
    let mut list_state = ListState::default();
    list_state.select((!models.is_empty()).then_some(0));
    app.advanced = Some(AdvancedState { preset_id, preset_name: preset.name, models, list_state });
    app.model_editor = None;
    app.status.clear();
    app.screen = Screen::Advanced;
    Ok(())
}

/// Reloads the model list after a change, keeping the selection in range.
pub fn refresh_models(app: &mut App) -> Result<()> {
    let Some(advanced) = app.advanced.as_mut() else { return Ok(()) };
    advanced.models = app.ctx.db.advanced_settings(advanced.preset_id)?.models();
    let len = advanced.models.len();
    let selected = match advanced.list_state.selected() {
        _ if len == 0 => None,
        Some(i) => Some(i.min(len - 1)),
        None => Some(0),
    };
    advanced.list_state.select(selected);
    Ok(())
}

pub fn handle_list_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let Some(advanced) = app.advanced.as_mut() else {
        app.go_home();
        return Ok(None);
    };
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            let len = advanced.models.len();
            step_selection(&mut advanced.list_state, len, -1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let len = advanced.models.len();
            step_selection(&mut advanced.list_state, len, 1);
        }
        KeyCode::Char('n') | KeyCode::Char('N') => {
            let id = advanced.preset_id;
            let name = advanced.preset_name.clone();
            open_model_editor(app, id, &name, None)?;
        }
        KeyCode::Enter | KeyCode::Char('e') => {
            if let Some(model) = advanced.selected().map(|m| m.name.clone()) {
                let id = advanced.preset_id;
                let name = advanced.preset_name.clone();
                open_model_editor(app, id, &name, Some(&model))?;
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(model) = advanced.selected().map(|m| m.name.clone()) {
                let preset_id = advanced.preset_id;
                app.confirm(
                    "Delete model settings?",
                    format!("Remove settings and metadata for '{model}'?"),
                    PendingAction::DeleteModel { preset_id, model },
                );
            }
        }
        KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
        _ => {}
    }
    Ok(None)
}

// ── Model editor ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelField {
    Model,
    SettingsPath,
    Settings,
    MetadataPath,
    Metadata,
}

impl ModelField {
    pub const ALL: [ModelField; 5] = [
        ModelField::Model,
        ModelField::SettingsPath,
        ModelField::Settings,
        ModelField::MetadataPath,
        ModelField::Metadata,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ModelField::Model => "Model",
            ModelField::SettingsPath => "Settings file",
            ModelField::Settings => "Settings (YAML)",
            ModelField::MetadataPath => "Metadata file",
            ModelField::Metadata => "Metadata (JSON)",
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, ModelField::Settings | ModelField::Metadata)
    }

    fn shift(self, delta: isize) -> Self {
        let pos = Self::ALL.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ALL[(pos + delta).rem_euclid(Self::ALL.len() as isize) as usize]
    }
}

pub struct ModelEditorState {
    pub preset_id: i64,
    pub preset_name: String,
    /// Model name the entries were stored under, `None` for a new model.
    pub original_model: Option<String>,
    pub focus: ModelField,
    pub model: TextInput,
    pub settings_path: TextInput,
    pub settings: TextInput,
    pub metadata_path: TextInput,
    pub metadata: TextInput,
    pub templates: Vec<SettingsTemplate>,
    pub template_cursor: Option<usize>,
}

impl ModelEditorState {
    pub fn field(&self, field: ModelField) -> &TextInput {
        match field {
            ModelField::Model => &self.model,
            ModelField::SettingsPath => &self.settings_path,
            ModelField::Settings => &self.settings,
            ModelField::MetadataPath => &self.metadata_path,
            ModelField::Metadata => &self.metadata,
        }
    }

    fn field_mut(&mut self, field: ModelField) -> &mut TextInput {
        match field {
            ModelField::Model => &mut self.model,
            ModelField::SettingsPath => &mut self.settings_path,
            ModelField::Settings => &mut self.settings,
            ModelField::MetadataPath => &mut self.metadata_path,
            ModelField::Metadata => &mut self.metadata,
        }
    }

    pub fn input(&self) -> ModelConfigInput {
        ModelConfigInput {
            model_name: self.model.trimmed().to_string(),
            settings_yaml: self.settings.value.clone(),
            settings_path: self.settings_path.trimmed().to_string(),
            metadata_json: self.metadata.value.clone(),
            metadata_path: self.metadata_path.trimmed().to_string(),
        }
    }

    /// Replaces the settings text with the next stored template.
    pub fn cycle_template(&mut self) -> Result<Option<&str>> {
        if self.templates.is_empty() {
            return Ok(None);
        }
        let next = match self.template_cursor {
            Some(i) => (i + 1) % self.templates.len(),
            None => 0,
        };
        let yaml = settings_json_to_yaml(&self.templates[next].settings_json)?;
        self.settings.set(&yaml);
        self.template_cursor = Some(next);
        Ok(Some(self.templates[next].name.as_str()))
    }
}

pub fn open_model_editor(
    app: &mut App,
    preset_id: i64,
    preset_name: &str,
    model: Option<&str>,
) -> Result<()> {
    let mut editor = ModelEditorState {
        preset_id,
        preset_name: preset_name.to_string(),
        original_model: model.map(str::to_string),
        focus: ModelField::Model,
        model: TextInput::with_value(model.unwrap_or_default()),
        settings_path: TextInput::new(),
        settings: TextInput::new(),
        metadata_path: TextInput::new(),
        metadata: TextInput::new(),
        templates: app.ctx.db.list_templates()?,
        template_cursor: None,
    };
    if let Some(model) = model {
        if let Some(entry) = app.ctx.db.model_settings(Some(preset_id), Some(model))? {
            editor.settings.set(&settings_json_to_yaml(&entry.json)?);
            editor.settings_path.set(entry.file_path.as_deref().unwrap_or_default());
        }
        if let Some(entry) = app.ctx.db.model_metadata(preset_id, model)? {
            editor.metadata.set(&pretty_json(&entry.json));
            editor.metadata_path.set(entry.file_path.as_deref().unwrap_or_default());
        }
        editor.focus = ModelField::Settings;
        editor.settings.cursor = 0;
        editor.metadata.cursor = 0;
    }
    app.model_editor = Some(editor);
    app.status.clear();
    app.screen = Screen::ModelEditor;
    Ok(())
}

/// Clears `path` when it names the generated file at `default`, so the file
/// is generated again under the new model name. Returns true if cleared.
fn retarget(path: &mut String, default: &Path) -> bool {
    let matches = !path.is_empty() && Path::new(path.as_str()) == default;
    if matches {
        path.clear();
    }
    matches
}

fn save_model(app: &mut App, editor: &ModelEditorState) -> Result<String> {
    let mut input = editor.input();
    let dir = app.ctx.paths.preset_config_dir(editor.preset_id);
    let renamed = editor.original_model.as_deref().filter(|old| *old != input.model_name);

    let mut stale = Vec::new();
    if let Some(old) = renamed {
        for (path, default) in [
            (&mut input.settings_path, dir.join(settings_file_name(old))),
            (&mut input.metadata_path, dir.join(metadata_file_name(old))),
        ] {
            if retarget(path, &default) {
                stale.push(default);
            }
        }
    }

    save_model_config(&app.ctx.db, editor.preset_id, &input, &dir)?;
    if let Some(old) = renamed {
        app.ctx.db.delete_model_entries(editor.preset_id, old)?;
        for file in stale {
            if let Err(e) = fs::remove_file(&file) {
                tracing::warn!(error = %e, "Could not remove {}", file.display());
            }
        }
        tracing::info!(from = old, to = %input.model_name, "Renamed model settings");
    }
    Ok(input.model_name)
}

fn save_as_template(app: &mut App, editor: &ModelEditorState) -> Result<String> {
    if editor.settings.is_blank() {
        return Err(AppError::Validation("nothing to save: settings are empty".into()));
    }
    let settings = parse_settings_yaml(&editor.settings.value)?;
    let name = editor.model.trimmed();
    if name.is_empty() {
        return Err(AppError::Validation("enter a model name to name the template".into()));
    }
    let description = format!("Settings saved from preset '{}'", editor.preset_name);
    app.ctx.db.save_template(name, &description, &serde_json::to_string(&settings)?)?;
    Ok(name.to_string())
}

fn handle_editor_command(app: &mut App, editor: &mut ModelEditorState, key: KeyEvent) -> Result<bool> {
    let ctrl_s = key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::F(2) => {}
        _ if ctrl_s => {}
        KeyCode::F(3) => {
            let name = save_as_template(app, editor)?;
            editor.templates = app.ctx.db.list_templates()?;
            app.status = format!("✓ Saved template '{name}'");
            return Ok(false);
        }
        KeyCode::F(4) => {
            app.status = match editor.cycle_template()? {
                Some(name) => format!("Loaded template '{name}'"),
                None => "No templates saved yet".to_string(),
            };
            return Ok(false);
        }
        _ => return Ok(false),
    }
    let model = save_model(app, editor)?;
    app.status = format!("✓ Saved settings for '{model}'");
    Ok(true)
}

pub fn handle_editor_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let Some(mut editor) = app.model_editor.take() else {
        app.screen = Screen::Advanced;
        return Ok(None);
    };

    if matches!(key.code, KeyCode::F(2) | KeyCode::F(3) | KeyCode::F(4))
        || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        match handle_editor_command(app, &mut editor, key) {
            Ok(true) => {
                app.screen = Screen::Advanced;
                if let Err(e) = refresh_models(app) {
                    app.report(e);
                }
            }
            Ok(false) => app.model_editor = Some(editor),
            Err(e) => {
                app.model_editor = Some(editor);
                app.report(e);
            }
        }
        return Ok(None);
    }

    match key.code {
        KeyCode::Esc => {
            app.screen = Screen::Advanced;
            return Ok(None);
        }
        KeyCode::Tab => editor.focus = editor.focus.shift(1),
        KeyCode::BackTab => editor.focus = editor.focus.shift(-1),
        KeyCode::Enter if !editor.focus.is_multiline() => editor.focus = editor.focus.shift(1),
        _ => {
            let focus = editor.focus;
            let input = editor.field_mut(focus);
            if focus.is_multiline() {
                handle_multiline_key(input, key);
            } else {
                handle_text_input_key(input, key);
            }
        }
    }
    app.model_editor = Some(editor);
    Ok(None)
}
