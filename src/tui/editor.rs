use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::{AppError, Result};
use crate::flags::FlagManager;
use crate::models::{normalize_flag_name, parse_bool, Preset};
use crate::tui::input::{handle_text_input_key, TextInput};
use crate::tui::state::{choice_index, step_index, App, BackendChoice, Outcome, PendingAction, Screen};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorFocus {
    Name,
    Description,
    Flags,
    Backend,
}

impl EditorFocus {
    fn next(self) -> Self {
        match self {
            EditorFocus::Name => EditorFocus::Description,
            EditorFocus::Description => EditorFocus::Flags,
            EditorFocus::Flags => EditorFocus::Backend,
            EditorFocus::Backend => EditorFocus::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            EditorFocus::Name => EditorFocus::Backend,
            EditorFocus::Description => EditorFocus::Name,
            EditorFocus::Flags => EditorFocus::Description,
            EditorFocus::Backend => EditorFocus::Flags,
        }
    }
}

/// Catalog search used to add a flag to the preset.
#[derive(Default)]
pub struct FlagPicker {
    pub query: TextInput,
    pub cursor: usize,
}

pub struct EditorState {
    pub preset: Preset,
    pub name: TextInput,
    pub description: TextInput,
    pub focus: EditorFocus,
    pub flag_cursor: usize,
    pub editing: Option<TextInput>,
    pub picker: Option<FlagPicker>,
    pub backends: Vec<BackendChoice>,
    pub backend_cursor: usize,
    pub dirty: bool,
}

impl EditorState {
    pub fn new(preset: Preset, backends: Vec<BackendChoice>) -> Self {
        let backend_cursor = choice_index(&backends, &BackendChoice::from_preset(&preset));
        EditorState {
            name: TextInput::with_value(&preset.name),
            description: TextInput::with_value(&preset.description),
            preset,
            focus: EditorFocus::Name,
            flag_cursor: 0,
            editing: None,
            picker: None,
            backends,
            backend_cursor,
            dirty: false,
        }
    }

    pub fn flag_names(&self) -> Vec<&str> {
        self.preset.flags.keys().map(String::as_str).collect()
    }

    pub fn current_flag(&self) -> Option<String> {
        self.flag_names().get(self.flag_cursor).map(|s| s.to_string())
    }

    pub fn backend(&self) -> &BackendChoice {
        self.backends.get(self.backend_cursor).unwrap_or(&BackendChoice::None)
    }

    /// Catalog flags matching the picker query that the preset lacks. A
    /// query naming no known flag is offered as a custom flag.
    pub fn picker_candidates(&self, flags: &FlagManager) -> Vec<String> {
        let Some(picker) = &self.picker else { return Vec::new() };
        let query = normalize_flag_name(picker.query.trimmed()).to_lowercase();
        let mut candidates: Vec<String> = flags
            .all_flags()
            .iter()
            .filter(|f| !f.is_deprecated && !self.preset.has_flag(&f.name))
            .filter(|f| {
                query.is_empty()
                    || f.name.contains(&query)
                    || f.category.to_lowercase().contains(&query)
            })
            .map(|f| f.name.clone())
            .collect();
        if !query.is_empty() && flags.flag(&query).is_none() && !self.preset.has_flag(&query) {
            candidates.push(query);
        }
        candidates
    }

    fn select_flag(&mut self, name: &str) {
        if let Some(pos) = self.flag_names().iter().position(|n| *n == name) {
            self.flag_cursor = pos;
        }
    }

    /// The edited preset with form fields applied.
    pub fn to_preset(&self) -> Preset {
        let mut preset = self.preset.clone();
        preset.name = self.name.trimmed().to_string();
        preset.description = self.description.trimmed().to_string();
        self.backend().apply(&mut preset);
        preset
    }
}

pub fn open_editor(app: &mut App, preset_id: i64) -> Result<()> {
    let preset = app.ctx.db.preset(preset_id)?;
    let backends = BackendChoice::all(&app.ctx.providers);
    app.editor = Some(EditorState::new(preset, backends));
    app.status.clear();
    app.screen = Screen::Editor;
    Ok(())
}

/// Validates known flags, then writes the preset and its flags.
pub fn save(app: &mut App, editor: &EditorState) -> Result<i64> {
    let preset = editor.to_preset();
    if preset.name.is_empty() {
        return Err(AppError::Validation("preset name cannot be empty".into()));
    }
    for (name, value) in &preset.flags {
        if app.ctx.flags.flag(name).is_some() {
            app.ctx.flags.validate_flag(name, value.as_deref())?;
        }
    }
    let id = app.ctx.db.save_preset(&preset)?;
    tracing::info!(id, name = %preset.name, "Preset updated");
    Ok(id)
}

// ── Keys ──────────────────────────────────────────────────────────────────────

fn start_value_edit(app: &App, editor: &mut EditorState, name: &str) {
    let known = app.ctx.flags.flag(name);
    if known.is_some_and(|f| f.value_type.is_boolean()) {
        let on = editor
            .preset
            .flags
            .get(name)
            .and_then(|v| v.as_deref())
            .map(|v| parse_bool(v).unwrap_or(true))
            .unwrap_or(true);
        editor.preset.set_flag(name, Some(if on { "false" } else { "true" }));
        editor.dirty = true;
        return;
    }
    let current = editor
        .preset
        .flags
        .get(name)
        .and_then(|v| v.clone())
        .or_else(|| known.and_then(|f| f.default_value.clone()))
        .unwrap_or_default();
    editor.editing = Some(TextInput::with_value(&current));
}

fn handle_picker_keys(app: &App, editor: &mut EditorState, key: KeyEvent) {
    let candidates = editor.picker_candidates(&app.ctx.flags);
    let Some(picker) = editor.picker.as_mut() else { return };
    match key.code {
        KeyCode::Esc => editor.picker = None,
        KeyCode::Up => picker.cursor = step_index(picker.cursor, candidates.len(), -1),
        KeyCode::Down => picker.cursor = step_index(picker.cursor, candidates.len(), 1),
        KeyCode::Enter => {
            let Some(name) = candidates.get(picker.cursor).cloned() else { return };
            editor.picker = None;
            let boolean = app.ctx.flags.flag(&name).is_some_and(|f| f.value_type.is_boolean());
            editor.preset.set_flag(&name, if boolean { Some("true") } else { None });
            editor.select_flag(&name);
            editor.dirty = true;
            if !boolean {
                start_value_edit(app, editor, &name);
            }
        }
        _ => {
            if handle_text_input_key(&mut picker.query, key) {
                picker.cursor = 0;
            }
        }
    }
}

fn handle_value_keys(app: &App, editor: &mut EditorState, key: KeyEvent) -> Result<()> {
    let Some(input) = editor.editing.as_mut() else { return Ok(()) };
    match key.code {
        KeyCode::Esc => editor.editing = None,
        KeyCode::Enter => {
            let value = input.trimmed().to_string();
            let Some(name) = editor.current_flag() else {
                editor.editing = None;
                return Ok(());
            };
            let value = (!value.is_empty()).then_some(value);
            if app.ctx.flags.flag(&name).is_some() {
                app.ctx.flags.validate_flag(&name, value.as_deref())?;
            }
            editor.preset.set_flag(&name, value.as_deref());
            editor.editing = None;
            editor.dirty = true;
        }
        _ => {
            handle_text_input_key(input, key);
        }
    }
    Ok(())
}

fn handle_focus_keys(app: &mut App, editor: &mut EditorState, key: KeyEvent) {
    match editor.focus {
        EditorFocus::Name => {
            if handle_text_input_key(&mut editor.name, key) {
                editor.dirty = true;
            }
        }
        EditorFocus::Description => {
            if handle_text_input_key(&mut editor.description, key) {
                editor.dirty = true;
            }
        }
        EditorFocus::Flags => {
            let len = editor.preset.flags.len();
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => editor.flag_cursor = step_index(editor.flag_cursor, len, -1),
                KeyCode::Down | KeyCode::Char('j') => editor.flag_cursor = step_index(editor.flag_cursor, len, 1),
                KeyCode::Char('a') | KeyCode::Char('+') => editor.picker = Some(FlagPicker::default()),
                KeyCode::Enter | KeyCode::Char('e') => {
                    if let Some(name) = editor.current_flag() {
                        start_value_edit(app, editor, &name);
                    }
                }
                KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete => {
                    if let Some(name) = editor.current_flag() {
                        editor.preset.remove_flag(&name);
                        editor.flag_cursor = editor.flag_cursor.min(len.saturating_sub(2));
                        editor.dirty = true;
                        app.status = format!("Removed --{name}");
                    }
                }
                _ => {}
            }
        }
        EditorFocus::Backend => {
            let len = editor.backends.len();
            let delta = match key.code {
                KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => -1,
                KeyCode::Down | KeyCode::Right | KeyCode::Char('j') | KeyCode::Char(' ') => 1,
                _ => 0,
            };
            if delta != 0 {
                editor.backend_cursor = step_index(editor.backend_cursor, len, delta);
                editor.dirty = true;
            }
        }
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let Some(mut editor) = app.editor.take() else {
        app.go_home();
        return Ok(None);
    };

    if editor.picker.is_some() {
        handle_picker_keys(app, &mut editor, key);
        app.editor = Some(editor);
        return Ok(None);
    }
    if editor.editing.is_some() {
        if let Err(e) = handle_value_keys(app, &mut editor, key) {
            app.report(e);
        }
        app.editor = Some(editor);
        return Ok(None);
    }

    let save_key = key.code == KeyCode::F(2)
        || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL));
    if save_key {
        match save(app, &editor) {
            Ok(id) => {
                let name = editor.name.trimmed().to_string();
                app.go_home();
                app.select_preset_id(id);
                app.status = format!("✓ Saved preset '{name}'");
            }
            Err(e) => {
                app.editor = Some(editor);
                app.report(e);
            }
        }
        return Ok(None);
    }

    match key.code {
        KeyCode::Esc => {
            let dirty = editor.dirty;
            app.editor = Some(editor);
            if dirty {
                app.confirm("Discard changes?", "The preset has unsaved changes.", PendingAction::DiscardEdits);
            } else {
                app.go_home();
            }
            return Ok(None);
        }
        KeyCode::Tab => editor.focus = editor.focus.next(),
        KeyCode::BackTab => editor.focus = editor.focus.prev(),
        _ => handle_focus_keys(app, &mut editor, key),
    }
    app.editor = Some(editor);
    Ok(None)
}
