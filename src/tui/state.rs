use ratatui::widgets::ListState;

use crate::command::CommandLine;
use crate::context::Context;
use crate::error::AppError;
use crate::models::{Preset, PresetSummary};
use crate::providers::{Backend, ProviderManager};
use crate::tui::advanced::{AdvancedState, ModelEditorState};
use crate::tui::editor::EditorState;
use crate::tui::input::TextInput;
use crate::tui::preview::PreviewState;
use crate::tui::providers::{ProviderForm, ProvidersState};
use crate::tui::wizard::WizardState;

// ── Screens ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    PresetList,
    Preview,
    Wizard,
    Editor,
    Advanced,
    ModelEditor,
    Providers,
    ProviderForm,
    WizardFlags,
}

// ── Dialogs ───────────────────────────────────────────────────────────────────

/// Something a confirm dialog does when answered yes.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingAction {
    DeletePreset { id: i64, name: String },
    DeleteModel { preset_id: i64, model: String },
    DeleteBackend(Backend),
    ClearApiKey(Backend),
    DiscardEdits,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Dialog {
    Message { title: String, body: String, is_error: bool },
    Confirm { title: String, body: String, action: PendingAction },
}

/// What the UI hands back to the caller when it exits.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Quit,
    Launch { command: CommandLine, env: Vec<(String, String)> },
}

// ── Backend choice ────────────────────────────────────────────────────────────

/// Provider or endpoint a preset points at, as offered in forms.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendChoice {
    None,
    Provider(String),
    Endpoint(String),
}

impl BackendChoice {
    pub fn all(providers: &ProviderManager) -> Vec<BackendChoice> {
        std::iter::once(BackendChoice::None)
            .chain(providers.providers().keys().cloned().map(BackendChoice::Provider))
            .chain(providers.endpoints().keys().cloned().map(BackendChoice::Endpoint))
            .collect()
    }

    pub fn from_preset(preset: &Preset) -> Self {
        match (&preset.provider, &preset.endpoint) {
            (_, Some(e)) if !e.is_empty() => BackendChoice::Endpoint(e.clone()),
            (Some(p), _) if !p.is_empty() => BackendChoice::Provider(p.clone()),
            _ => BackendChoice::None,
        }
    }

    pub fn apply(&self, preset: &mut Preset) {
        let (provider, endpoint) = match self {
            BackendChoice::None => (None, None),
            BackendChoice::Provider(p) => (Some(p.clone()), None),
            BackendChoice::Endpoint(e) => (None, Some(e.clone())),
        };
        preset.provider = provider;
        preset.endpoint = endpoint;
    }

    pub fn label(&self) -> String {
        match self {
            BackendChoice::None => "(none)".to_string(),
            BackendChoice::Provider(p) => format!("provider: {p}"),
            BackendChoice::Endpoint(e) => format!("endpoint: {e}"),
        }
    }
}

/// Index of `current` in `choices`, or 0.
pub fn choice_index(choices: &[BackendChoice], current: &BackendChoice) -> usize {
    choices.iter().position(|c| c == current).unwrap_or(0)
}

// ── App state ─────────────────────────────────────────────────────────────────

pub struct App {
    pub ctx: Context,
    pub screen: Screen,
    pub dialog: Option<Dialog>,
    pub status: String,

    // preset list
    pub presets: Vec<PresetSummary>,
    pub preset_list_state: ListState,
    pub filter: TextInput,
    pub filtering: bool,

    pub preview: Option<PreviewState>,
    pub wizard: Option<WizardState>,
    pub editor: Option<EditorState>,
    pub advanced: Option<AdvancedState>,
    pub model_editor: Option<ModelEditorState>,
    pub providers: ProvidersState,
    pub provider_form: Option<ProviderForm>,
    pub wizard_flags_state: ListState,

    /// Connectivity check requested from the providers screen; the event
    /// loop runs it and clears the field.
    pub pending_check: Option<Backend>,
}

impl App {
    pub fn new(ctx: Context) -> Self {
        let mut wizard_flags_state = ListState::default();
        wizard_flags_state.select(Some(0));
        let mut app = App {
            ctx,
            screen: Screen::PresetList,
            dialog: None,
            status: String::new(),
            presets: Vec::new(),
            preset_list_state: ListState::default(),
            filter: TextInput::new(),
            filtering: false,
            preview: None,
            wizard: None,
            editor: None,
            advanced: None,
            model_editor: None,
            providers: ProvidersState::default(),
            provider_form: None,
            wizard_flags_state,
            pending_check: None,
        };
        app.refresh_presets();
        app
    }

    /// Reloads the preset list, keeping the selection in range.
    pub fn refresh_presets(&mut self) {
        match self.ctx.db.list_presets() {
            Ok(presets) => self.presets = presets,
            Err(e) => self.report(e),
        }
        self.clamp_selection();
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_presets().len();
        let selected = match self.preset_list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.preset_list_state.select(selected);
    }

    /// Presets matching the filter, case-insensitively on name or description.
    pub fn visible_presets(&self) -> Vec<&PresetSummary> {
        filter_presets(&self.presets, self.filter.trimmed())
    }

    pub fn selected_preset(&self) -> Option<&PresetSummary> {
        let i = self.preset_list_state.selected()?;
        self.visible_presets().get(i).copied()
    }

    pub fn select_preset_id(&mut self, id: i64) {
        if let Some(pos) = self.visible_presets().iter().position(|p| p.id == id) {
            self.preset_list_state.select(Some(pos));
        }
    }

    pub fn go_home(&mut self) {
        self.screen = Screen::PresetList;
        self.preview = None;
        self.wizard = None;
        self.editor = None;
        self.advanced = None;
        self.model_editor = None;
        self.provider_form = None;
        self.refresh_presets();
    }

    pub fn message(&mut self, title: &str, body: impl Into<String>) {
        self.dialog = Some(Dialog::Message { title: title.to_string(), body: body.into(), is_error: false });
    }

    pub fn confirm(&mut self, title: &str, body: impl Into<String>, action: PendingAction) {
        self.dialog = Some(Dialog::Confirm { title: title.to_string(), body: body.into(), action });
    }

    /// Surfaces an error from a user action. Input problems go to the status
    /// line so the user stays on the form; anything else is logged and shown
    /// in a dialog.
    pub fn report(&mut self, err: AppError) {
        if err.is_validation() {
            tracing::debug!(error = %err, "Rejected input");
            self.status = err.to_string();
        } else {
            tracing::error!(error = %err, screen = ?self.screen, "Action failed");
            self.dialog = Some(Dialog::Message {
                title: "Error".to_string(),
                body: err.to_string(),
                is_error: true,
            });
        }
    }
}

pub fn filter_presets<'a>(presets: &'a [PresetSummary], query: &str) -> Vec<&'a PresetSummary> {
    let query = query.to_lowercase();
    presets
        .iter()
        .filter(|p| {
            query.is_empty()
                || p.name.to_lowercase().contains(&query)
                || p.description.to_lowercase().contains(&query)
        })
        .collect()
}

/// Moves a list selection by `delta`, wrapping at both ends.
pub fn step_selection(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(len as isize) as usize;
    state.select(Some(next));
}

/// Index-based variant for cursors that are not a `ListState`.
pub fn step_index(index: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (index as isize + delta).rem_euclid(len as isize) as usize
}
