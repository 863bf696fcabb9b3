// ── Providers and endpoints ──────────────────────────────────────────────────

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;

use crate::config::{EndpointRecord, ProviderRecord};
use crate::error::{AppError, Result};
use crate::providers::{Backend, ProviderManager};
use crate::tui::input::{handle_text_input_key, TextInput};
use crate::tui::state::{step_selection, App, Outcome, PendingAction, Screen};

/// One line of the providers screen.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendRow {
    pub backend: Backend,
    pub description: String,
    pub api_url: String,
    pub model_count: usize,
    pub has_key: bool,
}

impl BackendRow {
    pub fn kind(&self) -> &'static str {
        match self.backend {
            Backend::Provider(_) => "provider",
            Backend::Endpoint(_) => "endpoint",
        }
    }
}

#[derive(Default)]
pub struct ProvidersState {
    pub rows: Vec<BackendRow>,
    pub list_state: ListState,
}

impl ProvidersState {
    pub fn refresh(&mut self, manager: &ProviderManager) {
        let providers = manager.providers().iter().map(|(name, p)| BackendRow {
            backend: Backend::Provider(name.clone()),
            description: p.description.clone(),
            api_url: p.api_url.clone(),
            model_count: p.models.len(),
            has_key: manager.has_api_key(name),
        });
        let endpoints = manager.endpoints().iter().map(|(name, e)| BackendRow {
            backend: Backend::Endpoint(name.clone()),
            description: e.description.clone(),
            api_url: e.api_url.clone(),
            model_count: e.models.len(),
            has_key: matches!(manager.endpoint_api_key(name), Ok(Some(_))),
        });
        self.rows = providers.chain(endpoints).collect();
        let len = self.rows.len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn selected(&self) -> Option<&BackendRow> {
        self.rows.get(self.list_state.selected()?)
    }
}

pub fn open_providers(app: &mut App) {
    app.providers.refresh(&app.ctx.providers);
    app.provider_form = None;
    app.screen = Screen::Providers;
}

pub fn handle_list_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let len = app.providers.rows.len();
    let selected = app.providers.selected().map(|r| r.backend.clone());
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => step_selection(&mut app.providers.list_state, len, -1),
        KeyCode::Down | KeyCode::Char('j') => step_selection(&mut app.providers.list_state, len, 1),
        KeyCode::Char('a') => open_form(app, ProviderForm::add(FormKind::Endpoint)),
        KeyCode::Char('P') => open_form(app, ProviderForm::add(FormKind::Provider)),
        KeyCode::Char('K') | KeyCode::Char('s') => {
            if let Some(backend) = selected {
                open_form(app, ProviderForm::api_key(backend));
            }
        }
        KeyCode::Char('x') => {
            if let Some(backend) = selected {
                app.confirm(
                    "Clear API key?",
                    format!("Remove the stored API key for {} '{}'?", kind_label(&backend), backend.name()),
                    PendingAction::ClearApiKey(backend),
                );
            }
        }
        KeyCode::Char('m') => {
            if let Some(backend) = selected {
                open_form(app, ProviderForm::add_model(backend));
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(backend) = selected {
                app.confirm(
                    "Delete backend?",
                    format!("Delete {} '{}' and its stored API key?", kind_label(&backend), backend.name()),
                    PendingAction::DeleteBackend(backend),
                );
            }
        }
        KeyCode::Char('t') => {
            if let Some(backend) = selected {
                app.status = format!("Checking {}…", backend.name());
                app.pending_check = Some(backend);
            }
        }
        KeyCode::Char('r') => app.providers.refresh(&app.ctx.providers),
        KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
        _ => {}
    }
    Ok(None)
}

fn kind_label(backend: &Backend) -> &'static str {
    match backend {
        Backend::Provider(_) => "provider",
        Backend::Endpoint(_) => "endpoint",
    }
}

/// Removes a provider or endpoint together with its stored key.
pub fn delete_backend(app: &mut App, backend: &Backend) -> Result<()> {
    match backend {
        Backend::Provider(name) => app.ctx.providers.delete_provider(name)?,
        Backend::Endpoint(name) => app.ctx.providers.delete_endpoint(name)?,
    }
    app.providers.refresh(&app.ctx.providers);
    app.status = format!("✓ Deleted {} '{}'", kind_label(backend), backend.name());
    Ok(())
}

pub fn clear_api_key(app: &mut App, backend: &Backend) -> Result<()> {
    let removed = match backend {
        Backend::Provider(name) => app.ctx.providers.delete_api_key(name)?,
        Backend::Endpoint(name) => app.ctx.providers.delete_endpoint_api_key(name)?,
    };
    app.providers.refresh(&app.ctx.providers);
    app.status = if removed {
        format!("✓ Cleared API key for '{}'", backend.name())
    } else {
        format!("No API key stored for '{}'", backend.name())
    };
    Ok(())
}

// ── Form ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Provider,
    Endpoint,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormMode {
    Add(FormKind),
    ApiKey(Backend),
    AddModel(Backend),
}

pub struct ProviderForm {
    pub mode: FormMode,
    pub name: TextInput,
    pub url: TextInput,
    pub models: TextInput,
    pub api_type: TextInput,
    pub api_key: TextInput,
    pub model: TextInput,
    pub focus: usize,
}

impl ProviderForm {
    fn empty(mode: FormMode) -> Self {
        ProviderForm {
            mode,
            name: TextInput::new(),
            url: TextInput::new(),
            models: TextInput::new(),
            api_type: TextInput::new(),
            api_key: TextInput::new(),
            model: TextInput::new(),
            focus: 0,
        }
    }

    pub fn add(kind: FormKind) -> Self {
        let mut form = Self::empty(FormMode::Add(kind));
        if kind == FormKind::Endpoint {
            form.api_type.set("openai");
        }
        form
    }

    pub fn api_key(backend: Backend) -> Self {
        Self::empty(FormMode::ApiKey(backend))
    }

    pub fn add_model(backend: Backend) -> Self {
        Self::empty(FormMode::AddModel(backend))
    }

    pub fn title(&self) -> String {
        match &self.mode {
            FormMode::Add(FormKind::Provider) => "Add provider".to_string(),
            FormMode::Add(FormKind::Endpoint) => "Add endpoint".to_string(),
            FormMode::ApiKey(b) => format!("API key for {}", b.name()),
            FormMode::AddModel(b) => format!("Add model to {}", b.name()),
        }
    }

    /// Labels of the fields shown for this mode, in focus order.
    pub fn labels(&self) -> Vec<&'static str> {
        match &self.mode {
            FormMode::Add(FormKind::Provider) => vec!["Name", "API URL", "Models", "API key"],
            FormMode::Add(FormKind::Endpoint) => {
                vec!["Name", "API URL", "Models", "API type", "API key"]
            }
            FormMode::ApiKey(_) => vec!["API key"],
            FormMode::AddModel(_) => vec!["Model"],
        }
    }

    pub fn field(&self, index: usize) -> Option<&TextInput> {
        let label = *self.labels().get(index)?;
        Some(match label {
            "Name" => &self.name,
            "API URL" => &self.url,
            "Models" => &self.models,
            "API type" => &self.api_type,
            "API key" => &self.api_key,
            _ => &self.model,
        })
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut TextInput> {
        let label = *self.labels().get(index)?;
        Some(match label {
            "Name" => &mut self.name,
            "API URL" => &mut self.url,
            "Models" => &mut self.models,
            "API type" => &mut self.api_type,
            "API key" => &mut self.api_key,
            _ => &mut self.model,
        })
    }

    pub fn is_secret(&self, index: usize) -> bool {
        self.labels().get(index) == Some(&"API key")
    }

    fn model_list(&self) -> Vec<String> {
        self.models
            .value
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn key(&self) -> Option<&str> {
        Some(self.api_key.trimmed()).filter(|k| !k.is_empty())
    }

    /// Applies the form to the provider manager. Returns a status line.
    pub fn submit(&self, manager: &mut ProviderManager) -> Result<String> {
        match &self.mode {
            FormMode::Add(kind) => {
                let name = self.name.trimmed();
                let url = self.url.trimmed().to_string();
                match kind {
                    FormKind::Provider => {
                        let record = ProviderRecord { api_url: url, models: self.model_list(), ..Default::default() };
                        manager.add_provider(name, record, self.key())?;
                        Ok(format!("✓ Saved provider '{name}'"))
                    }
                    FormKind::Endpoint => {
                        let api_type = Some(self.api_type.trimmed().to_string()).filter(|t| !t.is_empty());
                        let record = EndpointRecord { api_url: url, models: self.model_list(), api_type, ..Default::default() };
                        manager.add_endpoint(name, record, self.key())?;
                        Ok(format!("✓ Saved endpoint '{name}'"))
                    }
                }
            }
            FormMode::ApiKey(backend) => {
                let key = self.key().ok_or_else(|| AppError::Validation("API key cannot be empty".into()))?;
                match backend {
                    Backend::Provider(name) => manager.set_api_key(name, key)?,
                    Backend::Endpoint(name) => manager.set_endpoint_api_key(name, key)?,
                }
                Ok(format!("✓ Stored API key for '{}'", backend.name()))
            }
            FormMode::AddModel(backend) => {
                let model = self.model.trimmed();
                if model.is_empty() {
                    return Err(AppError::Validation("model name cannot be empty".into()));
                }
                let added = match backend {
                    Backend::Provider(name) => manager.add_provider_model(name, model)?,
                    Backend::Endpoint(name) => {
                        let mut record = manager.endpoint(name)?.clone();
                        if record.models.iter().any(|m| m == model) {
                            false
                        } else {
                            record.models.push(model.to_string());
                            manager.add_endpoint(name, record, None)?;
                            true
                        }
                    }
                };
                Ok(if added {
                    format!("✓ Added model '{model}'")
                } else {
                    format!("'{model}' is already listed")
                })
            }
        }
    }
}

fn open_form(app: &mut App, form: ProviderForm) {
    app.provider_form = Some(form);
    app.status.clear();
    app.screen = Screen::ProviderForm;
}

pub fn handle_form_key(app: &mut App, key: KeyEvent) -> Result<Option<Outcome>> {
    let Some(form) = app.provider_form.as_mut() else {
        app.screen = Screen::Providers;
        return Ok(None);
    };
    let count = form.labels().len();
    match key.code {
        KeyCode::Esc => {
            app.provider_form = None;
            app.screen = Screen::Providers;
        }
        KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % count,
        KeyCode::BackTab | KeyCode::Up => form.focus = (form.focus + count - 1) % count,
        KeyCode::Enter if form.focus + 1 < count => form.focus += 1,
        KeyCode::Enter => {
            let result = form.submit(&mut app.ctx.providers);
            match result {
                Ok(status) => {
                    app.provider_form = None;
                    app.providers.refresh(&app.ctx.providers);
                    app.screen = Screen::Providers;
                    app.status = status;
                }
                Err(e) => app.report(e),
            }
        }
        _ => {
            let focus = form.focus;
            if let Some(input) = form.field_mut(focus) {
                handle_text_input_key(input, key);
            }
        }
    }
    Ok(None)
}
