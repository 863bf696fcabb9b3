use aider_start::advanced::{metadata_file_name, settings_file_name, settings_json_to_yaml};
use aider_start::db::Database;
use aider_start::flags::catalog;
use aider_start::paths::AppPaths;
use aider_start::secrets::MemoryStore;
use aider_start::tui::{handle_key, render_to_buffer, App, Dialog, Outcome, PendingAction, Screen};
use aider_start::{Context, Preset};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;

// ── helpers ───────────────────────────────────────────────────────────────────

fn make_app() -> (TempDir, App) {
    let dir = TempDir::new().unwrap();
    let paths = AppPaths::with_dirs(dir.path().join("data"), dir.path().join("legacy"));
    let ctx = Context::with_database(paths, Database::open_in_memory().unwrap(), Box::new(MemoryStore::new()))
        .unwrap();
    (dir, App::new(ctx))
}

fn make_app_with_preset(preset: Preset) -> (TempDir, App, i64) {
    let (dir, mut app) = make_app();
    let id = app.ctx.db.save_preset(&preset).unwrap();
    app.refresh_presets();
    (dir, app, id)
}

fn press(app: &mut App, code: KeyCode) -> Option<Outcome> {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_str(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

/// Collect all visible characters from a buffer row into a String.
fn buffer_row(buf: &ratatui::buffer::Buffer, row: u16) -> String {
    let width = buf.area().width;
    (0..width).map(|col| buf[(col, row)].symbol().chars().next().unwrap_or(' ')).collect()
}

/// Collect the entire buffer as a single string (rows joined by newline).
fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    let height = buf.area().height;
    (0..height).map(|r| buffer_row(buf, r)).collect::<Vec<_>>().join("\n")
}

// ── Preset list ───────────────────────────────────────────────────────────────

#[test]
fn new_app_starts_on_the_list() {
    let (_dir, app) = make_app();
    assert_eq!(app.screen, Screen::PresetList);
    assert!(app.presets.is_empty());
    assert!(app.dialog.is_none());
}

#[test]
fn q_and_ctrl_c_quit() {
    let (_dir, mut app) = make_app();
    assert_eq!(press(&mut app, KeyCode::Char('q')), Some(Outcome::Quit));
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(handle_key(&mut app, ctrl_c), Some(Outcome::Quit));
}

#[test]
fn filter_narrows_the_list() {
    let (_dir, mut app) = make_app();
    app.ctx.db.save_preset(&Preset::new("daily")).unwrap();
    app.ctx.db.save_preset(&Preset::new("review")).unwrap();
    app.refresh_presets();

    press(&mut app, KeyCode::Char('/'));
    assert!(app.filtering);
    type_str(&mut app, "rev");
    assert_eq!(app.visible_presets().len(), 1);
    assert_eq!(app.selected_preset().unwrap().name, "review");

    press(&mut app, KeyCode::Esc);
    assert!(!app.filtering);
    assert_eq!(app.visible_presets().len(), 2);
}

#[test]
fn enter_opens_the_launch_preview() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p").with_flag("model", Some("gpt-4o")));
    assert_eq!(press(&mut app, KeyCode::Enter), None);
    assert_eq!(app.screen, Screen::Preview);
    let preview = app.preview.as_ref().unwrap();
    assert_eq!(preview.command.arg_value("--model"), Some("gpt-4o"));

    match press(&mut app, KeyCode::Enter) {
        Some(Outcome::Launch { command, .. }) => assert!(command.has_arg("--model")),
        other => panic!("expected launch, got {other:?}"),
    }
}

#[test]
fn preview_escape_returns_home() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p"));
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen, Screen::PresetList);
    assert!(app.preview.is_none());
}

#[test]
fn delete_asks_for_confirmation() {
    let (_dir, mut app, id) = make_app_with_preset(Preset::new("doomed"));
    press(&mut app, KeyCode::Char('d'));
    match &app.dialog {
        Some(Dialog::Confirm { action, .. }) => {
            assert_eq!(action, &PendingAction::DeletePreset { id, name: "doomed".into() })
        }
        other => panic!("expected confirm, got {other:?}"),
    }

    press(&mut app, KeyCode::Char('n'));
    assert!(app.dialog.is_none());
    assert_eq!(app.status, "Cancelled");
    assert_eq!(app.presets.len(), 1);

    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Char('y'));
    assert!(app.presets.is_empty());
    assert!(app.status.contains("Deleted preset 'doomed'"));
}

#[test]
fn dialogs_swallow_other_keys() {
    let (_dir, mut app) = make_app();
    app.message("Hi", "body");
    assert_eq!(press(&mut app, KeyCode::Char('q')), None);
    assert!(app.dialog.is_none());
    app.message("Hi", "body");
    press(&mut app, KeyCode::Char('x'));
    assert!(app.dialog.is_some());
}

// ── Wizard ────────────────────────────────────────────────────────────────────

#[test]
fn wizard_creates_a_preset() {
    let (_dir, mut app) = make_app();
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.screen, Screen::Wizard);

    type_str(&mut app, "quick");
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "fast edits");
    press(&mut app, KeyCode::Enter);

    let wizard = app.wizard.as_mut().unwrap();
    let main = wizard.categories.iter().position(|c| c == catalog::MAIN_MODEL).unwrap();
    wizard.category_cursor = main;
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Enter);

    let wizard = app.wizard.as_mut().unwrap();
    let model = wizard.flags.iter().position(|f| f.name == "model").unwrap();
    wizard.flag_cursor = model;
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "gpt-4o");
    press(&mut app, KeyCode::Enter);
    assert_eq!(
        app.wizard.as_ref().unwrap().value_of("model"),
        Some(&Some("gpt-4o".to_string()))
    );

    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.screen, Screen::PresetList);
    assert!(app.status.contains("Created preset 'quick'"));
    let saved = app.ctx.db.preset_by_name("quick").unwrap().unwrap();
    assert_eq!(saved.description, "fast edits");
    assert_eq!(saved.model(), Some("gpt-4o"));
    assert_eq!(app.selected_preset().unwrap().name, "quick");
}

#[test]
fn wizard_rejects_blank_and_duplicate_names() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("taken"));
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Enter);
    assert!(app.status.contains("cannot be empty"));
    assert!(app.wizard.is_some());

    type_str(&mut app, "taken");
    press(&mut app, KeyCode::Enter);
    assert!(app.status.contains("already exists"));
    assert!(app.dialog.is_none());
}

#[test]
fn wizard_escape_from_first_step_cancels() {
    let (_dir, mut app) = make_app();
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen, Screen::PresetList);
    assert!(app.wizard.is_none());
}

// ── Editor ────────────────────────────────────────────────────────────────────

#[test]
fn editor_adds_a_flag_and_saves() {
    let (_dir, mut app, id) = make_app_with_preset(Preset::new("p").with_flag("model", Some("gpt-4o")));
    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.screen, Screen::Editor);

    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('a'));
    type_str(&mut app, "map-tokens");
    let candidates = app.editor.as_ref().unwrap().picker_candidates(&app.ctx.flags);
    assert_eq!(candidates.first().map(String::as_str), Some("map-tokens"));
    press(&mut app, KeyCode::Enter);
    assert!(app.editor.as_ref().unwrap().editing.is_some());
    type_str(&mut app, "1024");
    press(&mut app, KeyCode::Enter);

    press(&mut app, KeyCode::F(2));
    assert_eq!(app.screen, Screen::PresetList);
    assert!(app.status.contains("Saved preset 'p'"));
    let saved = app.ctx.db.preset(id).unwrap();
    assert_eq!(saved.flag_value("map-tokens"), Some("1024"));
    assert_eq!(saved.model(), Some("gpt-4o"));
}

#[test]
fn picker_reads_underscores_as_dashes() {
    let (_dir, mut app, id) = make_app_with_preset(Preset::new("p"));
    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('a'));
    type_str(&mut app, "auto_commits");
    let candidates = app.editor.as_ref().unwrap().picker_candidates(&app.ctx.flags);
    assert_eq!(candidates, vec!["auto-commits".to_string()]);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::F(2));
    assert_eq!(app.ctx.db.preset(id).unwrap().flag_value("auto-commits"), Some("true"));
}

#[test]
fn editor_rejects_bad_values() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p").with_flag("map-tokens", Some("1")));
    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Backspace);
    type_str(&mut app, "lots");
    press(&mut app, KeyCode::Enter);
    assert!(app.status.contains("expected an integer"));
    assert!(app.editor.as_ref().unwrap().editing.is_some());
}

#[test]
fn editor_toggles_booleans_in_place() {
    let (_dir, mut app, id) = make_app_with_preset(Preset::new("p").with_flag("stream", None));
    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.editor.as_ref().unwrap().preset.flag_value("stream"), Some("false"));
    press(&mut app, KeyCode::F(2));
    assert_eq!(app.ctx.db.preset(id).unwrap().flag_value("stream"), Some("false"));
}

#[test]
fn leaving_a_dirty_editor_asks_first() {
    let (_dir, mut app, id) = make_app_with_preset(Preset::new("p").with_flag("stream", None));
    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Esc);
    assert!(matches!(
        app.dialog,
        Some(Dialog::Confirm { action: PendingAction::DiscardEdits, .. })
    ));
    press(&mut app, KeyCode::Char('y'));
    assert_eq!(app.screen, Screen::PresetList);
    assert!(app.ctx.db.preset(id).unwrap().has_flag("stream"));
}

// ── Model settings ────────────────────────────────────────────────────────────

#[test]
fn model_settings_are_saved_from_the_editor() {
    let (dir, mut app, id) = make_app_with_preset(Preset::new("p").with_flag("model", Some("gpt-4o")));
    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.screen, Screen::Advanced);
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.screen, Screen::ModelEditor);

    type_str(&mut app, "gpt-4o");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    type_str(&mut app, "edit_format: diff");
    press(&mut app, KeyCode::F(2));

    assert_eq!(app.screen, Screen::Advanced);
    assert!(app.status.contains("Saved settings for 'gpt-4o'"));
    assert_eq!(app.advanced.as_ref().unwrap().models.len(), 1);
    let file = dir
        .path()
        .join("data")
        .join("presets_config")
        .join(id.to_string())
        .join("gpt-4o.model.settings.yml");
    assert!(file.exists());
}

#[test]
fn templates_are_saved_and_loaded_in_the_model_editor() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p"));
    press(&mut app, KeyCode::Char('a'));
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::F(4));
    assert!(app.status.contains("No templates saved yet"));

    type_str(&mut app, "gpt-4o");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    type_str(&mut app, "edit_format: diff");
    press(&mut app, KeyCode::F(3));
    assert!(app.status.contains("Saved template 'gpt-4o'"));
    assert_eq!(app.screen, Screen::ModelEditor);

    let templates = app.ctx.db.list_templates().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].name, "gpt-4o");
    assert!(templates[0].settings_json.contains("edit_format"));

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen, Screen::Advanced);
    press(&mut app, KeyCode::Char('n'));
    assert!(app.model_editor.as_ref().unwrap().settings.is_blank());
    press(&mut app, KeyCode::F(4));
    assert!(app.status.contains("Loaded template 'gpt-4o'"));
    let expected = settings_json_to_yaml(&templates[0].settings_json).unwrap();
    assert_eq!(app.model_editor.as_ref().unwrap().settings.value, expected);
    assert!(expected.contains("edit_format: diff"));
}

#[test]
fn template_needs_settings_text() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p"));
    press(&mut app, KeyCode::Char('a'));
    press(&mut app, KeyCode::Char('n'));
    type_str(&mut app, "gpt-4o");
    press(&mut app, KeyCode::F(3));
    assert!(app.status.contains("settings are empty"));
    assert!(app.ctx.db.list_templates().unwrap().is_empty());
}

#[test]
fn renaming_a_model_moves_its_generated_files() {
    let (dir, mut app, id) = make_app_with_preset(Preset::new("p"));
    let config_dir = dir.path().join("data").join("presets_config").join(id.to_string());
    press(&mut app, KeyCode::Char('a'));
    press(&mut app, KeyCode::Char('n'));
    type_str(&mut app, "old-model");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    type_str(&mut app, "edit_format: diff");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    type_str(&mut app, r#"{"max_tokens": 4096}"#);
    press(&mut app, KeyCode::F(2));
    assert!(config_dir.join(settings_file_name("old-model")).exists());
    assert!(config_dir.join(metadata_file_name("old-model")).exists());

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen, Screen::ModelEditor);
    press(&mut app, KeyCode::BackTab);
    press(&mut app, KeyCode::BackTab);
    for _ in 0.."old-model".len() {
        press(&mut app, KeyCode::Backspace);
    }
    type_str(&mut app, "new-model");
    press(&mut app, KeyCode::F(2));
    assert_eq!(app.screen, Screen::Advanced);

    let settings = config_dir.join(settings_file_name("new-model"));
    assert!(settings.exists());
    assert!(config_dir.join(metadata_file_name("new-model")).exists());
    assert!(!config_dir.join(settings_file_name("old-model")).exists());
    assert!(!config_dir.join(metadata_file_name("old-model")).exists());
    let stored = app.ctx.db.model_settings(Some(id), Some("new-model")).unwrap().unwrap();
    assert_eq!(stored.file_path, Some(settings.display().to_string()));
    assert!(app.ctx.db.model_settings(Some(id), Some("old-model")).unwrap().is_none());
}

#[test]
fn empty_model_editor_reports_on_status_line() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p"));
    press(&mut app, KeyCode::Char('a'));
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::F(2));
    assert_eq!(app.screen, Screen::ModelEditor);
    assert!(app.status.contains("model name cannot be empty"));
}

// ── Providers ─────────────────────────────────────────────────────────────────

#[test]
fn providers_screen_lists_defaults() {
    let (_dir, mut app) = make_app();
    press(&mut app, KeyCode::Char('p'));
    assert_eq!(app.screen, Screen::Providers);
    let names: Vec<&str> = app.providers.rows.iter().map(|r| r.backend.name()).collect();
    assert_eq!(names, vec!["anthropic", "mistral", "openai"]);
}

#[test]
fn endpoint_form_adds_an_endpoint() {
    let (_dir, mut app) = make_app();
    press(&mut app, KeyCode::Char('p'));
    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.screen, Screen::ProviderForm);

    type_str(&mut app, "local");
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "http://localhost:11434/v1");
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "llama3, qwen2");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "local-key-123");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.screen, Screen::Providers);
    assert!(app.status.contains("Saved endpoint 'local'"));
    let endpoint = app.ctx.providers.endpoint("local").unwrap();
    assert_eq!(endpoint.models, vec!["llama3", "qwen2"]);
    assert_eq!(endpoint.api_type.as_deref(), Some("openai"));
    assert_eq!(app.ctx.providers.endpoint_api_key("local").unwrap().as_deref(), Some("local-key-123"));
    assert!(app.providers.rows.iter().any(|r| r.kind() == "endpoint" && r.has_key));
}

#[test]
fn clearing_a_key_asks_first() {
    let (_dir, mut app) = make_app();
    app.ctx.providers.set_api_key("anthropic", "sk-ant-test-123456").unwrap();
    press(&mut app, KeyCode::Char('p'));
    assert!(app.providers.selected().unwrap().has_key);

    press(&mut app, KeyCode::Char('x'));
    assert!(matches!(
        app.dialog,
        Some(Dialog::Confirm { action: PendingAction::ClearApiKey(_), .. })
    ));
    press(&mut app, KeyCode::Char('y'));
    assert!(app.status.contains("Cleared API key for 'anthropic'"));
    assert!(!app.ctx.providers.has_api_key("anthropic"));
    assert!(!app.providers.selected().unwrap().has_key);
    assert!(app.ctx.providers.provider("anthropic").is_ok());

    press(&mut app, KeyCode::Char('x'));
    press(&mut app, KeyCode::Char('y'));
    assert!(app.status.contains("No API key stored"));
}

#[test]
fn invalid_form_input_stays_on_the_form() {
    let (_dir, mut app) = make_app();
    press(&mut app, KeyCode::Char('p'));
    press(&mut app, KeyCode::Char('a'));
    type_str(&mut app, "bad name");
    for _ in 0..5 {
        press(&mut app, KeyCode::Enter);
    }
    assert_eq!(app.screen, Screen::ProviderForm);
    assert!(app.status.contains("invalid endpoint name"));
}

#[test]
fn connection_check_is_queued_for_the_loop() {
    let (_dir, mut app) = make_app();
    press(&mut app, KeyCode::Char('p'));
    press(&mut app, KeyCode::Char('t'));
    assert!(app.pending_check.is_some());
}

// ── Wizard flags ──────────────────────────────────────────────────────────────

#[test]
fn wizard_flags_toggle_visibility() {
    let (_dir, mut app) = make_app();
    press(&mut app, KeyCode::Char('w'));
    assert_eq!(app.screen, Screen::WizardFlags);

    let first = app.ctx.flags.all_flags()[0].clone();
    press(&mut app, KeyCode::Char(' '));
    assert_eq!(app.ctx.flags.flag(&first.name).unwrap().wizard_visible, !first.wizard_visible);
    assert!(app.status.contains(&first.name));
    press(&mut app, KeyCode::Char(' '));
    assert_eq!(app.ctx.flags.flag(&first.name).unwrap().wizard_visible, first.wizard_visible);

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen, Screen::PresetList);
}

// ── Rendering ─────────────────────────────────────────────────────────────────

#[test]
fn empty_list_renders_hint() {
    let (_dir, mut app) = make_app();
    let text = buffer_text(&render_to_buffer(&mut app, 100, 30));
    assert!(text.contains("aider-start"));
    assert!(text.contains("Presets"));
}

#[test]
fn list_renders_preset_and_command() {
    let (_dir, mut app, _) = make_app_with_preset(
        Preset::new("daily").with_flag("model", Some("gpt-4o")).with_flag("stream", None),
    );
    let text = buffer_text(&render_to_buffer(&mut app, 120, 30));
    assert!(text.contains("daily"));
    assert!(text.contains("aider --model gpt-4o --stream"));
}

#[test]
fn every_screen_renders() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p").with_flag("model", Some("gpt-4o")));
    let screens = [
        (KeyCode::Enter, "Launch"),
        (KeyCode::Char('n'), "New preset"),
        (KeyCode::Char('e'), "Edit preset"),
        (KeyCode::Char('a'), "Model settings"),
        (KeyCode::Char('p'), "Providers & endpoints"),
        (KeyCode::Char('w'), "Wizard flags"),
    ];
    for (key, title) in screens {
        app.go_home();
        press(&mut app, key);
        let text = buffer_text(&render_to_buffer(&mut app, 120, 40));
        assert!(text.contains(title), "missing title {title}");
    }
}

#[test]
fn confirm_dialog_renders_on_top() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("doomed"));
    press(&mut app, KeyCode::Char('d'));
    let text = buffer_text(&render_to_buffer(&mut app, 100, 30));
    assert!(text.contains("Delete preset?"));
}

#[test]
fn tiny_terminal_does_not_panic() {
    let (_dir, mut app, _) = make_app_with_preset(Preset::new("p"));
    render_to_buffer(&mut app, 20, 6);
    press(&mut app, KeyCode::Char('n'));
    render_to_buffer(&mut app, 20, 6);
}
