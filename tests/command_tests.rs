use aider_start::config::{EndpointRecord, LegacyProfile, ProviderRecord};
use aider_start::db::Database;
use aider_start::paths::AppPaths;
use aider_start::secrets::MemoryStore;
use aider_start::{build_command, AppError, CommandBuilder, Context, Executor, LaunchMode, Preset};
use serde_json::json;
use tempfile::TempDir;

fn context(dir: &TempDir) -> Context {
    let paths = AppPaths::with_dirs(dir.path().join("data"), dir.path().join("legacy"));
    Context::with_database(paths, Database::open_in_memory().unwrap(), Box::new(MemoryStore::new()))
        .unwrap()
}

fn local_endpoint() -> EndpointRecord {
    EndpointRecord {
        description: "Local server".into(),
        api_url: "http://localhost:11434/v1".into(),
        models: vec!["llama3".into()],
        api_type: Some("openai".into()),
        api_key: None,
    }
}

// ── Flag rendering ────────────────────────────────────────────────────────────

#[test]
fn renders_values_and_switches() {
    let preset = Preset::new("p").with_flag("model", Some("gpt-4o")).with_flag("stream", None);
    assert_eq!(build_command(&preset).to_string(), "aider --model gpt-4o --stream");
}

#[test]
fn false_booleans_are_negated() {
    let preset = Preset::new("p")
        .with_flag("auto-commits", Some("false"))
        .with_flag("dark-mode", Some("true"))
        .with_flag("no-browser", Some("false"));
    let command = build_command(&preset);
    assert!(command.has_arg("--no-auto-commits"));
    assert!(command.has_arg("--dark-mode"));
    assert!(command.has_arg("--browser"));
    assert!(!command.has_arg("--auto-commits"));
}

#[test]
fn underscore_spellings_render_like_dashed_ones() {
    let preset = Preset::new("p").with_flag("auto_commits", Some("false")).with_flag("--map_tokens", Some("2048"));
    assert!(preset.has_flag("auto-commits"));
    assert_eq!(build_command(&preset).args, vec!["--no-auto-commits", "--map-tokens", "2048"]);
}

#[test]
fn explicit_boolean_is_rendered_as_switch() {
    let preset = Preset::new("p").with_flag("cache-prompts", Some("off"));
    assert_eq!(build_command(&preset).args, vec!["--no-cache-prompts"]);
}

#[test]
fn values_with_spaces_are_quoted_in_the_preview() {
    let preset = Preset::new("p").with_flag("message", Some("Act as a helpful assistant."));
    let command = build_command(&preset);
    assert_eq!(command.arg_value("--message"), Some("Act as a helpful assistant."));
    assert_eq!(command.to_string(), "aider --message 'Act as a helpful assistant.'");
}

#[test]
fn files_come_last() {
    let preset = Preset::new("p")
        .with_flag("fnames", Some("src/main.rs 'notes file.md'"))
        .with_flag("model", Some("gpt-4o"))
        .with_flag("yes", None);
    let command = build_command(&preset);
    assert_eq!(
        command.args,
        vec!["--model", "gpt-4o", "--yes-always", "src/main.rs", "notes file.md"]
    );
}

#[test]
fn aliased_keys_use_aider_spelling() {
    let preset = Preset::new("p").with_flag("api-base", Some("https://proxy.example/v1"));
    let command = build_command(&preset);
    assert_eq!(command.arg_value("--openai-api-base"), Some("https://proxy.example/v1"));
}

#[test]
fn builder_honours_custom_executable() {
    let preset = Preset::new("p").with_flag("model", Some("gpt-4o"));
    let command = CommandBuilder::new().executable("/opt/aider").build(&preset).unwrap();
    assert_eq!(command.argv()[0], "/opt/aider");
}

// ── Model config files ────────────────────────────────────────────────────────

#[test]
fn stored_model_files_are_appended() {
    let db = Database::open_in_memory().unwrap();
    let mut preset = Preset::new("p").with_flag("model", Some("gpt-4o"));
    preset.id = Some(db.save_preset(&preset).unwrap());
    let id = preset.id.unwrap();
    db.upsert_model_settings(Some(id), Some("gpt-4o"), "{}", Some("/cfg/gpt-4o.model.settings.yml"))
        .unwrap();
    db.upsert_model_metadata(id, "gpt-4o", "{}", Some("/cfg/gpt-4o.model.metadata.json")).unwrap();

    let command = CommandBuilder::new().executable("aider").with_database(&db).build(&preset).unwrap();
    assert_eq!(command.arg_value("--model-settings-file"), Some("/cfg/gpt-4o.model.settings.yml"));
    assert_eq!(command.arg_value("--model-metadata-file"), Some("/cfg/gpt-4o.model.metadata.json"));
}

#[test]
fn global_settings_are_the_fallback() {
    let db = Database::open_in_memory().unwrap();
    let mut preset = Preset::new("p").with_flag("model", Some("gpt-4o"));
    preset.id = Some(db.save_preset(&preset).unwrap());
    db.upsert_model_settings(None, Some("gpt-4o"), "{}", Some("/global.yml")).unwrap();

    let command = CommandBuilder::new().with_database(&db).build(&preset).unwrap();
    assert_eq!(command.arg_value("--model-settings-file"), Some("/global.yml"));
    assert!(!command.has_arg("--model-metadata-file"));
}

#[test]
fn explicit_settings_flag_wins() {
    let db = Database::open_in_memory().unwrap();
    let mut preset = Preset::new("p")
        .with_flag("model", Some("gpt-4o"))
        .with_flag("model-settings-file", Some("/mine.yml"));
    preset.id = Some(db.save_preset(&preset).unwrap());
    db.upsert_model_settings(preset.id, Some("gpt-4o"), "{}", Some("/stored.yml")).unwrap();

    let command = CommandBuilder::new().with_database(&db).build(&preset).unwrap();
    let count = command.args.iter().filter(|a| *a == "--model-settings-file").count();
    assert_eq!(count, 1);
    assert_eq!(command.arg_value("--model-settings-file"), Some("/mine.yml"));
}

// ── Backends ──────────────────────────────────────────────────────────────────

#[test]
fn endpoint_adds_base_and_type() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.providers.add_endpoint("local", local_endpoint(), None).unwrap();

    let mut preset = Preset::new("p").with_flag("model", Some("llama3"));
    preset.endpoint = Some("local".into());
    let command = CommandBuilder::new().with_providers(&ctx.providers).build(&preset).unwrap();
    assert_eq!(command.arg_value("--openai-api-base"), Some("http://localhost:11434/v1"));
    assert_eq!(command.arg_value("--openai-api-type"), Some("openai"));
}

#[test]
fn provider_params_become_arguments() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let mut record = ProviderRecord::new("https://openrouter.ai/api/v1", &["gpt-4o"], "Router");
    record.params.insert(
        "api_base".into(),
        json!({"cli_arg": "--openai-api-base", "value": "https://openrouter.ai/api/v1"}),
    );
    record.params.insert("verify".into(), json!({"cli_arg": "--verify-ssl", "value": true}));
    record.params.insert("skip".into(), json!({"cli_arg": "--skipped", "value": false}));
    ctx.providers.add_provider("openrouter", record, None).unwrap();

    let mut preset = Preset::new("p");
    preset.provider = Some("openrouter".into());
    let command = CommandBuilder::new().with_providers(&ctx.providers).build(&preset).unwrap();
    assert_eq!(command.arg_value("--openai-api-base"), Some("https://openrouter.ai/api/v1"));
    assert!(command.has_arg("--verify-ssl"));
    assert!(!command.has_arg("--skipped"));
}

#[test]
fn unknown_backend_is_a_build_error() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let mut preset = Preset::new("p");
    preset.provider = Some("ghost".into());
    let err = CommandBuilder::new().with_providers(&ctx.providers).build(&preset).unwrap_err();
    assert!(matches!(err, AppError::CommandBuild(_)));

    let mut preset = Preset::new("p");
    preset.endpoint = Some("nowhere".into());
    let err = CommandBuilder::new().with_providers(&ctx.providers).build(&preset).unwrap_err();
    assert!(matches!(err, AppError::CommandBuild(_)));
}

#[test]
fn backend_without_provider_config_fails() {
    let mut preset = Preset::new("p");
    preset.provider = Some("openai".into());
    assert!(matches!(CommandBuilder::new().build(&preset), Err(AppError::CommandBuild(_))));
}

// ── Legacy profiles ───────────────────────────────────────────────────────────

#[test]
fn legacy_profile_renders_like_a_preset() {
    let profile: LegacyProfile = serde_json::from_value(json!({
        "model": "gpt-4",
        "auto-commits": false,
        "fnames": ["a.py"],
        "name": "ignored"
    }))
    .unwrap();
    let command = CommandBuilder::new().executable("aider").build_profile(&profile).unwrap();
    assert_eq!(command.to_string(), "aider --no-auto-commits --model gpt-4 a.py");
}

#[test]
fn legacy_list_values_repeat_the_flag() {
    let profile: LegacyProfile = serde_json::from_value(json!({
        "read": ["CONVENTIONS.md", "docs/api.md"],
        "map-tokens": 1024
    }))
    .unwrap();
    let command = CommandBuilder::new().executable("aider").build_profile(&profile).unwrap();
    assert_eq!(
        command.args,
        vec!["--map-tokens", "1024", "--read", "CONVENTIONS.md", "--read", "docs/api.md"]
    );
}

// ── Environment ───────────────────────────────────────────────────────────────

#[test]
fn executor_exports_backend_keys() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.providers.set_api_key("openai", "sk-test-1234567890").unwrap();
    ctx.providers.add_endpoint("local", local_endpoint(), Some("local-key-123")).unwrap();

    let mut preset = Preset::new("p");
    preset.provider = Some("openai".into());
    preset.endpoint = Some("local".into());
    let env = Executor::new(LaunchMode::Spawn).prepare_env(&preset, &ctx.providers);
    assert!(env.contains(&("OPENAI_API_KEY".to_string(), "sk-test-1234567890".to_string())));
    assert!(env.contains(&("OPENAI_API_KEY".to_string(), "local-key-123".to_string())));
}

#[test]
fn missing_keys_are_skipped() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let env = Executor::new(LaunchMode::Spawn).backend_env(Some("mistral"), None, &ctx.providers);
    assert!(env.is_empty());
}

#[test]
fn launching_a_missing_program_fails() {
    let command = aider_start::CommandLine::new("definitely-not-installed-aider-xyz");
    let err = Executor::new(LaunchMode::Spawn).launch(&command, &[]).unwrap_err();
    assert!(matches!(err, AppError::CommandExecution(_)));
}
