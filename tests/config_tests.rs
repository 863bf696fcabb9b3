use aider_start::config::quick::QuickPresets;
use aider_start::config::validate::{is_valid_file_path, is_valid_name, validate_api_key, validate_url};
use aider_start::config::{ConfigStore, EndpointRecord, LegacyProfile, ProviderRecord};
use aider_start::db::Database;
use aider_start::paths::AppPaths;
use aider_start::providers::ProviderManager;
use aider_start::secrets::{CredentialStore, MemoryStore};
use aider_start::{AppError, Context};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn context(dir: &TempDir) -> Context {
    let paths = AppPaths::with_dirs(dir.path().join("data"), dir.path().join("legacy"));
    Context::with_database(paths, Database::open_in_memory().unwrap(), Box::new(MemoryStore::new()))
        .unwrap()
}

fn manager(path: &Path) -> ProviderManager {
    ProviderManager::new(ConfigStore::load(path), Box::new(MemoryStore::new())).unwrap()
}

/// Credential store whose backend refuses every write, like a locked keyring.
struct LockedStore;

impl CredentialStore for LockedStore {
    fn get(&self, _account: &str) -> aider_start::Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _account: &str, _secret: &str) -> aider_start::Result<()> {
        Err(AppError::Keyring("keyring is locked".into()))
    }

    fn delete(&self, _account: &str) -> aider_start::Result<bool> {
        Err(AppError::Keyring("keyring is locked".into()))
    }
}

fn endpoint(url: &str) -> EndpointRecord {
    EndpointRecord { api_url: url.into(), models: vec!["llama3".into(), "qwen2".into()], ..Default::default() }
}

// ── Config store ──────────────────────────────────────────────────────────────

#[test]
fn missing_config_starts_empty() {
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::load(&dir.path().join("config.json"));
    assert!(store.profiles().is_empty());
    assert!(store.data().providers.is_empty());
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let mut store = ConfigStore::load(&path);
    let profile: LegacyProfile =
        serde_json::from_value(serde_json::json!({"model": "gpt-4", "provider": "openai"})).unwrap();
    store.add_profile("work", profile.clone()).unwrap();

    let reloaded = ConfigStore::load(&path);
    assert_eq!(reloaded.profile("work").unwrap(), &profile);
    assert!(dir.path().join("nested").join("config.json.lastgood").exists());
    assert!(!dir.path().join("nested").join("config.json.prev").exists());
}

#[test]
fn corrupt_config_is_moved_aside_and_last_good_restored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ this is not json").unwrap();
    fs::write(
        dir.path().join("config.json.lastgood"),
        r#"{"profiles": {"saved": {"model": "gpt-4"}}}"#,
    )
    .unwrap();

    let store = ConfigStore::load(&path);
    assert!(store.profile("saved").is_ok());
    assert!(dir.path().join("config.json.bak").exists());
    let restored = fs::read_to_string(&path).unwrap();
    assert!(restored.contains("saved"));
}

#[test]
fn corrupt_config_without_backup_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "[]]").unwrap();
    let store = ConfigStore::load(&path);
    assert!(store.profiles().is_empty());
    assert!(dir.path().join("config.json.bak").exists());
}

#[test]
fn profiles_add_and_delete() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::load(&dir.path().join("config.json"));
    assert!(matches!(store.profile("x"), Err(AppError::ProfileNotFound(_))));
    store.add_profile("x", LegacyProfile::default()).unwrap();
    store.delete_profile("x").unwrap();
    assert!(matches!(store.delete_profile("x"), Err(AppError::ProfileNotFound(_))));
    assert!(store.add_profile("bad name", LegacyProfile::default()).is_err());
}

// ── Providers ─────────────────────────────────────────────────────────────────

#[test]
fn defaults_are_installed_once() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let names: Vec<&str> = ctx.providers.providers().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["anthropic", "mistral", "openai"]);

    let mut again = manager(&ctx.paths.legacy_config_file());
    assert!(!again.ensure_default_providers().unwrap());
}

#[test]
fn api_keys_never_reach_the_config_file() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.providers.set_api_key("openai", "sk-test-1234567890").unwrap();
    let record = ProviderRecord::new("https://api.groq.com/openai/v1", &["llama3-70b"], "Groq");
    ctx.providers.add_provider("groq", record, Some("gsk-secret-value")).unwrap();

    assert_eq!(ctx.providers.api_key("openai").unwrap().as_deref(), Some("sk-test-1234567890"));
    assert!(ctx.providers.has_api_key("groq"));
    let raw = fs::read_to_string(ctx.paths.legacy_config_file()).unwrap();
    assert!(!raw.contains("sk-test-1234567890"));
    assert!(!raw.contains("gsk-secret-value"));
    assert!(raw.contains("groq"));
}

#[test]
fn export_reports_key_presence_only() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.providers.set_api_key("anthropic", "sk-ant-test-123456").unwrap();
    let exported = ctx.providers.export_provider("anthropic").unwrap();
    assert_eq!(exported["name"], "anthropic");
    assert_eq!(exported["has_api_key"], true);
    assert!(exported.get("api_key").is_none());
    assert!(!exported.to_string().contains("sk-ant-test"));
    assert_eq!(ctx.providers.export_provider("mistral").unwrap()["has_api_key"], false);
}

#[test]
fn inline_keys_are_migrated() {
    let dir = TempDir::new().unwrap();
    let legacy = dir.path().join("legacy");
    fs::create_dir_all(&legacy).unwrap();
    fs::write(
        legacy.join("config.json"),
        r#"{
            "providers": {"openai": {"api_url": "https://api.openai.com/v1", "models": ["gpt-4"], "api_key": "sk-inline-1234567"}},
            "custom_endpoints": {"local": {"api_url": "http://localhost:8080/v1", "api_key": "inline-endpoint-key"}}
        }"#,
    )
    .unwrap();

    let ctx = context(&dir);
    assert_eq!(ctx.providers.api_key("openai").unwrap().as_deref(), Some("sk-inline-1234567"));
    assert_eq!(ctx.providers.endpoint_api_key("local").unwrap().as_deref(), Some("inline-endpoint-key"));
    let raw = fs::read_to_string(legacy.join("config.json")).unwrap();
    assert!(!raw.contains("sk-inline"));
    assert!(!raw.contains("inline-endpoint-key"));
    // Existing providers suppress the defaults.
    assert_eq!(ctx.providers.providers().len(), 1);
}

#[test]
fn unwritable_legacy_dir_does_not_block_startup() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("legacy"), "not a directory").unwrap();

    let ctx = context(&dir);
    assert_eq!(ctx.providers.providers().len(), 3);
    assert!(ctx.db.list_presets().unwrap().is_empty());
}

#[test]
fn locked_keyring_keeps_inline_keys_usable() {
    let dir = TempDir::new().unwrap();
    let legacy = dir.path().join("legacy");
    fs::create_dir_all(&legacy).unwrap();
    let raw = r#"{"providers": {"openai": {"api_url": "https://api.openai.com/v1", "api_key": "sk-inline-1234567"}}}"#;
    fs::write(legacy.join("config.json"), raw).unwrap();

    let paths = AppPaths::with_dirs(dir.path().join("data"), legacy.clone());
    let ctx = Context::with_database(paths, Database::open_in_memory().unwrap(), Box::new(LockedStore)).unwrap();
    assert_eq!(ctx.providers.api_key("openai").unwrap().as_deref(), Some("sk-inline-1234567"));
    assert_eq!(fs::read_to_string(legacy.join("config.json")).unwrap(), raw);
    assert!(ProviderManager::new(ConfigStore::load(&legacy.join("config.json")), Box::new(LockedStore)).is_err());
}

#[test]
fn provider_validation() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let record = ProviderRecord::new("https://example.com", &[], "");
    assert!(ctx.providers.add_provider("has space", record.clone(), None).is_err());
    let bad_url = ProviderRecord::new("ftp://example.com", &[], "");
    assert!(ctx.providers.add_provider("ftp", bad_url, None).is_err());
    assert!(ctx.providers.set_api_key("openai", "pk-1234567890").is_err());
    assert!(matches!(
        ctx.providers.set_api_key("ghost", "sk-1234567890"),
        Err(AppError::ProviderNotFound(_))
    ));
}

#[test]
fn provider_models_add_and_remove() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    assert!(ctx.providers.add_provider_model("openai", "gpt-4o").unwrap());
    assert!(!ctx.providers.add_provider_model("openai", "gpt-4o").unwrap());
    assert!(ctx.providers.provider_models("openai").unwrap().contains(&"gpt-4o".to_string()));
    assert!(ctx.providers.remove_provider_model("openai", "gpt-4o").unwrap());
    assert!(!ctx.providers.remove_provider_model("openai", "gpt-4o").unwrap());
    assert!(ctx.providers.add_provider_model("openai", "  ").is_err());
}

#[test]
fn deleting_a_provider_drops_its_key() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.providers.set_api_key("openai", "sk-test-1234567890").unwrap();
    ctx.providers.delete_provider("openai").unwrap();
    assert!(ctx.providers.api_key("openai").unwrap().is_none());
    assert!(matches!(ctx.providers.delete_provider("openai"), Err(AppError::ProviderNotFound(_))));
}

#[test]
fn keyring_failure_leaves_the_provider_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let mut providers = ProviderManager::new(ConfigStore::load(&path), Box::new(LockedStore)).unwrap();
    providers.add_provider("groq", ProviderRecord::new("https://api.groq.com/openai/v1", &[], ""), None).unwrap();
    providers.add_endpoint("local", endpoint("http://localhost:11434/v1"), None).unwrap();

    assert!(matches!(providers.delete_provider("groq"), Err(AppError::Keyring(_))));
    assert!(matches!(providers.delete_endpoint("local"), Err(AppError::Keyring(_))));
    let reloaded = manager(&path);
    assert!(reloaded.provider("groq").is_ok());
    assert!(reloaded.endpoint("local").is_ok());
}

#[test]
fn api_keys_can_be_cleared() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.providers.set_api_key("openai", "sk-test-1234567890").unwrap();
    assert!(ctx.providers.delete_api_key("openai").unwrap());
    assert!(!ctx.providers.delete_api_key("openai").unwrap());
    assert!(!ctx.providers.has_api_key("openai"));
    assert!(ctx.providers.provider("openai").is_ok());
    assert!(matches!(ctx.providers.delete_api_key("ghost"), Err(AppError::ProviderNotFound(_))));

    ctx.providers.add_endpoint("local", endpoint("http://localhost:11434/v1"), Some("local-key-123")).unwrap();
    assert!(ctx.providers.delete_endpoint_api_key("local").unwrap());
    assert!(ctx.providers.endpoint_api_key("local").unwrap().is_none());
    assert!(matches!(ctx.providers.delete_endpoint_api_key("ghost"), Err(AppError::EndpointNotFound(_))));
}

#[test]
fn endpoints_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.providers.add_endpoint("local", endpoint("http://localhost:11434/v1"), Some("local-key-123")).unwrap();

    assert_eq!(ctx.providers.endpoint_models("local").unwrap(), ["llama3", "qwen2"]);
    let exported = ctx.providers.export_endpoint("local").unwrap();
    assert_eq!(exported["has_api_key"], true);
    assert_eq!(exported["api_url"], "http://localhost:11434/v1");

    let reloaded = manager(&ctx.paths.legacy_config_file());
    assert!(reloaded.endpoint("local").is_ok());

    ctx.providers.delete_endpoint("local").unwrap();
    assert!(ctx.providers.endpoint_api_key("local").unwrap().is_none());
    assert!(matches!(ctx.providers.endpoint_models("local"), Err(AppError::EndpointNotFound(_))));
}

// ── Quick presets ─────────────────────────────────────────────────────────────

#[test]
fn quick_presets_split_like_a_shell() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("presets.json");
    fs::write(&path, r#"{"fast": "aider --model 'gpt 4' --yes-always"}"#).unwrap();
    let quick = QuickPresets::load(&path).unwrap();
    assert_eq!(quick.argv("fast").unwrap(), vec!["aider", "--model", "gpt 4", "--yes-always"]);
    assert!(matches!(quick.argv("slow"), Err(AppError::ProfileNotFound(_))));
}

#[test]
fn quick_presets_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("presets.json");
    let mut quick = QuickPresets::load(&path).unwrap();
    assert!(quick.is_empty());
    quick.insert("empty", "   ");
    quick.insert("one", "aider --model o1");
    quick.save().unwrap();

    let mut reloaded = QuickPresets::load(&path).unwrap();
    assert_eq!(reloaded.get("one"), Some("aider --model o1"));
    assert!(matches!(reloaded.argv("empty"), Err(AppError::CommandBuild(_))));
    assert!(reloaded.remove("empty"));
    assert_eq!(reloaded.iter().count(), 1);
}

#[test]
fn unreadable_quick_presets_are_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("presets.json");
    fs::write(&path, "not json").unwrap();
    assert!(matches!(QuickPresets::load(&path), Err(AppError::JsonParse { .. })));
}

// ── Validation helpers ────────────────────────────────────────────────────────

#[test]
fn validation_helpers() {
    assert!(is_valid_name("local.llm_2"));
    assert!(!is_valid_name("no/slash"));
    assert!(validate_url("http://127.0.0.1:8080").is_ok());
    assert!(validate_url("localhost:8080").is_err());
    assert!(validate_api_key("anthropic", "sk-ant-abcdef").is_ok());
    assert!(validate_api_key("openai", "short").is_err());
    assert!(is_valid_file_path("~/models/settings.yml"));
}
