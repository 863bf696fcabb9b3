use aider_start::db::Database;
use aider_start::flags::{catalog, validate_value, FlagManager};
use aider_start::models::{parse_bool, ValueType};
use aider_start::AppError;
use std::rc::Rc;

fn manager() -> FlagManager {
    FlagManager::new(Rc::new(Database::open_in_memory().unwrap())).unwrap()
}

// ── Loading ───────────────────────────────────────────────────────────────────

#[test]
fn new_manager_seeds_the_catalog() {
    let flags = manager();
    assert_eq!(flags.all_flags().len(), catalog::FLAGS.len());
    assert!(flags.flag("model").is_some());
}

#[test]
fn lookup_ignores_leading_dashes() {
    let flags = manager();
    assert_eq!(flags.flag("--model").unwrap().name, "model");
    assert!(flags.flag("definitely-not-a-flag").is_none());
}

#[test]
fn lookup_reads_underscores_as_dashes() {
    let flags = manager();
    assert_eq!(flags.flag("--auto_commits").unwrap().name, "auto-commits");
    assert!(catalog::is_boolean("auto_commits"));
    assert!(flags.validate_flag("map_tokens", Some("many")).is_err());
}

#[test]
fn reload_keeps_edited_rows() {
    let db = Rc::new(Database::open_in_memory().unwrap());
    let mut flags = FlagManager::new(Rc::clone(&db)).unwrap();
    flags.set_wizard_visibility("verbose", false).unwrap();
    let reopened = FlagManager::new(db).unwrap();
    assert!(!reopened.flag("verbose").unwrap().wizard_visible);
}

#[test]
fn categories_follow_catalog_order() {
    let flags = manager();
    let categories = flags.categories();
    assert!(categories.contains(&catalog::MAIN_MODEL));
    assert!(categories.contains(&catalog::CACHE));
    let mut deduped = categories.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), categories.len());
}

#[test]
fn flags_by_category_filters() {
    let flags = manager();
    let cache = flags.flags_by_category(catalog::CACHE);
    assert!(cache.iter().any(|f| f.name == "cache-prompts"));
    assert!(cache.iter().all(|f| f.category == catalog::CACHE));
}

// ── Wizard visibility ─────────────────────────────────────────────────────────

#[test]
fn wizard_flags_skip_hidden_and_deprecated() {
    let flags = manager();
    for category in flags.wizard_categories() {
        for flag in flags.wizard_flags(category) {
            assert!(flag.wizard_visible);
            assert!(!flag.is_deprecated);
        }
    }
    assert!(!flags.wizard_flags(catalog::OTHER).iter().any(|f| f.name == "config"));
}

#[test]
fn hiding_a_flag_removes_it_from_the_wizard() {
    let mut flags = manager();
    assert!(flags.wizard_flags(catalog::MAIN_MODEL).iter().any(|f| f.name == "model"));
    flags.set_wizard_visibility("model", false).unwrap();
    assert!(!flags.wizard_flags(catalog::MAIN_MODEL).iter().any(|f| f.name == "model"));
    flags.set_wizard_visibility("model", true).unwrap();
    assert!(flags.flag("model").unwrap().wizard_visible);
}

#[test]
fn unknown_flag_visibility_is_an_error() {
    let mut flags = manager();
    assert!(matches!(flags.set_wizard_visibility("nope", true), Err(AppError::Validation(_))));
}

// ── Validation ────────────────────────────────────────────────────────────────

#[test]
fn cache_prompts_needs_an_explicit_boolean() {
    let flags = manager();
    assert!(flags.validate_flag("cache-prompts", None).is_err());
    assert!(flags.validate_flag("cache-prompts", Some("maybe")).is_err());
    assert!(flags.validate_flag("cache-prompts", Some("true")).is_ok());
    assert!(flags.validate_flag("cache-prompts", Some("off")).is_ok());
}

#[test]
fn integer_flags_must_parse() {
    let flags = manager();
    assert!(flags.validate_flag("cache-keepalive-pings", Some("abc")).is_err());
    assert!(flags.validate_flag("cache-keepalive-pings", Some("3")).is_ok());
    assert!(flags.validate_flag("map-tokens", Some("1.5")).is_err());
}

#[test]
fn float_flags_must_parse() {
    let flags = manager();
    assert!(flags.validate_flag("map-multiplier-no-files", Some("2.5")).is_ok());
    assert!(flags.validate_flag("map-multiplier-no-files", Some("lots")).is_err());
}

#[test]
fn plain_booleans_accept_bare_or_boolean_values() {
    let flags = manager();
    assert!(flags.validate_flag("stream", None).is_ok());
    assert!(flags.validate_flag("stream", Some("yes")).is_ok());
    assert!(flags.validate_flag("stream", Some("sometimes")).is_err());
}

#[test]
fn value_flags_require_a_value() {
    let flags = manager();
    assert!(flags.validate_flag("model", None).is_err());
    assert!(flags.validate_flag("model", Some("  ")).is_err());
    assert!(flags.validate_flag("model", Some("gpt-4o")).is_ok());
}

#[test]
fn unknown_flags_fail_validation() {
    let flags = manager();
    let err = flags.validate_flag("made-up", Some("1")).unwrap_err();
    assert!(err.to_string().contains("made-up"));
}

#[test]
fn validate_value_works_on_detached_metadata() {
    let meta = catalog::find("cache-keepalive-pings").unwrap().to_metadata();
    assert_eq!(meta.value_type, ValueType::Integer);
    assert!(validate_value(&meta, Some("10")).is_ok());
    assert!(validate_value(&meta, Some("ten")).is_err());
}

// ── Helpers ───────────────────────────────────────────────────────────────────

#[test]
fn parse_bool_spellings() {
    for t in ["true", "YES", "1", "on"] {
        assert_eq!(parse_bool(t), Some(true), "{t}");
    }
    for f in ["false", "No", "0", "off"] {
        assert_eq!(parse_bool(f), Some(false), "{f}");
    }
    assert_eq!(parse_bool("perhaps"), None);
}

#[test]
fn value_type_names_round_trip() {
    for vt in [
        ValueType::String,
        ValueType::Boolean,
        ValueType::BooleanExplicit,
        ValueType::Integer,
        ValueType::Float,
        ValueType::Path,
    ] {
        assert_eq!(vt.as_str().parse::<ValueType>().unwrap(), vt);
    }
}
