use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, Result};

pub const MAX_NAME_LEN: usize = 50;
pub const MIN_API_KEY_LEN: usize = 10;
pub const MAX_PATH_LEN: usize = 1024;

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("static regex"))
}

/// Provider, endpoint and profile names: `[A-Za-z0-9_.-]`, 1 to 50 chars.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && name_pattern().is_match(name)
}

/// `http` or `https` with a host.
pub fn is_valid_url(raw: &str) -> bool {
    match url::Url::parse(raw.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

pub fn is_valid_api_key(key: &str) -> bool {
    key.trim().len() >= MIN_API_KEY_LEN
}

pub fn is_valid_file_path(path: &str) -> bool {
    !path.trim().is_empty() && !path.contains('\0') && path.len() <= MAX_PATH_LEN
}

pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "invalid {kind} name '{name}': use letters, digits, '.', '_' or '-' (max {MAX_NAME_LEN})"
        )))
    }
}

pub fn validate_url(url: &str) -> Result<()> {
    if is_valid_url(url) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid URL '{url}': expected http(s)://host")))
    }
}

/// Length check plus the key prefixes the big providers use.
pub fn validate_api_key(provider: &str, key: &str) -> Result<()> {
    let key = key.trim();
    if !is_valid_api_key(key) {
        return Err(AppError::Validation(format!(
            "API key too short (minimum {MIN_API_KEY_LEN} characters)"
        )));
    }
    let prefix = match provider {
        "anthropic" => Some("sk-ant-"),
        "openai" => Some("sk-"),
        _ => None,
    };
    match prefix {
        Some(prefix) if !key.starts_with(prefix) => Err(AppError::Validation(format!(
            "{provider} API keys start with '{prefix}'"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(is_valid_name("my-provider_1.0"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name(&"x".repeat(51)));
    }

    #[test]
    fn urls() {
        assert!(is_valid_url("https://api.openai.com/v1"));
        assert!(is_valid_url("http://localhost:11434"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn api_key_prefixes() {
        assert!(validate_api_key("openai", "sk-1234567890").is_ok());
        assert!(validate_api_key("openai", "pk-1234567890").is_err());
        assert!(validate_api_key("anthropic", "sk-ant-123456").is_ok());
        assert!(validate_api_key("anthropic", "sk-12345678901").is_err());
        assert!(validate_api_key("local", "short").is_err());
        assert!(validate_api_key("local", "anything-long").is_ok());
    }

    #[test]
    fn file_paths() {
        assert!(is_valid_file_path("/tmp/a.yml"));
        assert!(!is_valid_file_path("  "));
        assert!(!is_valid_file_path("a\0b"));
    }
}
