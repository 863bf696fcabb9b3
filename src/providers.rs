//! Providers and custom endpoints, with API keys kept in the credential
//! store instead of the JSON config.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::validate::{validate_api_key, validate_name, validate_url};
use crate::config::{ConfigStore, EndpointRecord, ProviderRecord};
use crate::error::{AppError, Result};
use crate::secrets::{endpoint_account, provider_account, CredentialStore};

// ── Defaults ──────────────────────────────────────────────────────────────────

pub fn default_providers() -> BTreeMap<String, ProviderRecord> {
    let mut providers = BTreeMap::new();
    providers.insert(
        "openai".to_string(),
        ProviderRecord::new(
            "https://api.openai.com/v1",
            &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo", "gpt-4-vision"],
            "OpenAI API",
        ),
    );
    providers.insert(
        "anthropic".to_string(),
        ProviderRecord::new(
            "https://api.anthropic.com/v1",
            &[
                "claude-1",
                "claude-2",
                "claude-instant-1",
                "claude-3-opus",
                "claude-3-sonnet",
                "claude-3-haiku",
            ],
            "Anthropic API",
        ),
    );
    providers.insert(
        "mistral".to_string(),
        ProviderRecord::new(
            "https://api.mistral.ai/v1",
            &["mistral-tiny", "mistral-small", "mistral-medium", "mistral-large"],
            "Mistral AI API",
        ),
    );
    providers
}

/// Environment variable aider reads the key from when the record names none.
pub fn default_env_var(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_ascii_uppercase().replace(['-', '.'], "_"))
}

// ── Manager ───────────────────────────────────────────────────────────────────

pub struct ProviderManager {
    config: ConfigStore,
    secrets: Box<dyn CredentialStore>,
}

impl ProviderManager {
    /// Wraps the config store and moves any inline API keys from older
    /// config files into the credential store.
    pub fn new(config: ConfigStore, secrets: Box<dyn CredentialStore>) -> Result<Self> {
        let mut manager = Self::without_migration(config, secrets);
        manager.migrate_inline_keys()?;
        Ok(manager)
    }

    /// Wraps the stores as they are. Inline keys stay in memory until
    /// [`migrate_inline_keys`](Self::migrate_inline_keys) succeeds.
    pub fn without_migration(config: ConfigStore, secrets: Box<dyn CredentialStore>) -> Self {
        ProviderManager { config, secrets }
    }

    /// A key leaves its record only once the credential store has it.
    pub fn migrate_inline_keys(&mut self) -> Result<()> {
        let mut moved = 0;
        for (name, record) in self.config.data_mut().providers.iter_mut() {
            if let Some(key) = record.api_key.as_deref() {
                self.secrets.set(&provider_account(name), key.trim())?;
                record.api_key = None;
                moved += 1;
            }
        }
        for (name, record) in self.config.data_mut().custom_endpoints.iter_mut() {
            if let Some(key) = record.api_key.as_deref() {
                self.secrets.set(&endpoint_account(name), key.trim())?;
                record.api_key = None;
                moved += 1;
            }
        }
        if moved > 0 {
            tracing::info!(moved, "Moved inline API keys into the credential store");
            self.config.save()?;
        }
        Ok(())
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    /// Installs openai, anthropic and mistral when no provider exists.
    /// Returns true when defaults were written.
    pub fn ensure_default_providers(&mut self) -> Result<bool> {
        if !self.config.data().providers.is_empty() {
            return Ok(false);
        }
        self.config.data_mut().providers = default_providers();
        self.config.save()?;
        tracing::info!("Installed default providers");
        Ok(true)
    }

    // ── Providers ─────────────────────────────────────────────────────────────

    pub fn providers(&self) -> &BTreeMap<String, ProviderRecord> {
        &self.config.data().providers
    }

    pub fn provider(&self, name: &str) -> Result<&ProviderRecord> {
        self.providers()
            .get(name)
            .ok_or_else(|| AppError::ProviderNotFound(name.to_string()))
    }

    /// Adds or replaces a provider. A key given here goes to the credential
    /// store, as does any key left on the record.
    pub fn add_provider(
        &mut self,
        name: &str,
        mut record: ProviderRecord,
        api_key: Option<&str>,
    ) -> Result<()> {
        validate_name("provider", name)?;
        validate_url(&record.api_url)?;
        let api_key = api_key.map(str::to_string).or_else(|| record.api_key.take());
        if let Some(key) = api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            validate_api_key(name, key)?;
            self.secrets.set(&provider_account(name), key.trim())?;
        }
        self.config.data_mut().providers.insert(name.to_string(), record);
        self.config.save()?;
        tracing::info!(provider = name, "Saved provider");
        Ok(())
    }

    /// Drops the stored key first, so a credential store failure leaves the
    /// provider in place.
    pub fn delete_provider(&mut self, name: &str) -> Result<()> {
        self.provider(name)?;
        self.secrets.delete(&provider_account(name))?;
        self.config.data_mut().providers.remove(name);
        self.config.save()?;
        tracing::info!(provider = name, "Deleted provider");
        Ok(())
    }

    pub fn provider_models(&self, name: &str) -> Result<&[String]> {
        Ok(&self.provider(name)?.models)
    }

    pub fn add_provider_model(&mut self, name: &str, model: &str) -> Result<bool> {
        let model = model.trim();
        if model.is_empty() {
            return Err(AppError::Validation("model name cannot be empty".into()));
        }
        let record = self
            .config
            .data_mut()
            .providers
            .get_mut(name)
            .ok_or_else(|| AppError::ProviderNotFound(name.to_string()))?;
        if record.models.iter().any(|m| m == model) {
            return Ok(false);
        }
        record.models.push(model.to_string());
        self.config.save()?;
        Ok(true)
    }

    pub fn remove_provider_model(&mut self, name: &str, model: &str) -> Result<bool> {
        let record = self
            .config
            .data_mut()
            .providers
            .get_mut(name)
            .ok_or_else(|| AppError::ProviderNotFound(name.to_string()))?;
        let before = record.models.len();
        record.models.retain(|m| m != model);
        if record.models.len() == before {
            return Ok(false);
        }
        self.config.save()?;
        Ok(true)
    }

    pub fn set_api_key(&mut self, name: &str, key: &str) -> Result<()> {
        self.provider(name)?;
        validate_api_key(name, key)?;
        self.secrets.set(&provider_account(name), key.trim())
    }

    /// Stored key, else an inline key that could not be migrated yet.
    pub fn api_key(&self, name: &str) -> Result<Option<String>> {
        if let Some(key) = self.secrets.get(&provider_account(name))? {
            return Ok(Some(key));
        }
        Ok(self.providers().get(name).and_then(|p| p.api_key.clone()))
    }

    pub fn has_api_key(&self, name: &str) -> bool {
        matches!(self.api_key(name), Ok(Some(_)))
    }

    /// Forgets the provider's stored key. Returns false when none was stored.
    pub fn delete_api_key(&mut self, name: &str) -> Result<bool> {
        let inline = self
            .config
            .data_mut()
            .providers
            .get_mut(name)
            .ok_or_else(|| AppError::ProviderNotFound(name.to_string()))?
            .api_key
            .take();
        Ok(self.secrets.delete(&provider_account(name))? || inline.is_some())
    }

    /// Environment variable the provider's key is exported as.
    pub fn env_var(&self, name: &str) -> String {
        self.providers()
            .get(name)
            .and_then(|p| p.api_key_env_var.clone())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_env_var(name))
    }

    /// Provider record as exported to other tools: never carries the key.
    pub fn export_provider(&self, name: &str) -> Result<Value> {
        let record = self.provider(name)?;
        let mut value = serde_json::to_value(record)?;
        if let Value::Object(map) = &mut value {
            map.insert("name".into(), Value::String(name.to_string()));
            map.insert("has_api_key".into(), Value::Bool(self.has_api_key(name)));
        }
        Ok(value)
    }

    // ── Endpoints ─────────────────────────────────────────────────────────────

    pub fn endpoints(&self) -> &BTreeMap<String, EndpointRecord> {
        &self.config.data().custom_endpoints
    }

    pub fn endpoint(&self, name: &str) -> Result<&EndpointRecord> {
        self.endpoints()
            .get(name)
            .ok_or_else(|| AppError::EndpointNotFound(name.to_string()))
    }

    pub fn add_endpoint(
        &mut self,
        name: &str,
        mut record: EndpointRecord,
        api_key: Option<&str>,
    ) -> Result<()> {
        validate_name("endpoint", name)?;
        validate_url(&record.api_url)?;
        let api_key = api_key.map(str::to_string).or_else(|| record.api_key.take());
        if let Some(key) = api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            validate_api_key(name, key)?;
            self.secrets.set(&endpoint_account(name), key.trim())?;
        }
        self.config.data_mut().custom_endpoints.insert(name.to_string(), record);
        self.config.save()?;
        tracing::info!(endpoint = name, "Saved endpoint");
        Ok(())
    }

    pub fn delete_endpoint(&mut self, name: &str) -> Result<()> {
        self.endpoint(name)?;
        self.secrets.delete(&endpoint_account(name))?;
        self.config.data_mut().custom_endpoints.remove(name);
        self.config.save()?;
        tracing::info!(endpoint = name, "Deleted endpoint");
        Ok(())
    }

    pub fn endpoint_models(&self, name: &str) -> Result<&[String]> {
        Ok(&self.endpoint(name)?.models)
    }

    pub fn set_endpoint_api_key(&mut self, name: &str, key: &str) -> Result<()> {
        self.endpoint(name)?;
        validate_api_key(name, key)?;
        self.secrets.set(&endpoint_account(name), key.trim())
    }

    pub fn endpoint_api_key(&self, name: &str) -> Result<Option<String>> {
        if let Some(key) = self.secrets.get(&endpoint_account(name))? {
            return Ok(Some(key));
        }
        Ok(self.endpoints().get(name).and_then(|e| e.api_key.clone()))
    }

    pub fn delete_endpoint_api_key(&mut self, name: &str) -> Result<bool> {
        let inline = self
            .config
            .data_mut()
            .custom_endpoints
            .get_mut(name)
            .ok_or_else(|| AppError::EndpointNotFound(name.to_string()))?
            .api_key
            .take();
        Ok(self.secrets.delete(&endpoint_account(name))? || inline.is_some())
    }

    pub fn export_endpoint(&self, name: &str) -> Result<Value> {
        let record = self.endpoint(name)?;
        let mut value = serde_json::to_value(record)?;
        if let Value::Object(map) = &mut value {
            map.insert("name".into(), Value::String(name.to_string()));
            map.insert(
                "has_api_key".into(),
                Value::Bool(matches!(self.endpoint_api_key(name), Ok(Some(_)))),
            );
        }
        Ok(value)
    }

    // ── Connectivity ──────────────────────────────────────────────────────────

    /// Lists `{api_url}/models` with the stored key and returns how many
    /// models the backend reports. Only run on explicit request.
    pub async fn check_connection(&self, target: &Backend) -> Result<usize> {
        let (api_url, key, anthropic) = match target {
            Backend::Provider(name) => {
                (self.provider(name)?.api_url.clone(), self.api_key(name)?, name == "anthropic")
            }
            Backend::Endpoint(name) => {
                (self.endpoint(name)?.api_url.clone(), self.endpoint_api_key(name)?, false)
            }
        };
        let url = format!("{}/models", api_url.trim_end_matches('/'));
        tracing::info!(%url, "Checking connection");

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        let mut request = client.get(&url);
        if let Some(key) = key {
            request = if anthropic {
                request.header("x-api-key", key).header("anthropic-version", "2023-06-01")
            } else {
                request.bearer_auth(key)
            };
        }
        let json: Value = request.send().await?.error_for_status()?.json().await?;
        Ok(count_models(&json))
    }
}

/// `{"data": [...]}` (OpenAI style), `{"models": [...]}` (Ollama) or a bare array.
fn count_models(json: &Value) -> usize {
    json.get("data")
        .or_else(|| json.get("models"))
        .unwrap_or(json)
        .as_array()
        .map(Vec::len)
        .unwrap_or(0)
}

/// A provider or endpoint reference.
#[derive(Clone, Debug, PartialEq)]
pub enum Backend {
    Provider(String),
    Endpoint(String),
}

impl Backend {
    pub fn name(&self) -> &str {
        match self {
            Backend::Provider(n) | Backend::Endpoint(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn env_var_defaults() {
        assert_eq!(default_env_var("openai"), "OPENAI_API_KEY");
        assert_eq!(default_env_var("my-llm"), "MY_LLM_API_KEY");
    }

    #[test]
    fn counts_models_in_common_shapes() {
        assert_eq!(count_models(&json!({"data": [1, 2]})), 2);
        assert_eq!(count_models(&json!({"models": [1]})), 1);
        assert_eq!(count_models(&json!([1, 2, 3])), 3);
        assert_eq!(count_models(&json!({"other": true})), 0);
    }
}
