use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Result;

/// Keyring service name every API key is stored under.
pub const KEYRING_SERVICE: &str = "aider-start";

/// Account name for a provider's API key.
pub fn provider_account(provider: &str) -> String {
    format!("{provider}_api_key")
}

/// Account name for a custom endpoint's API key.
pub fn endpoint_account(endpoint: &str) -> String {
    format!("endpoint_{endpoint}_api_key")
}

/// Where API keys live. Nothing else in the crate persists them.
pub trait CredentialStore {
    fn get(&self, account: &str) -> Result<Option<String>>;
    fn set(&self, account: &str, secret: &str) -> Result<()>;
    /// Returns false when there was nothing to delete.
    fn delete(&self, account: &str) -> Result<bool>;
}

// ── OS keyring ────────────────────────────────────────────────────────────────

pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: &str) -> Self {
        KeyringStore { service: service.to_string() }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, account)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, account: &str) -> Result<Option<String>> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, account: &str, secret: &str) -> Result<()> {
        self.entry(account)?.set_password(secret)?;
        tracing::info!(account, "Stored API key in keyring");
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<bool> {
        match self.entry(account)?.delete_credential() {
            Ok(()) => {
                tracing::info!(account, "Deleted API key from keyring");
                Ok(true)
            }
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Process-local store, used when no OS keyring should be touched.
#[derive(Default)]
pub struct MemoryStore {
    secrets: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, account: &str) -> Result<Option<String>> {
        Ok(self.secrets.borrow().get(account).cloned())
    }

    fn set(&self, account: &str, secret: &str) -> Result<()> {
        self.secrets.borrow_mut().insert(account.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<bool> {
        Ok(self.secrets.borrow_mut().remove(account).is_some())
    }
}
