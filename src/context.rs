use std::rc::Rc;

use crate::config::quick::QuickPresets;
use crate::config::ConfigStore;
use crate::db::Database;
use crate::error::Result;
use crate::flags::FlagManager;
use crate::paths::AppPaths;
use crate::providers::ProviderManager;
use crate::secrets::CredentialStore;

/// Everything a command or screen needs: storage, flag catalog, providers.
pub struct Context {
    pub paths: AppPaths,
    pub db: Rc<Database>,
    pub flags: FlagManager,
    pub providers: ProviderManager,
}

impl Context {
    /// Opens the database at `paths.db_path` and the legacy config.
    pub fn open(paths: AppPaths, secrets: Box<dyn CredentialStore>) -> Result<Self> {
        let db = Database::open(&paths.db_path)?;
        Self::with_database(paths, db, secrets)
    }

    /// Provider config problems are logged and never stop startup; only the
    /// database and flag catalog are required.
    pub fn with_database(
        paths: AppPaths,
        db: Database,
        secrets: Box<dyn CredentialStore>,
    ) -> Result<Self> {
        let db = Rc::new(db);
        let flags = FlagManager::new(Rc::clone(&db))?;
        let config = ConfigStore::load(&paths.legacy_config_file());
        let mut providers = ProviderManager::without_migration(config, secrets);
        if let Err(e) = providers.migrate_inline_keys() {
            tracing::warn!(error = %e, "Could not move inline API keys, keeping them in memory");
        }
        if let Err(e) = providers.ensure_default_providers() {
            tracing::warn!(error = %e, "Could not write provider config, using in-memory defaults");
        }
        Ok(Context { paths, db, flags, providers })
    }

    pub fn quick_presets(&self) -> Result<QuickPresets> {
        QuickPresets::load(&self.paths.quick_presets_file())
    }
}
