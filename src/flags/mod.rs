pub mod catalog;

use std::collections::HashMap;
use std::rc::Rc;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{normalize_flag_name, parse_bool, FlagMetadata, ValueType};

/// In-memory view of the `flag_metadata` table.
///
/// The table is seeded from [`catalog::FLAGS`] the first time it is found
/// empty. Lookups are served from the cache until `load(true)`.
pub struct FlagManager {
    db: Rc<Database>,
    flags: Vec<FlagMetadata>,
    index: HashMap<String, usize>,
    loaded: bool,
}

impl FlagManager {
    pub fn new(db: Rc<Database>) -> Result<Self> {
        let mut manager = FlagManager { db, flags: Vec::new(), index: HashMap::new(), loaded: false };
        manager.load(false)?;
        Ok(manager)
    }

    pub fn load(&mut self, force_reload: bool) -> Result<()> {
        if self.loaded && !force_reload {
            return Ok(());
        }
        let mut flags = self.db.all_flag_metadata()?;
        if flags.is_empty() {
            tracing::info!("Flag metadata table empty, seeding built-in catalog");
            self.db.populate_flag_metadata(&catalog::default_flags())?;
            flags = self.db.all_flag_metadata()?;
        }
        self.index = flags.iter().enumerate().map(|(i, f)| (f.name.clone(), i)).collect();
        self.flags = flags;
        self.loaded = true;
        tracing::debug!(count = self.flags.len(), "Flag metadata loaded");
        Ok(())
    }

    pub fn flag(&self, name: &str) -> Option<&FlagMetadata> {
        self.index.get(&normalize_flag_name(name)).map(|&i| &self.flags[i])
    }

    /// All flags ordered by category, then name.
    pub fn all_flags(&self) -> &[FlagMetadata] {
        &self.flags
    }

    pub fn flags_by_category(&self, category: &str) -> Vec<&FlagMetadata> {
        self.flags.iter().filter(|f| f.category == category).collect()
    }

    /// Distinct categories in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for flag in &self.flags {
            if !categories.contains(&flag.category.as_str()) {
                categories.push(&flag.category);
            }
        }
        categories
    }

    /// Flags the creation wizard offers for a category.
    pub fn wizard_flags(&self, category: &str) -> Vec<&FlagMetadata> {
        self.flags
            .iter()
            .filter(|f| f.category == category && f.wizard_visible && !f.is_deprecated)
            .collect()
    }

    /// Categories that have at least one wizard-visible flag.
    pub fn wizard_categories(&self) -> Vec<&str> {
        self.categories()
            .into_iter()
            .filter(|c| !self.wizard_flags(c).is_empty())
            .collect()
    }

    pub fn set_wizard_visibility(&mut self, name: &str, visible: bool) -> Result<()> {
        if !self.db.update_flag_wizard_visibility(name, visible)? {
            return Err(AppError::Validation(format!("unknown flag '{name}'")));
        }
        tracing::info!(flag = name, visible, "Updated wizard visibility");
        self.load(true)
    }

    /// Checks a candidate value against the flag's declared type.
    pub fn validate_flag(&self, name: &str, value: Option<&str>) -> Result<()> {
        let flag = self
            .flag(name)
            .ok_or_else(|| AppError::Validation(format!("unknown flag '{name}'")))?;
        validate_value(flag, value)
    }
}

/// Type check shared by the flag manager and the preset forms.
pub fn validate_value(flag: &FlagMetadata, value: Option<&str>) -> Result<()> {
    let value = value.map(str::trim).unwrap_or("");
    let fail = |msg: String| Err(AppError::Validation(format!("--{}: {msg}", flag.name)));

    if flag.requires_value && value.is_empty() {
        return fail("a value is required".into());
    }

    match flag.value_type {
        ValueType::BooleanExplicit if parse_bool(value).is_none() => {
            fail(format!("expected true or false, got '{value}'"))
        }
        ValueType::Boolean if !value.is_empty() && parse_bool(value).is_none() => {
            fail(format!("expected a boolean, got '{value}'"))
        }
        ValueType::Integer if !value.is_empty() && value.parse::<i64>().is_err() => {
            fail(format!("expected an integer, got '{value}'"))
        }
        ValueType::Float if !value.is_empty() && value.parse::<f64>().is_err() => {
            fail(format!("expected a number, got '{value}'"))
        }
        ValueType::Path if value.contains('\0') => fail("path contains a NUL byte".into()),
        _ => Ok(()),
    }
}
