use rusqlite::{params, OptionalExtension, Row};

use super::{bool_to_int, Database};
use crate::error::{AppError, Result};
use crate::models::{FlagMetadata, ValueType};

fn row_to_flag(row: &Row) -> rusqlite::Result<FlagMetadata> {
    let raw_type: Option<String> = row.get("value_type")?;
    Ok(FlagMetadata {
        name: row.get("name")?,
        description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
        category: row.get::<_, Option<String>>("category")?.unwrap_or_else(|| "Other".into()),
        value_type: raw_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(ValueType::String),
        default_value: row.get("default_value")?,
        is_deprecated: row.get::<_, Option<i64>>("is_deprecated")?.unwrap_or(0) != 0,
        requires_value: row.get::<_, Option<i64>>("requires_value")?.unwrap_or(0) != 0,
        wizard_visible: row.get::<_, Option<i64>>("wizard_visible")?.unwrap_or(1) != 0,
    })
}

impl Database {
    /// Inserts catalog rows that are not present yet. Existing rows keep
    /// their (possibly user-edited) visibility. Returns rows inserted.
    pub fn populate_flag_metadata(&self, flags: &[FlagMetadata]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO flag_metadata
                 (name, description, category, value_type, default_value,
                  is_deprecated, requires_value, wizard_visible)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for flag in flags {
                inserted += stmt.execute(params![
                    flag.name,
                    flag.description,
                    flag.category,
                    flag.value_type.as_str(),
                    flag.default_value,
                    bool_to_int(flag.is_deprecated),
                    bool_to_int(flag.requires_value),
                    bool_to_int(flag.wizard_visible),
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(inserted, total = flags.len(), "Populated flag metadata");
        Ok(inserted)
    }

    pub fn flag_metadata(&self, name: &str) -> Result<Option<FlagMetadata>> {
        self.conn
            .query_row("SELECT * FROM flag_metadata WHERE name = ?1", params![name], row_to_flag)
            .optional()
            .map_err(AppError::Database)
    }

    /// All catalog rows ordered by category, then name.
    pub fn all_flag_metadata(&self) -> Result<Vec<FlagMetadata>> {
        let mut stmt = self.conn.prepare("SELECT * FROM flag_metadata ORDER BY category, name")?;
        let rows = stmt.query_map([], row_to_flag)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(AppError::Database)
    }

    pub fn update_flag_wizard_visibility(&self, name: &str, visible: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE flag_metadata SET wizard_visible = ?1 WHERE name = ?2",
            params![bool_to_int(visible), name],
        )?;
        Ok(changed > 0)
    }
}
