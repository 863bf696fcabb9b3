use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{AppError, Result};
use crate::models::{parse_timestamp, SettingsTemplate};

fn row_to_template(row: &Row) -> rusqlite::Result<SettingsTemplate> {
    Ok(SettingsTemplate {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
        settings_json: row.get("settings_json")?,
        created_at: row.get::<_, Option<String>>("created_at")?.as_deref().and_then(parse_timestamp),
        updated_at: row.get::<_, Option<String>>("updated_at")?.as_deref().and_then(parse_timestamp),
    })
}

impl Database {
    /// Creates or overwrites the template called `name`.
    pub fn save_template(&self, name: &str, description: &str, settings_json: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("template name cannot be empty".into()));
        }
        serde_json::from_str::<serde_json::Value>(settings_json)?;
        self.conn.execute(
            "INSERT INTO settings_templates (name, description, settings_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                 description = excluded.description,
                 settings_json = excluded.settings_json,
                 updated_at = CURRENT_TIMESTAMP",
            params![name, description, settings_json],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM settings_templates WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        tracing::info!(id, name, "Saved settings template");
        Ok(id)
    }

    pub fn list_templates(&self) -> Result<Vec<SettingsTemplate>> {
        let mut stmt = self.conn.prepare("SELECT * FROM settings_templates ORDER BY name")?;
        let rows = stmt.query_map([], row_to_template)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(AppError::Database)
    }

    pub fn template_by_name(&self, name: &str) -> Result<Option<SettingsTemplate>> {
        self.conn
            .query_row(
                "SELECT * FROM settings_templates WHERE name = ?1",
                params![name],
                row_to_template,
            )
            .optional()
            .map_err(AppError::Database)
    }

    pub fn delete_template(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM settings_templates WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
