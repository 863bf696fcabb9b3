use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{AppError, Result};
use crate::models::{AdvancedEntry, AdvancedSettings};

/// The two tables share a shape and differ only in the JSON column.
#[derive(Clone, Copy)]
enum Table {
    Settings,
    Metadata,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Settings => "model_settings",
            Table::Metadata => "model_metadata",
        }
    }

    fn json_column(self) -> &'static str {
        match self {
            Table::Settings => "settings_json",
            Table::Metadata => "metadata_json",
        }
    }
}

fn row_to_entry(row: &Row) -> rusqlite::Result<AdvancedEntry> {
    Ok(AdvancedEntry {
        preset_id: row.get(0)?,
        model_name: row.get(1)?,
        json: row.get(2)?,
        file_path: row.get(3)?,
    })
}

fn check_json(json: &str) -> Result<()> {
    serde_json::from_str::<serde_json::Value>(json)?;
    Ok(())
}

impl Database {
    // NULL preset_id / model_name never collide under UNIQUE, so upserts
    // match with IS and replace explicitly.
    fn upsert_advanced(
        &self,
        table: Table,
        preset_id: Option<i64>,
        model_name: Option<&str>,
        json: &str,
        file_path: Option<&str>,
    ) -> Result<()> {
        check_json(json)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("DELETE FROM {} WHERE preset_id IS ?1 AND model_name IS ?2", table.name()),
            params![preset_id, model_name],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {} (preset_id, model_name, {}, file_path) VALUES (?1, ?2, ?3, ?4)",
                table.name(),
                table.json_column()
            ),
            params![preset_id, model_name, json, file_path],
        )?;
        if let Some(id) = preset_id {
            tx.execute(
                "UPDATE presets SET updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
                params![id],
            )?;
        }
        tx.commit()?;
        tracing::info!(table = table.name(), ?preset_id, ?model_name, "Stored advanced entry");
        Ok(())
    }

    fn advanced_entry(
        &self,
        table: Table,
        preset_id: Option<i64>,
        model_name: Option<&str>,
    ) -> Result<Option<AdvancedEntry>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT preset_id, model_name, {}, file_path FROM {}
                     WHERE preset_id IS ?1 AND model_name IS ?2",
                    table.json_column(),
                    table.name()
                ),
                params![preset_id, model_name],
                row_to_entry,
            )
            .optional()
            .map_err(AppError::Database)
    }

    fn delete_advanced(
        &self,
        table: Table,
        preset_id: Option<i64>,
        model_name: Option<&str>,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE preset_id IS ?1 AND model_name IS ?2", table.name()),
            params![preset_id, model_name],
        )?;
        Ok(changed > 0)
    }

    fn advanced_for_preset(&self, table: Table, preset_id: i64) -> Result<Vec<AdvancedEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT preset_id, model_name, {}, file_path FROM {}
             WHERE preset_id = ?1 AND model_name IS NOT NULL
             ORDER BY model_name",
            table.json_column(),
            table.name()
        ))?;
        let rows = stmt.query_map(params![preset_id], row_to_entry)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(AppError::Database)
    }

    // ── Model settings ────────────────────────────────────────────────────────

    /// Stores settings for a preset/model pair. Either side may be `None`
    /// for global or model-global settings.
    pub fn upsert_model_settings(
        &self,
        preset_id: Option<i64>,
        model_name: Option<&str>,
        settings_json: &str,
        file_path: Option<&str>,
    ) -> Result<()> {
        self.upsert_advanced(Table::Settings, preset_id, model_name, settings_json, file_path)
    }

    pub fn model_settings(
        &self,
        preset_id: Option<i64>,
        model_name: Option<&str>,
    ) -> Result<Option<AdvancedEntry>> {
        self.advanced_entry(Table::Settings, preset_id, model_name)
    }

    pub fn delete_model_settings(&self, preset_id: Option<i64>, model_name: Option<&str>) -> Result<bool> {
        self.delete_advanced(Table::Settings, preset_id, model_name)
    }

    // ── Model metadata ────────────────────────────────────────────────────────

    pub fn upsert_model_metadata(
        &self,
        preset_id: i64,
        model_name: &str,
        metadata_json: &str,
        file_path: Option<&str>,
    ) -> Result<()> {
        if model_name.trim().is_empty() {
            return Err(AppError::Validation("model name cannot be empty".into()));
        }
        self.upsert_advanced(Table::Metadata, Some(preset_id), Some(model_name), metadata_json, file_path)
    }

    pub fn model_metadata(&self, preset_id: i64, model_name: &str) -> Result<Option<AdvancedEntry>> {
        self.advanced_entry(Table::Metadata, Some(preset_id), Some(model_name))
    }

    pub fn delete_model_metadata(&self, preset_id: i64, model_name: &str) -> Result<bool> {
        self.delete_advanced(Table::Metadata, Some(preset_id), Some(model_name))
    }

    /// Every per-model settings and metadata entry of a preset.
    pub fn advanced_settings(&self, preset_id: i64) -> Result<AdvancedSettings> {
        let mut advanced = AdvancedSettings::default();
        for entry in self.advanced_for_preset(Table::Settings, preset_id)? {
            if let Some(model) = entry.model_name.clone() {
                advanced.settings.insert(model, entry);
            }
        }
        for entry in self.advanced_for_preset(Table::Metadata, preset_id)? {
            if let Some(model) = entry.model_name.clone() {
                advanced.metadata.insert(model, entry);
            }
        }
        Ok(advanced)
    }

    /// Removes both settings and metadata for one model of a preset.
    pub fn delete_model_entries(&self, preset_id: i64, model_name: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        for table in [Table::Settings, Table::Metadata] {
            removed += tx.execute(
                &format!("DELETE FROM {} WHERE preset_id = ?1 AND model_name = ?2", table.name()),
                params![preset_id, model_name],
            )?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }
}
