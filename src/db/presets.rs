use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{AppError, Result};
use crate::models::{normalize_flag_name, parse_timestamp, FlagMap, Preset, PresetSummary};

// ── Row mappers ───────────────────────────────────────────────────────────────

fn row_to_preset(row: &Row) -> rusqlite::Result<Preset> {
    Ok(Preset {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
        provider: row.get("provider")?,
        endpoint: row.get("endpoint")?,
        created_at: row.get::<_, Option<String>>("created_at")?.as_deref().and_then(parse_timestamp),
        updated_at: row.get::<_, Option<String>>("updated_at")?.as_deref().and_then(parse_timestamp),
        flags: FlagMap::new(),
    })
}

fn row_to_summary(row: &Row) -> rusqlite::Result<PresetSummary> {
    Ok(PresetSummary {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
        flag_count: row.get::<_, i64>("flag_count")? as usize,
        updated_at: row.get::<_, Option<String>>("updated_at")?.as_deref().and_then(parse_timestamp),
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn map_name_conflict(e: rusqlite::Error, name: &str) -> AppError {
    if is_unique_violation(&e) {
        AppError::PresetExists(name.to_string())
    } else {
        AppError::Database(e)
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("preset name cannot be empty".into()));
    }
    Ok(name)
}

// ── Preset CRUD ───────────────────────────────────────────────────────────────

impl Database {
    pub fn create_preset(&self, name: &str, description: &str) -> Result<i64> {
        let name = validate_name(name)?;
        self.conn
            .execute(
                "INSERT INTO presets (name, description) VALUES (?1, ?2)",
                params![name, description],
            )
            .map_err(|e| map_name_conflict(e, name))?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, name, "Created preset");
        Ok(id)
    }

    /// Inserts or updates a preset with all its flags in one transaction.
    /// Returns the preset id.
    pub fn save_preset(&self, preset: &Preset) -> Result<i64> {
        let name = validate_name(&preset.name)?;
        let tx = self.conn.unchecked_transaction()?;

        let id = match preset.id {
            Some(id) => {
                let changed = tx
                    .execute(
                        "UPDATE presets
                         SET name = ?1, description = ?2, provider = ?3, endpoint = ?4,
                             updated_at = CURRENT_TIMESTAMP
                         WHERE id = ?5",
                        params![name, preset.description, preset.provider, preset.endpoint, id],
                    )
                    .map_err(|e| map_name_conflict(e, name))?;
                if changed == 0 {
                    return Err(AppError::PresetNotFound(id.to_string()));
                }
                tx.execute("DELETE FROM preset_flags WHERE preset_id = ?1", params![id])?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO presets (name, description, provider, endpoint)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![name, preset.description, preset.provider, preset.endpoint],
                )
                .map_err(|e| map_name_conflict(e, name))?;
                tx.last_insert_rowid()
            }
        };

        {
            let mut stmt = tx.prepare(
                "INSERT INTO preset_flags (preset_id, flag_name, flag_value) VALUES (?1, ?2, ?3)",
            )?;
            for (flag, value) in &preset.flags {
                stmt.execute(params![id, normalize_flag_name(flag), value])?;
            }
        }

        tx.commit()?;
        tracing::info!(id, name, flags = preset.flags.len(), "Saved preset");
        Ok(id)
    }

    /// Loads a preset and its flags.
    pub fn preset(&self, id: i64) -> Result<Preset> {
        let mut preset = self
            .conn
            .query_row("SELECT * FROM presets WHERE id = ?1", params![id], row_to_preset)
            .optional()?
            .ok_or_else(|| AppError::PresetNotFound(id.to_string()))?;
        preset.flags = self.preset_flags(id)?;
        Ok(preset)
    }

    pub fn preset_by_name(&self, name: &str) -> Result<Option<Preset>> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT id FROM presets WHERE name = ?1", params![name.trim()], |row| {
                row.get(0)
            })
            .optional()?;
        id.map(|id| self.preset(id)).transpose()
    }

    /// All presets ordered by name.
    pub fn list_presets(&self) -> Result<Vec<PresetSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.description, p.updated_at,
                    (SELECT COUNT(*) FROM preset_flags f WHERE f.preset_id = p.id) AS flag_count
             FROM presets p
             ORDER BY p.name COLLATE NOCASE",
        )?;
        let rows = stmt.query_map([], row_to_summary)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(AppError::Database)
    }

    pub fn update_preset_details(&self, id: i64, name: &str, description: &str) -> Result<()> {
        let name = validate_name(name)?;
        let changed = self
            .conn
            .execute(
                "UPDATE presets SET name = ?1, description = ?2 WHERE id = ?3",
                params![name, description, id],
            )
            .map_err(|e| map_name_conflict(e, name))?;
        if changed == 0 {
            return Err(AppError::PresetNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn set_preset_backend(
        &self,
        id: i64,
        provider: Option<&str>,
        endpoint: Option<&str>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE presets SET provider = ?1, endpoint = ?2 WHERE id = ?3",
            params![provider, endpoint, id],
        )?;
        if changed == 0 {
            return Err(AppError::PresetNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Deletes a preset; flags, settings and metadata go with it.
    pub fn delete_preset(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM presets WHERE id = ?1", params![id])?;
        if changed > 0 {
            tracing::info!(id, "Deleted preset");
        }
        Ok(changed > 0)
    }

    // ── Flags ─────────────────────────────────────────────────────────────────

    pub fn preset_flags(&self, id: i64) -> Result<FlagMap> {
        let mut stmt = self.conn.prepare(
            "SELECT flag_name, flag_value FROM preset_flags WHERE preset_id = ?1",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut flags = FlagMap::new();
        for row in rows {
            let (name, value) = row?;
            flags.insert(name, value);
        }
        Ok(flags)
    }

    /// Adds or replaces one flag and touches the preset's `updated_at`.
    pub fn set_flag(&self, preset_id: i64, name: &str, value: Option<&str>) -> Result<()> {
        let name = normalize_flag_name(name);
        if name.is_empty() {
            return Err(AppError::Validation("flag name cannot be empty".into()));
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO preset_flags (preset_id, flag_name, flag_value)
             VALUES (?1, ?2, ?3)",
            params![preset_id, name, value],
        )?;
        tx.execute(
            "UPDATE presets SET updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
            params![preset_id],
        )?;
        tx.commit()?;
        tracing::debug!(preset_id, flag = %name, "Set flag");
        Ok(())
    }

    pub fn delete_flag(&self, preset_id: i64, name: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM preset_flags WHERE preset_id = ?1 AND flag_name = ?2",
            params![preset_id, normalize_flag_name(name)],
        )?;
        if changed > 0 {
            self.conn.execute(
                "UPDATE presets SET updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
                params![preset_id],
            )?;
        }
        Ok(changed > 0)
    }
}
