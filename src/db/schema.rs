use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS presets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    provider    TEXT,
    endpoint    TEXT,
    created_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TRIGGER IF NOT EXISTS update_presets_updated_at
AFTER UPDATE ON presets
FOR EACH ROW
WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE presets SET updated_at = CURRENT_TIMESTAMP WHERE id = OLD.id;
END;

CREATE TABLE IF NOT EXISTS preset_flags (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    preset_id  INTEGER NOT NULL,
    flag_name  TEXT NOT NULL,
    flag_value TEXT,
    FOREIGN KEY (preset_id) REFERENCES presets (id) ON DELETE CASCADE,
    UNIQUE (preset_id, flag_name)
);

CREATE TABLE IF NOT EXISTS model_settings (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    preset_id     INTEGER,
    model_name    TEXT,
    settings_json TEXT NOT NULL,
    file_path     TEXT,
    FOREIGN KEY (preset_id) REFERENCES presets (id) ON DELETE CASCADE,
    UNIQUE (preset_id, model_name)
);

CREATE TABLE IF NOT EXISTS model_metadata (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    preset_id     INTEGER NOT NULL,
    model_name    TEXT NOT NULL,
    metadata_json TEXT NOT NULL,
    file_path     TEXT,
    FOREIGN KEY (preset_id) REFERENCES presets (id) ON DELETE CASCADE,
    UNIQUE (preset_id, model_name)
);

CREATE TABLE IF NOT EXISTS flag_metadata (
    name           TEXT PRIMARY KEY,
    description    TEXT,
    category       TEXT,
    value_type     TEXT,
    default_value  TEXT,
    is_deprecated  INTEGER DEFAULT 0,
    requires_value INTEGER DEFAULT 0,
    wizard_visible INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS settings_templates (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL UNIQUE,
    description   TEXT,
    settings_json TEXT NOT NULL,
    created_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TRIGGER IF NOT EXISTS update_settings_templates_updated_at
AFTER UPDATE ON settings_templates
FOR EACH ROW
WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE settings_templates SET updated_at = CURRENT_TIMESTAMP WHERE id = OLD.id;
END;
";

/// Columns added after the first release; older databases get them on open.
const ADDED_COLUMNS: &[(&str, &str, &str)] = &[
    ("presets", "provider", "TEXT"),
    ("presets", "endpoint", "TEXT"),
    ("flag_metadata", "wizard_visible", "INTEGER DEFAULT 1"),
];

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    for (table, column, decl) in ADDED_COLUMNS {
        if !has_column(conn, table, column)? {
            tracing::info!(table, column, "Adding missing column");
            conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl};"))?;
        }
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>("name"))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
