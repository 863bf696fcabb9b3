//! SQLite store for presets, flags, advanced model settings, the flag
//! catalog and settings templates.
//!
//! One connection per process. Writes that touch more than one row run in a
//! transaction and roll back on error.

mod advanced;
mod flag_metadata;
mod presets;
pub mod schema;
mod templates;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database file and runs schema setup.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::file_access(parent, e))?;
        }
        tracing::info!(path = %path.display(), "Opening database");
        let conn = Connection::open(path)?;
        let db = Database { conn, path: Some(path.to_path_buf()) };
        db.setup()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database { conn: Connection::open_in_memory()?, path: None };
        db.setup()?;
        Ok(db)
    }

    fn setup(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::run(&self.conn)?;
        tracing::debug!("Database schema ready");
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
