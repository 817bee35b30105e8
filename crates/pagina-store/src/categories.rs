// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Category catalogue backed by SQLite.
//
// Categories come from sidecars (protected while their sidecar is the active
// one) or are added by the operator. Usage counts rank the list offered for
// naming. The set of names in the currently loaded sidecar is process state
// held by the store, not persisted.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use pagina_core::error::{PaginaError, Result};
use pagina_core::types::CategorySource;

use crate::{now_rfc3339, parse_timestamp};

/// SQLite schema for the categories table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS categories (
        name TEXT PRIMARY KEY,
        source TEXT NOT NULL DEFAULT 'manual',
        json_document TEXT,
        usage_count INTEGER NOT NULL DEFAULT 0,
        protected INTEGER NOT NULL DEFAULT 0,
        last_used TEXT,
        created_at TEXT NOT NULL DEFAULT ''
    )
"#;

/// Columns an older database may lack, with the definition used to add them.
const MIGRATED_COLUMNS: [(&str, &str); 6] = [
    ("source", "TEXT NOT NULL DEFAULT 'manual'"),
    ("usage_count", "INTEGER NOT NULL DEFAULT 0"),
    ("json_document", "TEXT"),
    ("protected", "INTEGER NOT NULL DEFAULT 0"),
    ("last_used", "TEXT"),
    ("created_at", "TEXT NOT NULL DEFAULT ''"),
];

const SELECT_COLUMNS: &str =
    "name, source, json_document, usage_count, protected, last_used, created_at";

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub source: CategorySource,
    /// Document whose sidecar last declared this category.
    pub json_document: Option<String>,
    pub usage_count: u32,
    pub protected: bool,
    pub last_used: Option<DateTime<Utc>>,
}

/// Aggregate counts over the catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub total: u32,
    pub protected: u32,
    pub from_sidecar: u32,
    pub manual: u32,
    pub total_usage: u64,
    pub active: u32,
}

/// Category catalogue.
///
/// Keeps one connection for its lifetime. Not shared across threads; the
/// worker that exports owns its own store.
pub struct CategoryStore {
    conn: Connection,
    /// Names declared by the sidecar currently in use.
    active: HashSet<String>,
}

fn db_err(context: &str) -> impl FnOnce(rusqlite::Error) -> PaginaError + '_ {
    move |e| PaginaError::Database(format!("{context}: {e}"))
}

impl CategoryStore {
    /// Open (or create) the category database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        let store = Self::init(conn)?;
        info!("category database opened");
        Ok(store)
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;
        migrate_columns(&conn)?;
        Ok(Self {
            conn,
            active: HashSet::new(),
        })
    }

    // -- Sidecar synchronisation ----------------------------------------------

    /// Make `names` the protected, active set for the document at `doc_path`.
    ///
    /// Every sidecar category loses protection first; the incoming names are
    /// then upserted as protected sidecar categories. Usage counts survive.
    #[instrument(skip(self, names), fields(doc = %doc_path.display(), count = names.len()))]
    pub fn sync_sidecar(&mut self, names: &[String], doc_path: &Path) -> Result<()> {
        let now = now_rfc3339();
        let doc = doc_path.display().to_string();

        let tx = self.conn.transaction().map_err(db_err("begin sync"))?;
        tx.execute(
            "UPDATE categories SET protected = 0 WHERE source = 'sidecar'",
            [],
        )
        .map_err(db_err("clear protection"))?;

        let mut active = HashSet::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            tx.execute(
                "INSERT INTO categories (name, source, json_document, usage_count, protected, created_at)
                 VALUES (?1, 'sidecar', ?2, 0, 1, ?3)
                 ON CONFLICT(name) DO UPDATE SET
                     source = 'sidecar',
                     protected = 1,
                     json_document = excluded.json_document",
                params![name, doc, now],
            )
            .map_err(db_err("upsert sidecar category"))?;
            active.insert(name.to_string());
        }
        tx.commit().map_err(db_err("commit sync"))?;

        self.active = active;
        debug!(active = self.active.len(), "sidecar categories synchronised");
        Ok(())
    }

    /// Forget the active sidecar set (no document loaded).
    pub fn clear_active(&mut self) {
        self.active.clear();
    }

    /// Names of the active sidecar, sorted.
    pub fn active_categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active.iter().cloned().collect();
        names.sort();
        names
    }

    // -- Catalogue edits ------------------------------------------------------

    /// Add a category. Returns `false` if the name is blank or already known.
    #[instrument(skip(self))]
    pub fn add(&self, name: &str, source: CategorySource) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            warn!("refusing to add a blank category name");
            return Ok(false);
        }
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO categories (name, source, usage_count, protected, created_at)
                 VALUES (?1, ?2, 0, ?3, ?4)",
                params![
                    name,
                    source.as_str(),
                    source == CategorySource::Sidecar,
                    now_rfc3339()
                ],
            )
            .map_err(db_err("insert category"))?;
        Ok(inserted > 0)
    }

    /// Whether `name` exists, is unprotected and not in the active sidecar.
    pub fn can_delete(&self, name: &str) -> Result<bool> {
        if self.active.contains(name) {
            return Ok(false);
        }
        let protected: Option<bool> = self
            .conn
            .query_row(
                "SELECT protected FROM categories WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err("query protection"))?;
        Ok(protected == Some(false))
    }

    /// Delete an unprotected, inactive category. Returns whether a row was
    /// removed.
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> Result<bool> {
        if !self.can_delete(name)? {
            debug!("category is protected, active or unknown");
            return Ok(false);
        }
        let removed = self
            .conn
            .execute("DELETE FROM categories WHERE name = ?1", params![name])
            .map_err(db_err("delete category"))?;
        if removed > 0 {
            info!("category deleted");
        }
        Ok(removed > 0)
    }

    /// Count one more use of `name`, creating it as a manual category if it
    /// is unknown.
    pub fn record_usage(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        let now = now_rfc3339();
        self.conn
            .execute(
                "INSERT INTO categories (name, source, usage_count, protected, last_used, created_at)
                 VALUES (?1, 'manual', 1, 0, ?2, ?2)
                 ON CONFLICT(name) DO UPDATE SET
                     usage_count = usage_count + 1,
                     last_used = excluded.last_used",
                params![name, now],
            )
            .map_err(db_err("record usage"))?;
        Ok(())
    }

    // -- Queries --------------------------------------------------------------

    /// Every category: protected first, then most used, then most recent.
    pub fn all(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM categories
                 ORDER BY protected DESC, usage_count DESC, last_used DESC, name ASC"
            ))
            .map_err(db_err("prepare all"))?;

        stmt.query_map([], row_to_category)
            .map_err(db_err("query all"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect rows"))
    }

    pub fn get(&self, name: &str) -> Result<Option<Category>> {
        self.conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM categories WHERE name = ?1"),
                params![name],
                row_to_category,
            )
            .optional()
            .map_err(db_err("get category"))
    }

    pub fn stats(&self) -> Result<CategoryStats> {
        let (total, protected, from_sidecar, manual, total_usage) = self
            .conn
            .query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(protected), 0),
                        COALESCE(SUM(source = 'sidecar'), 0),
                        COALESCE(SUM(source = 'manual'), 0),
                        COALESCE(SUM(usage_count), 0)
                 FROM categories",
                [],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .map_err(db_err("stats"))?;

        Ok(CategoryStats {
            total,
            protected,
            from_sidecar,
            manual,
            total_usage: total_usage.max(0) as u64,
            active: self.active.len() as u32,
        })
    }
}

/// Add any column an older database lacks. Existing rows keep their data.
fn migrate_columns(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(categories)")
        .map_err(db_err("table info"))?;
    let existing: HashSet<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(db_err("table info"))?
        .collect::<std::result::Result<_, _>>()
        .map_err(db_err("table info rows"))?;

    for (column, definition) in MIGRATED_COLUMNS {
        if !existing.contains(column) {
            conn.execute_batch(&format!(
                "ALTER TABLE categories ADD COLUMN {column} {definition}"
            ))
            .map_err(db_err("add column"))?;
            info!(column, "category table migrated");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Column indices must match `SELECT_COLUMNS`.
fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let source_str: String = row.get(1)?;
    let source: CategorySource = source_str.parse().map_err(|e: PaginaError| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let last_used: Option<String> = row.get(5)?;
    let last_used = match last_used.as_deref() {
        Some(text) if !text.is_empty() => Some(parse_timestamp(5, text)?),
        _ => None,
    };

    Ok(Category {
        name: row.get(0)?,
        source,
        json_document: row.get(2)?,
        usage_count: row.get::<_, i64>(3)?.max(0) as u32,
        protected: row.get(4)?,
        last_used,
    })
}
