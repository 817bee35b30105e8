// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch state store: sessions and their document queue in SQLite.
//
// Every operation opens its own connection and closes it before returning,
// so a crash between operations never leaves a half-applied change behind.
// Rows left `processing` by a crash are not touched here: the orchestrator
// decides when to put them back to `pending`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info, instrument};

use pagina_core::error::{PaginaError, Result};
use pagina_core::types::{DocumentPair, DocumentStatus, ExportedFile, SessionId, WorkflowKind};

use crate::{now_rfc3339, parse_timestamp};

/// SQLite schema for sessions, documents and their indexes.
const CREATE_SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS batch_sessions (
        session_id TEXT PRIMARY KEY,
        root_path TEXT NOT NULL,
        output_path TEXT,
        created_at TEXT NOT NULL,
        completed_at TEXT,
        completed INTEGER NOT NULL DEFAULT 0,
        total_documents INTEGER NOT NULL DEFAULT 0,
        processed_documents INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS batch_documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL
            REFERENCES batch_sessions(session_id) ON DELETE CASCADE,
        doc_path TEXT NOT NULL,
        sidecar_path TEXT NOT NULL,
        relative_path TEXT NOT NULL,
        workflow_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        sidecar_data TEXT NOT NULL,
        processed_at TEXT,
        error_message TEXT,
        exported_files TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_batch_documents_status
        ON batch_documents(session_id, status);
    CREATE INDEX IF NOT EXISTS idx_batch_documents_workflow
        ON batch_documents(session_id, workflow_type);
"#;

const SESSION_COLUMNS: &str = "session_id, root_path, output_path, created_at, completed_at, \
                               completed, total_documents, processed_documents";

const DOCUMENT_COLUMNS: &str = "id, session_id, doc_path, sidecar_path, relative_path, \
                                workflow_type, status, sidecar_data, processed_at, \
                                error_message, exported_files";

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A batch run over one input tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSession {
    pub session_id: SessionId,
    pub root_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub total_documents: u32,
    /// Always equal to the number of `completed` rows.
    pub processed_documents: u32,
}

/// One queued document of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchDocument {
    /// Insertion order within the store.
    pub id: i64,
    pub session_id: SessionId,
    pub doc_path: PathBuf,
    pub sidecar_path: PathBuf,
    pub relative_path: String,
    pub workflow: WorkflowKind,
    pub status: DocumentStatus,
    pub sidecar_data: serde_json::Value,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub exported_files: Vec<ExportedFile>,
}

impl BatchDocument {
    /// Basenames of the files this document produced.
    pub fn exported_basenames(&self) -> Vec<&str> {
        self.exported_files.iter().map(|f| f.file.as_str()).collect()
    }
}

/// Per-session counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStatistics {
    pub total: u32,
    pub by_status: BTreeMap<DocumentStatus, u32>,
    pub by_workflow: BTreeMap<WorkflowKind, u32>,
    /// Completed documents as a percentage of all documents.
    pub progress_percent: f64,
}

impl SessionStatistics {
    pub fn count(&self, status: DocumentStatus) -> u32 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

fn db_err(context: &str) -> impl FnOnce(rusqlite::Error) -> PaginaError + '_ {
    move |e| PaginaError::Database(format!("{context}: {e}"))
}

/// Handle on the batch database file.
#[derive(Debug, Clone)]
pub struct BatchStore {
    path: PathBuf,
}

impl BatchStore {
    /// Create the schema if needed. Rows are left as they are.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute_batch(CREATE_SCHEMA_SQL)
            .map_err(db_err("create schema"))?;
        info!("batch state database opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(db_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(db_err("foreign_keys pragma"))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(db_err("busy timeout"))?;
        Ok(conn)
    }

    // -- Sessions -------------------------------------------------------------

    /// Register a new session and return its id.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn create_session(&self, root: &Path, output: Option<&Path>) -> Result<SessionId> {
        let id = SessionId::new();
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO batch_sessions (session_id, root_path, output_path, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                path_text(root),
                output.map(path_text),
                now_rfc3339()
            ],
        )
        .map_err(db_err("insert session"))?;
        info!(session = %id, "batch session created");
        Ok(id)
    }

    pub fn get_session(&self, session: &SessionId) -> Result<Option<BatchSession>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM batch_sessions WHERE session_id = ?1"),
            params![session.to_string()],
            row_to_session,
        )
        .optional()
        .map_err(db_err("get session"))
    }

    /// Sessions not yet marked completed, newest first.
    pub fn get_incomplete_sessions(&self) -> Result<Vec<BatchSession>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM batch_sessions
                 WHERE completed = 0 ORDER BY created_at DESC"
            ))
            .map_err(db_err("prepare incomplete sessions"))?;
        let sessions = stmt
            .query_map([], row_to_session)
            .map_err(db_err("query incomplete sessions"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect sessions"))?;
        debug!(count = sessions.len(), "incomplete sessions");
        Ok(sessions)
    }

    /// Every session, newest first.
    pub fn list_sessions(&self) -> Result<Vec<BatchSession>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM batch_sessions ORDER BY created_at DESC"
            ))
            .map_err(db_err("prepare sessions"))?;
        stmt.query_map([], row_to_session)
            .map_err(db_err("query sessions"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect sessions"))
    }

    #[instrument(skip(self), fields(session = %session))]
    pub fn mark_session_completed(&self, session: &SessionId) -> Result<()> {
        let conn = self.connect()?;
        let rows = conn
            .execute(
                "UPDATE batch_sessions SET completed = 1, completed_at = ?1 WHERE session_id = ?2",
                params![now_rfc3339(), session.to_string()],
            )
            .map_err(db_err("mark completed"))?;
        if rows == 0 {
            return Err(PaginaError::Database(format!("session {session} not found")));
        }
        info!("batch session completed");
        Ok(())
    }

    /// Delete a session and, through the foreign key, all its documents.
    /// Returns whether the session existed.
    #[instrument(skip(self), fields(session = %session))]
    pub fn delete_session(&self, session: &SessionId) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn
            .execute(
                "DELETE FROM batch_sessions WHERE session_id = ?1",
                params![session.to_string()],
            )
            .map_err(db_err("delete session"))?;
        if rows > 0 {
            info!("batch session deleted");
        }
        Ok(rows > 0)
    }

    // -- Documents ------------------------------------------------------------

    /// Queue `pairs` as `pending` rows in the given order and refresh the
    /// session's document total.
    #[instrument(skip(self, pairs), fields(session = %session, count = pairs.len()))]
    pub fn add_documents(&self, session: &SessionId, pairs: &[DocumentPair]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(db_err("begin add"))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO batch_documents
                         (session_id, doc_path, sidecar_path, relative_path, workflow_type,
                          status, sidecar_data)
                     VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
                )
                .map_err(db_err("prepare insert document"))?;
            for pair in pairs {
                let sidecar = serde_json::to_string(&pair.sidecar_data)?;
                stmt.execute(params![
                    session.to_string(),
                    path_text(&pair.doc_path),
                    path_text(&pair.sidecar_path),
                    pair.relative_path,
                    pair.workflow.as_str(),
                    sidecar,
                ])
                .map_err(db_err("insert document"))?;
            }
        }
        let updated = tx
            .execute(
                "UPDATE batch_sessions SET total_documents =
                     (SELECT COUNT(*) FROM batch_documents d
                      WHERE d.session_id = batch_sessions.session_id)
                 WHERE session_id = ?1",
                params![session.to_string()],
            )
            .map_err(db_err("update total"))?;
        if updated == 0 {
            return Err(PaginaError::Database(format!("session {session} not found")));
        }
        tx.commit().map_err(db_err("commit add"))?;

        info!("documents queued");
        Ok(pairs.len())
    }

    /// Move a document to `status`.
    ///
    /// `error` replaces the stored message (cleared with `None`);
    /// `exported` replaces the file list only when given. The session's
    /// processed count is recomputed from the rows in the same transaction.
    #[instrument(skip(self, error, exported), fields(status = %status))]
    pub fn update_document_status(
        &self,
        doc_id: i64,
        status: DocumentStatus,
        error: Option<&str>,
        exported: Option<&[ExportedFile]>,
    ) -> Result<()> {
        let exported_json = exported.map(serde_json::to_string).transpose()?;
        let finished = matches!(
            status,
            DocumentStatus::Completed | DocumentStatus::Error | DocumentStatus::Skipped
        );
        let processed_at = finished.then(now_rfc3339);

        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(db_err("begin update"))?;
        let rows = tx
            .execute(
                "UPDATE batch_documents SET
                     status = ?1,
                     error_message = ?2,
                     exported_files = COALESCE(?3, exported_files),
                     processed_at = COALESCE(?4, processed_at)
                 WHERE id = ?5",
                params![status.as_str(), error, exported_json, processed_at, doc_id],
            )
            .map_err(db_err("update document"))?;
        if rows == 0 {
            return Err(PaginaError::Database(format!("document {doc_id} not found")));
        }
        tx.execute(
            "UPDATE batch_sessions SET processed_documents =
                 (SELECT COUNT(*) FROM batch_documents d
                  WHERE d.session_id = batch_sessions.session_id AND d.status = 'completed')
             WHERE session_id = (SELECT session_id FROM batch_documents WHERE id = ?1)",
            params![doc_id],
        )
        .map_err(db_err("recount processed"))?;
        tx.commit().map_err(db_err("commit update"))?;

        debug!(doc_id, "document status updated");
        Ok(())
    }

    /// Operator skip.
    pub fn skip_document(&self, doc_id: i64) -> Result<()> {
        self.update_document_status(doc_id, DocumentStatus::Skipped, None, None)
    }

    /// Documents of a session in insertion order, optionally filtered.
    pub fn get_session_documents(
        &self,
        session: &SessionId,
        status: Option<DocumentStatus>,
        workflow: Option<WorkflowKind>,
    ) -> Result<Vec<BatchDocument>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM batch_documents
                 WHERE session_id = ?1
                   AND (?2 IS NULL OR status = ?2)
                   AND (?3 IS NULL OR workflow_type = ?3)
                 ORDER BY id ASC"
            ))
            .map_err(db_err("prepare documents"))?;
        stmt.query_map(
            params![
                session.to_string(),
                status.map(|s| s.as_str()),
                workflow.map(|w| w.as_str())
            ],
            row_to_document,
        )
        .map_err(db_err("query documents"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err("collect documents"))
    }

    /// The oldest `pending` document of a session.
    pub fn next_pending_document(&self, session: &SessionId) -> Result<Option<BatchDocument>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!(
                "SELECT {DOCUMENT_COLUMNS} FROM batch_documents
                 WHERE session_id = ?1 AND status = 'pending'
                 ORDER BY id ASC LIMIT 1"
            ),
            params![session.to_string()],
            row_to_document,
        )
        .optional()
        .map_err(db_err("next pending"))
    }

    /// Put every `processing` row of a session back to `pending`. Returns the
    /// number of rows reset.
    #[instrument(skip(self), fields(session = %session))]
    pub fn reset_processing_documents(&self, session: &SessionId) -> Result<usize> {
        let conn = self.connect()?;
        let rows = conn
            .execute(
                "UPDATE batch_documents SET status = 'pending'
                 WHERE session_id = ?1 AND status = 'processing'",
                params![session.to_string()],
            )
            .map_err(db_err("reset processing"))?;
        if rows > 0 {
            info!(rows, "interrupted documents requeued");
        }
        Ok(rows)
    }

    pub fn statistics(&self, session: &SessionId) -> Result<SessionStatistics> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT status, workflow_type, COUNT(*) FROM batch_documents
                 WHERE session_id = ?1 GROUP BY status, workflow_type",
            )
            .map_err(db_err("prepare statistics"))?;
        let groups = stmt
            .query_map(params![session.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })
            .map_err(db_err("query statistics"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect statistics"))?;

        let mut stats = SessionStatistics::default();
        for (status, workflow, count) in groups {
            let status: DocumentStatus = status.parse()?;
            let workflow: WorkflowKind = workflow.parse()?;
            stats.total += count;
            *stats.by_status.entry(status).or_insert(0) += count;
            *stats.by_workflow.entry(workflow).or_insert(0) += count;
        }
        if stats.total > 0 {
            stats.progress_percent =
                stats.count(DocumentStatus::Completed) as f64 * 100.0 / stats.total as f64;
        }
        Ok(stats)
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_error(index: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
}

/// Column indices must match `SESSION_COLUMNS`.
fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<BatchSession> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;
    let completed_at: Option<String> = row.get(4)?;

    Ok(BatchSession {
        session_id: SessionId::parse(&id).map_err(|e| conversion_error(0, e))?,
        root_path: PathBuf::from(row.get::<_, String>(1)?),
        output_path: row.get::<_, Option<String>>(2)?.map(PathBuf::from),
        created_at: parse_timestamp(3, &created_at)?,
        completed_at: completed_at
            .as_deref()
            .map(|text| parse_timestamp(4, text))
            .transpose()?,
        completed: row.get(5)?,
        total_documents: row.get(6)?,
        processed_documents: row.get(7)?,
    })
}

/// Column indices must match `DOCUMENT_COLUMNS`.
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<BatchDocument> {
    let session: String = row.get(1)?;
    let workflow: String = row.get(5)?;
    let status: String = row.get(6)?;
    let sidecar: String = row.get(7)?;
    let processed_at: Option<String> = row.get(8)?;
    let exported: Option<String> = row.get(10)?;

    Ok(BatchDocument {
        id: row.get(0)?,
        session_id: SessionId::parse(&session).map_err(|e| conversion_error(1, e))?,
        doc_path: PathBuf::from(row.get::<_, String>(2)?),
        sidecar_path: PathBuf::from(row.get::<_, String>(3)?),
        relative_path: row.get(4)?,
        workflow: workflow.parse().map_err(|e| conversion_error(5, e))?,
        status: status.parse().map_err(|e| conversion_error(6, e))?,
        sidecar_data: serde_json::from_str(&sidecar).map_err(|e| conversion_error(7, e))?,
        processed_at: processed_at
            .as_deref()
            .map(|text| parse_timestamp(8, text))
            .transpose()?,
        error_message: row.get(9)?,
        exported_files: match exported {
            Some(json) => serde_json::from_str(&json).map_err(|e| conversion_error(10, e))?,
            None => Vec::new(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, BatchStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = BatchStore::open(dir.path().join("batch_state.db")).expect("open");
        (dir, store)
    }

    fn pair(name: &str, workflow: WorkflowKind) -> DocumentPair {
        DocumentPair {
            doc_path: PathBuf::from(format!("/in/{name}.pdf")),
            sidecar_path: PathBuf::from(format!("/in/{name}.json")),
            relative_path: ".".into(),
            workflow,
            sidecar_data: json!({"Intestatario": name}),
        }
    }

    fn session_with(store: &BatchStore, pairs: &[DocumentPair]) -> SessionId {
        let id = store
            .create_session(Path::new("/in"), Some(Path::new("/out")))
            .expect("create");
        store.add_documents(&id, pairs).expect("add");
        id
    }

    #[test]
    fn add_documents_sets_total_and_keeps_order() {
        let (_dir, store) = store();
        let id = session_with(
            &store,
            &[pair("a", WorkflowKind::Split), pair("b", WorkflowKind::Flat)],
        );

        let session = store.get_session(&id).expect("get").expect("exists");
        assert_eq!(session.total_documents, 2);
        assert_eq!(session.output_path, Some(PathBuf::from("/out")));

        let docs = store.get_session_documents(&id, None, None).expect("docs");
        let names: Vec<_> = docs.iter().map(|d| d.doc_path.clone()).collect();
        assert_eq!(names, vec![PathBuf::from("/in/a.pdf"), PathBuf::from("/in/b.pdf")]);
        assert!(docs.iter().all(|d| d.status == DocumentStatus::Pending));
        assert_eq!(docs[0].sidecar_data, json!({"Intestatario": "a"}));
    }

    #[test]
    fn processed_count_tracks_completed_rows() {
        let (_dir, store) = store();
        let id = session_with(
            &store,
            &[pair("a", WorkflowKind::Flat), pair("b", WorkflowKind::Flat), pair("c", WorkflowKind::Flat)],
        );
        let docs = store.get_session_documents(&id, None, None).expect("docs");
        let files = vec![ExportedFile {
            file: "a_001.jpg".into(),
            category: "Documento Completo".into(),
        }];

        store
            .update_document_status(docs[0].id, DocumentStatus::Completed, None, Some(&files))
            .expect("complete a");
        store
            .update_document_status(docs[1].id, DocumentStatus::Error, Some("corrupt"), None)
            .expect("fail b");
        store.skip_document(docs[2].id).expect("skip c");

        let session = store.get_session(&id).expect("get").expect("exists");
        assert_eq!(session.processed_documents, 1);

        let done = store
            .get_session_documents(&id, Some(DocumentStatus::Completed), None)
            .expect("completed");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].exported_basenames(), vec!["a_001.jpg"]);
        assert!(done[0].processed_at.is_some());

        let failed = store
            .get_session_documents(&id, Some(DocumentStatus::Error), None)
            .expect("errors");
        assert_eq!(failed[0].error_message.as_deref(), Some("corrupt"));
    }

    #[test]
    fn workflow_filter_and_statistics() {
        let (_dir, store) = store();
        let id = session_with(
            &store,
            &[pair("a", WorkflowKind::Split), pair("b", WorkflowKind::Flat), pair("c", WorkflowKind::Split)],
        );
        let split = store
            .get_session_documents(&id, None, Some(WorkflowKind::Split))
            .expect("split docs");
        assert_eq!(split.len(), 2);

        store
            .update_document_status(split[0].id, DocumentStatus::Completed, None, Some(&[]))
            .expect("complete");

        let stats = store.statistics(&id).expect("stats");
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(DocumentStatus::Completed), 1);
        assert_eq!(stats.count(DocumentStatus::Pending), 2);
        assert_eq!(stats.by_workflow.get(&WorkflowKind::Split), Some(&2));
        assert!((stats.progress_percent - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn processing_rows_survive_reopen_until_reset() {
        let (dir, store) = store();
        let id = session_with(&store, &[pair("a", WorkflowKind::Flat), pair("b", WorkflowKind::Flat)]);
        let first = store.next_pending_document(&id).expect("next").expect("pending");
        store
            .update_document_status(first.id, DocumentStatus::Processing, None, None)
            .expect("processing");

        // A fresh handle on the same file, as after a crash.
        let reopened = BatchStore::open(dir.path().join("batch_state.db")).expect("reopen");
        let processing = reopened
            .get_session_documents(&id, Some(DocumentStatus::Processing), None)
            .expect("processing");
        assert_eq!(processing.len(), 1);

        assert_eq!(reopened.reset_processing_documents(&id).expect("reset"), 1);
        let next = reopened.next_pending_document(&id).expect("next").expect("pending");
        assert_eq!(next.id, first.id);
    }

    #[test]
    fn incomplete_sessions_and_completion() {
        let (_dir, store) = store();
        let id = session_with(&store, &[pair("a", WorkflowKind::Flat)]);
        assert_eq!(store.get_incomplete_sessions().expect("incomplete").len(), 1);

        store.mark_session_completed(&id).expect("complete");
        assert!(store.get_incomplete_sessions().expect("incomplete").is_empty());
        let session = store.get_session(&id).expect("get").expect("exists");
        assert!(session.completed);
        assert!(session.completed_at.is_some());
    }

    #[test]
    fn delete_session_cascades() {
        let (_dir, store) = store();
        let id = session_with(&store, &[pair("a", WorkflowKind::Flat)]);
        assert!(store.delete_session(&id).expect("delete"));
        assert!(!store.delete_session(&id).expect("delete again"));
        assert!(store.get_session_documents(&id, None, None).expect("docs").is_empty());
    }

    #[test]
    fn unknown_rows_are_errors() {
        let (_dir, store) = store();
        assert!(store.update_document_status(42, DocumentStatus::Completed, None, None).is_err());
        assert!(store.mark_session_completed(&SessionId::new()).is_err());
        assert!(store.add_documents(&SessionId::new(), &[pair("a", WorkflowKind::Flat)]).is_err());
    }
}
