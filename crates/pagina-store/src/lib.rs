// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagina-store: Embedded SQLite persistence.
//
// `categories.db` holds the category catalogue used for naming and usage
// ranking; `batch_state.db` holds batch sessions and their document queue so
// an interrupted run can be resumed.

pub mod batch;
pub mod categories;

pub use batch::{BatchDocument, BatchSession, BatchStore, SessionStatistics};
pub use categories::{Category, CategoryStats, CategoryStore};

/// Current UTC time in the fixed-width RFC 3339 form stored in both
/// databases, so text ordering matches time ordering.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Parse a stored timestamp column.
pub(crate) fn parse_timestamp(
    index: usize,
    value: &str,
) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
        })
}
