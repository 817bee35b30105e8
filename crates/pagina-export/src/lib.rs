// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagina-export: From document groups to files on disk.
//
// `naming` plans file names, `collision` applies the file handling policy,
// `engine` renders and writes pages, `index` maintains the CSV metadata
// index. Operator interaction and progress reach the engine through the
// `ExportPrompt` and `ProgressSink` traits.

pub mod collision;
pub mod engine;
pub mod index;
pub mod naming;
pub mod progress;
pub mod prompt;

pub use collision::Resolution;
pub use engine::{ExportEngine, ExportOptions, ExportOutcome, ExportedRecord};
pub use index::CsvRow;
pub use naming::{PlannedFile, plan_files, safe_category};
pub use progress::{CancelFlag, ProgressSink, SilentProgress};
pub use prompt::{AutoPrompt, ExportPrompt, OverwriteChoice};
