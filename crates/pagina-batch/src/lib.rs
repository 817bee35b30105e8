// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagina-batch: Scanning, batch sessions and the export worker.

pub mod orchestrator;
pub mod prepare;
pub mod scanner;
pub mod single;
pub mod worker;

pub use orchestrator::{BatchOrchestrator, BatchReport};
pub use scanner::{ScanResult, ScanStatistics, scan};
pub use single::{SingleExport, SingleExportContext, export_single};
pub use worker::{BatchJob, BatchWorker, WorkerMessage, WorkerPaths, spawn_batch_worker};
