// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestrator: drives a session from scan to CSV index.
//
// Every document moves `pending → processing → completed | error | skipped`
// in the batch store before and after its export, so a crash at any point
// leaves at most one `processing` row. `recover` puts such rows back to
// `pending` at the next start; the exported files of completed rows are
// never produced twice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use pagina_core::config::CoreConfig;
use pagina_core::error::{PaginaError, Result};
use pagina_core::human_errors::{EXPORT_CANCELLED, export_completed_message};
use pagina_core::sidecar::Sidecar;
use pagina_core::types::{BatchCsvLocation, DocumentStatus, SessionId};
use pagina_document::DocumentHandle;
use pagina_export::index::{CsvRow, batch_csv_name, rows_for_files, write_new_csv};
use pagina_export::{
    AutoPrompt, CancelFlag, ExportEngine, ExportOptions, ExportOutcome, ExportPrompt,
    ProgressSink, SilentProgress,
};
use pagina_store::{BatchDocument, BatchSession, BatchStore, CategoryStore};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::prepare::{prepare_groups, track_categories};
use crate::scanner::{ScanStatistics, scan};

/// Folder created under the input root when no output folder is given.
pub const DEFAULT_OUTPUT_DIR: &str = "export";

/// What one `run_session` call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub session_id: SessionId,
    pub output_dir: PathBuf,
    pub completed: u32,
    pub failed: u32,
    pub skipped: u32,
    /// Files written during this run.
    pub files: usize,
    pub csv_files: Vec<PathBuf>,
    /// The run stopped on the cancel flag; the session stays resumable.
    pub cancelled: bool,
}

enum DocumentResult {
    Exported(ExportOutcome),
    /// The operator aborted at the empty-group gate.
    Aborted,
}

pub struct BatchOrchestrator {
    config: CoreConfig,
    store: BatchStore,
    categories: Option<CategoryStore>,
    prompt: Arc<dyn ExportPrompt>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
}

impl BatchOrchestrator {
    // -- Construction ---------------------------------------------------------

    /// Unattended orchestrator: existing files are auto-renamed, empty
    /// groups are dropped, progress is discarded.
    pub fn new(config: CoreConfig, store: BatchStore) -> Self {
        Self {
            config,
            store,
            categories: None,
            prompt: Arc::new(AutoPrompt::default()),
            progress: Arc::new(SilentProgress),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_categories(mut self, categories: CategoryStore) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn ExportPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    // -- Session lifecycle ----------------------------------------------------

    /// Startup recovery: list unfinished sessions and requeue their
    /// interrupted documents.
    #[instrument(skip(self))]
    pub fn recover(&self) -> Result<Vec<BatchSession>> {
        let sessions = self.store.get_incomplete_sessions()?;
        for session in &sessions {
            self.store.reset_processing_documents(&session.session_id)?;
        }
        if !sessions.is_empty() {
            info!(count = sessions.len(), "incomplete batch sessions found");
        }
        Ok(sessions)
    }

    /// Scan `root` and persist the pairs as a new session. The output folder
    /// falls back to `default_output_folder`, then to `{root}/export`.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn start_session(
        &self,
        root: &Path,
        output: Option<&Path>,
    ) -> Result<(SessionId, ScanStatistics)> {
        let scanned = scan(root, self.config.scan_depth())?;
        let output = output
            .map(Path::to_path_buf)
            .or_else(|| self.config.default_output_folder.clone())
            .unwrap_or_else(|| root.join(DEFAULT_OUTPUT_DIR));

        let session = self.store.create_session(root, Some(&output))?;
        self.store.add_documents(&session, &scanned.pairs)?;
        Ok((session, scanned.stats))
    }

    /// Scan and run in one go.
    pub fn run_new(&mut self, root: &Path, output: Option<&Path>) -> Result<BatchReport> {
        let (session, _) = self.start_session(root, output)?;
        self.run_session(&session)
    }

    /// Export every pending document of `session` in insertion order, then
    /// write the session CSVs and mark it completed.
    ///
    /// On cancellation the in-flight document stays `processing`, no CSV is
    /// written and the report has `cancelled` set.
    #[instrument(skip(self), fields(session = %session_id))]
    pub fn run_session(&mut self, session_id: &SessionId) -> Result<BatchReport> {
        let session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| PaginaError::Database(format!("session {session_id} not found")))?;
        let output_root = session_output(&session);

        let stats = self.store.statistics(session_id)?;
        let total = stats.total as usize;
        let mut position = total - stats.count(DocumentStatus::Pending) as usize;

        let mut report = BatchReport {
            session_id: *session_id,
            output_dir: output_root.clone(),
            completed: 0,
            failed: 0,
            skipped: 0,
            files: 0,
            csv_files: Vec::new(),
            cancelled: false,
        };

        loop {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let Some(document) = self.store.next_pending_document(session_id)? else {
                break;
            };
            position += 1;

            self.store
                .update_document_status(document.id, DocumentStatus::Processing, None, None)?;
            let name = document
                .doc_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.progress.on_document_start(&name, position, total);

            match self.process_document(&document, &output_root) {
                Ok(result) => self.record_result(&document, result, &mut report)?,
                Err(err) if err.is_cancelled() => {
                    report.cancelled = true;
                    break;
                }
                Err(err) => {
                    error!(document = %document.doc_path.display(), error = %err, "document export failed");
                    self.store.update_document_status(
                        document.id,
                        DocumentStatus::Error,
                        Some(&err.to_string()),
                        None,
                    )?;
                    report.failed += 1;
                }
            }

            let fraction = if total == 0 { 1.0 } else { position as f32 / total as f32 };
            self.progress
                .on_status(&format!("{position}/{total} {name}"), fraction);
        }

        if report.cancelled {
            warn!(completed = report.completed, "batch run cancelled");
            self.progress.on_status(EXPORT_CANCELLED, 0.0);
            return Ok(report);
        }

        report.csv_files = self.write_session_csvs(&session)?;
        self.store.mark_session_completed(session_id)?;
        self.progress.on_status(
            &export_completed_message(report.files, &output_root.display().to_string()),
            1.0,
        );
        info!(
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            files = report.files,
            "batch run finished"
        );
        Ok(report)
    }

    /// Operator skip of a queued document.
    pub fn skip_document(&self, doc_id: i64) -> Result<()> {
        self.store.skip_document(doc_id)
    }

    // -- Per document ---------------------------------------------------------

    fn process_document(
        &mut self,
        document: &BatchDocument,
        output_root: &Path,
    ) -> Result<DocumentResult> {
        let sidecar = Sidecar::from_value(&document.sidecar_data);
        let mut handle = DocumentHandle::open(&document.doc_path)?;

        let Some(groups) = prepare_groups(
            &sidecar,
            handle.total_pages(),
            &document.doc_path,
            self.prompt.as_ref(),
        ) else {
            return Ok(DocumentResult::Aborted);
        };

        let output_dir = self.output_dir_for(output_root, &document.relative_path);
        let engine = ExportEngine::new(
            ExportOptions::from(&self.config),
            self.prompt.as_ref(),
            self.progress.as_ref(),
            self.cancel.clone(),
        );
        let outcome = engine.export_document(&mut handle, &groups, &output_dir)?;
        handle.close();

        if let Some(categories) = self.categories.as_mut() {
            if let Err(err) = track_categories(categories, &sidecar, &document.doc_path, &outcome) {
                warn!(error = %err, "category usage not recorded");
            }
        }
        Ok(DocumentResult::Exported(outcome))
    }

    fn record_result(
        &self,
        document: &BatchDocument,
        result: DocumentResult,
        report: &mut BatchReport,
    ) -> Result<()> {
        let outcome = match result {
            DocumentResult::Exported(outcome) => outcome,
            DocumentResult::Aborted => {
                self.store.update_document_status(
                    document.id,
                    DocumentStatus::Skipped,
                    Some("export aborted at the empty group check"),
                    None,
                )?;
                report.skipped += 1;
                return Ok(());
            }
        };

        if !outcome.files.is_empty() {
            let files = outcome.exported_files();
            self.store.update_document_status(
                document.id,
                DocumentStatus::Completed,
                None,
                Some(&files),
            )?;
            report.completed += 1;
            report.files += files.len();
        } else if outcome.skipped > 0 {
            self.store.update_document_status(
                document.id,
                DocumentStatus::Skipped,
                Some("every output was skipped by the operator"),
                Some(&[]),
            )?;
            report.skipped += 1;
        } else {
            self.store.update_document_status(
                document.id,
                DocumentStatus::Error,
                Some("no pages to export"),
                None,
            )?;
            report.failed += 1;
        }
        Ok(())
    }

    fn output_dir_for(&self, output_root: &Path, relative_path: &str) -> PathBuf {
        if self.config.batch_preserve_structure && relative_path != "." {
            output_root.join(relative_path)
        } else {
            output_root.to_path_buf()
        }
    }

    // -- CSV index ------------------------------------------------------------

    /// Write the CSV index of a session's completed documents according to
    /// `batch_csv_location`. Returns the files written.
    #[instrument(skip_all, fields(session = %session.session_id))]
    pub fn write_session_csvs(&self, session: &BatchSession) -> Result<Vec<PathBuf>> {
        let documents = self.store.get_session_documents(
            &session.session_id,
            Some(DocumentStatus::Completed),
            None,
        )?;
        let output_root = session_output(session);
        let delimiter = self.config.csv_delimiter_byte();
        let now = Local::now();
        let root_name = folder_name(&session.root_path);

        let mut written = Vec::new();
        match self.config.batch_csv_location {
            BatchCsvLocation::Root => {
                let rows: Vec<CsvRow> = documents
                    .iter()
                    .flat_map(|doc| document_rows(doc, Some(doc.relative_path.as_str())))
                    .collect();
                if !rows.is_empty() {
                    let name = batch_csv_name(&self.config, &root_name, 1, now);
                    written.push(write_new_csv(&output_root, &name, &rows, delimiter)?);
                }
            }
            BatchCsvLocation::PerFolder => {
                let mut folders: Vec<(String, Vec<CsvRow>)> = Vec::new();
                for doc in &documents {
                    let rows = document_rows(doc, None);
                    match folders.iter_mut().find(|(folder, _)| *folder == doc.relative_path) {
                        Some((_, existing)) => existing.extend(rows),
                        None => folders.push((doc.relative_path.clone(), rows)),
                    }
                }
                for (index, (relative, rows)) in folders.iter().enumerate() {
                    if rows.is_empty() {
                        continue;
                    }
                    let label = match relative.rsplit('/').next() {
                        Some(last) if relative != "." => last.to_string(),
                        _ => root_name.clone(),
                    };
                    let name = batch_csv_name(&self.config, &label, index + 1, now);
                    let dir = self.output_dir_for(&output_root, relative);
                    written.push(write_new_csv(&dir, &name, rows, delimiter)?);
                }
            }
        }

        info!(count = written.len(), "session CSV files written");
        Ok(written)
    }
}

fn session_output(session: &BatchSession) -> PathBuf {
    session
        .output_path
        .clone()
        .unwrap_or_else(|| session.root_path.join(DEFAULT_OUTPUT_DIR))
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn document_rows(document: &BatchDocument, relative_path: Option<&str>) -> Vec<CsvRow> {
    let sidecar = Sidecar::from_value(&document.sidecar_data);
    rows_for_files(&document.exported_files, sidecar.metadata(), relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use pagina_core::types::{ExportFormat, TiffCompression};
    use pagina_document::TiffPageWriter;
    use std::fs;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    const TWO_GROUPS: &str = r#"{"header":{"Pratica":"7"},"categories":[
        {"categoria":"Istanza","inizio":1,"fine":1},
        {"categoria":"Allegati","inizio":2,"fine":2}]}"#;

    /// Write `{dir}/{stem}.tiff` with `pages` pages and its sidecar.
    fn fixture(dir: &Path, stem: &str, pages: u32, sidecar: &str) -> PathBuf {
        fs::create_dir_all(dir).expect("mkdir");
        let path = dir.join(format!("{stem}.tiff"));
        let file = fs::File::create(&path).expect("create");
        let mut writer = TiffPageWriter::new(file, TiffCompression::TiffDeflate).expect("writer");
        for n in 0..pages {
            let page = RgbImage::from_pixel(6, 6, Rgb([n as u8 * 30, 90, 160]));
            writer.write_page(&DynamicImage::ImageRgb8(page)).expect("page");
        }
        writer.finish();
        fs::write(dir.join(format!("{stem}.json")), sidecar).expect("sidecar");
        path
    }

    fn flat(owner: &str) -> String {
        format!(r#"{{"Intestatario":"{owner}"}}"#)
    }

    fn config(format: ExportFormat) -> CoreConfig {
        let mut config = CoreConfig::default();
        config.export_format = format;
        config
    }

    fn orchestrator(dir: &Path, config: CoreConfig) -> BatchOrchestrator {
        let store = BatchStore::open(dir.join("batch_state.db")).expect("store");
        BatchOrchestrator::new(config, store)
    }

    fn files_in(dir: &Path, ext: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(ext))
            .collect();
        names.sort();
        names
    }

    /// Cancels when document number `at` starts.
    struct CancelAtDocument {
        flag: CancelFlag,
        at: usize,
    }

    impl ProgressSink for CancelAtDocument {
        fn on_document_start(&self, _name: &str, index: usize, _total: usize) {
            if index == self.at {
                self.flag.cancel();
            }
        }
    }

    /// Cancels after `after` pages.
    struct CancelAfterPages {
        flag: CancelFlag,
        after: u32,
        pages: AtomicU32,
    }

    impl ProgressSink for CancelAfterPages {
        fn on_page(&self, _done: u32, _total: u32) {
            if self.pages.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
                self.flag.cancel();
            }
        }
    }

    #[test]
    fn batch_exports_every_document_and_completes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(&input, "alpha", 2, TWO_GROUPS);
        fixture(&input, "beta", 3, &flat("A. Rossi"));
        let output = dir.path().join("out");

        let mut orchestrator = orchestrator(dir.path(), config(ExportFormat::PdfMulti))
            .with_categories(CategoryStore::open_in_memory().expect("categories"));
        let report = orchestrator.run_new(&input, Some(&output)).expect("run");

        assert_eq!((report.completed, report.failed, report.skipped), (2, 0, 0));
        assert!(!report.cancelled);
        assert_eq!(
            files_in(&output, ".pdf"),
            vec!["alpha_doc001_Istanza.pdf", "alpha_doc002_Allegati.pdf", "beta.pdf"]
        );

        let session = orchestrator.store().get_session(&report.session_id).expect("get").expect("exists");
        assert!(session.completed);
        assert_eq!(session.processed_documents, 2);
        assert!(orchestrator.recover().expect("recover").is_empty());
    }

    #[test]
    fn broken_document_is_marked_error_and_run_continues() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fs::create_dir_all(&input).expect("mkdir");
        fs::write(input.join("broken.tiff"), b"not a tiff").expect("broken");
        fs::write(input.join("broken.json"), flat("X")).expect("sidecar");
        fixture(&input, "good", 1, &flat("Y"));

        let mut orchestrator = orchestrator(dir.path(), config(ExportFormat::Jpeg));
        let report = orchestrator.run_new(&input, Some(&dir.path().join("out"))).expect("run");
        assert_eq!((report.completed, report.failed), (1, 1));

        let errors = orchestrator
            .store()
            .get_session_documents(&report.session_id, Some(DocumentStatus::Error), None)
            .expect("errors");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].error_message.is_some());
    }

    #[test]
    fn crash_recovery_exports_only_the_remainder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        for n in 1..=100 {
            fixture(&input, &format!("doc{n:03}"), 1, &flat("Z"));
        }
        let output = dir.path().join("out");

        // First run stops as document 57 starts, leaving it `processing`.
        let flag = CancelFlag::new();
        let mut first = orchestrator(dir.path(), config(ExportFormat::Jpeg))
            .with_cancel_flag(flag.clone())
            .with_progress(Arc::new(CancelAtDocument { flag, at: 57 }));
        let report = first.run_new(&input, Some(&output)).expect("first run");
        assert!(report.cancelled);
        assert_eq!(report.completed, 56);

        let store = first.store().clone();
        let stats = store.statistics(&report.session_id).expect("stats");
        assert_eq!(stats.count(DocumentStatus::Completed), 56);
        assert_eq!(stats.count(DocumentStatus::Processing), 1);
        assert_eq!(stats.count(DocumentStatus::Pending), 43);
        drop(first);

        // Restart.
        let mut second = orchestrator(dir.path(), config(ExportFormat::Jpeg));
        let sessions = second.recover().expect("recover");
        assert_eq!(sessions.len(), 1);
        let resumed = second.run_session(&sessions[0].session_id).expect("resume");
        assert_eq!(resumed.completed, 44);

        let session = store.get_session(&report.session_id).expect("get").expect("exists");
        assert_eq!(session.processed_documents, 100);
        assert!(session.completed);
        let jpegs = files_in(&output, ".jpg");
        assert_eq!(jpegs.len(), 100);
        assert!(jpegs.iter().all(|name| !name.contains('(')));
    }

    #[test]
    fn cancel_mid_document_leaves_no_partial_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(&input, "bundle", 8, &flat("A. Rossi"));
        let output = dir.path().join("out");

        let flag = CancelFlag::new();
        let mut first = orchestrator(dir.path(), config(ExportFormat::PdfMulti))
            .with_cancel_flag(flag.clone())
            .with_progress(Arc::new(CancelAfterPages {
                flag,
                after: 3,
                pages: AtomicU32::new(0),
            }));
        let report = first.run_new(&input, Some(&output)).expect("run");
        assert!(report.cancelled);
        assert!(files_in(&output, ".pdf").is_empty());
        assert_eq!(files_in(&output, "").len(), 0, "temporary file left behind");

        let processing = first
            .store()
            .get_session_documents(&report.session_id, Some(DocumentStatus::Processing), None)
            .expect("processing");
        assert_eq!(processing.len(), 1);
        drop(first);

        let mut second = orchestrator(dir.path(), config(ExportFormat::PdfMulti));
        let sessions = second.recover().expect("recover");
        let resumed = second.run_session(&sessions[0].session_id).expect("resume");
        assert_eq!(resumed.completed, 1);

        let pdf = lopdf::Document::load(output.join("bundle.pdf")).expect("pdf");
        assert_eq!(pdf.get_pages().len(), 8);
    }

    #[test]
    fn resumed_split_document_writes_each_group_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(
            &input,
            "bundle",
            5,
            r#"{"categories":[
                {"categoria":"A","inizio":1,"fine":2},
                {"categoria":"B","inizio":3,"fine":5}]}"#,
        );
        let output = dir.path().join("out");

        // Group A is on disk when the cancel lands inside group B.
        let flag = CancelFlag::new();
        let mut first = orchestrator(dir.path(), config(ExportFormat::TiffMulti))
            .with_cancel_flag(flag.clone())
            .with_progress(Arc::new(CancelAfterPages {
                flag,
                after: 3,
                pages: AtomicU32::new(0),
            }));
        let report = first.run_new(&input, Some(&output)).expect("run");
        assert!(report.cancelled);
        assert_eq!(files_in(&output, ""), Vec::<String>::new());
        drop(first);

        let mut second = orchestrator(dir.path(), config(ExportFormat::TiffMulti));
        let sessions = second.recover().expect("recover");
        let resumed = second.run_session(&sessions[0].session_id).expect("resume");
        assert_eq!(resumed.completed, 1);
        assert_eq!(resumed.files, 2);

        let expected = vec!["bundle_doc001_A.tiff", "bundle_doc002_B.tiff"];
        assert_eq!(files_in(&output, ".tiff"), expected);
        let rows = second
            .store()
            .get_session_documents(&report.session_id, Some(DocumentStatus::Completed), None)
            .expect("completed");
        assert_eq!(rows.len(), 1);
        let listed: Vec<&str> = rows[0].exported_files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(listed, expected);
    }

    #[test]
    fn every_listed_file_exists_in_the_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(&input, "alpha", 2, TWO_GROUPS);
        fixture(&input, "beta", 1, &flat("B"));
        fixture(&input, "gamma", 3, &flat("G"));
        let output = dir.path().join("out");
        fs::create_dir_all(&output).expect("out");
        fs::write(output.join("beta.pdf"), b"earlier export").expect("existing");

        let mut config = config(ExportFormat::PdfMulti);
        config.batch_csv_location = BatchCsvLocation::Root;
        config.batch_csv_naming = pagina_core::types::BatchCsvNaming::Auto;
        let mut orchestrator = orchestrator(dir.path(), config);
        let report = orchestrator.run_new(&input, Some(&output)).expect("run");
        assert_eq!(report.completed, 3);

        let rows = orchestrator
            .store()
            .get_session_documents(&report.session_id, Some(DocumentStatus::Completed), None)
            .expect("completed");
        let listed: Vec<String> = rows
            .iter()
            .flat_map(|row| row.exported_files.iter().map(|f| f.file.clone()))
            .collect();
        assert_eq!(listed.len(), 4);
        assert!(listed.contains(&"beta(1).pdf".to_string()));
        for name in &listed {
            assert!(output.join(name).is_file(), "{name} listed but missing");
        }

        let text = fs::read_to_string(output.join("metadata.csv")).expect("csv");
        let in_csv: Vec<&str> = text
            .lines()
            .skip(1)
            .filter_map(|line| line.split(';').next())
            .collect();
        assert_eq!(in_csv.len(), 4);
        for name in in_csv {
            assert!(output.join(name).is_file(), "{name} in the CSV but missing");
        }
    }

    #[test]
    fn per_folder_csv_named_after_each_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        for stem in ["a1", "a2", "a3"] {
            fixture(&input.join("A"), stem, 1, r#"{"Ufficio":"Nord"}"#);
        }
        for stem in ["b1", "b2"] {
            fixture(&input.join("B"), stem, 1, r#"{"Ufficio":"Sud","Anno":"2024"}"#);
        }
        let output = dir.path().join("output");

        let mut config = config(ExportFormat::PdfMulti);
        config.batch_csv_location = BatchCsvLocation::PerFolder;
        config.batch_csv_naming = pagina_core::types::BatchCsvNaming::FolderName;
        config.batch_preserve_structure = true;
        let mut orchestrator = orchestrator(dir.path(), config);
        let report = orchestrator.run_new(&input, Some(&output)).expect("run");

        assert_eq!(report.csv_files, vec![output.join("A/A.csv"), output.join("B/B.csv")]);
        let a = fs::read_to_string(output.join("A/A.csv")).expect("A.csv");
        let b = fs::read_to_string(output.join("B/B.csv")).expect("B.csv");
        assert_eq!(a.lines().count(), 4);
        assert_eq!(b.lines().count(), 3);
        assert!(a.lines().next().expect("header").ends_with("Nome File;Categoria;Ufficio"));
        assert!(b.lines().next().expect("header").ends_with("Nome File;Categoria;Anno;Ufficio"));
        assert!(output.join("A/a1.pdf").exists());
    }

    #[test]
    fn root_csv_carries_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(&input, "top", 1, &flat("T"));
        fixture(&input.join("sub"), "inner", 1, &flat("I"));
        let output = dir.path().join("out");

        let mut config = config(ExportFormat::TiffMulti);
        config.batch_csv_location = BatchCsvLocation::Root;
        config.batch_csv_naming = pagina_core::types::BatchCsvNaming::Auto;
        let mut orchestrator = orchestrator(dir.path(), config);
        let report = orchestrator.run_new(&input, Some(&output)).expect("run");

        assert_eq!(report.csv_files, vec![output.join("metadata.csv")]);
        let text = fs::read_to_string(output.join("metadata.csv")).expect("csv");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("Nome File;Categoria;Path Relativo;Intestatario"));
        assert_eq!(lines[1], "inner.tiff;Documento Completo;sub;I");
        assert_eq!(lines[2], "top.tiff;Documento Completo;.;T");
    }

    #[test]
    fn skipped_documents_are_not_exported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(&input, "keep", 1, &flat("K"));
        fixture(&input, "skip", 1, &flat("S"));
        let output = dir.path().join("out");

        let orchestrator = orchestrator(dir.path(), config(ExportFormat::Jpeg));
        let (session, stats) = orchestrator.start_session(&input, Some(&output)).expect("start");
        assert_eq!(stats.pairs_matched, 2);

        let queued = orchestrator.store().get_session_documents(&session, None, None).expect("docs");
        orchestrator.skip_document(queued[1].id).expect("skip");

        let started = Arc::new(AtomicUsize::new(0));
        struct Count(Arc<AtomicUsize>);
        impl ProgressSink for Count {
            fn on_document_start(&self, _name: &str, _index: usize, _total: usize) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        let mut orchestrator = orchestrator.with_progress(Arc::new(Count(started.clone())));
        let report = orchestrator.run_session(&session).expect("run");

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(report.completed, 1);
        assert_eq!(files_in(&output, ".jpg"), vec!["keep_001.jpg"]);
    }
}
