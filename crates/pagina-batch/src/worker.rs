// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export worker: runs a batch on its own thread and reports over a bounded
// channel. The driver drains the receiver on its own schedule and stops the
// run through the shared cancel flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use pagina_core::config::CoreConfig;
use pagina_core::error::{PaginaError, Result};
use pagina_core::human_errors::humanize_error;
use pagina_core::types::{ExportFormat, SessionId};
use pagina_export::{CancelFlag, ExportPrompt, ProgressSink};
use pagina_store::{BatchStore, CategoryStore};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::orchestrator::BatchOrchestrator;

/// Capacity of the worker → driver channel.
pub const CHANNEL_CAPACITY: usize = 64;

/// Events sent by the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    Progress { text: String, fraction: f32 },
    Completed {
        files: usize,
        folder: PathBuf,
        format: ExportFormat,
    },
    /// The run stopped on request; the session can be resumed.
    Cancelled,
    Error(String),
}

/// What the worker should run.
#[derive(Debug, Clone)]
pub enum BatchJob {
    /// Scan `root` and export into `output` (or the configured default).
    New { root: PathBuf, output: Option<PathBuf> },
    /// Continue an interrupted session.
    Resume(SessionId),
}

/// Where the worker keeps its state.
#[derive(Debug, Clone)]
pub struct WorkerPaths {
    pub batch_db: PathBuf,
    /// Category catalogue; `None` disables usage tracking.
    pub categories_db: Option<PathBuf>,
}

/// Forwards progress into the channel. Blocks when the driver falls behind.
struct ChannelProgress {
    sender: Sender<WorkerMessage>,
}

impl ChannelProgress {
    fn send(&self, message: WorkerMessage) {
        if self.sender.blocking_send(message).is_err() {
            debug!("driver dropped the receiver, progress discarded");
        }
    }
}

impl ProgressSink for ChannelProgress {
    fn on_document_start(&self, name: &str, index: usize, total: usize) {
        let fraction = if total == 0 { 0.0 } else { (index - 1) as f32 / total as f32 };
        self.send(WorkerMessage::Progress {
            text: format!("Documento {index}/{total}: {name}"),
            fraction,
        });
    }

    fn on_page(&self, done: u32, total: u32) {
        let fraction = if total == 0 { 0.0 } else { done as f32 / total as f32 };
        self.send(WorkerMessage::Progress {
            text: format!("Pagina {done}/{total}"),
            fraction,
        });
    }

    fn on_file_written(&self, path: &Path) {
        debug!(path = %path.display(), "file written");
    }

    fn on_status(&self, text: &str, fraction: f32) {
        self.send(WorkerMessage::Progress {
            text: text.to_string(),
            fraction,
        });
    }
}

/// Handle on a running worker.
pub struct BatchWorker {
    receiver: Receiver<WorkerMessage>,
    cancel: CancelFlag,
    handle: Option<JoinHandle<()>>,
}

impl BatchWorker {
    /// Ask the worker to stop after the current page.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Every message available right now, without blocking.
    pub fn drain(&mut self) -> Vec<WorkerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Wait for the next message; `None` once the worker is gone and the
    /// channel is empty.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.receiver.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|handle| handle.is_finished())
    }

    /// Wait for the thread to exit.
    pub fn join(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PaginaError::Export("export worker panicked".into())),
            None => Ok(()),
        }
    }
}

/// Start `job` on a new thread.
pub fn spawn_batch_worker(
    config: CoreConfig,
    paths: WorkerPaths,
    prompt: Arc<dyn ExportPrompt>,
    job: BatchJob,
) -> Result<BatchWorker> {
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();

    let handle = std::thread::Builder::new()
        .name("pagina-export".into())
        .spawn(move || {
            let format = config.export_format;
            let progress = Arc::new(ChannelProgress {
                sender: sender.clone(),
            });
            let message = match run_job(config, &paths, prompt, progress, worker_cancel, job) {
                Ok(report) if report.cancelled => WorkerMessage::Cancelled,
                Ok(report) => WorkerMessage::Completed {
                    files: report.files,
                    folder: report.output_dir,
                    format,
                },
                Err(err) if err.is_cancelled() => WorkerMessage::Cancelled,
                Err(err) => {
                    error!(error = %err, "batch worker failed");
                    let human = humanize_error(&err);
                    WorkerMessage::Error(format!("{} {}", human.message, human.suggestion))
                }
            };
            if sender.blocking_send(message).is_err() {
                warn!("driver gone before the final message");
            }
        })?;

    info!("export worker started");
    Ok(BatchWorker {
        receiver,
        cancel,
        handle: Some(handle),
    })
}

fn run_job(
    config: CoreConfig,
    paths: &WorkerPaths,
    prompt: Arc<dyn ExportPrompt>,
    progress: Arc<ChannelProgress>,
    cancel: CancelFlag,
    job: BatchJob,
) -> Result<crate::orchestrator::BatchReport> {
    let store = BatchStore::open(&paths.batch_db)?;
    let mut orchestrator = BatchOrchestrator::new(config, store)
        .with_prompt(prompt)
        .with_progress(progress)
        .with_cancel_flag(cancel);
    if let Some(path) = &paths.categories_db {
        orchestrator = orchestrator.with_categories(CategoryStore::open(path)?);
    }

    orchestrator.recover()?;
    match job {
        BatchJob::New { root, output } => orchestrator.run_new(&root, output.as_deref()),
        BatchJob::Resume(session) => orchestrator.run_session(&session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use pagina_core::types::TiffCompression;
    use pagina_document::TiffPageWriter;
    use pagina_export::AutoPrompt;

    fn fixture(dir: &Path, stem: &str) {
        std::fs::create_dir_all(dir).expect("mkdir");
        let file = std::fs::File::create(dir.join(format!("{stem}.tif"))).expect("create");
        let mut writer = TiffPageWriter::new(file, TiffCompression::TiffLzw).expect("writer");
        let page = RgbImage::from_pixel(5, 5, Rgb([1, 2, 3]));
        writer.write_page(&DynamicImage::ImageRgb8(page)).expect("page");
        writer.finish();
        std::fs::write(dir.join(format!("{stem}.json")), r#"{"Intestatario":"W"}"#).expect("sidecar");
    }

    fn wait(worker: &mut BatchWorker) -> Vec<WorkerMessage> {
        let mut messages = Vec::new();
        while !worker.is_finished() {
            messages.extend(worker.drain());
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        worker.join().expect("join");
        messages.extend(worker.drain());
        messages
    }

    #[test]
    fn worker_reports_progress_then_completion() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(&input, "one");
        fixture(&input, "two");
        let output = dir.path().join("out");

        let mut config = CoreConfig::default();
        config.export_format = ExportFormat::Jpeg;
        let paths = WorkerPaths {
            batch_db: dir.path().join("batch_state.db"),
            categories_db: Some(dir.path().join("categories.db")),
        };
        let mut worker = spawn_batch_worker(
            config,
            paths,
            Arc::new(AutoPrompt::default()),
            BatchJob::New {
                root: input,
                output: Some(output.clone()),
            },
        )
        .expect("spawn");

        let messages = wait(&mut worker);
        assert!(messages.iter().any(|m| matches!(m, WorkerMessage::Progress { .. })));
        assert_eq!(
            messages.last(),
            Some(&WorkerMessage::Completed {
                files: 2,
                folder: output,
                format: ExportFormat::Jpeg,
            })
        );
    }

    #[test]
    fn missing_input_is_reported_as_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WorkerPaths {
            batch_db: dir.path().join("batch_state.db"),
            categories_db: None,
        };
        let mut worker = spawn_batch_worker(
            CoreConfig::default(),
            paths,
            Arc::new(AutoPrompt::default()),
            BatchJob::New {
                root: dir.path().join("missing"),
                output: None,
            },
        )
        .expect("spawn");

        let messages = wait(&mut worker);
        assert!(matches!(messages.last(), Some(WorkerMessage::Error(_))));
    }

    #[test]
    fn cancel_before_start_reports_cancelled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        fixture(&input, "one");
        let paths = WorkerPaths {
            batch_db: dir.path().join("batch_state.db"),
            categories_db: None,
        };
        let prompt: Arc<dyn ExportPrompt> = Arc::new(AutoPrompt::default());

        // Pre-cancelled flag: run the job directly so the race with the
        // spawned thread does not matter.
        let cancel = CancelFlag::new();
        cancel.cancel();
        let (sender, _receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let report = run_job(
            CoreConfig::default(),
            &paths,
            prompt,
            Arc::new(ChannelProgress { sender }),
            cancel,
            BatchJob::New {
                root: input,
                output: None,
            },
        )
        .expect("run");
        assert!(report.cancelled);

        let store = BatchStore::open(&paths.batch_db).expect("store");
        assert_eq!(store.get_incomplete_sessions().expect("incomplete").len(), 1);
    }

    #[test]
    fn every_exported_page_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).expect("mkdir");
        let file = std::fs::File::create(input.join("tre.tif")).expect("create");
        let mut writer = TiffPageWriter::new(file, TiffCompression::TiffLzw).expect("writer");
        for _ in 0..3 {
            let page = RgbImage::from_pixel(5, 5, Rgb([1, 2, 3]));
            writer.write_page(&DynamicImage::ImageRgb8(page)).expect("page");
        }
        writer.finish();
        std::fs::write(input.join("tre.json"), r#"{"Intestatario":"W"}"#).expect("sidecar");

        let paths = WorkerPaths {
            batch_db: dir.path().join("batch_state.db"),
            categories_db: None,
        };
        let mut config = CoreConfig::default();
        config.export_format = ExportFormat::Jpeg;
        let (sender, mut receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let report = run_job(
            config,
            &paths,
            Arc::new(AutoPrompt::default()),
            Arc::new(ChannelProgress { sender }),
            CancelFlag::new(),
            BatchJob::New {
                root: input,
                output: Some(dir.path().join("out")),
            },
        )
        .expect("run");
        assert!(!report.cancelled);

        let mut pages = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            if let WorkerMessage::Progress { text, fraction } = message {
                if text.starts_with("Pagina ") {
                    pages.push((text, fraction));
                }
            }
        }
        assert_eq!(
            pages.iter().map(|(text, _)| text.as_str()).collect::<Vec<_>>(),
            vec!["Pagina 1/3", "Pagina 2/3", "Pagina 3/3"]
        );
        assert_eq!(pages.last().map(|(_, fraction)| *fraction), Some(1.0));
    }
}
