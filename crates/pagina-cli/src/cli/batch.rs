// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch driver: starts the export worker and polls it until it finishes.
// Ctrl-C sets the cancel flag; the worker stops after the current page and
// the session stays resumable.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use pagina_batch::{BatchJob, BatchWorker, WorkerMessage, spawn_batch_worker};
use pagina_core::human_errors::{EXPORT_CANCELLED, export_completed_message};
use pagina_core::types::SessionId;
use tracing::{info, warn};

use super::ExportArgs;
use crate::services::app_services::AppServices;

/// How often the driver drains the worker channel.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub async fn cmd_batch(
    services: &AppServices,
    root: PathBuf,
    output: Option<PathBuf>,
    args: &ExportArgs,
) -> anyhow::Result<ExitCode> {
    let config = args.apply(services.config());
    let worker = spawn_batch_worker(
        config,
        services.worker_paths(),
        args.prompt(),
        BatchJob::New { root, output },
    )?;
    drive(worker).await
}

pub async fn cmd_resume(
    services: &AppServices,
    session: Option<&str>,
    args: &ExportArgs,
) -> anyhow::Result<ExitCode> {
    let store = services.batch_store()?;
    let session_id = match session {
        Some(id) => SessionId::parse(id)?,
        None => match store.get_incomplete_sessions()?.into_iter().next() {
            Some(session) => session.session_id,
            None => {
                println!("Nessuna sessione da riprendere.");
                return Ok(ExitCode::SUCCESS);
            }
        },
    };
    let session = store
        .get_session(&session_id)?
        .with_context(|| format!("session {session_id} not found"))?;
    if session.completed {
        bail!("session {session_id} is already completed");
    }

    info!(%session_id, "resuming session");
    println!(
        "Ripresa sessione {session_id} ({}/{} documenti completati)",
        session.processed_documents, session.total_documents
    );
    let config = args.apply(services.config());
    let worker = spawn_batch_worker(
        config,
        services.worker_paths(),
        args.prompt(),
        BatchJob::Resume(session_id),
    )?;
    drive(worker).await
}

/// Poll `worker` until it reports a final message.
async fn drive(mut worker: BatchWorker) -> anyhow::Result<ExitCode> {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut interrupted = false;

    let success = 'poll: loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                if let Err(err) = signal {
                    warn!(error = %err, "cannot listen for Ctrl-C");
                }
                eprintln!("Interruzione richiesta, attendo la fine della pagina corrente...");
                worker.cancel();
                interrupted = true;
            }
            _ = ticker.tick() => {
                let finished = worker.is_finished();
                for message in worker.drain() {
                    if let Some(success) = show(&message) {
                        break 'poll success;
                    }
                }
                if finished {
                    // Worker gone without a final message.
                    break 'poll false;
                }
            }
        }
    };

    worker.join()?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print `message`. Final messages return whether the run succeeded.
fn show(message: &WorkerMessage) -> Option<bool> {
    match message {
        WorkerMessage::Progress { text, fraction } => {
            eprintln!("[{:>3.0}%] {text}", fraction * 100.0);
            None
        }
        WorkerMessage::Completed {
            files,
            folder,
            format,
        } => {
            println!(
                "{} ({format})",
                export_completed_message(*files, &folder.display().to_string())
            );
            Some(true)
        }
        WorkerMessage::Cancelled => {
            println!("{EXPORT_CANCELLED}. Riprendere con `pagina resume`.");
            Some(true)
        }
        WorkerMessage::Error(text) => {
            eprintln!("Errore: {text}");
            Some(false)
        }
    }
}
