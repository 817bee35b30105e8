// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session inspection and housekeeping.

use std::process::ExitCode;

use anyhow::Context;
use clap::Subcommand;
use pagina_core::types::{DocumentStatus, SessionId};
use pagina_store::{BatchSession, BatchStore};

use crate::services::app_services::AppServices;

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List sessions, newest first
    List {
        /// Only sessions that can be resumed
        #[arg(long)]
        incomplete: bool,
    },
    /// Show the documents of a session
    Show {
        session: String,
        /// Only documents in this state (pending, processing, completed, error, skipped)
        #[arg(long)]
        status: Option<String>,
    },
    /// Per-status and per-workflow counts of a session
    Stats {
        session: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a pending document as skipped
    Skip { document_id: i64 },
    /// Delete a session and its documents
    Delete { session: String },
}

pub fn run(services: &AppServices, command: SessionCommands) -> anyhow::Result<ExitCode> {
    let store = services.batch_store()?;
    match command {
        SessionCommands::List { incomplete } => {
            let sessions = if incomplete {
                store.get_incomplete_sessions()?
            } else {
                store.list_sessions()?
            };
            if sessions.is_empty() {
                println!("Nessuna sessione.");
            }
            for session in &sessions {
                println!("{}", session_line(session));
            }
        }
        SessionCommands::Show { session, status } => {
            let session_id = existing(&store, &session)?.session_id;
            let status = status
                .as_deref()
                .map(str::parse::<DocumentStatus>)
                .transpose()?;
            for doc in store.get_session_documents(&session_id, status, None)? {
                let detail = match (&doc.error_message, doc.exported_files.len()) {
                    (Some(message), _) => message.clone(),
                    (None, 0) => String::new(),
                    (None, files) => format!("{files} file"),
                };
                println!(
                    "{:>5} {:<10} {:<5} {} {detail}",
                    doc.id,
                    doc.status.as_str(),
                    doc.workflow.as_str(),
                    doc.doc_path.display()
                );
            }
        }
        SessionCommands::Stats { session, json } => {
            let session_id = existing(&store, &session)?.session_id;
            let stats = store.statistics(&session_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Documenti:   {}", stats.total);
                for status in DocumentStatus::ALL {
                    println!("  {:<10} {}", status.as_str(), stats.count(status));
                }
                for (workflow, count) in &stats.by_workflow {
                    println!("  {:<10} {count}", workflow.as_str());
                }
                println!("Avanzamento: {:.1}%", stats.progress_percent);
            }
        }
        SessionCommands::Skip { document_id } => {
            store.skip_document(document_id)?;
            println!("Documento {document_id} saltato.");
        }
        SessionCommands::Delete { session } => {
            let session_id = SessionId::parse(&session)?;
            if store.delete_session(&session_id)? {
                println!("Sessione {session_id} eliminata.");
            } else {
                println!("Sessione {session_id} non trovata.");
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn existing(store: &BatchStore, session: &str) -> anyhow::Result<BatchSession> {
    let session_id = SessionId::parse(session)?;
    store
        .get_session(&session_id)?
        .with_context(|| format!("session {session_id} not found"))
}

fn session_line(session: &BatchSession) -> String {
    let state = if session.completed { "completata" } else { "in corso" };
    format!(
        "{}  {}  {:>4}/{:<4} {:<10} {}",
        session.session_id,
        session.created_at.format("%Y-%m-%d %H:%M"),
        session.processed_documents,
        session.total_documents,
        state,
        session.root_path.display()
    )
}
