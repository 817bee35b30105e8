// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Commands that work on a folder or a single document without a session.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use pagina_batch::single::locate_sidecar;
use pagina_batch::{SingleExportContext, export_single, scan};
use pagina_core::grouping::groups_for_sidecar;
use pagina_core::human_errors::export_completed_message;
use pagina_core::sidecar::Sidecar;
use pagina_document::DocumentHandle;
use pagina_export::{CancelFlag, ProgressSink};
use tracing::warn;

use super::ExportArgs;
use crate::services::app_services::AppServices;

/// Prints each written file.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_file_written(&self, path: &Path) {
        println!("  {}", path.display());
    }
}

pub fn cmd_scan(services: &AppServices, root: &Path, depth: Option<i32>) -> anyhow::Result<ExitCode> {
    let depth = match depth {
        Some(depth) => usize::try_from(depth).ok(),
        None => services.config().scan_depth(),
    };
    let result = scan(root, depth)?;

    for pair in &result.pairs {
        println!(
            "{:<6} {:<30} {}",
            pair.workflow.as_str(),
            pair.relative_path,
            pair.doc_path.display()
        );
    }
    let stats = &result.stats;
    println!();
    println!("Cartelle visitate:   {}", stats.directories_visited);
    println!("Documenti trovati:   {}", stats.documents_found);
    println!("JSON trovati:        {}", stats.sidecars_found);
    println!(
        "Coppie:              {} ({} split, {} flat)",
        stats.pairs_matched, stats.split_pairs, stats.flat_pairs
    );
    if stats.sidecar_errors > 0 || stats.unreadable_entries > 0 {
        println!(
            "Scartati:            {} JSON non validi, {} voci illeggibili",
            stats.sidecar_errors, stats.unreadable_entries
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_export(
    services: &AppServices,
    document: &Path,
    output: Option<&Path>,
    args: &ExportArgs,
) -> anyhow::Result<ExitCode> {
    let config = args.apply(services.config());
    let prompt = args.prompt();
    let mut categories = match services.category_store() {
        Ok(store) => Some(store),
        Err(err) => {
            warn!(error = %err, "category catalogue unavailable, usage not tracked");
            None
        }
    };

    let context = SingleExportContext {
        prompt: prompt.as_ref(),
        progress: &ConsoleProgress,
        cancel: CancelFlag::new(),
        categories: categories.as_mut(),
    };
    let result = export_single(&config, document, output, context)?;

    let Some(outcome) = result.outcome else {
        println!("Export annullato per {}", document.display());
        return Ok(ExitCode::SUCCESS);
    };
    println!(
        "{}",
        export_completed_message(outcome.files.len(), &result.output_dir.display().to_string())
    );
    if outcome.skipped > 0 {
        println!("File non scritti su richiesta: {}", outcome.skipped);
    }
    if let Some(csv) = result.csv_path {
        println!("CSV: {}", csv.display());
    }
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_info(services: &AppServices, document: &Path) -> anyhow::Result<ExitCode> {
    let mut handle = DocumentHandle::open(document)
        .with_context(|| format!("cannot open {}", document.display()))?;
    let total = handle.total_pages();
    println!("Documento: {}", document.display());
    println!("Formato:   {:?}", handle.kind());
    println!("Pagine:    {total}");
    handle.close();

    let sidecar_path = locate_sidecar(services.config(), document);
    if !sidecar_path.is_file() {
        println!("JSON:      assente ({})", sidecar_path.display());
        return Ok(ExitCode::SUCCESS);
    }
    let (sidecar, _) = Sidecar::read(&sidecar_path)?;
    println!("JSON:      {} ({})", sidecar_path.display(), sidecar.workflow().as_str());
    for group in groups_for_sidecar(&sidecar, total) {
        let pages: Vec<String> = group.pages.iter().map(u32::to_string).collect();
        let pages = if pages.is_empty() {
            "nessuna pagina".to_string()
        } else {
            pages.join(", ")
        };
        println!("  {:>3} {:<30} {pages}", group.counter, group.category);
    }
    Ok(ExitCode::SUCCESS)
}
