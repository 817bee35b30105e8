// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Directory scanner: finds document/sidecar pairs under an input root.
//
// The walk is depth-first with siblings sorted by name, so two scans of an
// unchanged tree return the same pairs in the same order. A document pairs
// with the `{stem}.json` file next to it. Unreadable directories and
// malformed sidecars are logged and skipped.

use std::path::{Component, Path};

use pagina_core::error::{PaginaError, Result};
use pagina_core::sidecar::Sidecar;
use pagina_core::types::{BackendKind, DocumentPair, WorkflowKind};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Counters collected during one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStatistics {
    pub directories_visited: usize,
    pub documents_found: usize,
    pub sidecars_found: usize,
    pub pairs_matched: usize,
    pub split_pairs: usize,
    pub flat_pairs: usize,
    pub sidecar_errors: usize,
    pub unreadable_entries: usize,
}

/// Pairs found by a scan, in walk order.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub pairs: Vec<DocumentPair>,
    pub stats: ScanStatistics,
}

/// Scan `root`. `max_depth` of `Some(0)` looks at the root folder only,
/// `Some(n)` descends into folders down to depth `n`, `None` is unbounded.
#[instrument(skip_all, fields(root = %root.display(), ?max_depth))]
pub fn scan(root: &Path, max_depth: Option<usize>) -> Result<ScanResult> {
    if !root.is_dir() {
        return Err(PaginaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input folder {} not found", root.display()),
        )));
    }

    let mut walker = WalkDir::new(root).sort_by_file_name();
    if let Some(depth) = max_depth {
        // Files of a folder at depth n sit at walk depth n + 1.
        walker = walker.max_depth(depth.saturating_add(1));
    }

    let mut result = ScanResult::default();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                result.stats.unreadable_entries += 1;
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_dir() {
            result.stats.directories_visited += 1;
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            result.stats.sidecars_found += 1;
            continue;
        }
        if BackendKind::from_path(path).is_none() {
            continue;
        }
        result.stats.documents_found += 1;

        let Some(stem) = path.file_stem() else {
            continue;
        };
        let sidecar_path = path.with_file_name(format!("{}.json", stem.to_string_lossy()));
        if !sidecar_path.is_file() {
            debug!(document = %path.display(), "no sidecar, skipping");
            continue;
        }

        let sidecar_data = match Sidecar::read(&sidecar_path) {
            Ok((_, value)) => value,
            Err(err) => {
                warn!(sidecar = %sidecar_path.display(), error = %err, "skipping document with unreadable sidecar");
                result.stats.sidecar_errors += 1;
                continue;
            }
        };
        let workflow = pagina_core::classify_workflow(&sidecar_data);
        match workflow {
            WorkflowKind::Split => result.stats.split_pairs += 1,
            WorkflowKind::Flat => result.stats.flat_pairs += 1,
        }

        let folder = path.parent().unwrap_or(root);
        result.pairs.push(DocumentPair {
            doc_path: path.to_path_buf(),
            sidecar_path,
            relative_path: relative_folder(root, folder),
            workflow,
            sidecar_data,
        });
        result.stats.pairs_matched += 1;
    }

    info!(
        pairs = result.stats.pairs_matched,
        documents = result.stats.documents_found,
        directories = result.stats.directories_visited,
        "scan finished"
    );
    Ok(result)
}

/// `folder` relative to `root` with `/` separators; `.` for the root itself.
pub fn relative_folder(root: &Path, folder: &Path) -> String {
    let Ok(relative) = folder.strip_prefix(root) else {
        return ".".to_string();
    };
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
