// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-document export: the interactive path outside batch sessions.

use std::path::{Path, PathBuf};

use pagina_core::config::CoreConfig;
use pagina_core::error::Result;
use pagina_core::sidecar::Sidecar;
use pagina_core::types::CsvMode;
use pagina_document::DocumentHandle;
use pagina_export::index::{
    DEFAULT_CSV_NAME, append_csv, per_file_csv_name, rows_for_files, write_new_csv,
};
use pagina_export::{
    CancelFlag, ExportEngine, ExportOptions, ExportOutcome, ExportPrompt, ProgressSink,
};
use pagina_store::CategoryStore;
use tracing::{info, instrument, warn};

use crate::prepare::{prepare_groups, track_categories};

/// Result of [`export_single`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleExport {
    pub output_dir: PathBuf,
    /// `None` when the operator aborted at the empty-group check.
    pub outcome: Option<ExportOutcome>,
    pub csv_path: Option<PathBuf>,
}

/// Collaborators of a single export.
pub struct SingleExportContext<'a> {
    pub prompt: &'a dyn ExportPrompt,
    pub progress: &'a dyn ProgressSink,
    pub cancel: CancelFlag,
    pub categories: Option<&'a mut CategoryStore>,
}

/// Sidecar of `document`: next to it, or in `json_folder` when the
/// configuration keeps sidecars apart.
pub fn locate_sidecar(config: &CoreConfig, document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{stem}.json");
    match (&config.json_folder, config.use_same_folder_for_json) {
        (Some(folder), false) => folder.join(name),
        _ => document.with_file_name(name),
    }
}

/// Folder the files of `document` go to. With `preserve_folder_structure`
/// the document's folder relative to `default_input_folder` is kept.
pub fn output_dir_for(config: &CoreConfig, document: &Path, output: Option<&Path>) -> PathBuf {
    let parent = document.parent().unwrap_or_else(|| Path::new("."));
    let base = output
        .map(Path::to_path_buf)
        .or_else(|| config.default_output_folder.clone())
        .unwrap_or_else(|| parent.to_path_buf());

    if !config.preserve_folder_structure {
        return base;
    }
    match config
        .default_input_folder
        .as_deref()
        .and_then(|input| parent.strip_prefix(input).ok())
    {
        Some(relative) if !relative.as_os_str().is_empty() => base.join(relative),
        _ => base,
    }
}

/// Export one document and update the CSV index per `csv_mode`.
///
/// A missing sidecar exports the whole document with no metadata.
#[instrument(skip_all, fields(document = %document.display()))]
pub fn export_single(
    config: &CoreConfig,
    document: &Path,
    output: Option<&Path>,
    context: SingleExportContext<'_>,
) -> Result<SingleExport> {
    let sidecar_path = locate_sidecar(config, document);
    let sidecar = if sidecar_path.is_file() {
        Sidecar::read(&sidecar_path)?.0
    } else {
        warn!(sidecar = %sidecar_path.display(), "no sidecar, exporting the whole document");
        Sidecar::Flat {
            metadata: Default::default(),
        }
    };

    let mut handle = DocumentHandle::open(document)?;
    let output_dir = output_dir_for(config, document, output);

    let Some(groups) = prepare_groups(&sidecar, handle.total_pages(), document, context.prompt)
    else {
        info!("export aborted at the empty group check");
        return Ok(SingleExport {
            output_dir,
            outcome: None,
            csv_path: None,
        });
    };

    let engine = ExportEngine::new(
        ExportOptions::from(config),
        context.prompt,
        context.progress,
        context.cancel,
    );
    let outcome = engine.export_document(&mut handle, &groups, &output_dir)?;
    let stem = handle.stem();
    handle.close();

    if let Some(categories) = context.categories {
        if let Err(err) = track_categories(categories, &sidecar, document, &outcome) {
            warn!(error = %err, "category usage not recorded");
        }
    }

    let rows = rows_for_files(&outcome.exported_files(), sidecar.metadata(), None);
    let csv_path = if rows.is_empty() {
        None
    } else {
        let delimiter = config.csv_delimiter_byte();
        let path = match config.csv_mode {
            CsvMode::Incremental => {
                let path = incremental_csv_path(config, &output_dir);
                append_csv(&path, &rows, delimiter)?;
                path
            }
            CsvMode::PerFile => {
                let name = per_file_csv_name(config, &stem, &output_dir);
                write_new_csv(&output_dir, &name, &rows, delimiter)?
            }
        };
        Some(path)
    };

    Ok(SingleExport {
        output_dir,
        outcome: Some(outcome),
        csv_path,
    })
}

/// `csv_output_path` when it names a `.csv` file, `{dir}/metadata.csv` when
/// it names a folder, `{output}/metadata.csv` when unset.
fn incremental_csv_path(config: &CoreConfig, output_dir: &Path) -> PathBuf {
    let default_name = format!("{DEFAULT_CSV_NAME}.csv");
    match &config.csv_output_path {
        Some(path) if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) => {
            path.clone()
        }
        Some(dir) => dir.join(default_name),
        None => output_dir.join(default_name),
    }
}
