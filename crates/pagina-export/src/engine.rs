// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export engine: turns the groups of one open document into image and PDF
// files.
//
// Each output is written to a temporary file in the target directory and
// renamed into place once complete, so a cancelled or failed multi-page
// file never appears under its final name. The cancel flag is polled before
// every file and every page.

use std::io::Write;
use std::path::{Path, PathBuf};

use pagina_core::config::{CoreConfig, DocumentNumbering};
use pagina_core::error::{PaginaError, Result};
use pagina_core::grouping::DocumentGroup;
use pagina_core::types::{ExportFormat, ExportedFile, FileHandlingMode, TiffCompression};
use pagina_document::{
    DocumentHandle, JpegOptions, PageImage, RasterPdfWriter, TiffPageWriter, encode_jpeg,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use crate::collision::{self, Resolution};
use crate::naming::{PlannedFile, plan_files};
use crate::progress::{CancelFlag, ProgressSink};
use crate::prompt::ExportPrompt;

/// The slice of the configuration the engine reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub jpeg: JpegOptions,
    pub tiff_compression: TiffCompression,
    pub file_handling_mode: FileHandlingMode,
    pub create_backup_on_overwrite: bool,
    pub numbering: DocumentNumbering,
}

impl From<&CoreConfig> for ExportOptions {
    fn from(config: &CoreConfig) -> Self {
        Self {
            format: config.export_format,
            jpeg: JpegOptions::from(config),
            tiff_compression: config.tiff_compression,
            file_handling_mode: config.file_handling_mode,
            create_backup_on_overwrite: config.create_backup_on_overwrite,
            numbering: config.document_numbering.clone(),
        }
    }
}

/// A file the engine wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedRecord {
    pub path: PathBuf,
    pub category: String,
    pub pages: Vec<u32>,
}

impl ExportedRecord {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The `{file, category}` form stored with batch rows.
    pub fn to_exported_file(&self) -> ExportedFile {
        ExportedFile {
            file: self.file_name(),
            category: self.category.clone(),
        }
    }
}

/// Result of exporting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutcome {
    pub files: Vec<ExportedRecord>,
    /// Planned files the operator chose not to write.
    pub skipped: usize,
}

impl ExportOutcome {
    pub fn exported_files(&self) -> Vec<ExportedFile> {
        self.files.iter().map(ExportedRecord::to_exported_file).collect()
    }
}

/// Exports documents with fixed options.
pub struct ExportEngine<'a> {
    options: ExportOptions,
    prompt: &'a dyn ExportPrompt,
    progress: &'a dyn ProgressSink,
    cancel: CancelFlag,
}

impl<'a> ExportEngine<'a> {
    pub fn new(
        options: ExportOptions,
        prompt: &'a dyn ExportPrompt,
        progress: &'a dyn ProgressSink,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            options,
            prompt,
            progress,
            cancel,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export `groups` of `document` into `output_dir`.
    ///
    /// Returns [`PaginaError::Cancelled`] as soon as the cancel flag is seen.
    /// On cancellation or any error the files already written for this
    /// document are removed (overwritten files come back from their backup),
    /// so a later export of the same document starts from a clean folder.
    #[instrument(skip_all, fields(
        document = %document.path().display(),
        format = %self.options.format,
        output = %output_dir.display(),
    ))]
    pub fn export_document(
        &self,
        document: &mut DocumentHandle,
        groups: &[DocumentGroup],
        output_dir: &Path,
    ) -> Result<ExportOutcome> {
        std::fs::create_dir_all(output_dir)?;

        let planned = plan_files(
            &document.stem(),
            groups,
            self.options.format,
            &self.options.numbering,
        );
        let mut outcome = ExportOutcome::default();
        let mut written = Vec::new();

        let result =
            self.write_planned(document, &planned, output_dir, &mut outcome, &mut written);
        if let Err(err) = result {
            roll_back(&written);
            return Err(err);
        }

        info!(
            files = outcome.files.len(),
            skipped = outcome.skipped,
            "document exported"
        );
        Ok(outcome)
    }

    fn write_planned(
        &self,
        document: &mut DocumentHandle,
        planned: &[PlannedFile],
        output_dir: &Path,
        outcome: &mut ExportOutcome,
        written: &mut Vec<WrittenFile>,
    ) -> Result<()> {
        let total_pages: u32 = planned.iter().map(|file| file.pages.len() as u32).sum();
        let mut pages_done = 0u32;

        for file in planned {
            self.check_cancel()?;

            let target = output_dir.join(&file.file_name);
            let resolution = collision::resolve(
                &target,
                self.options.file_handling_mode,
                self.options.create_backup_on_overwrite,
                self.prompt,
            )?;
            let (path, backup) = match resolution {
                Resolution::Skipped => {
                    outcome.skipped += 1;
                    pages_done += file.pages.len() as u32;
                    self.progress.on_page(pages_done, total_pages);
                    continue;
                }
                Resolution::Free(path) | Resolution::Renamed(path) => (path, None),
                Resolution::Overwrite { path, backup } => (path, backup),
            };

            self.write_file(document, file, &path, &mut pages_done, total_pages)?;
            written.push(WrittenFile {
                path: path.clone(),
                backup,
            });
            self.progress.on_file_written(&path);
            outcome.files.push(ExportedRecord {
                path,
                category: file.category.clone(),
                pages: file.pages.clone(),
            });
        }
        Ok(())
    }

    fn write_file(
        &self,
        document: &mut DocumentHandle,
        file: &PlannedFile,
        path: &Path,
        pages_done: &mut u32,
        total_pages: u32,
    ) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;

        match self.options.format {
            ExportFormat::Jpeg => {
                for (index, &page) in file.pages.iter().enumerate() {
                    if index > 0 {
                        self.check_cancel()?;
                    }
                    let image = load_page(document, page)?;
                    temp.write_all(&encode_jpeg(&image, &self.options.jpeg)?)?;
                    self.page_done(pages_done, total_pages);
                }
            }
            ExportFormat::PdfSingle | ExportFormat::PdfMulti => {
                let title = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let mut writer = RasterPdfWriter::new(&title);
                for (index, &page) in file.pages.iter().enumerate() {
                    if index > 0 {
                        self.check_cancel()?;
                    }
                    let image = load_page(document, page)?;
                    writer.add_page(&image);
                    self.page_done(pages_done, total_pages);
                }
                temp.write_all(&writer.finish()?)?;
            }
            ExportFormat::TiffSingle | ExportFormat::TiffMulti => {
                let mut writer =
                    TiffPageWriter::new(temp.as_file_mut(), self.options.tiff_compression)?;
                for (index, &page) in file.pages.iter().enumerate() {
                    if index > 0 {
                        self.check_cancel()?;
                    }
                    let image = load_page(document, page)?;
                    writer.write_page(&image)?;
                    self.page_done(pages_done, total_pages);
                }
                writer.finish();
            }
        }

        temp.flush()?;
        temp.persist(path).map_err(|e| PaginaError::Io(e.error))?;
        debug!(path = %path.display(), pages = file.pages.len(), "file written");
        Ok(())
    }

    fn page_done(&self, pages_done: &mut u32, total_pages: u32) {
        *pages_done += 1;
        self.progress.on_page(*pages_done, total_pages);
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            info!("export cancelled");
            return Err(PaginaError::Cancelled);
        }
        Ok(())
    }
}

/// A file written during one `export_document` call.
struct WrittenFile {
    path: PathBuf,
    /// Copy of the file this one replaced.
    backup: Option<PathBuf>,
}

/// Undo `written`, newest first.
fn roll_back(written: &[WrittenFile]) {
    for file in written.iter().rev() {
        let restored = match &file.backup {
            Some(backup) => std::fs::copy(backup, &file.path).map(|_| ()),
            None => std::fs::remove_file(&file.path),
        };
        match restored {
            Ok(()) => debug!(path = %file.path.display(), "written file rolled back"),
            Err(err) => warn!(path = %file.path.display(), error = %err, "could not roll back written file"),
        }
    }
}

fn load_page(document: &mut DocumentHandle, page: u32) -> Result<PageImage> {
    document.get_page(page).ok_or_else(|| {
        PaginaError::Export(format!(
            "page {page} of {} could not be read",
            document.path().display()
        ))
    })
}
