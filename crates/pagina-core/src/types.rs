// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagina exporter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PaginaError;

/// Flat string metadata attached to a document (CSV columns).
pub type Metadata = BTreeMap<String, String>;

/// Unique identifier for a batch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form stored in the batch database.
    pub fn parse(value: &str) -> Result<Self, PaginaError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|e| PaginaError::Database(format!("invalid session id {value}: {e}")))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backing format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Pdf,
    Tiff,
}

impl BackendKind {
    /// Infer the backend from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Infer the backend from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Tiff => "tiff",
        }
    }
}

/// Which sidecar shape a document follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    /// Sidecar lists page-range categories; one output group per category.
    Split,
    /// Sidecar is header metadata only; the whole document is one group.
    Flat,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Flat => "flat",
        }
    }
}

impl FromStr for WorkflowKind {
    type Err = PaginaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(Self::Split),
            "flat" => Ok(Self::Flat),
            other => Err(PaginaError::Database(format!("unknown workflow kind: {other}"))),
        }
    }
}

/// Lifecycle states of a batch document row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Queued, waiting for the orchestrator.
    Pending,
    /// Currently being exported. Left in place on crash or cancel.
    Processing,
    /// Exported successfully.
    Completed,
    /// Export failed, see the row's error message.
    Error,
    /// Skipped by the operator.
    Skipped,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Error,
        Self::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = PaginaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PaginaError::Database(format!("unknown document status: {s}")))
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format dispatch variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "JPEG")]
    Jpeg,
    #[serde(rename = "PDF_SINGLE")]
    PdfSingle,
    #[serde(rename = "PDF_MULTI")]
    PdfMulti,
    #[serde(rename = "TIFF_SINGLE")]
    TiffSingle,
    #[serde(rename = "TIFF_MULTI")]
    TiffMulti,
}

impl ExportFormat {
    /// File extension (without the dot) of emitted files.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::PdfSingle | Self::PdfMulti => "pdf",
            Self::TiffSingle | Self::TiffMulti => "tiff",
        }
    }

    /// Whether one file is written per document group instead of per page.
    pub fn is_multi_page(&self) -> bool {
        matches!(self, Self::PdfMulti | Self::TiffMulti)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::PdfSingle => "PDF_SINGLE",
            Self::PdfMulti => "PDF_MULTI",
            Self::TiffSingle => "TIFF_SINGLE",
            Self::TiffMulti => "TIFF_MULTI",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JPEG chroma subsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JpegSubsampling {
    #[serde(rename = "4:4:4")]
    S444,
    #[serde(rename = "4:2:2")]
    S422,
    #[serde(rename = "4:2:0")]
    S420,
}

/// TIFF compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiffCompression {
    None,
    TiffLzw,
    TiffDeflate,
    TiffCcittG4,
}

/// What to do when an output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileHandlingMode {
    AutoRename,
    AskOverwrite,
    AlwaysOverwrite,
}

/// Single-document CSV behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvMode {
    /// Append rows to one growing CSV.
    Incremental,
    /// One CSV per exported document.
    PerFile,
}

/// Where batch CSVs are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchCsvLocation {
    PerFolder,
    Root,
}

/// How batch CSVs are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchCsvNaming {
    Auto,
    FolderName,
    Custom,
    Timestamp,
}

/// Document counter scope for split-mode filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingMode {
    /// One counter across all groups of a document.
    Global,
    /// One counter per category name.
    PerCategory,
}

/// Provenance of a persisted category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// Read from a sidecar's `categories` list.
    Sidecar,
    /// Added by the operator.
    Manual,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sidecar => "sidecar",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for CategorySource {
    type Err = PaginaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sidecar" => Ok(Self::Sidecar),
            "manual" => Ok(Self::Manual),
            other => Err(PaginaError::Database(format!("unknown category source: {other}"))),
        }
    }
}

/// A document matched with its sidecar by the directory scanner, ready to be
/// queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPair {
    pub doc_path: PathBuf,
    pub sidecar_path: PathBuf,
    /// Directory of the document relative to the scan root; "." for the root.
    pub relative_path: String,
    pub workflow: WorkflowKind,
    /// The sidecar as parsed, kept so the export needs no second read.
    pub sidecar_data: serde_json::Value,
}

/// One file written by an export, with the category it was filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    /// Basename of the written file.
    pub file: String,
    pub category: String,
}
