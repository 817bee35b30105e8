// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagina.

use thiserror::Error;

/// Top-level error type for all Pagina operations.
#[derive(Debug, Error)]
pub enum PaginaError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Document loading --
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to open document: {0}")]
    OpenFailed(String),

    #[error("page {page} could not be decoded: {reason}")]
    Decode { page: u32, reason: String },

    // -- Sidecar --
    #[error("sidecar {path} is not valid JSON: {reason}")]
    SidecarParse { path: String, reason: String },

    // -- Export --
    #[error("export failed: {0}")]
    Export(String),

    /// Cooperative cancellation. Not a failure: callers leave the in-flight
    /// work recoverable.
    #[error("operation cancelled")]
    Cancelled,

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("TIFF operation failed: {0}")]
    Tiff(String),

    #[error("CSV write failed: {0}")]
    Csv(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PaginaError {
    /// Whether this error is the cancellation signal rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PaginaError>;
