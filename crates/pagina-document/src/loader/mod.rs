// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document loader: an open document that decodes pages on demand.
//
// The backend (PDFium for PDF, the `tiff` decoder for TIFF) stays open for
// cheap random access while the page cache bounds how many decoded pages are
// alive. Page numbers are 1-based at this boundary and 0-based inside
// backends.

pub mod pdf;
pub mod tiff;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use pagina_core::error::{PaginaError, Result};
use pagina_core::types::BackendKind;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheLimits, CacheStats, PageCache, PageImage};

/// Random access to the pages of one open document.
pub trait PageBackend {
    /// Number of pages, fixed at open time.
    fn page_count(&self) -> u32;

    /// Decode the page at 0-based `index` into an independent raster.
    fn decode(&mut self, index: u32) -> Result<DynamicImage>;
}

struct OpenState {
    backend: Box<dyn PageBackend>,
    cache: PageCache,
}

/// An open PDF or TIFF document.
///
/// Dropping the handle releases the backend and every cached page; `close`
/// does the same earlier and may be called any number of times.
pub struct DocumentHandle {
    path: PathBuf,
    kind: BackendKind,
    total_pages: u32,
    state: Option<OpenState>,
}

impl DocumentHandle {
    // -- Construction ---------------------------------------------------------

    /// Open a document with the default cache limits.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_limits(path, CacheLimits::default())
    }

    /// Open a document, choosing the backend from the file extension.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with_limits(path: impl AsRef<Path>, limits: CacheLimits) -> Result<Self> {
        let path = path.as_ref();
        let kind = BackendKind::from_path(path).ok_or_else(|| {
            PaginaError::UnsupportedFormat(format!(
                "{}: expected .pdf, .tif or .tiff",
                path.display()
            ))
        })?;

        let backend: Box<dyn PageBackend> = match kind {
            BackendKind::Pdf => Box::new(pdf::PdfiumBackend::open(path)?),
            BackendKind::Tiff => Box::new(tiff::TiffBackend::open(path)?),
        };

        let handle = Self::from_backend(path, kind, backend, limits);
        info!(kind = kind.as_str(), pages = handle.total_pages, "document opened");
        Ok(handle)
    }

    /// Wrap an already-open backend.
    pub fn from_backend(
        path: impl Into<PathBuf>,
        kind: BackendKind,
        backend: Box<dyn PageBackend>,
        limits: CacheLimits,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            total_pages: backend.page_count(),
            state: Some(OpenState {
                backend,
                cache: PageCache::new(limits),
            }),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Page count reported by the backend at open time.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// The file name without extension, used as the base of output names.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documento".to_string())
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.state.as_ref().map(|state| state.cache.stats())
    }

    // -- Pages ----------------------------------------------------------------

    /// Fetch page `page` (1-based).
    ///
    /// Returns `None` for page 0, pages past the end, a closed handle, or a
    /// page the backend cannot decode (logged as a warning).
    pub fn get_page(&mut self, page: u32) -> Option<PageImage> {
        if page == 0 || page > self.total_pages {
            debug!(page, total = self.total_pages, "page out of range");
            return None;
        }
        let state = self.state.as_mut()?;

        if let Some(image) = state.cache.get(page) {
            return Some(image);
        }

        match state.backend.decode(page - 1) {
            Ok(image) => {
                let image = Arc::new(image);
                state.cache.put(page, Arc::clone(&image));
                Some(image)
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    page,
                    error = %err,
                    "page could not be decoded"
                );
                None
            }
        }
    }

    /// Release the backend and the cache. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.cache.clear();
            debug!(path = %self.path.display(), "document closed");
        }
    }
}

impl std::fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("total_pages", &self.total_pages)
            .field("open", &self.is_open())
            .finish()
    }
}
