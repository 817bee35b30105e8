// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagina-document: Page access for multi-page PDF and TIFF documents.
//
// Provides the bounded page cache, the document handle that decodes pages on
// demand through a per-format backend, and the raster writers (JPEG, PDF,
// TIFF) used by the export engine.

pub mod cache;
pub mod image;
pub mod loader;
pub mod writer;

pub use cache::{CacheLimits, CacheStats, PageCache, PageImage};
pub use loader::{DocumentHandle, PageBackend};
pub use writer::jpeg::{JpegOptions, encode_jpeg};
pub use writer::pdf::RasterPdfWriter;
pub use writer::tiff::TiffPageWriter;
