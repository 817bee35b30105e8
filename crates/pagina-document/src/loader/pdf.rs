// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF backend: rasterises pages through PDFium at twice the nominal scale.
//
// The PDFium library is bound once per process. The directory named by
// `PAGINA_PDFIUM_DIR` is tried first, then the system library path.

use std::path::Path;
use std::sync::OnceLock;

use image::DynamicImage;
use pagina_core::error::{PaginaError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::PageBackend;

/// Render scale applied to the PDF page box (2× ≈ 144 dpi).
pub const RENDER_SCALE: f32 = 2.0;

/// Environment variable naming a directory that holds the PDFium library.
pub const PDFIUM_DIR_ENV: &str = "PAGINA_PDFIUM_DIR";

static PDFIUM: OnceLock<std::result::Result<Pdfium, String>> = OnceLock::new();

fn pdfium() -> Result<&'static Pdfium> {
    PDFIUM
        .get_or_init(|| {
            let bindings = match std::env::var(PDFIUM_DIR_ENV) {
                Ok(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    dir.as_str(),
                ))
                .or_else(|_| Pdfium::bind_to_system_library()),
                Err(_) => Pdfium::bind_to_system_library(),
            };
            match bindings {
                Ok(bindings) => {
                    info!("PDFium library bound");
                    Ok(Pdfium::new(bindings))
                }
                Err(err) => Err(err.to_string()),
            }
        })
        .as_ref()
        .map_err(|reason| PaginaError::OpenFailed(format!("PDFium unavailable: {reason}")))
}

/// An open PDF document.
pub struct PdfiumBackend {
    document: PdfDocument<'static>,
    page_count: u32,
}

impl PdfiumBackend {
    pub fn open(path: &Path) -> Result<Self> {
        let document = pdfium()?
            .load_pdf_from_file(path, None)
            .map_err(|e| PaginaError::OpenFailed(format!("{}: {e}", path.display())))?;
        let page_count = document.pages().len() as u32;
        debug!(page_count, "PDF loaded");
        Ok(Self {
            document,
            page_count,
        })
    }
}

impl PageBackend for PdfiumBackend {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn decode(&mut self, index: u32) -> Result<DynamicImage> {
        let decode_err = |reason: String| PaginaError::Decode {
            page: index + 1,
            reason,
        };

        let page_index =
            PdfPageIndex::try_from(index).map_err(|e| decode_err(format!("page index: {e}")))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| decode_err(e.to_string()))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| decode_err(format!("render: {e}")))?;

        // Rendered bitmaps carry an alpha channel that is always opaque.
        Ok(DynamicImage::ImageRgb8(bitmap.as_image().to_rgb8()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{DocumentHandle, RasterPdfWriter};
    use image::{DynamicImage, Rgb, RgbImage};
    use pagina_core::types::BackendKind;

    #[test]
    #[ignore = "needs a PDFium library (set PAGINA_PDFIUM_DIR)"]
    fn written_pdf_renders_back_at_source_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("two.pdf");
        let mut writer = RasterPdfWriter::new("two");
        for shade in [40u8, 200] {
            let page = RgbImage::from_pixel(288, 144, Rgb([shade, shade, shade]));
            writer.add_page(&DynamicImage::ImageRgb8(page));
        }
        std::fs::write(&path, writer.finish().expect("serialise")).expect("write pdf");

        let mut document = DocumentHandle::open(&path).expect("open");
        assert_eq!(document.kind(), BackendKind::Pdf);
        assert_eq!(document.total_pages(), 2);
        // Placed at 144 dpi and rendered at 2x the 72 dpi page box.
        let page = document.get_page(2).expect("page 2");
        assert!(page.width().abs_diff(288) <= 1, "width {}", page.width());
        assert!(page.height().abs_diff(144) <= 1, "height {}", page.height());
        assert!(document.get_page(3).is_none());
    }
}
