// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: raster pages embedded one image per page using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: images are registered on the
// document as XObjects, pages are `PdfPage` structs holding `Vec<Op>`, and the
// whole document is serialised by `PdfDocument::save()`. Each page is sized so
// the image sits at its native resolution.

use image::DynamicImage;
use pagina_core::error::{PaginaError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, instrument};

use crate::image::flatten_to_rgb;

/// Resolution at which rendered pages are placed (2× the 72 dpi PDF unit).
pub const PAGE_DPI: f32 = 144.0;

const MM_PER_INCH: f32 = 25.4;

/// Accumulates raster pages into one PDF.
///
/// ```ignore
/// let mut writer = RasterPdfWriter::new("scan_doc001_Istanza");
/// writer.add_page(&page_one);
/// writer.add_page(&page_two);
/// let bytes = writer.finish()?;
/// ```
pub struct RasterPdfWriter {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    dpi: f32,
}

impl RasterPdfWriter {
    /// Start a document whose /Info title is `title`.
    pub fn new(title: &str) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            dpi: PAGE_DPI,
        }
    }

    /// Place images at `dpi` instead of the default.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append a page showing `image` edge to edge. Transparency is
    /// composited over white.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn add_page(&mut self, image: &DynamicImage) {
        let rgb = flatten_to_rgb(image);
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);

        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width,
            height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        let page_w = Mm(width as f32 / self.dpi * MM_PER_INCH);
        let page_h = Mm(height as f32 / self.dpi * MM_PER_INCH);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(self.dpi),
                rotate: None,
            },
        }];

        self.pages.push(PdfPage::new(page_w, page_h, ops));
        debug!(page = self.pages.len(), page_w_mm = page_w.0, page_h_mm = page_h.0, "PDF page added");
    }

    /// Serialise the document. A document without pages is an error.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(PaginaError::Pdf("no pages to write".into()));
        }
        let pages = std::mem::take(&mut self.pages);
        self.doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }
        if !output.starts_with(b"%PDF") {
            return Err(PaginaError::Pdf("serialised document has no PDF header".into()));
        }
        Ok(output)
    }
}
