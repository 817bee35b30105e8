// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TIFF writer: every `write_page` appends one IFD, so the same writer
// produces single-page and multipage files.
//
// 8- and 16-bit gray, RGB and RGBA pages keep their sample layout; anything
// else is converted to 8-bit RGB. CCITT Group 4 is not available in the
// encoder: those pages are thresholded to black and white and stored with
// Deflate.

use std::io::{Seek, Write};

use image::DynamicImage;
use pagina_core::error::{PaginaError, Result};
use pagina_core::types::TiffCompression;
use tiff::TiffResult;
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::compression::{Deflate, Lzw, Uncompressed};
use tiff::encoder::{TiffEncoder, TiffValue};
use tracing::{trace, warn};

use crate::image::flatten::threshold_to_bilevel;

/// Streams pages into a TIFF container.
pub struct TiffPageWriter<W: Write + Seek> {
    encoder: TiffEncoder<W>,
    compression: TiffCompression,
    pages: u32,
}

impl<W: Write + Seek> TiffPageWriter<W> {
    pub fn new(writer: W, compression: TiffCompression) -> Result<Self> {
        let encoder = TiffEncoder::new(writer).map_err(tiff_err)?;
        if compression == TiffCompression::TiffCcittG4 {
            warn!("CCITT G4 unavailable, writing bilevel pages with Deflate");
        }
        Ok(Self {
            encoder,
            compression,
            pages: 0,
        })
    }

    /// Append one page as a new image file directory.
    pub fn write_page(&mut self, image: &DynamicImage) -> Result<()> {
        let (width, height) = (image.width(), image.height());
        let compression = self.compression;
        let encoder = &mut self.encoder;

        if compression == TiffCompression::TiffCcittG4 {
            let bilevel = threshold_to_bilevel(image);
            write_frame::<_, colortype::Gray8>(encoder, width, height, bilevel.as_raw(), compression)
                .map_err(tiff_err)?;
        } else {
            let written = match image {
                DynamicImage::ImageLuma8(buf) => {
                    write_frame::<_, colortype::Gray8>(encoder, width, height, buf.as_raw(), compression)
                }
                DynamicImage::ImageLuma16(buf) => {
                    write_frame::<_, colortype::Gray16>(encoder, width, height, buf.as_raw(), compression)
                }
                DynamicImage::ImageRgb8(buf) => {
                    write_frame::<_, colortype::RGB8>(encoder, width, height, buf.as_raw(), compression)
                }
                DynamicImage::ImageRgb16(buf) => {
                    write_frame::<_, colortype::RGB16>(encoder, width, height, buf.as_raw(), compression)
                }
                DynamicImage::ImageRgba8(buf) => {
                    write_frame::<_, colortype::RGBA8>(encoder, width, height, buf.as_raw(), compression)
                }
                DynamicImage::ImageRgba16(buf) => {
                    write_frame::<_, colortype::RGBA16>(encoder, width, height, buf.as_raw(), compression)
                }
                DynamicImage::ImageLumaA8(_) => {
                    let rgba = image.to_rgba8();
                    write_frame::<_, colortype::RGBA8>(encoder, width, height, rgba.as_raw(), compression)
                }
                _ => {
                    let rgb = image.to_rgb8();
                    write_frame::<_, colortype::RGB8>(encoder, width, height, rgb.as_raw(), compression)
                }
            };
            written.map_err(tiff_err)?;
        }

        self.pages += 1;
        trace!(page = self.pages, width, height, "TIFF page written");
        Ok(())
    }

    pub fn pages_written(&self) -> u32 {
        self.pages
    }

    /// Finish the container and return the number of pages written. Every
    /// directory is complete once `write_page` returns.
    pub fn finish(self) -> u32 {
        self.pages
    }
}

fn write_frame<W: Write + Seek, C: ColorType>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    compression: TiffCompression,
) -> TiffResult<()>
where
    [C::Inner]: TiffValue,
{
    match compression {
        TiffCompression::None => {
            encoder.write_image_with_compression::<C, _>(width, height, Uncompressed::default(), data)
        }
        TiffCompression::TiffLzw => {
            encoder.write_image_with_compression::<C, _>(width, height, Lzw::default(), data)
        }
        TiffCompression::TiffDeflate | TiffCompression::TiffCcittG4 => {
            encoder.write_image_with_compression::<C, _>(width, height, Deflate::default(), data)
        }
    }
}

fn tiff_err(e: tiff::TiffError) -> PaginaError {
    PaginaError::Tiff(e.to_string())
}
