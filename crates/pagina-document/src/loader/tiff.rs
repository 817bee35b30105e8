// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TIFF backend: one decoder kept open for the lifetime of the handle.
//
// Frames are counted once at open by walking the IFD chain to its end; the
// decoder is then rewound to the first frame. Each decode seeks to the
// requested frame and builds a fresh raster, so callers never alias decoder
// buffers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, LumaA, Rgb, Rgba, RgbImage};
use pagina_core::error::{PaginaError, Result};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use super::PageBackend;

/// An open multipage TIFF.
pub struct TiffBackend {
    decoder: Decoder<BufReader<File>>,
    frame_count: u32,
    /// Frame the decoder is positioned on.
    current: u32,
}

impl TiffBackend {
    pub fn open(path: &Path) -> Result<Self> {
        let open_err = |e: &dyn std::fmt::Display| {
            PaginaError::OpenFailed(format!("{}: {e}", path.display()))
        };

        let file = File::open(path).map_err(|e| open_err(&e))?;
        let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| open_err(&e))?;

        let mut frame_count = 1u32;
        while decoder.more_images() {
            decoder.next_image().map_err(|e| open_err(&e))?;
            frame_count += 1;
        }
        decoder.seek_to_image(0).map_err(|e| open_err(&e))?;
        debug!(frame_count, "TIFF frames counted");

        Ok(Self {
            decoder,
            frame_count,
            current: 0,
        })
    }
}

impl PageBackend for TiffBackend {
    fn page_count(&self) -> u32 {
        self.frame_count
    }

    fn decode(&mut self, index: u32) -> Result<DynamicImage> {
        let decode_err = |e: &dyn std::fmt::Display| PaginaError::Decode {
            page: index + 1,
            reason: e.to_string(),
        };

        if index != self.current {
            // Unknown position until the seek succeeds.
            self.current = u32::MAX;
            self.decoder
                .seek_to_image(index as usize)
                .map_err(|e| decode_err(&e))?;
            self.current = index;
        }

        let (width, height) = self.decoder.dimensions().map_err(|e| decode_err(&e))?;
        let color = self.decoder.colortype().map_err(|e| decode_err(&e))?;
        let data = self.decoder.read_image().map_err(|e| decode_err(&e))?;
        to_dynamic(width, height, color, data).map_err(|e| decode_err(&e))
    }
}

/// Assemble an owned raster from decoded samples.
fn to_dynamic(
    width: u32,
    height: u32,
    color: ColorType,
    data: DecodingResult,
) -> std::result::Result<DynamicImage, String> {
    let too_short = || format!("sample buffer too short for {width}x{height} {color:?}");

    let image = match (color, data) {
        (ColorType::Gray(1), DecodingResult::U8(packed)) => {
            DynamicImage::ImageLuma8(unpack_bilevel(width, height, &packed).ok_or_else(too_short)?)
        }
        (ColorType::Gray(8), DecodingResult::U8(buf)) => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width, height, buf).ok_or_else(too_short)?,
        ),
        (ColorType::Gray(16), DecodingResult::U16(buf)) => DynamicImage::ImageLuma16(
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, buf).ok_or_else(too_short)?,
        ),
        (ColorType::GrayA(8), DecodingResult::U8(buf)) => DynamicImage::ImageLumaA8(
            ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, buf).ok_or_else(too_short)?,
        ),
        (ColorType::RGB(8), DecodingResult::U8(buf)) => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width, height, buf).ok_or_else(too_short)?,
        ),
        (ColorType::RGB(16), DecodingResult::U16(buf)) => DynamicImage::ImageRgb16(
            ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, buf).ok_or_else(too_short)?,
        ),
        (ColorType::RGBA(8), DecodingResult::U8(buf)) => DynamicImage::ImageRgba8(
            ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, buf).ok_or_else(too_short)?,
        ),
        (ColorType::RGBA(16), DecodingResult::U16(buf)) => DynamicImage::ImageRgba16(
            ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, buf).ok_or_else(too_short)?,
        ),
        (ColorType::CMYK(8), DecodingResult::U8(buf)) => {
            DynamicImage::ImageRgb8(cmyk_to_rgb(width, height, &buf).ok_or_else(too_short)?)
        }
        (other, _) => return Err(format!("unsupported TIFF colour type {other:?}")),
    };
    Ok(image)
}

/// Expand 1-bit rows (padded to whole bytes, 1 = white) into 8-bit luma.
fn unpack_bilevel(width: u32, height: u32, packed: &[u8]) -> Option<GrayImage> {
    let row_bytes = (width as usize).div_ceil(8);
    if packed.len() < row_bytes * height as usize {
        return None;
    }
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let row = &packed[y as usize * row_bytes..(y as usize + 1) * row_bytes];
        for x in 0..width {
            let bit = (row[x as usize / 8] >> (7 - (x % 8))) & 1;
            out.put_pixel(x, y, Luma([if bit == 1 { 255 } else { 0 }]));
        }
    }
    Some(out)
}

fn cmyk_to_rgb(width: u32, height: u32, buf: &[u8]) -> Option<RgbImage> {
    if buf.len() < width as usize * height as usize * 4 {
        return None;
    }
    let rgb: Vec<u8> = buf
        .chunks_exact(4)
        .take(width as usize * height as usize)
        .flat_map(|px| {
            let k = 255 - px[3] as u32;
            [
                ((255 - px[0] as u32) * k / 255) as u8,
                ((255 - px[1] as u32) * k / 255) as u8,
                ((255 - px[2] as u32) * k / 255) as u8,
            ]
        })
        .collect();
    RgbImage::from_raw(width, height, rgb)
}
