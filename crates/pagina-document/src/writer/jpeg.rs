// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JPEG encoding with explicit quality, Huffman optimisation, progressive scan
// and chroma subsampling.

use image::DynamicImage;
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use pagina_core::config::CoreConfig;
use pagina_core::error::{PaginaError, Result};
use pagina_core::types::JpegSubsampling;

use crate::image::flatten_to_rgb;

/// Encoder settings taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegOptions {
    /// 1..=100.
    pub quality: u8,
    pub optimize: bool,
    pub progressive: bool,
    pub subsampling: JpegSubsampling,
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self::from(&CoreConfig::default())
    }
}

impl From<&CoreConfig> for JpegOptions {
    fn from(config: &CoreConfig) -> Self {
        Self {
            quality: config.jpeg_quality,
            optimize: config.jpeg_optimize,
            progressive: config.jpeg_progressive,
            subsampling: config.jpeg_subsampling,
        }
    }
}

/// Encode one page. Transparency is composited over white first.
pub fn encode_jpeg(image: &DynamicImage, options: &JpegOptions) -> Result<Vec<u8>> {
    if !(1..=100).contains(&options.quality) {
        return Err(PaginaError::Config(format!(
            "jpeg_quality must be between 1 and 100, got {}",
            options.quality
        )));
    }

    let rgb = flatten_to_rgb(image);
    let (width, height) = (
        u16::try_from(rgb.width()),
        u16::try_from(rgb.height()),
    );
    let (Ok(width), Ok(height)) = (width, height) else {
        return Err(PaginaError::Image(format!(
            "{}x{} exceeds the JPEG size limit of 65535 pixels per side",
            rgb.width(),
            rgb.height()
        )));
    };

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, options.quality);
    encoder.set_sampling_factor(match options.subsampling {
        JpegSubsampling::S444 => SamplingFactor::R_4_4_4,
        JpegSubsampling::S422 => SamplingFactor::R_4_2_2,
        JpegSubsampling::S420 => SamplingFactor::R_4_2_0,
    });
    encoder.set_progressive(options.progressive);
    encoder.set_optimized_huffman_tables(options.optimize);
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| PaginaError::Image(format!("JPEG encoding failed: {e}")))?;

    Ok(out)
}
