// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster writers: JPEG, image-embedded PDF, and (multipage) TIFF.

pub mod jpeg;
pub mod pdf;
pub mod tiff;
