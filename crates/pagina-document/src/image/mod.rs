// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: pixel-format normalisation ahead of encoding.

pub mod flatten;

pub use flatten::{estimated_bytes, flatten_to_rgb};
