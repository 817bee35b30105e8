// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagina: Core types, configuration, sidecar classification and error
// definitions shared across all crates.

pub mod config;
pub mod error;
pub mod grouping;
pub mod human_errors;
pub mod sidecar;
pub mod types;

pub use config::{CoreConfig, DocumentNumbering};
pub use error::{PaginaError, Result};
pub use grouping::{DocumentGroup, GapResolution};
pub use sidecar::{CategorySpan, Sidecar, classify_workflow};
pub use types::*;
