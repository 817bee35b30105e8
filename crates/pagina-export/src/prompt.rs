// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator decisions the engine cannot take alone.

use std::path::Path;

use pagina_core::grouping::GapResolution;

/// Answer to "overwrite the existing file?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteChoice {
    /// Replace the file (backing it up first when configured).
    Yes,
    /// Keep the existing file and write under a new name.
    No,
    /// Do not write this file at all.
    Cancel,
}

/// Asks the operator. Implemented by interactive drivers; batch runs use
/// [`AutoPrompt`].
pub trait ExportPrompt: Send + Sync {
    fn confirm_overwrite(&self, path: &Path) -> OverwriteChoice;

    /// Groups `empty` of `document` have no pages. Decide what to do.
    fn resolve_empty_groups(&self, document: &Path, empty: &[u32]) -> GapResolution;
}

/// Fixed answers, for unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompt {
    pub overwrite: OverwriteChoice,
    pub gaps: GapResolution,
}

impl Default for AutoPrompt {
    fn default() -> Self {
        Self {
            overwrite: OverwriteChoice::No,
            gaps: GapResolution::DeleteAndRenumber,
        }
    }
}

impl ExportPrompt for AutoPrompt {
    fn confirm_overwrite(&self, _path: &Path) -> OverwriteChoice {
        self.overwrite
    }

    fn resolve_empty_groups(&self, _document: &Path, _empty: &[u32]) -> GapResolution {
        self.gaps
    }
}
