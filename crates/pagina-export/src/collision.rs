// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// What to do when an output file already exists.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use pagina_core::error::Result;
use pagina_core::types::FileHandlingMode;
use tracing::{debug, info};

use crate::prompt::{ExportPrompt, OverwriteChoice};

/// Highest `(k)` suffix tried before falling back to a timestamp.
pub const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Outcome of checking a target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing there; write as planned.
    Free(PathBuf),
    /// Write under a new, unused name.
    Renamed(PathBuf),
    /// Replace the existing file. `backup` holds the copy taken beforehand.
    Overwrite { path: PathBuf, backup: Option<PathBuf> },
    /// The operator declined; write nothing.
    Skipped,
}

impl Resolution {
    /// Where to write, or `None` when skipped.
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::Free(path) | Self::Renamed(path) | Self::Overwrite { path, .. } => Some(path),
            Self::Skipped => None,
        }
    }
}

/// Apply the configured policy to `path`. Backups are taken here, before
/// any byte of the new file is written.
pub fn resolve(
    path: &Path,
    mode: FileHandlingMode,
    create_backup: bool,
    prompt: &dyn ExportPrompt,
) -> Result<Resolution> {
    if !path.exists() {
        return Ok(Resolution::Free(path.to_path_buf()));
    }

    let resolution = match mode {
        FileHandlingMode::AutoRename => Resolution::Renamed(auto_rename(path)),
        FileHandlingMode::AlwaysOverwrite => overwrite(path, create_backup)?,
        FileHandlingMode::AskOverwrite => match prompt.confirm_overwrite(path) {
            OverwriteChoice::Yes => overwrite(path, create_backup)?,
            OverwriteChoice::No => Resolution::Renamed(auto_rename(path)),
            OverwriteChoice::Cancel => {
                info!(path = %path.display(), "existing file kept, output skipped");
                Resolution::Skipped
            }
        },
    };
    debug!(path = %path.display(), ?resolution, "collision resolved");
    Ok(resolution)
}

fn overwrite(path: &Path, create_backup: bool) -> Result<Resolution> {
    let backup = if create_backup {
        Some(backup_file(path)?)
    } else {
        None
    };
    Ok(Resolution::Overwrite {
        path: path.to_path_buf(),
        backup,
    })
}

/// Copy `path` to `{path}.backup`, replacing an older backup.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".backup");
    let backup = PathBuf::from(name);
    std::fs::copy(path, &backup)?;
    info!(backup = %backup.display(), "backup created");
    Ok(backup)
}

/// First free `name(k).ext` next to `path`, k = 1..=9999, then a
/// timestamped name.
pub fn auto_rename(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for k in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = parent.join(format!("{stem}({k}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
    }

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%6f");
    parent.join(format!("{stem}_{stamp}{ext}"))
}
