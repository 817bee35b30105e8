// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware locations for the configuration and the state databases.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "pagina";

pub const CONFIG_FILE: &str = "config.json";
pub const CATEGORIES_DB: &str = "categories.db";
pub const BATCH_DB: &str = "batch_state.db";

/// Resolved locations of everything Pagina keeps between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub config_file: PathBuf,
    pub categories_db: PathBuf,
    pub batch_db: PathBuf,
}

impl DataPaths {
    /// Conventional per-user locations, or everything below `data_dir` when
    /// the operator passes one.
    pub fn resolve(data_dir: Option<&Path>, config_file: Option<&Path>) -> Self {
        let (config_dir, state_dir) = match data_dir {
            Some(dir) => (dir.to_path_buf(), dir.to_path_buf()),
            None => (
                base_dir(dirs::config_dir()).join(APP_DIR),
                base_dir(dirs::data_dir()).join(APP_DIR),
            ),
        };
        Self {
            config_file: config_file
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config_dir.join(CONFIG_FILE)),
            categories_db: state_dir.join(CATEGORIES_DB),
            batch_db: state_dir.join(BATCH_DB),
        }
    }

    /// Create the folders the databases live in.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for path in [&self.categories_db, &self.batch_db] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn base_dir(platform: Option<PathBuf>) -> PathBuf {
    platform
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        // Last resort
        .unwrap_or_else(std::env::temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_data_dir_holds_everything() {
        let paths = DataPaths::resolve(Some(Path::new("/srv/pagina")), None);
        assert_eq!(paths.config_file, PathBuf::from("/srv/pagina/config.json"));
        assert_eq!(paths.categories_db, PathBuf::from("/srv/pagina/categories.db"));
        assert_eq!(paths.batch_db, PathBuf::from("/srv/pagina/batch_state.db"));
    }

    #[test]
    fn explicit_config_file_wins() {
        let paths = DataPaths::resolve(Some(Path::new("/srv/pagina")), Some(Path::new("/etc/pagina.json")));
        assert_eq!(paths.config_file, PathBuf::from("/etc/pagina.json"));
        assert_eq!(paths.batch_db, PathBuf::from("/srv/pagina/batch_state.db"));
    }

    #[test]
    fn default_locations_end_in_the_app_folder() {
        let paths = DataPaths::resolve(None, None);
        assert!(paths.config_file.ends_with("pagina/config.json"));
        assert!(paths.batch_db.ends_with("pagina/batch_state.db"));
    }

    #[test]
    fn ensure_dirs_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = DataPaths::resolve(Some(&dir.path().join("state")), None);
        paths.ensure_dirs().expect("dirs");
        assert!(dir.path().join("state").is_dir());
    }
}
