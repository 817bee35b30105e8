// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: loads the configuration once and opens the state
// databases on demand. Commands build their own copies of the config and
// hand them to the components they create.

use std::path::Path;

use pagina_batch::WorkerPaths;
use pagina_core::config::CoreConfig;
use pagina_core::error::Result;
use pagina_store::{BatchStore, CategoryStore};
use tracing::info;

use super::data_dir::DataPaths;

pub struct AppServices {
    paths: DataPaths,
    config: CoreConfig,
}

impl AppServices {
    /// Resolve the data paths and load the configuration. An invalid
    /// config file is an error; a missing one yields the defaults.
    pub fn init(data_dir: Option<&Path>, config_file: Option<&Path>) -> Result<Self> {
        let paths = DataPaths::resolve(data_dir, config_file);
        paths.ensure_dirs()?;
        let config = CoreConfig::load(&paths.config_file)?;
        info!(config = %paths.config_file.display(), "app services initialised");
        Ok(Self { paths, config })
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Persist `config` and make it current.
    pub fn save_config(&mut self, config: CoreConfig) -> Result<()> {
        config.save(&self.paths.config_file)?;
        self.config = config;
        Ok(())
    }

    pub fn batch_store(&self) -> Result<BatchStore> {
        BatchStore::open(&self.paths.batch_db)
    }

    pub fn category_store(&self) -> Result<CategoryStore> {
        CategoryStore::open(&self.paths.categories_db)
    }

    pub fn worker_paths(&self) -> WorkerPaths {
        WorkerPaths {
            batch_db: self.paths.batch_db.clone(),
            categories_db: Some(self.paths.categories_db.clone()),
        }
    }
}
