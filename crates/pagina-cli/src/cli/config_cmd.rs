// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration commands.

use std::process::ExitCode;

use anyhow::bail;
use clap::Subcommand;
use pagina_core::config::CoreConfig;
use serde_json::Value;

use crate::services::app_services::AppServices;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as JSON
    Show,
    /// Print where the configuration and databases live
    Path,
    /// Set one key, e.g. `export_format PDF_MULTI` or `document_numbering.prefix fasc`
    Set { key: String, value: String },
    /// Restore the defaults
    Reset,
}

pub fn run(services: &mut AppServices, command: ConfigCommands) -> anyhow::Result<ExitCode> {
    match command {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(services.config())?);
        }
        ConfigCommands::Path => {
            let paths = services.paths();
            println!("config:     {}", paths.config_file.display());
            println!("categorie:  {}", paths.categories_db.display());
            println!("sessioni:   {}", paths.batch_db.display());
        }
        ConfigCommands::Set { key, value } => {
            let config = set_key(services.config(), &key, &value)?;
            services.save_config(config)?;
            println!("{key} aggiornato.");
        }
        ConfigCommands::Reset => {
            services.save_config(CoreConfig::default())?;
            println!("Configurazione ripristinata.");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// `config` with the dotted `key` replaced by `raw`. `raw` is read as JSON
/// when it parses, otherwise as a plain string. The result is validated.
pub fn set_key(config: &CoreConfig, key: &str, raw: &str) -> anyhow::Result<CoreConfig> {
    let mut root = serde_json::to_value(config)?;
    let mut slot = &mut root;
    for part in key.split('.') {
        match slot.get_mut(part) {
            Some(next) => slot = next,
            None => bail!("unknown configuration key: {key}"),
        }
    }
    if slot.is_object() {
        bail!("{key} is a section; set one of its keys instead");
    }
    *slot = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    Ok(CoreConfig::from_json(&root.to_string())?)
}
