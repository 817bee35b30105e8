// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Category catalogue commands.

use std::process::ExitCode;

use clap::Subcommand;
use pagina_core::types::CategorySource;
use pagina_store::Category;

use crate::services::app_services::AppServices;

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories: protected first, then by usage
    List,
    /// Add a manual category
    Add { name: String },
    /// Delete an unprotected category
    Delete { name: String },
    /// Catalogue totals
    Stats,
}

pub fn run(services: &AppServices, command: CategoryCommands) -> anyhow::Result<ExitCode> {
    let store = services.category_store()?;
    match command {
        CategoryCommands::List => {
            for category in store.all()? {
                println!("{}", category_line(&category));
            }
        }
        CategoryCommands::Add { name } => {
            if store.add(&name, CategorySource::Manual)? {
                println!("Categoria \"{}\" aggiunta.", name.trim());
            } else {
                println!("Categoria \"{}\" già presente o non valida.", name.trim());
                return Ok(ExitCode::FAILURE);
            }
        }
        CategoryCommands::Delete { name } => {
            if store.delete(&name)? {
                println!("Categoria \"{name}\" eliminata.");
            } else {
                println!("Categoria \"{name}\" protetta o inesistente, non eliminata.");
                return Ok(ExitCode::FAILURE);
            }
        }
        CategoryCommands::Stats => {
            let stats = store.stats()?;
            println!("Categorie:  {}", stats.total);
            println!("  protette  {}", stats.protected);
            println!("  da JSON   {}", stats.from_sidecar);
            println!("  manuali   {}", stats.manual);
            println!("Utilizzi:   {}", stats.total_usage);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn category_line(category: &Category) -> String {
    let lock = if category.protected { "*" } else { " " };
    let last_used = category
        .last_used
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into());
    format!(
        "{lock} {:<40} {:<8} {:>5}  {last_used}",
        category.name,
        category.source.as_str(),
        category.usage_count
    )
}
