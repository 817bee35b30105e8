// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: argument parsing and dispatch.

mod batch;
mod categories;
mod config_cmd;
mod document;
mod sessions;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use pagina_core::config::CoreConfig;
use pagina_core::error::PaginaError;
use pagina_core::human_errors::{Severity, humanize_error};
use pagina_core::types::ExportFormat;
use pagina_export::{AutoPrompt, ExportPrompt};

use crate::services::app_services::AppServices;
use crate::services::prompt::TerminalPrompt;

#[derive(Parser)]
#[command(name = "pagina")]
#[command(about = "Split scanned bundles into categorised JPEG/PDF/TIFF files with a CSV index")]
#[command(version)]
pub struct Cli {
    /// Folder holding config.json and the state databases
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <config dir>/pagina/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// List the document/sidecar pairs found under a folder
    Scan {
        root: PathBuf,
        /// Folder depth to descend (-1 = unlimited; defaults to the configured depth)
        #[arg(long, allow_hyphen_values = true)]
        depth: Option<i32>,
    },

    /// Export every paired document under a folder as a new batch session
    Batch {
        root: PathBuf,
        /// Output folder (defaults to the configured folder, then <root>/export)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Continue an interrupted batch session
    Resume {
        /// Session id (defaults to the most recent incomplete session)
        session: Option<String>,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export a single document
    Export {
        document: PathBuf,
        /// Output folder (defaults to the configured folder, then the document's folder)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Show the format and page count of a document
    Info { document: PathBuf },

    /// Inspect and manage batch sessions
    Sessions {
        #[command(subcommand)]
        command: sessions::SessionCommands,
    },

    /// Manage the category catalogue
    Categories {
        #[command(subcommand)]
        command: categories::CategoryCommands,
    },

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        command: config_cmd::ConfigCommands,
    },
}

/// Options shared by the exporting commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Output format for this run (overrides the configuration)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Never ask: rename on collision and renumber around empty groups
    #[arg(short, long)]
    yes: bool,
}

impl ExportArgs {
    /// `config` with the per-run overrides applied.
    pub fn apply(&self, config: &CoreConfig) -> CoreConfig {
        let mut config = config.clone();
        if let Some(format) = self.format {
            config.export_format = format.into();
        }
        config
    }

    pub fn prompt(&self) -> Arc<dyn ExportPrompt> {
        if self.yes {
            Arc::new(AutoPrompt::default())
        } else {
            Arc::new(TerminalPrompt::stdin())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Jpeg,
    PdfSingle,
    PdfMulti,
    TiffSingle,
    TiffMulti,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Jpeg => ExportFormat::Jpeg,
            FormatArg::PdfSingle => ExportFormat::PdfSingle,
            FormatArg::PdfMulti => ExportFormat::PdfMulti,
            FormatArg::TiffSingle => ExportFormat::TiffSingle,
            FormatArg::TiffMulti => ExportFormat::TiffMulti,
        }
    }
}

pub async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    tracing::debug!(verbose = cli.verbose, "arguments parsed");
    let mut services = AppServices::init(cli.data_dir.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { root, depth } => document::cmd_scan(&services, &root, depth),
        Commands::Batch {
            root,
            output,
            export,
        } => batch::cmd_batch(&services, root, output, &export).await,
        Commands::Resume { session, export } => {
            batch::cmd_resume(&services, session.as_deref(), &export).await
        }
        Commands::Export {
            document,
            output,
            export,
        } => document::cmd_export(&services, &document, output.as_deref(), &export),
        Commands::Info { document } => document::cmd_info(&services, &document),
        Commands::Sessions { command } => sessions::run(&services, command),
        Commands::Categories { command } => categories::run(&services, command),
        Commands::Config { command } => config_cmd::run(&mut services, command),
    }
}

/// Print `err` for the operator, in plain words when it is one of ours.
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<PaginaError>() {
        Some(pagina) => {
            let human = humanize_error(pagina);
            let label = match human.severity {
                Severity::Info => "Nota",
                _ => "Errore",
            };
            eprintln!("{label}: {}", human.message);
            eprintln!("  {}", human.suggestion);
        }
        None => eprintln!("Errore: {err:#}"),
    }
}
