// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagina: scanned bundle splitter.
//
// Entry point. Initialises logging and hands over to the command dispatcher.

mod cli;
mod services;

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let default_filter = if cli::is_verbose() { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Pagina starting");

    match cli::run().await {
        Ok(code) => code,
        Err(err) => {
            cli::report_error(&err);
            ExitCode::FAILURE
        }
    }
}
