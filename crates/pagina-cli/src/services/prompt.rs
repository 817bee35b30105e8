// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal prompt: asks overwrite and empty-group questions on stderr and
// reads the answer from stdin. Runs on the worker thread, which blocks until
// the operator answers.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Mutex;

use pagina_core::grouping::GapResolution;
use pagina_export::{ExportPrompt, OverwriteChoice};
use tracing::warn;

pub struct TerminalPrompt {
    input: Mutex<Box<dyn BufRead + Send>>,
}

impl TerminalPrompt {
    pub fn stdin() -> Self {
        Self::from_reader(Box::new(std::io::BufReader::new(std::io::stdin())))
    }

    pub fn from_reader(input: Box<dyn BufRead + Send>) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }

    /// Ask until `parse` accepts the answer. End of input yields `None`.
    fn ask<T>(&self, question: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let Ok(mut input) = self.input.lock() else {
            warn!("prompt input poisoned");
            return None;
        };
        loop {
            eprint!("{question} ");
            let _ = std::io::stderr().flush();

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }
            if let Some(answer) = parse(line.trim()) {
                return Some(answer);
            }
            eprintln!("Risposta non valida.");
        }
    }
}

pub fn parse_overwrite(answer: &str) -> Option<OverwriteChoice> {
    match answer.to_lowercase().as_str() {
        "s" | "si" | "sì" | "y" | "yes" => Some(OverwriteChoice::Yes),
        "n" | "no" => Some(OverwriteChoice::No),
        "a" | "annulla" | "c" | "cancel" => Some(OverwriteChoice::Cancel),
        _ => None,
    }
}

pub fn parse_gap_resolution(answer: &str) -> Option<GapResolution> {
    match answer.to_lowercase().as_str() {
        "1" | "r" | "rinumera" => Some(GapResolution::DeleteAndRenumber),
        "2" | "p" | "procedi" => Some(GapResolution::ProceedWithGaps),
        "3" | "a" | "annulla" => Some(GapResolution::Abort),
        _ => None,
    }
}

impl ExportPrompt for TerminalPrompt {
    fn confirm_overwrite(&self, path: &Path) -> OverwriteChoice {
        let question = format!(
            "Il file {} esiste già. Sovrascrivere? [s]ì / [n]o, rinomina / [a]nnulla:",
            path.display()
        );
        // No answer: keep the existing file.
        self.ask(&question, parse_overwrite)
            .unwrap_or(OverwriteChoice::No)
    }

    fn resolve_empty_groups(&self, document: &Path, empty: &[u32]) -> GapResolution {
        let list: Vec<String> = empty.iter().map(u32::to_string).collect();
        let question = format!(
            "{}: i gruppi {} non hanno pagine.\n  1) elimina e rinumera  2) procedi con i buchi  3) annulla documento:",
            document.display(),
            list.join(", ")
        );
        self.ask(&question, parse_gap_resolution)
            .unwrap_or(GapResolution::Abort)
    }
}
