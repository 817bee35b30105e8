// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing messages.
//
// Every error is mapped to a short Italian heading plus a suggestion, so
// drivers (GUI dialog, terminal line, log record) never show stack traces.
// Status texts for progress and completion live here too.

use crate::error::PaginaError;

/// Heading shown when a target file already exists.
pub const FILE_EXISTS: &str = "File esistente";
/// Heading shown when an export finishes.
pub const EXPORT_COMPLETED: &str = "Export completato";
/// Heading shown when the operator stops an export.
pub const EXPORT_CANCELLED: &str = "Export annullato";

/// How the driver should present a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational; nothing failed.
    Info,
    /// The operator must fix something (paths, settings, files).
    ActionRequired,
    /// The document itself cannot be processed.
    Permanent,
    /// Retrying may work (locked file, busy database).
    Transient,
}

/// A presentable error.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `PaginaError` into operator-facing text.
pub fn humanize_error(err: &PaginaError) -> HumanError {
    match err {
        PaginaError::Config(detail) => HumanError {
            message: "Configurazione non valida".into(),
            suggestion: format!("Controllare le impostazioni di esportazione. ({detail})"),
            severity: Severity::ActionRequired,
        },

        PaginaError::UnsupportedFormat(detail) => HumanError {
            message: "Formato documento non supportato".into(),
            suggestion: format!("Sono supportati solo file PDF e TIFF. ({detail})"),
            severity: Severity::Permanent,
        },

        PaginaError::OpenFailed(_) => HumanError {
            message: "Impossibile aprire il documento".into(),
            suggestion: "Il file potrebbe essere danneggiato o protetto. Verificare che si apra con un visualizzatore.".into(),
            severity: Severity::Permanent,
        },

        PaginaError::Decode { page, .. } => HumanError {
            message: format!("Pagina {page} illeggibile"),
            suggestion: "La pagina è stata saltata. Verificare il documento originale.".into(),
            severity: Severity::Permanent,
        },

        PaginaError::SidecarParse { path, .. } => HumanError {
            message: "File JSON non valido".into(),
            suggestion: format!("Correggere la sintassi del file {path} e riprovare."),
            severity: Severity::ActionRequired,
        },

        PaginaError::Export(detail) => HumanError {
            message: "Errore durante l'esportazione".into(),
            suggestion: format!("Il documento è stato segnato come errore. ({detail})"),
            severity: Severity::Permanent,
        },

        PaginaError::Cancelled => HumanError {
            message: EXPORT_CANCELLED.into(),
            suggestion: "Il documento in corso verrà ripreso alla prossima esecuzione.".into(),
            severity: Severity::Info,
        },

        PaginaError::Image(_) | PaginaError::Pdf(_) | PaginaError::Tiff(_) => HumanError {
            message: "Errore nella scrittura dell'immagine".into(),
            suggestion: "Provare un formato di esportazione diverso.".into(),
            severity: Severity::Permanent,
        },

        PaginaError::Csv(_) => HumanError {
            message: "Impossibile scrivere il file CSV".into(),
            suggestion: "Verificare che il CSV non sia aperto in un altro programma.".into(),
            severity: Severity::Transient,
        },

        PaginaError::Database(_) => HumanError {
            message: "Errore dell'archivio interno".into(),
            suggestion: "Riprovare. Le sessioni interrotte possono essere riprese.".into(),
            severity: Severity::Transient,
        },

        PaginaError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "File o cartella non trovati".into(),
                suggestion: "Il percorso potrebbe essere stato spostato o eliminato.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permesso negato".into(),
                suggestion: "Verificare i permessi della cartella di destinazione.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Errore di lettura o scrittura".into(),
                suggestion: "Riprovare. Verificare lo spazio libero su disco.".into(),
                severity: Severity::Transient,
            },
        },

        PaginaError::Serialization(_) => HumanError {
            message: "Dati interni non validi".into(),
            suggestion: "Riprovare. Se il problema persiste, segnalarlo.".into(),
            severity: Severity::Transient,
        },
    }
}

/// Status line for a finished export of `files` files into `folder`.
pub fn export_completed_message(files: usize, folder: &str) -> String {
    format!("{EXPORT_COMPLETED}: {files} file in {folder}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_informational() {
        let human = humanize_error(&PaginaError::Cancelled);
        assert_eq!(human.severity, Severity::Info);
        assert_eq!(human.message, EXPORT_CANCELLED);
    }

    #[test]
    fn config_errors_need_action() {
        let human = humanize_error(&PaginaError::Config("jpeg_quality".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("jpeg_quality"));
    }

    #[test]
    fn missing_file_needs_action() {
        let err = PaginaError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn completion_message_names_folder() {
        assert_eq!(
            export_completed_message(3, "out/A"),
            "Export completato: 3 file in out/A"
        );
    }
}
