// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core configuration.
//
// `CoreConfig` is an immutable value handed to each component at
// construction. Drivers edit their own copy and rebuild components from it.
// The on-disk form is a JSON object whose keys match the field names below.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{PaginaError, Result};
use crate::types::{
    BatchCsvLocation, BatchCsvNaming, CsvMode, ExportFormat, FileHandlingMode, JpegSubsampling,
    NumberingMode, TiffCompression,
};

/// Delimiters accepted for CSV output.
pub const CSV_DELIMITERS: [&str; 4] = [";", ",", "\t", "|"];

/// Counter formatting for split-mode document labels (`doc001`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentNumbering {
    pub prefix: String,
    pub suffix: String,
    /// Zero-padded width of the counter, 2..=5.
    pub counter_digits: u8,
    pub start_number: u32,
    pub numbering_mode: NumberingMode,
}

impl Default for DocumentNumbering {
    fn default() -> Self {
        Self {
            prefix: "doc".into(),
            suffix: String::new(),
            counter_digits: 3,
            start_number: 1,
            numbering_mode: NumberingMode::Global,
        }
    }
}

impl DocumentNumbering {
    /// Render the label for the `ordinal`-th document (1-based) of its scope.
    pub fn label(&self, ordinal: u32) -> String {
        let number = self.start_number.saturating_add(ordinal.saturating_sub(1));
        format!(
            "{}{:0width$}{}",
            self.prefix,
            number,
            self.suffix,
            width = self.counter_digits as usize
        )
    }
}

/// Persistent settings for the export core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    // -- Folders --
    pub default_input_folder: Option<PathBuf>,
    pub default_output_folder: Option<PathBuf>,
    /// Where sidecars live when they are not next to their documents.
    pub json_folder: Option<PathBuf>,
    pub use_same_folder_for_json: bool,
    /// Mirror the input tree below the output folder (single-document export).
    pub preserve_folder_structure: bool,

    // -- Output format --
    pub export_format: ExportFormat,
    pub jpeg_quality: u8,
    pub jpeg_optimize: bool,
    pub jpeg_progressive: bool,
    pub jpeg_subsampling: JpegSubsampling,
    pub tiff_compression: TiffCompression,

    // -- Collisions --
    pub file_handling_mode: FileHandlingMode,
    pub create_backup_on_overwrite: bool,

    // -- Single-document CSV --
    pub csv_delimiter: String,
    pub csv_mode: CsvMode,
    pub csv_output_path: Option<PathBuf>,
    pub csv_use_document_name: bool,
    pub csv_custom_name: Option<String>,

    // -- Batch CSV --
    pub batch_csv_location: BatchCsvLocation,
    pub batch_csv_naming: BatchCsvNaming,
    pub batch_csv_custom_prefix: Option<String>,
    pub batch_csv_add_timestamp: bool,
    pub batch_csv_add_counter: bool,

    // -- Batch scanning --
    /// Directory depth to scan; -1 means unbounded.
    pub batch_scan_depth: i32,
    pub batch_preserve_structure: bool,

    pub document_numbering: DocumentNumbering,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_input_folder: None,
            default_output_folder: None,
            json_folder: None,
            use_same_folder_for_json: true,
            preserve_folder_structure: false,
            export_format: ExportFormat::Jpeg,
            jpeg_quality: 95,
            jpeg_optimize: true,
            jpeg_progressive: false,
            jpeg_subsampling: JpegSubsampling::S420,
            tiff_compression: TiffCompression::TiffLzw,
            file_handling_mode: FileHandlingMode::AutoRename,
            create_backup_on_overwrite: false,
            csv_delimiter: ";".into(),
            csv_mode: CsvMode::Incremental,
            csv_output_path: None,
            csv_use_document_name: false,
            csv_custom_name: None,
            batch_csv_location: BatchCsvLocation::PerFolder,
            batch_csv_naming: BatchCsvNaming::FolderName,
            batch_csv_custom_prefix: None,
            batch_csv_add_timestamp: false,
            batch_csv_add_counter: false,
            batch_scan_depth: -1,
            batch_preserve_structure: true,
            document_numbering: DocumentNumbering::default(),
        }
    }
}

impl CoreConfig {
    /// Parse and validate a configuration from its JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| PaginaError::Config(format!("config.json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration at `path`.
    ///
    /// A missing file yields the defaults; a present but invalid file is a
    /// `Config` error so that nothing runs on half-understood settings.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("configuration loaded");
        Ok(config)
    }

    /// Write the configuration atomically: temp file in the same directory,
    /// then rename over the destination.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(self)?;
        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| PaginaError::Io(e.error))?;

        info!("configuration saved");
        Ok(())
    }

    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PaginaError::Config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if !(2..=5).contains(&self.document_numbering.counter_digits) {
            return Err(PaginaError::Config(format!(
                "document_numbering.counter_digits must be between 2 and 5, got {}",
                self.document_numbering.counter_digits
            )));
        }
        if !CSV_DELIMITERS.contains(&self.csv_delimiter.as_str()) {
            return Err(PaginaError::Config(format!(
                "csv_delimiter {:?} is not one of ; , tab |",
                self.csv_delimiter
            )));
        }
        if self.batch_scan_depth < -1 {
            return Err(PaginaError::Config(format!(
                "batch_scan_depth must be -1 or a non-negative depth, got {}",
                self.batch_scan_depth
            )));
        }
        Ok(())
    }

    /// The CSV delimiter as the single byte the writer expects.
    pub fn csv_delimiter_byte(&self) -> u8 {
        self.csv_delimiter.as_bytes().first().copied().unwrap_or(b';')
    }

    /// Scanner depth limit; `None` means unbounded.
    pub fn scan_depth(&self) -> Option<usize> {
        usize::try_from(self.batch_scan_depth).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CoreConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.csv_delimiter_byte(), b';');
        assert_eq!(config.scan_depth(), None);
    }

    #[test]
    fn quality_bounds_are_inclusive() {
        for quality in [1, 100] {
            let json = format!(r#"{{"jpeg_quality": {quality}}}"#);
            let config = CoreConfig::from_json(&json).expect("in range");
            assert_eq!(config.jpeg_quality, quality);
        }
    }

    #[test]
    fn quality_outside_range_is_rejected() {
        for json in [r#"{"jpeg_quality": 0}"#, r#"{"jpeg_quality": 101}"#, r#"{"jpeg_quality": 400}"#] {
            let err = CoreConfig::from_json(json).unwrap_err();
            assert!(matches!(err, PaginaError::Config(_)), "{json}: {err}");
        }
    }

    #[test]
    fn unknown_delimiter_is_rejected() {
        let err = CoreConfig::from_json(r#"{"csv_delimiter": ":"}"#).unwrap_err();
        assert!(matches!(err, PaginaError::Config(_)));
    }

    #[test]
    fn enum_values_use_documented_spelling() {
        let json = r#"{
            "export_format": "TIFF_MULTI",
            "tiff_compression": "tiff_ccitt_g4",
            "file_handling_mode": "ask_overwrite",
            "batch_csv_location": "root",
            "batch_csv_naming": "timestamp",
            "csv_mode": "per_file",
            "document_numbering": {"counter_digits": 4, "numbering_mode": "per_category"}
        }"#;
        let config = CoreConfig::from_json(json).expect("parse");
        assert_eq!(config.export_format, ExportFormat::TiffMulti);
        assert_eq!(config.tiff_compression, TiffCompression::TiffCcittG4);
        assert_eq!(config.file_handling_mode, FileHandlingMode::AskOverwrite);
        assert_eq!(config.batch_csv_location, BatchCsvLocation::Root);
        assert_eq!(config.batch_csv_naming, BatchCsvNaming::Timestamp);
        assert_eq!(config.csv_mode, CsvMode::PerFile);
        assert_eq!(config.document_numbering.counter_digits, 4);
        assert_eq!(config.document_numbering.prefix, "doc");
        assert_eq!(config.document_numbering.numbering_mode, NumberingMode::PerCategory);
    }

    #[test]
    fn numbering_label_pads_and_offsets() {
        let numbering = DocumentNumbering::default();
        assert_eq!(numbering.label(1), "doc001");
        assert_eq!(numbering.label(12), "doc012");

        let custom = DocumentNumbering {
            prefix: "D".into(),
            suffix: "x".into(),
            counter_digits: 4,
            start_number: 10,
            numbering_mode: NumberingMode::Global,
        };
        assert_eq!(custom.label(1), "D0010x");
        assert_eq!(custom.label(3), "D0012x");
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");

        let mut config = CoreConfig::default();
        config.export_format = ExportFormat::PdfMulti;
        config.csv_delimiter = "|".into();
        config.save(&path).expect("save");

        let loaded = CoreConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
        // Only the destination remains; the temp file was renamed over it.
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = CoreConfig::load(dir.path().join("absent.json")).expect("load");
        assert_eq!(loaded, CoreConfig::default());
    }
}
