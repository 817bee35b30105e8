// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CSV metadata index.
//
// Files are UTF-8 with a byte-order mark. The header is `Nome File`,
// `Categoria`, optionally `Path Relativo`, then the union of metadata keys
// in sorted order. Every write goes through a temporary file in the target
// directory.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use pagina_core::config::CoreConfig;
use pagina_core::error::{PaginaError, Result};
use pagina_core::types::{BatchCsvLocation, BatchCsvNaming, ExportedFile, Metadata};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::collision::auto_rename;

pub const FILE_COLUMN: &str = "Nome File";
pub const CATEGORY_COLUMN: &str = "Categoria";
pub const RELATIVE_PATH_COLUMN: &str = "Path Relativo";

/// Base name used when nothing better is configured.
pub const DEFAULT_CSV_NAME: &str = "metadata";

const BOM: &[u8] = b"\xEF\xBB\xBF";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One line of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub file: String,
    pub category: String,
    /// Set for root-level batch CSVs only.
    pub relative_path: Option<String>,
    pub metadata: Metadata,
}

impl CsvRow {
    fn cell(&self, column: &str) -> String {
        match column {
            FILE_COLUMN => self.file.clone(),
            CATEGORY_COLUMN => self.category.clone(),
            RELATIVE_PATH_COLUMN => self.relative_path.clone().unwrap_or_default(),
            key => self.metadata.get(key).cloned().unwrap_or_default(),
        }
    }
}

/// One row per exported file, each carrying the document metadata.
pub fn rows_for_files(
    files: &[ExportedFile],
    metadata: &Metadata,
    relative_path: Option<&str>,
) -> Vec<CsvRow> {
    files
        .iter()
        .map(|file| CsvRow {
            file: file.file.clone(),
            category: file.category.clone(),
            relative_path: relative_path.map(str::to_string),
            metadata: metadata.clone(),
        })
        .collect()
}

fn is_fixed_column(column: &str) -> bool {
    matches!(column, FILE_COLUMN | CATEGORY_COLUMN | RELATIVE_PATH_COLUMN)
}

fn build_header(with_relative: bool, keys: BTreeSet<String>) -> Vec<String> {
    let mut header = vec![FILE_COLUMN.to_string(), CATEGORY_COLUMN.to_string()];
    if with_relative {
        header.push(RELATIVE_PATH_COLUMN.to_string());
    }
    header.extend(keys.into_iter().filter(|key| !is_fixed_column(key)));
    header
}

/// Header for `rows`.
pub fn header_for(rows: &[CsvRow]) -> Vec<String> {
    let with_relative = rows.iter().any(|row| row.relative_path.is_some());
    let keys = rows
        .iter()
        .flat_map(|row| row.metadata.keys().cloned())
        .collect();
    build_header(with_relative, keys)
}

fn csv_err(context: &str) -> impl FnOnce(csv::Error) -> PaginaError + '_ {
    move |e| PaginaError::Csv(format!("{context}: {e}"))
}

/// Replace `path` with a table.
fn write_table(path: &Path, header: &[String], records: &[Vec<String>], delimiter: u8) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(BOM)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(temp.as_file_mut());
        writer.write_record(header).map_err(csv_err("write header"))?;
        for record in records {
            writer.write_record(record).map_err(csv_err("write row"))?;
        }
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| PaginaError::Io(e.error))?;
    Ok(())
}

/// Write `rows` to a new CSV at `path` (replacing any file there).
#[instrument(skip(rows), fields(path = %path.display(), rows = rows.len()))]
pub fn write_csv(path: &Path, rows: &[CsvRow], delimiter: u8) -> Result<()> {
    let header = header_for(rows);
    let records: Vec<Vec<String>> = rows
        .iter()
        .map(|row| header.iter().map(|column| row.cell(column)).collect())
        .collect();
    write_table(path, &header, &records, delimiter)?;
    info!("CSV written");
    Ok(())
}

/// Write `rows` to a fresh CSV named `name.csv` in `dir`, choosing a new
/// name when one exists. Returns the path written.
pub fn write_new_csv(dir: &Path, name: &str, rows: &[CsvRow], delimiter: u8) -> Result<PathBuf> {
    let mut path = dir.join(format!("{name}.csv"));
    if path.exists() {
        path = auto_rename(&path);
    }
    write_csv(&path, rows, delimiter)?;
    Ok(path)
}

/// Existing header and records of a CSV written by this module.
fn read_table(path: &Path, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let bytes = std::fs::read(path)?;
    let body = bytes.strip_prefix(BOM).unwrap_or(&bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(body);
    let header: Vec<String> = reader
        .headers()
        .map_err(csv_err("read header"))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err("read row"))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok((header, records))
}

/// Add `rows` to the CSV at `path`, creating it when missing.
///
/// When the existing header already covers every column the rows need they
/// are appended in its column order; otherwise the whole file is rewritten
/// with the merged header.
#[instrument(skip(rows), fields(path = %path.display(), rows = rows.len()))]
pub fn append_csv(path: &Path, rows: &[CsvRow], delimiter: u8) -> Result<()> {
    if !path.exists() {
        return write_csv(path, rows, delimiter);
    }

    let (existing_header, existing_records) = read_table(path, delimiter)?;
    let needed = header_for(rows);
    let covered = needed.iter().all(|column| existing_header.contains(column));

    if covered {
        let file = std::fs::OpenOptions::new().append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(file);
        for row in rows {
            let record: Vec<String> = existing_header.iter().map(|column| row.cell(column)).collect();
            writer.write_record(&record).map_err(csv_err("append row"))?;
        }
        writer.flush()?;
        debug!("rows appended to CSV");
        return Ok(());
    }

    let with_relative = existing_header.iter().any(|c| c == RELATIVE_PATH_COLUMN)
        || rows.iter().any(|row| row.relative_path.is_some());
    let keys: BTreeSet<String> = existing_header
        .iter()
        .chain(needed.iter())
        .filter(|column| !is_fixed_column(column))
        .cloned()
        .collect();
    let header = build_header(with_relative, keys);

    let mut records: Vec<Vec<String>> = existing_records
        .iter()
        .map(|record| {
            let cells: HashMap<&str, &str> = existing_header
                .iter()
                .map(String::as_str)
                .zip(record.iter().map(String::as_str))
                .collect();
            header
                .iter()
                .map(|column| cells.get(column.as_str()).copied().unwrap_or("").to_string())
                .collect()
        })
        .collect();
    records.extend(
        rows.iter()
            .map(|row| header.iter().map(|column| row.cell(column)).collect()),
    );

    write_table(path, &header, &records, delimiter)?;
    info!(columns = header.len(), "CSV rewritten with merged header");
    Ok(())
}

// -- Naming -------------------------------------------------------------------

/// Base name of a per-file CSV: custom name, then document stem, then the
/// output folder's name, then `metadata`.
pub fn per_file_csv_name(config: &CoreConfig, document_stem: &str, output_dir: &Path) -> String {
    let custom = config
        .csv_custom_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(custom) = custom {
        return custom.trim_end_matches(".csv").to_string();
    }
    if config.csv_use_document_name && !document_stem.is_empty() {
        return document_stem.to_string();
    }
    output_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_CSV_NAME.to_string())
}

/// Base name of a batch CSV.
///
/// `folder` is the name of the folder the CSV describes (the input root's
/// name for root-level CSVs), `counter` its 1-based position in the session.
pub fn batch_csv_name(
    config: &CoreConfig,
    folder: &str,
    counter: usize,
    now: DateTime<Local>,
) -> String {
    let folder = if folder.is_empty() { DEFAULT_CSV_NAME } else { folder };
    let mut name = match config.batch_csv_naming {
        BatchCsvNaming::Auto => match config.batch_csv_location {
            BatchCsvLocation::PerFolder => folder.to_string(),
            BatchCsvLocation::Root => DEFAULT_CSV_NAME.to_string(),
        },
        BatchCsvNaming::FolderName => folder.to_string(),
        BatchCsvNaming::Custom => config
            .batch_csv_custom_prefix
            .as_deref()
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(DEFAULT_CSV_NAME)
            .to_string(),
        BatchCsvNaming::Timestamp => DEFAULT_CSV_NAME.to_string(),
    };
    if config.batch_csv_add_counter {
        name.push_str(&format!("_{counter:03}"));
    }
    if config.batch_csv_add_timestamp || config.batch_csv_naming == BatchCsvNaming::Timestamp {
        name.push('_');
        name.push_str(&now.format(TIMESTAMP_FORMAT).to_string());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(file: &str, pairs: &[(&str, &str)]) -> CsvRow {
        CsvRow {
            file: file.into(),
            category: "Istanza".into(),
            relative_path: None,
            metadata: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    fn read_text(path: &Path) -> String {
        let bytes = std::fs::read(path).expect("read csv");
        assert!(bytes.starts_with(BOM), "missing byte-order mark");
        String::from_utf8(bytes[BOM.len()..].to_vec()).expect("utf-8")
    }

    #[test]
    fn header_is_fixed_columns_then_sorted_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.csv");
        let rows = [
            row("a_001.jpg", &[("Pratica", "12"), ("Cognome", "Rossi")]),
            row("a_002.jpg", &[("Anno", "2024")]),
        ];
        write_csv(&path, &rows, b';').expect("write");

        let text = read_text(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Nome File;Categoria;Anno;Cognome;Pratica");
        assert_eq!(lines[1], "a_001.jpg;Istanza;;Rossi;12");
        assert_eq!(lines[2], "a_002.jpg;Istanza;2024;;");
    }

    #[test]
    fn relative_path_column_for_root_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("root.csv");
        let files = [ExportedFile {
            file: "x.pdf".into(),
            category: "Documento Completo".into(),
        }];
        let metadata: Metadata = [("Ufficio".to_string(), "Nord".to_string())].into();
        let rows = rows_for_files(&files, &metadata, Some("2024/marzo"));
        write_csv(&path, &rows, b',').expect("write");

        let text = read_text(&path);
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["Nome File,Categoria,Path Relativo,Ufficio", "x.pdf,Documento Completo,2024/marzo,Nord"]
        );
    }

    #[test]
    fn append_keeps_header_when_covered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("inc.csv");
        append_csv(&path, &[row("a.jpg", &[("Anno", "2023"), ("Cognome", "Bianchi")])], b';').expect("first");
        append_csv(&path, &[row("b.jpg", &[("Cognome", "Verdi")])], b';').expect("second");

        let text = read_text(&path);
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "Nome File;Categoria;Anno;Cognome",
                "a.jpg;Istanza;2023;Bianchi",
                "b.jpg;Istanza;;Verdi",
            ]
        );
    }

    #[test]
    fn append_with_new_keys_rewrites_merged_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("inc.csv");
        append_csv(&path, &[row("a.jpg", &[("Cognome", "Bianchi")])], b';').expect("first");
        append_csv(&path, &[row("b.jpg", &[("Anno", "2025")])], b';').expect("second");

        let text = read_text(&path);
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "Nome File;Categoria;Anno;Cognome",
                "a.jpg;Istanza;;Bianchi",
                "b.jpg;Istanza;2025;",
            ]
        );
    }

    #[test]
    fn new_csv_never_replaces_an_existing_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("metadata.csv"), b"old").expect("existing");
        let path = write_new_csv(dir.path(), "metadata", &[row("a.jpg", &[])], b';').expect("write");
        assert_eq!(path, dir.path().join("metadata(1).csv"));
        assert_eq!(std::fs::read(dir.path().join("metadata.csv")).expect("read"), b"old");
    }

    #[test]
    fn per_file_name_precedence() {
        let out = Path::new("/exports/pratiche");
        let mut config = CoreConfig::default();
        config.csv_use_document_name = false;
        assert_eq!(per_file_csv_name(&config, "scan", out), "pratiche");
        assert_eq!(per_file_csv_name(&config, "scan", Path::new("/")), DEFAULT_CSV_NAME);

        config.csv_use_document_name = true;
        assert_eq!(per_file_csv_name(&config, "scan", out), "scan");

        config.csv_custom_name = Some("indice.csv".into());
        assert_eq!(per_file_csv_name(&config, "scan", out), "indice");
    }

    #[test]
    fn batch_names_follow_naming_options() {
        let now = Local.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).single().expect("valid time");
        let mut config = CoreConfig::default();
        config.batch_csv_location = BatchCsvLocation::PerFolder;
        config.batch_csv_naming = BatchCsvNaming::Auto;
        config.batch_csv_add_counter = false;
        config.batch_csv_add_timestamp = false;
        assert_eq!(batch_csv_name(&config, "marzo", 1, now), "marzo");

        config.batch_csv_naming = BatchCsvNaming::Custom;
        config.batch_csv_custom_prefix = Some("lotto".into());
        config.batch_csv_add_counter = true;
        assert_eq!(batch_csv_name(&config, "marzo", 2, now), "lotto_002");

        config.batch_csv_naming = BatchCsvNaming::Timestamp;
        config.batch_csv_add_counter = false;
        assert_eq!(batch_csv_name(&config, "marzo", 1, now), "metadata_20260309_140507");
    }
}
