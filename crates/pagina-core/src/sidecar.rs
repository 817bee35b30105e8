// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sidecar JSON: classification into the split or flat workflow.
//
// A sidecar either lists page-range categories:
//
//   { "categories": [ {"categoria": "Istanza", "inizio": 1, "fine": 2}, ... ],
//     "header": { "Intestatario": "A. Rossi" } }
//
// or is any other object, whose fields (or whose `header` sub-object) are the
// document metadata. `Sidecar::from_value` is the only place a `Sidecar` is
// built, so downstream code matches on the variant instead of re-inspecting
// JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{PaginaError, Result};
use crate::types::{Metadata, WorkflowKind};

/// Category name used for the single group of a flat-workflow document.
pub const FLAT_CATEGORY: &str = "Documento Completo";

/// One `categories` entry: pages `inizio..=fine` (1-based) belong to
/// `categoria`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpan {
    pub categoria: String,
    pub inizio: u32,
    pub fine: u32,
}

/// A parsed sidecar.
#[derive(Debug, Clone, PartialEq)]
pub enum Sidecar {
    Split {
        categories: Vec<CategorySpan>,
        header: Metadata,
    },
    Flat {
        metadata: Metadata,
    },
}

/// Decide the workflow of a raw sidecar value.
///
/// `Split` iff `categories` is a non-empty array whose first element is an
/// object carrying `categoria`.
pub fn classify_workflow(value: &Value) -> WorkflowKind {
    let first = value
        .get("categories")
        .and_then(Value::as_array)
        .and_then(|list| list.first());
    match first {
        Some(Value::Object(entry)) if entry.contains_key("categoria") => WorkflowKind::Split,
        _ => WorkflowKind::Flat,
    }
}

impl Sidecar {
    /// Build the tagged sidecar from a JSON value.
    ///
    /// A list that classifies as split but has no usable entry falls back to
    /// the flat shape.
    pub fn from_value(value: &Value) -> Self {
        if classify_workflow(value) == WorkflowKind::Split {
            let categories = parse_spans(value);
            if !categories.is_empty() {
                let header = value
                    .get("header")
                    .and_then(Value::as_object)
                    .map(object_to_metadata)
                    .unwrap_or_default();
                return Self::Split { categories, header };
            }
            warn!("sidecar lists categories but none are usable, treating as flat");
        }

        let metadata = match value {
            Value::Object(object) => match object.get("header").and_then(Value::as_object) {
                Some(header) => object_to_metadata(header),
                None => {
                    let mut metadata = object_to_metadata(object);
                    metadata.remove("categories");
                    metadata
                }
            },
            _ => Metadata::new(),
        };
        Self::Flat { metadata }
    }

    /// Parse sidecar bytes. Invalid UTF-8 sequences are replaced and a
    /// leading byte-order mark is ignored; malformed JSON is a
    /// `SidecarParse` error naming `origin`.
    pub fn parse_bytes(bytes: &[u8], origin: &str) -> Result<(Self, Value)> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_start_matches('\u{feff}');
        let value: Value = serde_json::from_str(text).map_err(|e| PaginaError::SidecarParse {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        Ok((Self::from_value(&value), value))
    }

    /// Read and parse a sidecar file.
    pub fn read(path: &std::path::Path) -> Result<(Self, Value)> {
        let bytes = std::fs::read(path)?;
        Self::parse_bytes(&bytes, &path.display().to_string())
    }

    pub fn workflow(&self) -> WorkflowKind {
        match self {
            Self::Split { .. } => WorkflowKind::Split,
            Self::Flat { .. } => WorkflowKind::Flat,
        }
    }

    /// Metadata written to the CSV index.
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Split { header, .. } => header,
            Self::Flat { metadata } => metadata,
        }
    }

    /// Distinct category names in first-appearance order (empty for flat).
    pub fn category_names(&self) -> Vec<String> {
        match self {
            Self::Split { categories, .. } => {
                let mut names: Vec<String> = Vec::new();
                for span in categories {
                    if !names.contains(&span.categoria) {
                        names.push(span.categoria.clone());
                    }
                }
                names
            }
            Self::Flat { .. } => Vec::new(),
        }
    }
}

fn parse_spans(value: &Value) -> Vec<CategorySpan> {
    let Some(list) = value.get("categories").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut spans = Vec::with_capacity(list.len());
    for (index, entry) in list.iter().enumerate() {
        let categoria = entry.get("categoria").and_then(Value::as_str);
        let inizio = entry.get("inizio").and_then(as_page_number);
        let fine = entry.get("fine").and_then(as_page_number);
        match (categoria, inizio, fine) {
            (Some(categoria), Some(inizio), Some(fine)) if inizio >= 1 && inizio <= fine => {
                spans.push(CategorySpan {
                    categoria: categoria.to_string(),
                    inizio,
                    fine,
                });
            }
            _ => warn!(index, entry = %entry, "skipping malformed category entry"),
        }
    }
    spans
}

/// Page numbers are integers, tolerated as numeric strings.
fn as_page_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn object_to_metadata(object: &Map<String, Value>) -> Metadata {
    object
        .iter()
        .map(|(key, value)| (key.clone(), value_to_cell(value)))
        .collect()
}

/// Render a JSON value as a CSV cell.
fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn categories_with_categoria_classify_as_split() {
        let value = json!({"categories": [{"categoria": "Istanza", "inizio": 1, "fine": 2}]});
        assert_eq!(classify_workflow(&value), WorkflowKind::Split);
    }

    #[test]
    fn missing_empty_or_foreign_categories_classify_as_flat() {
        for value in [
            json!({"Intestatario": "A. Rossi"}),
            json!({"categories": []}),
            json!({"categories": [{"name": "x"}]}),
            json!({"categories": "Istanza"}),
            json!(["not", "an", "object"]),
        ] {
            assert_eq!(classify_workflow(&value), WorkflowKind::Flat, "{value}");
        }
    }

    #[test]
    fn split_sidecar_keeps_order_and_header() {
        let value = json!({
            "categories": [
                {"categoria": "Istanza", "inizio": 1, "fine": 2},
                {"categoria": "Allegati", "inizio": "3", "fine": 4}
            ],
            "header": {"Protocollo": 17, "Ufficio": "Tecnico"}
        });
        let sidecar = Sidecar::from_value(&value);
        let Sidecar::Split { categories, header } = &sidecar else {
            panic!("expected split, got {sidecar:?}");
        };
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].inizio, 3);
        assert_eq!(header.get("Protocollo").map(String::as_str), Some("17"));
        assert_eq!(sidecar.category_names(), vec!["Istanza", "Allegati"]);
    }

    #[test]
    fn flat_sidecar_uses_whole_object_or_header() {
        let whole = Sidecar::from_value(&json!({"Intestatario": "A. Rossi", "NumeroProgetto": "42"}));
        assert_eq!(whole.workflow(), WorkflowKind::Flat);
        assert_eq!(whole.metadata().len(), 2);

        let with_header = Sidecar::from_value(&json!({"header": {"A": "1"}, "other": "ignored"}));
        assert_eq!(with_header.metadata().len(), 1);
        assert_eq!(with_header.metadata().get("A").map(String::as_str), Some("1"));
    }

    #[test]
    fn unusable_split_entries_fall_back_to_flat() {
        let value = json!({"categories": [{"categoria": "X", "inizio": 5, "fine": 2}], "k": "v"});
        let sidecar = Sidecar::from_value(&value);
        assert_eq!(sidecar.workflow(), WorkflowKind::Flat);
        assert!(!sidecar.metadata().contains_key("categories"));
        assert_eq!(sidecar.metadata().get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn parse_bytes_tolerates_bom_and_invalid_utf8() {
        let mut bytes = "\u{feff}{\"Nome\": \"Caf".as_bytes().to_vec();
        bytes.push(0xE9); // latin-1 é
        bytes.extend_from_slice(b"\"}");
        let (sidecar, _) = Sidecar::parse_bytes(&bytes, "test.json").expect("lossy parse");
        assert!(sidecar.metadata().get("Nome").unwrap().starts_with("Caf"));
    }

    #[test]
    fn parse_bytes_reports_malformed_json() {
        let err = Sidecar::parse_bytes(b"{not json", "broken.json").unwrap_err();
        match err {
            PaginaError::SidecarParse { path, .. } => assert_eq!(path, "broken.json"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
