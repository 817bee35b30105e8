// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output file names.
//
// A document with exactly one group is exported in single mode
// (`{stem}_{NNN}.{ext}` per page, `{stem}.{ext}` for multi-page formats).
// With more groups every file carries the document label and the category:
// `{stem}_{label}_{category}.{ext}`, plus `_{PPP}` per page for single-page
// formats.

use std::collections::HashMap;

use pagina_core::config::DocumentNumbering;
use pagina_core::grouping::DocumentGroup;
use pagina_core::types::{ExportFormat, NumberingMode};

/// Upper bound on the length of a sanitized category.
pub const MAX_CATEGORY_LEN: usize = 100;

/// Replacement used when a category sanitizes to nothing.
pub const FALLBACK_CATEGORY: &str = "documento";

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Make a category usable inside a file name.
///
/// Characters reserved on common file systems become `_`, surrounding dots
/// and spaces are trimmed and the result is capped at 100 characters.
pub fn safe_category(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    let capped: String = replaced
        .trim_matches(|c| c == '.' || c == ' ')
        .chars()
        .take(MAX_CATEGORY_LEN)
        .collect();
    let trimmed = capped.trim_end_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        FALLBACK_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One output file before collision handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub file_name: String,
    pub category: String,
    /// Pages written into the file, in order.
    pub pages: Vec<u32>,
}

/// Whether groups are exported in single mode.
pub fn is_single_mode(groups: &[DocumentGroup]) -> bool {
    groups.len() == 1
}

/// Document labels (`doc001`, …) for each group, following the numbering
/// mode. Global labels follow the group counter; per-category labels count
/// each category on its own.
pub fn group_labels(groups: &[DocumentGroup], numbering: &DocumentNumbering) -> Vec<String> {
    let mut per_category: HashMap<&str, u32> = HashMap::new();
    groups
        .iter()
        .map(|group| match numbering.numbering_mode {
            NumberingMode::Global => numbering.label(group.counter),
            NumberingMode::PerCategory => {
                let ordinal = per_category.entry(group.category.as_str()).or_insert(0);
                *ordinal += 1;
                numbering.label(*ordinal)
            }
        })
        .collect()
}

/// Every file an export of `groups` produces, in emission order. Empty
/// groups produce nothing.
pub fn plan_files(
    stem: &str,
    groups: &[DocumentGroup],
    format: ExportFormat,
    numbering: &DocumentNumbering,
) -> Vec<PlannedFile> {
    let ext = format.extension();
    let mut planned = Vec::new();

    if is_single_mode(groups) {
        let group = &groups[0];
        if group.is_empty() {
            return planned;
        }
        if format.is_multi_page() {
            planned.push(PlannedFile {
                file_name: format!("{stem}.{ext}"),
                category: group.category.clone(),
                pages: group.pages.clone(),
            });
        } else {
            for (index, page) in group.pages.iter().enumerate() {
                planned.push(PlannedFile {
                    file_name: format!("{stem}_{:03}.{ext}", index + 1),
                    category: group.category.clone(),
                    pages: vec![*page],
                });
            }
        }
        return planned;
    }

    let labels = group_labels(groups, numbering);
    for (group, label) in groups.iter().zip(labels) {
        if group.is_empty() {
            continue;
        }
        let base = format!("{stem}_{label}_{}", safe_category(&group.category));
        if format.is_multi_page() {
            planned.push(PlannedFile {
                file_name: format!("{base}.{ext}"),
                category: group.category.clone(),
                pages: group.pages.clone(),
            });
        } else {
            for (index, page) in group.pages.iter().enumerate() {
                planned.push(PlannedFile {
                    file_name: format!("{base}_{:03}.{ext}", index + 1),
                    category: group.category.clone(),
                    pages: vec![*page],
                });
            }
        }
    }
    planned
}
