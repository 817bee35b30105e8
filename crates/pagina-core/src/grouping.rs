// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sidecar → document groups.
//
// Category spans are folded in order: a "Pagina vuota" span extends the
// current group, any other span closes it and opens a new one. Counters are
// 1-based and dense.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sidecar::{CategorySpan, FLAT_CATEGORY, Sidecar};

/// Reserved category for blank pages, merged into the preceding group.
pub const BLANK_PAGE_CATEGORY: &str = "Pagina vuota";

/// Pages exported together under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentGroup {
    pub category: String,
    /// 1-based position of the group within its document.
    pub counter: u32,
    /// 1-based page numbers in emission order.
    pub pages: Vec<u32>,
}

impl DocumentGroup {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// How the caller wants empty groups handled before export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapResolution {
    /// Remove empty groups and renumber the rest densely.
    DeleteAndRenumber,
    /// Keep numbering as is; empty groups produce no files.
    ProceedWithGaps,
    /// Do not export this document.
    Abort,
}

pub fn is_blank_page_category(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(BLANK_PAGE_CATEGORY)
}

/// Fold category spans into groups, clipping pages to `total_pages`.
pub fn group_spans(spans: &[CategorySpan], total_pages: u32) -> Vec<DocumentGroup> {
    let mut groups: Vec<DocumentGroup> = Vec::new();

    for span in spans {
        let last = span.fine.min(total_pages);
        if span.fine > total_pages {
            warn!(
                category = %span.categoria,
                fine = span.fine,
                total_pages,
                "category range exceeds document length, clipping"
            );
        }
        let pages = span.inizio..=last;

        match groups.last_mut() {
            Some(current) if is_blank_page_category(&span.categoria) => {
                current.pages.extend(pages);
            }
            _ => {
                let counter = groups.len() as u32 + 1;
                groups.push(DocumentGroup {
                    category: span.categoria.clone(),
                    counter,
                    pages: pages.collect(),
                });
            }
        }
    }

    groups
}

/// The single synthetic group of a flat-workflow document.
pub fn whole_document_group(total_pages: u32) -> DocumentGroup {
    DocumentGroup {
        category: FLAT_CATEGORY.to_string(),
        counter: 1,
        pages: (1..=total_pages).collect(),
    }
}

/// Groups for a sidecar over a document of `total_pages` pages.
pub fn groups_for_sidecar(sidecar: &Sidecar, total_pages: u32) -> Vec<DocumentGroup> {
    match sidecar {
        Sidecar::Split { categories, .. } => group_spans(categories, total_pages),
        Sidecar::Flat { .. } => vec![whole_document_group(total_pages)],
    }
}

/// Counters of groups that have no pages.
pub fn empty_group_counters(groups: &[DocumentGroup]) -> Vec<u32> {
    groups
        .iter()
        .filter(|group| group.is_empty())
        .map(|group| group.counter)
        .collect()
}

/// Renumber counters densely from 1 in the current order.
pub fn renumber(groups: &mut [DocumentGroup]) {
    for (index, group) in groups.iter_mut().enumerate() {
        group.counter = index as u32 + 1;
    }
}

/// Apply a gap resolution. `None` means the export is aborted.
pub fn resolve_gaps(
    mut groups: Vec<DocumentGroup>,
    resolution: GapResolution,
) -> Option<Vec<DocumentGroup>> {
    match resolution {
        GapResolution::DeleteAndRenumber => {
            groups.retain(|group| !group.is_empty());
            renumber(&mut groups);
            Some(groups)
        }
        GapResolution::ProceedWithGaps => Some(groups),
        GapResolution::Abort => None,
    }
}
