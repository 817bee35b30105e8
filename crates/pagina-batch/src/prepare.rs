// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Steps shared by batch and single-document export: the empty-group gate
// before export and category bookkeeping after it.

use std::collections::BTreeSet;
use std::path::Path;

use pagina_core::error::Result;
use pagina_core::grouping::{
    DocumentGroup, empty_group_counters, groups_for_sidecar, is_blank_page_category, resolve_gaps,
};
use pagina_core::sidecar::Sidecar;
use pagina_export::{ExportOutcome, ExportPrompt};
use pagina_store::CategoryStore;
use tracing::{debug, warn};

/// Groups to export for `sidecar`, after asking `prompt` about empty groups.
/// `None` means the operator aborted this document.
pub fn prepare_groups(
    sidecar: &Sidecar,
    total_pages: u32,
    document: &Path,
    prompt: &dyn ExportPrompt,
) -> Option<Vec<DocumentGroup>> {
    let groups = groups_for_sidecar(sidecar, total_pages);
    let empty = empty_group_counters(&groups);
    if empty.is_empty() {
        return Some(groups);
    }

    warn!(document = %document.display(), ?empty, "category groups without pages");
    let resolution = prompt.resolve_empty_groups(document, &empty);
    debug!(?resolution, "empty groups resolved");
    resolve_gaps(groups, resolution)
}

/// Sync the sidecar's categories and count one use per exported category.
pub fn track_categories(
    store: &mut CategoryStore,
    sidecar: &Sidecar,
    document: &Path,
    outcome: &ExportOutcome,
) -> Result<()> {
    if !matches!(sidecar, Sidecar::Split { .. }) {
        return Ok(());
    }

    let names: Vec<String> = sidecar
        .category_names()
        .into_iter()
        .filter(|name| !is_blank_page_category(name))
        .collect();
    store.sync_sidecar(&names, document)?;

    let used: BTreeSet<&str> = outcome
        .files
        .iter()
        .map(|file| file.category.as_str())
        .filter(|name| !is_blank_page_category(name))
        .collect();
    for name in used {
        store.record_usage(name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagina_core::grouping::GapResolution;
    use pagina_export::{AutoPrompt, ExportedRecord, OverwriteChoice};
    use serde_json::json;
    use std::path::PathBuf;

    fn prompt(gaps: GapResolution) -> AutoPrompt {
        AutoPrompt {
            overwrite: OverwriteChoice::No,
            gaps,
        }
    }

    fn sidecar() -> Sidecar {
        Sidecar::from_value(&json!({"categories": [
            {"categoria": "Istanza", "inizio": 1, "fine": 2},
            {"categoria": "Pagina vuota", "inizio": 3, "fine": 3},
            {"categoria": "Perizia", "inizio": 7, "fine": 9},
            {"categoria": "Allegati", "inizio": 4, "fine": 4}
        ]}))
    }

    #[test]
    fn gate_applies_the_operator_choice() {
        let doc = Path::new("/in/scan.pdf");

        let renumbered =
            prepare_groups(&sidecar(), 4, doc, &prompt(GapResolution::DeleteAndRenumber)).expect("groups");
        let summary: Vec<(&str, u32)> =
            renumbered.iter().map(|g| (g.category.as_str(), g.counter)).collect();
        assert_eq!(summary, vec![("Istanza", 1), ("Allegati", 2)]);

        let gaps = prepare_groups(&sidecar(), 4, doc, &prompt(GapResolution::ProceedWithGaps)).expect("groups");
        assert_eq!(gaps.len(), 3);
        assert_eq!(gaps[2].counter, 3);

        assert!(prepare_groups(&sidecar(), 4, doc, &prompt(GapResolution::Abort)).is_none());
    }

    #[test]
    fn complete_groups_skip_the_prompt() {
        let groups = prepare_groups(&sidecar(), 9, Path::new("x.pdf"), &prompt(GapResolution::Abort));
        assert_eq!(groups.map(|g| g.len()), Some(3));
    }

    #[test]
    fn categories_are_synced_and_counted() {
        let mut store = CategoryStore::open_in_memory().expect("store");
        let outcome = ExportOutcome {
            files: vec![
                ExportedRecord {
                    path: PathBuf::from("/out/scan_doc001_Istanza_001.jpg"),
                    category: "Istanza".into(),
                    pages: vec![1],
                },
                ExportedRecord {
                    path: PathBuf::from("/out/scan_doc001_Istanza_002.jpg"),
                    category: "Istanza".into(),
                    pages: vec![2],
                },
            ],
            skipped: 0,
        };
        track_categories(&mut store, &sidecar(), Path::new("/in/scan.pdf"), &outcome).expect("track");

        let istanza = store.get("Istanza").expect("get").expect("synced");
        assert!(istanza.protected);
        assert_eq!(istanza.usage_count, 1);
        assert!(store.get("Perizia").expect("get").is_some());
        assert!(store.get("Pagina vuota").expect("get").is_none());
    }
}
