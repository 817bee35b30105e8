// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting and cooperative cancellation.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives export progress.
///
/// Terminal drivers log it, the batch worker forwards it over its channel.
/// All methods default to no-ops.
pub trait ProgressSink: Send + Sync {
    /// A document is about to be exported (`index` is 1-based).
    fn on_document_start(&self, _name: &str, _index: usize, _total: usize) {}
    /// One page of the current document was written.
    fn on_page(&self, _done: u32, _total: u32) {}
    fn on_file_written(&self, _path: &Path) {}
    /// Free-form status line with overall completion in `0.0..=1.0`.
    fn on_status(&self, _text: &str, _fraction: f32) {}
}

/// Discards all progress.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {}

/// Shared stop request, polled between documents and between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request before a new run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
