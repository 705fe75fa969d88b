//! History Stack
//!
//! Ordered record of visited pages. The home page is always the root:
//! pushing it truncates the stack to a single entry.

use crate::page::PageId;
use serde_json::Value;

/// One visit
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Visited page
    pub page_id: PageId,
    /// Data supplied with the visit
    pub data: Option<Value>,
}

impl HistoryEntry {
    /// Create a new entry
    pub fn new(page_id: impl Into<PageId>, data: Option<Value>) -> Self {
        Self {
            page_id: page_id.into(),
            data,
        }
    }
}

/// Result of stepping back one page
#[derive(Debug, Clone, PartialEq)]
pub enum BackStep {
    /// The page below the top is home: leave the app through the host
    Exit,
    /// Both top entries were popped; the target must be navigated to again
    Restore(HistoryEntry),
}

/// Navigation history
#[derive(Debug, Default)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,
}

impl HistoryStack {
    /// Create empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a single home entry
    pub fn reset(&mut self, home: HistoryEntry) {
        self.entries.clear();
        self.entries.push(home);
    }

    /// Push a visit. Visiting home clears everything before it.
    pub fn push(&mut self, entry: HistoryEntry, home_id: &str) {
        if entry.page_id == home_id {
            self.entries.clear();
        }
        self.entries.push(entry);
    }

    /// Step back one page.
    ///
    /// When the entry beneath the top is home (or there is none), nothing is
    /// popped and the caller must exit through the host. Otherwise the top and
    /// the entry beneath it are removed and the latter is returned.
    pub fn step_back(&mut self, home_id: &str) -> BackStep {
        let below_top = self.entries.len().checked_sub(2).map(|i| &self.entries[i]);
        if !matches!(below_top, Some(entry) if entry.page_id != home_id) {
            return BackStep::Exit;
        }

        self.entries.pop();
        match self.entries.pop() {
            Some(target) => BackStep::Restore(target),
            None => BackStep::Exit,
        }
    }

    /// Current entry
    pub fn top(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the stack empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from root to top
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Page ids from root to top
    pub fn page_ids(&self) -> Vec<PageId> {
        self.entries.iter().map(|e| e.page_id.clone()).collect()
    }
}
