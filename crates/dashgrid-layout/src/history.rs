//! Bounded undo/redo over committed document versions.
//!
//! Each snapshot is an `Arc<DashboardDocument>`. Documents keep rows and
//! panels in persistent collections, so retaining many versions costs little
//! more than the edits between them.
//!
//! ```text
//! record(v3)   undo: [v0, v1, v2, v3]   redo: []
//! undo() x2    undo: [v0, v1]           redo: [v3, v2]
//! record(v4)   undo: [v0, v1, v4]       redo: []
//! ```
//!
//! Undo and redo hand back the stored snapshot as-is, version number
//! included.
//!
//! # Invariants
//!
//! 1. The undo stack is never empty; its back is the current document.
//! 2. `undo_depth() <= max_depth`.
//! 3. Recording a new version clears the redo stack.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::document::DashboardDocument;

pub struct LayoutHistory {
    undo_stack: VecDeque<Arc<DashboardDocument>>,
    redo_stack: VecDeque<Arc<DashboardDocument>>,
    max_depth: usize,
}

impl fmt::Debug for LayoutHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutHistory")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl LayoutHistory {
    /// Start a history whose current entry is `initial`.
    ///
    /// `max_depth` counts the current entry; zero is treated as one.
    #[must_use]
    pub fn new(initial: Arc<DashboardDocument>, max_depth: usize) -> Self {
        let mut undo_stack = VecDeque::new();
        undo_stack.push_back(initial);
        Self {
            undo_stack,
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a newly committed version, starting a new branch.
    pub fn record(&mut self, document: Arc<DashboardDocument>) {
        self.redo_stack.clear();
        self.undo_stack.push_back(document);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back one version. `None` when nothing is left to undo.
    pub fn undo(&mut self) -> Option<Arc<DashboardDocument>> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let current = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(current);
        self.undo_stack.back().cloned()
    }

    /// Re-apply the most recently undone version.
    pub fn redo(&mut self) -> Option<Arc<DashboardDocument>> {
        let snapshot = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(snapshot);
        self.undo_stack.back().cloned()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Arc<DashboardDocument>> {
        self.undo_stack.back()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Entries on the undo stack, current included.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Forget everything except the current version.
    pub fn reset(&mut self, current: Arc<DashboardDocument>) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push_back(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ItemPlacement, Reference, Row};

    fn versions(count: usize) -> Vec<Arc<DashboardDocument>> {
        let mut doc = DashboardDocument::new([Row::new("r")], []).unwrap();
        let mut out = vec![Arc::new(doc.clone())];
        for index in 1..count {
            let y = i32::try_from(index).unwrap() * 2;
            let placement =
                ItemPlacement::new(format!("i{index}"), 0, y, 4, 2, Reference::new_panel());
            doc = doc.insert_item(&"r".into(), 0, placement).unwrap().document;
            out.push(Arc::new(doc.clone()));
        }
        out
    }

    #[test]
    fn undo_redo_walks_versions() {
        let v = versions(3);
        let mut history = LayoutHistory::new(v[0].clone(), 10);
        history.record(v[1].clone());
        history.record(v[2].clone());

        assert_eq!(history.undo().unwrap().version(), 1);
        assert_eq!(history.undo().unwrap().version(), 0);
        assert!(history.undo().is_none());
        assert_eq!(history.redo().unwrap().version(), 1);
        assert_eq!(history.current().unwrap().version(), 1);
        assert!(history.can_redo());
    }

    #[test]
    fn record_clears_redo() {
        let v = versions(3);
        let mut history = LayoutHistory::new(v[0].clone(), 10);
        history.record(v[1].clone());
        history.undo();
        history.record(v[2].clone());
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn depth_is_bounded() {
        let v = versions(6);
        let mut history = LayoutHistory::new(v[0].clone(), 3);
        for doc in &v[1..] {
            history.record(doc.clone());
        }
        assert_eq!(history.undo_depth(), 3);
        history.undo();
        assert_eq!(history.undo().unwrap().version(), 3);
        assert!(!history.can_undo());
    }

    #[test]
    fn snapshots_share_structure() {
        let v = versions(2);
        let history = LayoutHistory::new(v[1].clone(), 4);
        assert!(Arc::ptr_eq(history.current().unwrap(), &v[1]));
    }
}
