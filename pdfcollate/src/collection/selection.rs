//! Pages marked for batch deletion.

use std::collections::{BTreeSet, HashSet};

use super::{PageId, PageIndex};

/// Set of selected page ids.
///
/// The set never holds an id that is not in the [`PageIndex`] it belongs to;
/// the owning collection calls [`SelectionSet::prune`] after every removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<PageId>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the selection state of a page. Returns whether it is now selected.
    pub fn toggle(&mut self, page_id: PageId) -> bool {
        if self.ids.remove(&page_id) {
            false
        } else {
            self.ids.insert(page_id);
            true
        }
    }

    /// Select every page of the index.
    pub fn select_all(&mut self, index: &PageIndex) {
        self.ids.extend(index.pages().iter().map(|page| page.id));
    }

    /// Drop the whole selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Keep only ids still present in `index`.
    pub fn prune(&mut self, index: &PageIndex) {
        if self.ids.is_empty() {
            return;
        }
        let live: HashSet<PageId> = index.pages().iter().map(|page| page.id).collect();
        self.ids.retain(|id| live.contains(id));
    }

    /// Take the selected ids, leaving the selection empty.
    pub fn take(&mut self) -> BTreeSet<PageId> {
        std::mem::take(&mut self.ids)
    }

    /// Check whether a page is selected.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.ids.contains(&page_id)
    }

    /// Selected ids in ascending id order.
    pub fn ids(&self) -> impl Iterator<Item = PageId> + '_ {
        self.ids.iter().copied()
    }

    /// Number of selected pages.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
