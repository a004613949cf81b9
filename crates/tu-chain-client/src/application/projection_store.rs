//! # Projection Store
//!
//! Read model of the shared account: the entries the board displays, in
//! display order. Holds no network handle; the client feeds it.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::algorithms::project_entries;
use crate::domain::{Entry, EntryId, Pubkey};

/// Last applied projection, swapped whole on every refresh.
#[derive(Debug)]
pub struct ProjectionStore {
    current: RwLock<Arc<[Entry]>>,
}

impl Default for ProjectionStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::from(Vec::new())),
        }
    }
}

impl ProjectionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Project `entries` and replace the current snapshot.
    pub fn refresh(&self, entries: Vec<Entry>) -> Arc<[Entry]> {
        let projected: Arc<[Entry]> = project_entries(entries).into();
        *self.current.write() = Arc::clone(&projected);
        projected
    }

    /// Last projection; empty before the first refresh.
    pub fn current(&self) -> Arc<[Entry]> {
        self.current.read().clone()
    }

    /// Every projected entry carrying `id`.
    pub fn find(&self, id: &EntryId) -> Vec<Entry> {
        self.current
            .read()
            .iter()
            .filter(|e| &e.id == id)
            .cloned()
            .collect()
    }

    /// Distinct submitters of the entries carrying `id`.
    pub fn submitters_of(&self, id: &EntryId) -> BTreeSet<Pubkey> {
        self.find(id).into_iter().map(|e| e.submitter).collect()
    }

    /// Number of projected entries.
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// True before the first refresh or when nothing qualifies.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
