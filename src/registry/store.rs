//! Concurrent, versioned object store keyed by object name.

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::watch;

use crate::registry::record::RoutingObjectRecord;

/// Errors raised by registry mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An object with this name is already registered.
    #[error("routing object '{0}' already exists")]
    DuplicateKey(String),
}

type Slot = Arc<ArcSwap<RoutingObjectRecord>>;

/// Shared registry of routing objects.
///
/// Cloning is not provided; share it behind an `Arc`.
pub struct ObjectStore {
    entries: DashMap<String, Slot>,
    revision: watch::Sender<u64>,
}

impl ObjectStore {
    /// Create an empty store at revision 0.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            entries: DashMap::new(),
            revision,
        }
    }

    /// Insert a new record. Never overwrites an existing name.
    pub fn put(&self, record: RoutingObjectRecord) -> Result<(), RegistryError> {
        match self.entries.entry(record.name.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateKey(record.name)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(ArcSwap::from_pointee(record)));
                self.bump();
                Ok(())
            }
        }
    }

    /// Insert or overwrite a record, returning the one it replaced.
    ///
    /// An overwrite continues the previous record's version sequence.
    pub fn replace(&self, record: RoutingObjectRecord) -> Option<Arc<RoutingObjectRecord>> {
        let previous = match self.entries.entry(record.name.clone()) {
            Entry::Occupied(slot) => Some(slot.get().rcu(|current| RoutingObjectRecord {
                version: current.version + 1,
                ..record.clone()
            })),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(ArcSwap::from_pointee(record)));
                None
            }
        };
        self.bump();
        previous
    }

    /// Bulk insertion used at startup. Stops at the first duplicate name.
    pub fn insert_all<I>(&self, records: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator<Item = RoutingObjectRecord>,
    {
        let mut inserted = 0;
        for record in records {
            self.put(record)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Current record for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<RoutingObjectRecord>> {
        self.slot(name).map(|slot| slot.load_full())
    }

    /// Atomically rewrite the tags of `name`.
    ///
    /// `f` sees the latest committed tag set. If another writer commits first
    /// the update is retried against the newer version, so `f` may run more
    /// than once. Returns `false` if `name` is not registered.
    pub fn update_tags<F>(&self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&BTreeSet<String>) -> BTreeSet<String>,
    {
        let Some(slot) = self.slot(name) else {
            return false;
        };

        let mut current = slot.load_full();
        loop {
            let tags = f(&current.tags);
            if tags == current.tags {
                return true;
            }

            let next = Arc::new(current.with_tags(tags));
            let previous = slot.compare_and_swap(&current, next);
            if Arc::ptr_eq(&*previous, &current) {
                self.bump();
                return true;
            }
            current = Guard::into_inner(previous);
        }
    }

    /// Point-in-time copy of all records whose tags satisfy `predicate`,
    /// ordered by name.
    pub fn snapshot<P>(&self, predicate: P) -> Vec<Arc<RoutingObjectRecord>>
    where
        P: Fn(&BTreeSet<String>) -> bool,
    {
        let mut records: Vec<_> = self
            .entries
            .iter()
            .map(|entry| entry.value().load_full())
            .filter(|record| predicate(&record.tags))
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// Delete `name`, returning the last published record.
    pub fn remove(&self, name: &str) -> Option<Arc<RoutingObjectRecord>> {
        let removed = self.entries.remove(name).map(|(_, slot)| slot.load_full());
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store-wide revision, incremented on every committed change.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribe to revision changes.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn slot(&self, name: &str) -> Option<Slot> {
        // Clone the slot out so no shard guard is held while callers work.
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}
