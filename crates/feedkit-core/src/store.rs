//! Keyed content lookup and an in-memory store with change notification.

use crate::reference::ItemRef;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Read access to the shared content store.
///
/// A lookup may legitimately come back empty, for example when an item was
/// deleted after its reference was listed.
pub trait ContentStore {
    /// The content record type held by this store.
    type Record;

    /// Look up the record for `item`.
    fn get(&self, item: &ItemRef) -> Option<&Self::Record>;

    /// Monotonic revision, bumped on every mutation.
    ///
    /// Stores that cannot track changes return `0`, which makes every
    /// projection over them recompute.
    fn revision(&self) -> u64 {
        0
    }

    /// Identifies this store instance among live stores.
    ///
    /// Revisions are only comparable between calls on the same instance.
    /// Stores that do not track revisions may leave this at `0`.
    fn store_id(&self) -> u64 {
        0
    }
}

impl<R> ContentStore for HashMap<ItemRef, R> {
    type Record = R;

    fn get(&self, item: &ItemRef) -> Option<&R> {
        HashMap::get(self, item)
    }
}

/// An in-memory [`ContentStore`] that publishes its revision on a
/// [`watch`] channel so hosts can re-project when content changes.
///
/// # Example
///
/// ```
/// use feedkit_core::store::{ContentStore, MemoryStore};
/// use feedkit_core::ItemRef;
///
/// let mut store = MemoryStore::new();
/// let revisions = store.subscribe();
/// store.insert(ItemRef::new("alice/x"), "hello");
/// assert_eq!(store.revision(), 1);
/// assert_eq!(*revisions.borrow(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryStore<R> {
    id: u64,
    records: HashMap<ItemRef, R>,
    revision: u64,
    notify: watch::Sender<u64>,
}

impl<R> MemoryStore<R> {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            records: HashMap::new(),
            revision: 0,
            notify,
        }
    }

    /// Receive the store revision every time it changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, item: ItemRef, record: R) -> Option<R> {
        let previous = self.records.insert(item, record);
        self.bump();
        previous
    }

    /// Insert many records as a single revision.
    pub fn extend(&mut self, records: impl IntoIterator<Item = (ItemRef, R)>) {
        let before = self.records.len();
        let mut replaced = false;
        for (item, record) in records {
            replaced |= self.records.insert(item, record).is_some();
        }
        if replaced || self.records.len() != before {
            self.bump();
        }
    }

    /// Remove a record, e.g. after the item was deleted upstream.
    pub fn remove(&mut self, item: &ItemRef) -> Option<R> {
        let removed = self.records.remove(item);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn bump(&mut self) {
        self.revision += 1;
        // No receivers is fine: nobody is watching yet.
        self.notify.send_replace(self.revision);
    }
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ContentStore for MemoryStore<R> {
    type Record = R;

    fn get(&self, item: &ItemRef) -> Option<&R> {
        self.records.get(item)
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn store_id(&self) -> u64 {
        self.id
    }
}

impl<R> FromIterator<(ItemRef, R)> for MemoryStore<R> {
    fn from_iter<I: IntoIterator<Item = (ItemRef, R)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_bumps_revision() {
        let mut store = MemoryStore::new();
        assert_eq!(store.revision(), 0);
        store.insert(ItemRef::new("a/1"), 1);
        store.insert(ItemRef::new("a/2"), 2);
        assert_eq!(store.revision(), 2);
        assert_eq!(store.get(&ItemRef::new("a/2")), Some(&2));
    }

    #[test]
    fn extend_is_one_revision() {
        let mut store = MemoryStore::new();
        store.extend([(ItemRef::new("a/1"), 1), (ItemRef::new("a/2"), 2)]);
        assert_eq!(store.revision(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn extend_with_nothing_keeps_revision() {
        let mut store: MemoryStore<i32> = MemoryStore::new();
        store.extend(std::iter::empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn removing_absent_item_keeps_revision() {
        let mut store: MemoryStore<i32> = MemoryStore::new();
        assert_eq!(store.remove(&ItemRef::new("a/1")), None);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn hash_map_store_has_no_revision() {
        let mut map = HashMap::new();
        map.insert(ItemRef::new("a/1"), "x");
        assert_eq!(ContentStore::get(&map, &ItemRef::new("a/1")), Some(&"x"));
        assert_eq!(map.revision(), 0);
    }

    #[test]
    fn each_store_has_its_own_id() {
        let a: MemoryStore<i32> = MemoryStore::new();
        let b: MemoryStore<i32> = MemoryStore::new();
        assert_ne!(a.store_id(), b.store_id());
        assert_ne!(a.store_id(), 0);
    }

    #[tokio::test]
    async fn subscribers_observe_revisions() {
        let mut store = MemoryStore::new();
        let mut rx = store.subscribe();

        store.insert(ItemRef::new("a/1"), "one");
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);

        store.remove(&ItemRef::new("a/1"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 2);
    }
}
