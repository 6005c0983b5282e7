//! Derives the renderable item list from the shared store.

use crate::reference::{ItemRef, MuteSet};
use crate::store::ContentStore;

/// Where the feed gets its items from.
///
/// Most feeds list references and resolve them against the store. Callers
/// that already hold records (search results, a pinned list) hand them over
/// directly and skip the store entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource<R> {
    /// Ordered references resolved through the store and the mute set.
    References(Vec<ItemRef>),
    /// Records used verbatim, in the given order.
    Materialized(Vec<R>),
}

impl<R> FeedSource<R> {
    /// Number of entries in the source before any filtering.
    pub fn len(&self) -> usize {
        match self {
            FeedSource::References(refs) => refs.len(),
            FeedSource::Materialized(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of [`select_visible`]: the records to render plus the references
/// whose content was missing from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'s, R> {
    pub records: Vec<&'s R>,
    /// Index into the input references of each entry in `records`.
    pub positions: Vec<usize>,
    pub missing: Vec<ItemRef>,
}

/// Resolve `refs` against `store`, dropping missing and muted items.
///
/// Order follows `refs` exactly. A missing record produces one error-level
/// diagnostic and is skipped; muted items are skipped silently.
pub fn select_visible<'s, S>(
    refs: &[ItemRef],
    store: &'s S,
    mutes: &MuteSet,
) -> Selection<'s, S::Record>
where
    S: ContentStore,
{
    let mut records = Vec::with_capacity(refs.len());
    let mut positions = Vec::with_capacity(refs.len());
    let mut missing = Vec::new();

    for (position, item) in refs.iter().enumerate() {
        let Some(record) = store.get(item) else {
            // Happens when a post is deleted while still listed.
            tracing::error!(item_ref = %item, "feed item missing from content store");
            missing.push(item.clone());
            continue;
        };
        if mutes.mutes(item) {
            continue;
        }
        records.push(record);
        positions.push(position);
    }

    Selection {
        records,
        positions,
        missing,
    }
}

/// Produce the visible records for `source`.
///
/// Materialized sources bypass both the store and the mute set.
pub fn resolve<'s, S>(
    source: &'s FeedSource<S::Record>,
    store: &'s S,
    mutes: &MuteSet,
) -> Vec<&'s S::Record>
where
    S: ContentStore,
{
    match source {
        FeedSource::References(refs) => select_visible(refs, store, mutes).records,
        FeedSource::Materialized(records) => records.iter().collect(),
    }
}
