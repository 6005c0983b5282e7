//! Item references, source identifiers and viewer mute sets.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Separator between the source and the slug of an [`ItemRef`].
pub const SEPARATOR: char = '/';

/// Identifier of one content item, composed as `<source>/<slug>`.
///
/// References are opaque strings as far as the store is concerned; the only
/// structure the feed relies on is the source prefix used for muting. A
/// reference without a separator is treated as consisting of its source
/// alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemRef(String);

impl ItemRef {
    /// Wrap a raw reference string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a reference from its two components.
    pub fn from_parts(source: &str, slug: &str) -> Self {
        Self(format!("{source}{SEPARATOR}{slug}"))
    }

    /// The source segment: everything before the first separator.
    pub fn source(&self) -> SourceId<'_> {
        let source = self.0.split(SEPARATOR).next().unwrap_or_default();
        SourceId(source)
    }

    /// The slug segment, if the reference has one.
    pub fn slug(&self) -> Option<&str> {
        self.0.split_once(SEPARATOR).map(|(_, slug)| slug)
    }

    /// The raw reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemRef {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ItemRef {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// The account or source portion of an [`ItemRef`], borrowed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId<'a>(&'a str);

impl<'a> SourceId<'a> {
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

impl fmt::Display for SourceId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Sources the current viewer has muted.
///
/// Supplied by the surrounding application and only ever read by the feed.
/// An empty set mutes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuteSet {
    sources: HashSet<String>,
}

impl MuteSet {
    /// An empty mute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mute one more source.
    pub fn insert(&mut self, source: impl Into<String>) -> bool {
        self.sources.insert(source.into())
    }

    /// Whether the given source is muted.
    pub fn contains(&self, source: SourceId<'_>) -> bool {
        self.sources.contains(source.as_str())
    }

    /// Whether the source of `item` is muted.
    pub fn mutes(&self, item: &ItemRef) -> bool {
        self.contains(item.source())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Order-independent fingerprint of the set, used to detect changes
    /// between projections without keeping a copy around.
    pub fn fingerprint(&self) -> u64 {
        self.sources
            .iter()
            .map(|source| {
                let mut hasher = std::hash::DefaultHasher::new();
                source.hash(&mut hasher);
                hasher.finish()
            })
            .fold(self.sources.len() as u64, |acc, h| acc ^ h.rotate_left(7))
    }
}

impl<S: Into<String>> FromIterator<S> for MuteSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_prefix_before_separator() {
        let r = ItemRef::new("alice/hello-world");
        assert_eq!(r.source().as_str(), "alice");
        assert_eq!(r.slug(), Some("hello-world"));
    }

    #[test]
    fn source_uses_first_separator_only() {
        let r = ItemRef::new("bob/nested/slug");
        assert_eq!(r.source().as_str(), "bob");
        assert_eq!(r.slug(), Some("nested/slug"));
    }

    #[test]
    fn reference_without_separator_is_all_source() {
        let r = ItemRef::new("carol");
        assert_eq!(r.source().as_str(), "carol");
        assert_eq!(r.slug(), None);
    }

    #[test]
    fn from_parts_round_trips_components() {
        let r = ItemRef::from_parts("dave", "post-1");
        assert_eq!(r.as_str(), "dave/post-1");
        assert_eq!(r.to_string(), "dave/post-1");
    }

    #[test]
    fn mute_set_matches_source_not_slug() {
        let mutes: MuteSet = ["carol"].into_iter().collect();
        assert!(mutes.mutes(&ItemRef::new("carol/y")));
        assert!(!mutes.mutes(&ItemRef::new("alice/carol")));
    }

    #[test]
    fn empty_mute_set_mutes_nothing() {
        let mutes = MuteSet::new();
        assert!(mutes.is_empty());
        assert!(!mutes.mutes(&ItemRef::new("alice/x")));
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let a: MuteSet = ["x", "y", "z"].into_iter().collect();
        let b: MuteSet = ["z", "x", "y"].into_iter().collect();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c: MuteSet = ["x", "y"].into_iter().collect();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
