//! Turns the visible records into the ordered rendering sequence.
//!
//! Composition is a pure function of its inputs: the same records and
//! props always yield the same entries with the same keys.

use crate::ads::{AdKind, AdPlacement};
use crate::layout::{LayoutMode, ThumbSize};
use serde::Deserialize;
use std::fmt;

/// How the viewer wants mature content presented. Passed through to the
/// summary renderer untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NsfwPref {
    Hide,
    #[default]
    Warn,
    Show,
}

/// Stable key of a rendered entry. Item and ad keys never collide even when
/// they share an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKey {
    Item(usize),
    Ad(usize),
    Loading,
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Item(i) => write!(f, "item-{i}"),
            EntryKey::Ad(i) => write!(f, "ad-{i}"),
            EntryKey::Loading => f.write_str("loading"),
        }
    }
}

/// Display settings handed to the summary renderer with every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions<'a> {
    pub thumb_size: ThumbSize,
    pub nsfw_pref: NsfwPref,
    pub hide_category: bool,
    pub order: Option<&'a str>,
    /// Whether collapsed low-rated comments are expanded.
    pub show_negative_comments: bool,
}

/// One content summary.
#[derive(Debug, PartialEq)]
pub struct SummaryEntry<'a, R> {
    /// Position within the visible list.
    pub index: usize,
    pub record: &'a R,
    pub options: SummaryOptions<'a>,
}

/// An advertisement placeholder following the item at `after_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdEntry<'a> {
    pub after_index: usize,
    /// Category the surrounding list shows; the ad's only targeting tag.
    pub category: Option<&'a str>,
    pub kind: AdKind,
    pub zone_id: &'a str,
}

/// One element of the rendering sequence.
#[derive(Debug, PartialEq)]
pub enum Entry<'a, R> {
    Summary(SummaryEntry<'a, R>),
    Ad(AdEntry<'a>),
    Loading,
}

impl<R> Entry<'_, R> {
    pub fn key(&self) -> EntryKey {
        match self {
            Entry::Summary(summary) => EntryKey::Item(summary.index),
            Entry::Ad(ad) => EntryKey::Ad(ad.after_index),
            Entry::Loading => EntryKey::Loading,
        }
    }

    pub fn is_ad(&self) -> bool {
        matches!(self, Entry::Ad(_))
    }
}

/// Inputs to [`compose`] besides the records themselves.
#[derive(Debug, Clone, Copy)]
pub struct ListProps<'a> {
    pub category: Option<&'a str>,
    pub order: Option<&'a str>,
    pub hide_category: bool,
    pub nsfw_pref: NsfwPref,
    pub show_negative_comments: bool,
    /// A page fetch is outstanding.
    pub loading: bool,
    pub ads: &'a AdPlacement,
}

/// Build the rendering sequence for `items`.
///
/// Each item yields one summary, followed by an ad placeholder when the
/// placement's cadence selects its index. A trailing loading entry is
/// appended while `props.loading` is set.
pub fn compose<'a, R>(items: &[&'a R], layout: LayoutMode, props: &ListProps<'a>) -> Vec<Entry<'a, R>> {
    let options = SummaryOptions {
        thumb_size: layout.thumb_size(),
        nsfw_pref: props.nsfw_pref,
        hide_category: props.hide_category,
        order: props.order,
        show_negative_comments: props.show_negative_comments,
    };

    let mut entries = Vec::with_capacity(items.len() + usize::from(props.loading));
    for (index, record) in items.iter().enumerate() {
        entries.push(Entry::Summary(SummaryEntry {
            index,
            record: *record,
            options,
        }));
        if props.ads.after(index) {
            entries.push(Entry::Ad(AdEntry {
                after_index: index,
                category: props.category,
                kind: props.ads.kind,
                zone_id: &props.ads.zone_id,
            }));
        }
    }
    if props.loading {
        entries.push(Entry::Loading);
    }
    entries
}
