//! Advertisement slot cadence.
//!
//! The feed never chooses or bills ads. It only decides *where* an ad
//! placeholder goes: after every `cadence`-th item, never after the first.

use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// Slot the feed draws its in-list placement from.
pub const IN_FEED_SLOT: &str = "in_feed_1";

/// Whether an ad placeholder follows the item at `index`.
///
/// True iff ads are enabled, `index >= cadence` and `index` is a multiple of
/// `cadence`. Index 0 never gets an ad.
pub fn should_insert_ad(index: usize, cadence: NonZeroUsize, enabled: bool) -> bool {
    let every = cadence.get();
    enabled && index >= every && index % every == 0
}

/// Placement kind forwarded to the ad widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdKind {
    #[default]
    Freestar,
}

/// Ads configuration for one placement in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdPlacement {
    /// Master switch for this viewer.
    pub enabled: bool,
    /// Interval, in items, between placeholders.
    pub cadence: NonZeroUsize,
    pub kind: AdKind,
    /// Zone identifier handed to the ad widget.
    pub zone_id: String,
}

impl AdPlacement {
    /// A placement that never inserts anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Whether the item at `index` is followed by this placement's ad.
    pub fn after(&self, index: usize) -> bool {
        should_insert_ad(index, self.cadence, self.enabled)
    }
}

impl Default for AdPlacement {
    fn default() -> Self {
        Self {
            enabled: false,
            cadence: NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN),
            kind: AdKind::default(),
            zone_id: DEFAULT_ZONE_ID.to_string(),
        }
    }
}

/// Zone used when the slot configuration does not name one.
pub const DEFAULT_ZONE_ID: &str = "bsa-zone_1566495089502-1_123456";

/// One named ad slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdSlot {
    pub every: NonZeroUsize,
    pub kind: AdKind,
    pub zone_id: Option<String>,
}

impl AdSlot {
    pub fn every(every: NonZeroUsize) -> Self {
        Self {
            every,
            kind: AdKind::default(),
            zone_id: None,
        }
    }
}

/// Ads settings for the current viewer: a master switch plus named slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdsSettings {
    pub enabled: bool,
    pub slots: HashMap<String, AdSlot>,
}

impl AdsSettings {
    /// Resolve the placement for slot `name`.
    ///
    /// An unknown slot yields a disabled placement.
    pub fn placement(&self, name: &str) -> AdPlacement {
        let Some(slot) = self.slots.get(name) else {
            if self.enabled {
                tracing::warn!(slot = name, "ads enabled but slot is not configured");
            }
            return AdPlacement::disabled();
        };
        AdPlacement {
            enabled: self.enabled,
            cadence: slot.every,
            kind: slot.kind,
            zone_id: slot
                .zone_id
                .clone()
                .unwrap_or_else(|| DEFAULT_ZONE_ID.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn first_item_never_gets_an_ad() {
        for cadence in 1..10 {
            assert!(!should_insert_ad(0, nz(cadence), true));
        }
    }

    #[test]
    fn cadence_two_places_after_even_positions() {
        let hits: Vec<usize> = (0..5).filter(|&i| should_insert_ad(i, nz(2), true)).collect();
        assert_eq!(hits, vec![2, 4]);
    }

    #[test]
    fn cadence_one_places_after_every_item_but_first() {
        let hits: Vec<usize> = (0..4).filter(|&i| should_insert_ad(i, nz(1), true)).collect();
        assert_eq!(hits, vec![1, 2, 3]);
    }

    #[test]
    fn disabled_placement_never_inserts() {
        let placement = AdPlacement {
            cadence: nz(1),
            ..AdPlacement::disabled()
        };
        assert!((0..100).all(|i| !placement.after(i)));
    }

    #[test]
    fn default_placement_is_off() {
        let placement = AdPlacement::default();
        assert!(!placement.enabled);
        assert_eq!(placement.cadence.get(), 5);
        assert_eq!(placement.kind, AdKind::Freestar);
    }

    #[test]
    fn settings_resolve_named_slot() {
        let mut settings = AdsSettings {
            enabled: true,
            ..AdsSettings::default()
        };
        settings.slots.insert(
            IN_FEED_SLOT.to_string(),
            AdSlot {
                every: nz(4),
                kind: AdKind::Freestar,
                zone_id: Some("zone-7".to_string()),
            },
        );

        let placement = settings.placement(IN_FEED_SLOT);

        assert!(placement.enabled);
        assert_eq!(placement.cadence.get(), 4);
        assert_eq!(placement.zone_id, "zone-7");
        assert!(placement.after(8));
    }

    #[test]
    fn unknown_slot_is_disabled() {
        let settings = AdsSettings {
            enabled: true,
            ..AdsSettings::default()
        };
        assert!(!settings.placement("sidebar").enabled);
    }

    #[test]
    fn switched_off_settings_disable_configured_slot() {
        let mut settings = AdsSettings::default();
        settings
            .slots
            .insert(IN_FEED_SLOT.to_string(), AdSlot::every(nz(2)));
        let placement = settings.placement(IN_FEED_SLOT);
        assert!(!placement.enabled);
        assert_eq!(placement.zone_id, DEFAULT_ZONE_ID);
    }

    proptest! {
        #[test]
        fn matches_cadence_rule(index in 0usize..10_000, cadence in 1usize..50) {
            let expected = index >= cadence && index % cadence == 0;
            prop_assert_eq!(should_insert_ad(index, nz(cadence), true), expected);
            prop_assert!(!should_insert_ad(index, nz(cadence), false));
        }
    }
}
