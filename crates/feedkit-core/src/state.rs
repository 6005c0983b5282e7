//! Shared application state a feed is connected to.
//!
//! A [`FeedState`] is the slice of the app a list reads from: the content
//! store, who is looking, whom they have muted, and their display and ads
//! settings. [`FeedList::sync`](crate::feed::FeedList::sync) projects it
//! into the list.

use crate::ads::{AdPlacement, AdsSettings, IN_FEED_SLOT};
use crate::compose::NsfwPref;
use crate::config::ResolvedConfig;
use crate::reference::MuteSet;
use crate::store::MemoryStore;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Per-viewer preferences. Unset fields fall back to configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPreferences {
    pub nsfw_pref: Option<NsfwPref>,
}

/// Viewer-derived settings a list renders with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerSettings {
    pub nsfw_pref: NsfwPref,
    pub ads: AdPlacement,
}

/// Snapshot of the state a feed list reads.
#[derive(Debug)]
pub struct FeedState<R> {
    pub content: MemoryStore<R>,
    /// Mute lists keyed by the account that owns them.
    pub follow: HashMap<String, MuteSet>,
    /// The signed-in user.
    pub current_user: Option<String>,
    /// Account used when browsing without signing in.
    pub offchain_account: Option<String>,
    pub preferences: UserPreferences,
    /// Fallback when `preferences.nsfw_pref` is unset.
    pub default_nsfw_pref: NsfwPref,
    pub ads: AdsSettings,
}

impl<R> FeedState<R> {
    pub fn new() -> Self {
        Self {
            content: MemoryStore::new(),
            follow: HashMap::new(),
            current_user: None,
            offchain_account: None,
            preferences: UserPreferences::default(),
            default_nsfw_pref: NsfwPref::default(),
            ads: AdsSettings::default(),
        }
    }

    /// Empty state seeded with configured ads and display defaults.
    pub fn configured(config: &ResolvedConfig) -> Self {
        Self {
            default_nsfw_pref: config.nsfw_pref,
            ads: config.ads.clone(),
            ..Self::new()
        }
    }

    /// Account whose mute list applies: the signed-in user, else the
    /// off-chain account.
    pub fn viewer(&self) -> Option<&str> {
        self.current_user
            .as_deref()
            .or(self.offchain_account.as_deref())
    }

    /// The viewer's mute set; empty when the viewer or their list is
    /// unknown.
    pub fn mutes(&self) -> &MuteSet {
        static EMPTY: OnceLock<MuteSet> = OnceLock::new();
        self.viewer()
            .and_then(|account| self.follow.get(account))
            .unwrap_or_else(|| EMPTY.get_or_init(MuteSet::new))
    }

    pub fn nsfw_pref(&self) -> NsfwPref {
        self.preferences.nsfw_pref.unwrap_or(self.default_nsfw_pref)
    }

    /// Settings for the in-feed placement and the viewer's preferences.
    pub fn viewer_settings(&self) -> ViewerSettings {
        ViewerSettings {
            nsfw_pref: self.nsfw_pref(),
            ads: self.ads.placement(IN_FEED_SLOT),
        }
    }
}

impl<R> Default for FeedState<R> {
    fn default() -> Self {
        Self::new()
    }
}
