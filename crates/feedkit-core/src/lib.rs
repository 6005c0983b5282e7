//! Core logic for the **feedkit** infinite-scroll feed.
//!
//! `feedkit-core` knows nothing about terminals or browsers. It decides
//! which items a feed shows, where ad placeholders go, when the viewport is
//! close enough to the bottom to fetch the next page, and which layout mode
//! applies. Geometry, events and time are injected through traits, so the
//! same logic runs in a real host and in a plain `#[test]`.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FeedList`] | One mounted list: projection, monitor, pagination and composition |
//! | [`ViewportMonitor`] | Debounced near-bottom and breakpoint evaluation |
//! | [`ContentStore`] / [`MemoryStore`] | Keyed record lookup, with revision notifications |
//! | [`MuteSet`] | Sources hidden from the current viewer |
//! | [`LoadMore`] | Capability to request the page after an anchor |
//! | [`AdPlacement`] | Cadence and zone of in-feed ad placeholders |
//! | [`FeedState`] | Shared state a list projects from |
//! | [`ResolvedConfig`] | Defaults, config file, environment and overrides merged |
//! | [`testing`] | Fake viewport, manual clock and recording load-more for tests |
//!
//! # Cycle
//!
//! 1. **mount** -- [`FeedList::mount`] attaches passive scroll and resize
//!    listeners to an [`EventTarget`] and schedules an initial evaluation.
//! 2. **event** -- Each viewport event pushes the pending evaluation one
//!    debounce window into the future.
//! 3. **poll** -- Once the window passes, [`FeedList::poll`] measures the
//!    list against the viewport, updates the [`LayoutMode`] and, near the
//!    bottom, calls [`LoadMore`] with the last listed reference.
//! 4. **refresh** -- When the store or mute set changes,
//!    [`FeedList::refresh`] re-projects the visible items and
//!    [`FeedList::entries`] yields the keyed rendering sequence.
//! 5. **unmount** -- [`FeedList::unmount`] removes exactly the listeners
//!    from step 1 and cancels any pending evaluation.
//!
//! # Quick example
//!
//! ```
//! use std::rc::Rc;
//! use feedkit_core::debounce::ManualClock;
//! use feedkit_core::testing::{FakeViewport, RecordingLoadMore};
//! use feedkit_core::{
//!     FeedList, FeedProps, ItemRef, MemoryStore, MonitorConfig, MuteSet, ViewportMonitor,
//!     WindowEvents, DEFAULT_DEBOUNCE,
//! };
//!
//! let clock = Rc::new(ManualClock::new());
//! let recorder: RecordingLoadMore<ItemRef> = RecordingLoadMore::new();
//! let monitor = ViewportMonitor::new(MonitorConfig::default(), clock.clone());
//! let mut list = FeedList::new(FeedProps::references([ItemRef::new("alice/hello")]), monitor)
//!     .with_load_more(recorder.clone());
//!
//! let store: MemoryStore<String> = [(ItemRef::new("alice/hello"), "Hello".to_string())]
//!     .into_iter()
//!     .collect();
//! list.refresh(&store, &MuteSet::new());
//!
//! let window = WindowEvents::new();
//! let handle = list.mount(&window);
//! clock.advance(DEFAULT_DEBOUNCE);
//! list.poll(&FakeViewport::with_list("posts_list", 0.0, 300.0, 800.0, 600.0));
//!
//! assert_eq!(recorder.calls(), vec![ItemRef::new("alice/hello")]);
//! assert_eq!(list.entries(&store).len(), 1);
//! list.unmount(handle, &window);
//! ```

pub mod ads;
pub mod compose;
pub mod config;
pub mod debounce;
pub mod events;
pub mod feed;
pub mod layout;
pub mod monitor;
pub mod pagination;
pub mod reference;
pub mod select;
pub mod state;
pub mod store;
pub mod testing;

pub use ads::{should_insert_ad, AdKind, AdPlacement, AdSlot, AdsSettings, IN_FEED_SLOT};
pub use compose::{compose, AdEntry, Entry, EntryKey, ListProps, NsfwPref, SummaryEntry, SummaryOptions};
pub use config::{load_config, ConfigError, ConfigOverrides, ResolvedConfig};
pub use debounce::{Clock, Debouncer, SystemClock};
pub use events::{EventKind, EventTarget, ListenerId, ListenerOptions, WindowEvents};
pub use feed::{FeedList, FeedProps, ProjectionKey};
pub use layout::{document_offset_top, Breakpoint, LayoutMode, LayoutNode, ThumbSize};
pub use monitor::{
    Evaluation, MonitorConfig, MountHandle, Viewport, ViewportMonitor, DEFAULT_DEBOUNCE,
    DEFAULT_ROOT_ID, DEFAULT_TRIGGER_THRESHOLD_PX,
};
pub use pagination::{maybe_load_more, LoadMore, PageRequest};
pub use reference::{ItemRef, MuteSet, SourceId};
pub use select::{resolve, select_visible, FeedSource, Selection};
pub use state::{FeedState, UserPreferences, ViewerSettings};
pub use store::{ContentStore, MemoryStore};
