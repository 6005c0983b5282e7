//! One mounted feed list.
//!
//! [`FeedList`] owns the list's props and its [`ViewportMonitor`], keeps a
//! cached projection of which items are visible, and turns debounced
//! viewport evaluations into page requests.
//!
//! # Projection
//!
//! The visible list depends on the store contents, the viewer's mute set
//! and the list's own references. [`FeedList::refresh`] computes a
//! [`ProjectionKey`] from the three and only re-runs selection when the key
//! changed, so re-rendering an unchanged list costs nothing and logs
//! nothing. Stores that report revision `0` cannot be tracked and are
//! re-projected on every refresh.
//!
//! # Pagination
//!
//! The next page is anchored on the last *listed* reference, muted or
//! missing or not, so the cursor handed to the fetcher always matches the
//! server-side listing. Lists built from pre-materialised records do not
//! paginate.

use crate::compose::{compose, Entry, ListProps, NsfwPref};
use crate::events::EventTarget;
use crate::layout::LayoutMode;
use crate::monitor::{Evaluation, MountHandle, Viewport, ViewportMonitor};
use crate::pagination::{maybe_load_more, LoadMore, PageRequest};
use crate::reference::{ItemRef, MuteSet};
use crate::select::{select_visible, FeedSource};
use crate::state::{FeedState, ViewerSettings};
use crate::store::ContentStore;
use std::fmt;

/// Caller-supplied inputs of a feed list.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedProps<R> {
    pub source: FeedSource<R>,
    /// Category being listed; becomes the ad targeting tag.
    pub category: Option<String>,
    /// Listing order, e.g. `trending`.
    pub order: Option<String>,
    pub hide_category: bool,
    /// A page fetch is outstanding.
    pub loading: bool,
}

impl<R> FeedProps<R> {
    pub fn new(source: FeedSource<R>) -> Self {
        Self {
            source,
            category: None,
            order: None,
            hide_category: false,
            loading: false,
        }
    }

    pub fn references(refs: impl IntoIterator<Item = ItemRef>) -> Self {
        Self::new(FeedSource::References(refs.into_iter().collect()))
    }

    pub fn materialized(records: Vec<R>) -> Self {
        Self::new(FeedSource::Materialized(records))
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }
}

/// Everything the visible list depends on, reduced to comparable numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionKey {
    pub store_id: u64,
    pub store_revision: u64,
    pub mutes: u64,
    pub source_revision: u64,
}

#[derive(Debug, Default)]
struct Projection {
    key: Option<ProjectionKey>,
    /// Source positions of the visible items, in order.
    positions: Vec<usize>,
    missing: usize,
}

/// A feed list instance.
pub struct FeedList<R> {
    props: FeedProps<R>,
    viewer: ViewerSettings,
    show_negative_comments: bool,
    monitor: ViewportMonitor,
    load_more: Option<Box<dyn LoadMore<ItemRef>>>,
    source_revision: u64,
    projection: Projection,
}

impl<R> FeedList<R> {
    pub fn new(props: FeedProps<R>, monitor: ViewportMonitor) -> Self {
        Self {
            props,
            viewer: ViewerSettings::default(),
            show_negative_comments: false,
            monitor,
            load_more: None,
            source_revision: 0,
            projection: Projection::default(),
        }
    }

    /// Give the list a way to fetch its next page.
    pub fn with_load_more(mut self, load_more: impl LoadMore<ItemRef> + 'static) -> Self {
        self.load_more = Some(Box::new(load_more));
        self
    }

    pub fn with_viewer(mut self, viewer: ViewerSettings) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn props(&self) -> &FeedProps<R> {
        &self.props
    }

    pub fn viewer(&self) -> &ViewerSettings {
        &self.viewer
    }

    pub fn monitor(&self) -> &ViewportMonitor {
        &self.monitor
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.monitor.layout_mode()
    }

    pub fn set_viewer(&mut self, viewer: ViewerSettings) {
        self.viewer = viewer;
    }

    pub fn set_nsfw_pref(&mut self, pref: NsfwPref) {
        self.viewer.nsfw_pref = pref;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.props.loading = loading;
    }

    pub fn show_negative_comments(&self) -> bool {
        self.show_negative_comments
    }

    pub fn set_show_negative_comments(&mut self, show: bool) {
        self.show_negative_comments = show;
    }

    /// Replace the list's source. Forces a re-projection.
    pub fn set_source(&mut self, source: FeedSource<R>) {
        self.props.source = source;
        self.source_revision += 1;
    }

    /// Append references for a newly fetched page.
    ///
    /// Returns `false`, changing nothing, when the list is materialised.
    pub fn append_references(&mut self, refs: impl IntoIterator<Item = ItemRef>) -> bool {
        let FeedSource::References(existing) = &mut self.props.source else {
            return false;
        };
        let before = existing.len();
        existing.extend(refs);
        if existing.len() != before {
            self.source_revision += 1;
        }
        true
    }

    /// The reference the next page would be anchored on.
    pub fn anchor(&self) -> Option<&ItemRef> {
        match &self.props.source {
            FeedSource::References(refs) => refs.last(),
            FeedSource::Materialized(_) => None,
        }
    }

    /// Number of listed references whose content was missing at the last
    /// projection.
    pub fn missing_count(&self) -> usize {
        self.projection.missing
    }

    /// Re-project the visible list if anything it depends on changed.
    ///
    /// Returns whether a new projection was computed.
    pub fn refresh<S>(&mut self, store: &S, mutes: &MuteSet) -> bool
    where
        S: ContentStore<Record = R>,
    {
        let key = ProjectionKey {
            store_id: store.store_id(),
            store_revision: store.revision(),
            mutes: mutes.fingerprint(),
            source_revision: self.source_revision,
        };
        if key.store_revision != 0 && self.projection.key == Some(key) {
            return false;
        }

        let (positions, missing) = match &self.props.source {
            FeedSource::References(refs) => {
                let selection = select_visible(refs, store, mutes);
                (selection.positions, selection.missing.len())
            }
            FeedSource::Materialized(records) => ((0..records.len()).collect(), 0),
        };
        tracing::trace!(
            visible = positions.len(),
            missing,
            listed = self.props.source.len(),
            "feed projection recomputed"
        );
        self.projection = Projection {
            key: Some(key),
            positions,
            missing,
        };
        true
    }

    /// Pull viewer settings and the mute set from `state`, then refresh.
    pub fn sync(&mut self, state: &FeedState<R>) -> bool {
        self.viewer = state.viewer_settings();
        self.refresh(&state.content, state.mutes())
    }

    /// Records of the last projection, in display order.
    ///
    /// `store` should be the store the list was last refreshed against.
    pub fn visible<'s, S>(&'s self, store: &'s S) -> Vec<&'s R>
    where
        S: ContentStore<Record = R>,
    {
        let positions = self.projection.positions.iter().copied();
        match &self.props.source {
            FeedSource::References(refs) => positions
                .filter_map(|i| refs.get(i))
                .filter_map(|item| store.get(item))
                .collect(),
            FeedSource::Materialized(records) => {
                positions.filter_map(|i| records.get(i)).collect()
            }
        }
    }

    /// The full rendering sequence: summaries, ad placeholders and the
    /// loading indicator.
    pub fn entries<'s, S>(&'s self, store: &'s S) -> Vec<Entry<'s, R>>
    where
        S: ContentStore<Record = R>,
    {
        let items = self.visible(store);
        let props = ListProps {
            category: self.props.category.as_deref(),
            order: self.props.order.as_deref(),
            hide_category: self.props.hide_category,
            nsfw_pref: self.viewer.nsfw_pref,
            show_negative_comments: self.show_negative_comments,
            loading: self.props.loading,
            ads: &self.viewer.ads,
        };
        compose(&items, self.monitor.layout_mode(), &props)
    }

    /// Attach the list's viewport listeners to `target`.
    pub fn mount(&self, target: &dyn EventTarget) -> MountHandle {
        self.monitor.mount(target)
    }

    /// Detach exactly the listeners in `handle` and drop any pending
    /// evaluation.
    pub fn unmount(&self, handle: MountHandle, target: &dyn EventTarget) -> usize {
        self.monitor.unmount(handle, target)
    }

    /// Run a due evaluation and request the next page if it says so.
    pub fn poll<V: Viewport>(&mut self, viewport: &V) -> Option<Evaluation> {
        let evaluation = self.monitor.poll(viewport)?;
        self.paginate(evaluation.near_bottom);
        Some(evaluation)
    }

    /// Evaluate now, bypassing the debounce window.
    pub fn evaluate_now<V: Viewport>(&mut self, viewport: &V) -> Option<Evaluation> {
        let evaluation = self.monitor.evaluate(viewport)?;
        self.paginate(evaluation.near_bottom);
        Some(evaluation)
    }

    /// Ask for the page after the last listed reference if `triggered`.
    pub fn paginate(&self, triggered: bool) -> PageRequest {
        let listed: Vec<&ItemRef> = match &self.props.source {
            FeedSource::References(refs) => refs.iter().collect(),
            FeedSource::Materialized(_) => Vec::new(),
        };
        let outcome = maybe_load_more(self.load_more.as_deref(), &listed, triggered);
        if outcome == PageRequest::Requested {
            if let Some(anchor) = listed.last() {
                tracing::debug!(anchor = %anchor, "requested next page");
            }
        }
        outcome
    }
}

impl<R> fmt::Debug for FeedList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedList")
            .field("listed", &self.props.source.len())
            .field("visible", &self.projection.positions.len())
            .field("loading", &self.props.loading)
            .field("paginates", &self.load_more.is_some())
            .field("monitor", &self.monitor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::AdPlacement;
    use crate::compose::EntryKey;
    use crate::debounce::ManualClock;
    use crate::events::{EventKind, WindowEvents};
    use crate::layout::ThumbSize;
    use crate::monitor::{MonitorConfig, DEFAULT_DEBOUNCE, DEFAULT_ROOT_ID};
    use crate::store::MemoryStore;
    use crate::testing::{FakeViewport, RecordingLoadMore};
    use std::collections::HashMap;
    use std::num::NonZeroUsize;
    use std::rc::Rc;

    fn refs(raw: &[&str]) -> Vec<ItemRef> {
        raw.iter().map(|r| ItemRef::new(*r)).collect()
    }

    fn store(raw: &[&str]) -> MemoryStore<String> {
        raw.iter()
            .map(|r| (ItemRef::new(*r), r.to_uppercase()))
            .collect()
    }

    fn feed(clock: &Rc<ManualClock>, raw: &[&str]) -> FeedList<String> {
        let monitor = ViewportMonitor::new(MonitorConfig::default(), clock.clone());
        FeedList::new(FeedProps::references(refs(raw)), monitor)
    }

    /// List bottom at 1100px in a 600px tall window.
    fn viewport(scroll_top: f64) -> FakeViewport {
        let mut vp = FakeViewport::with_list(DEFAULT_ROOT_ID, 100.0, 1000.0, 800.0, 600.0);
        vp.scroll_top = scroll_top;
        vp
    }

    #[test]
    fn near_bottom_requests_next_page_once_with_last_item() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let mut list = feed(&clock, &["a/1", "b/2", "c/3"]).with_load_more(recorder.clone());
        let window = WindowEvents::new();
        let handle = list.mount(&window);

        clock.advance(DEFAULT_DEBOUNCE);
        let evaluation = list.poll(&viewport(495.0)).unwrap();

        assert!(evaluation.near_bottom);
        assert_eq!(recorder.calls(), refs(&["c/3"]));
        let _ = list.unmount(handle, &window);
    }

    #[test]
    fn far_from_bottom_requests_nothing() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let mut list = feed(&clock, &["a/1", "b/2"]).with_load_more(recorder.clone());
        let window = WindowEvents::new();
        let handle = list.mount(&window);

        clock.advance(DEFAULT_DEBOUNCE);
        let evaluation = list.poll(&viewport(480.0)).unwrap();

        assert!(!evaluation.near_bottom);
        assert_eq!(recorder.call_count(), 0);
        let _ = list.unmount(handle, &window);
    }

    #[test]
    fn scroll_burst_requests_once() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let mut list = feed(&clock, &["a/1"]).with_load_more(recorder.clone());
        let window = WindowEvents::new();
        let handle = list.mount(&window);
        let vp = viewport(600.0);

        for _ in 0..5 {
            window.dispatch(EventKind::Scroll);
            clock.advance(std::time::Duration::from_millis(40));
            assert!(list.poll(&vp).is_none());
        }
        clock.advance(DEFAULT_DEBOUNCE);
        assert!(list.poll(&vp).is_some());

        assert_eq!(recorder.call_count(), 1);
        let _ = list.unmount(handle, &window);
    }

    #[test]
    fn short_list_asks_for_more_after_mounting() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let mut list = feed(&clock, &["a/1"]).with_load_more(recorder.clone());
        let window = WindowEvents::new();
        // The whole 200px list fits in the window.
        let vp = FakeViewport::with_list(DEFAULT_ROOT_ID, 0.0, 200.0, 800.0, 600.0);

        let handle = list.mount(&window);
        assert!(list.poll(&vp).is_none());
        clock.advance(DEFAULT_DEBOUNCE);
        list.poll(&vp);

        assert_eq!(recorder.calls(), refs(&["a/1"]));
        let _ = list.unmount(handle, &window);
    }

    #[test]
    fn without_capability_evaluation_still_updates_layout() {
        let clock = Rc::new(ManualClock::new());
        let mut list = feed(&clock, &["a/1"]);
        let mut vp = viewport(495.0);
        vp.inner_width = 320.0;

        let evaluation = list.evaluate_now(&vp).unwrap();

        assert!(evaluation.near_bottom);
        assert_eq!(list.layout_mode(), LayoutMode::Compact);
        assert_eq!(list.paginate(true), PageRequest::NoCapability);
    }

    #[test]
    fn empty_list_does_not_paginate() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let mut list = feed(&clock, &[]).with_load_more(recorder.clone());

        list.evaluate_now(&viewport(495.0));

        assert_eq!(recorder.call_count(), 0);
        assert_eq!(list.paginate(true), PageRequest::Empty);
    }

    #[test]
    fn materialized_list_does_not_paginate() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let monitor = ViewportMonitor::new(MonitorConfig::default(), clock.clone());
        let list = FeedList::new(FeedProps::materialized(vec!["X".to_string()]), monitor)
            .with_load_more(recorder.clone());

        assert_eq!(list.paginate(true), PageRequest::Empty);
        assert_eq!(list.anchor(), None);
    }

    #[test]
    fn anchor_is_last_listed_reference_even_when_muted() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let mut list = feed(&clock, &["a/1", "spam/2"]).with_load_more(recorder.clone());
        let content = store(&["a/1", "spam/2"]);
        let mutes: MuteSet = ["spam"].into_iter().collect();

        list.refresh(&content, &mutes);
        list.evaluate_now(&viewport(495.0));

        assert_eq!(list.visible(&content), vec!["A/1"]);
        assert_eq!(recorder.calls(), refs(&["spam/2"]));
    }

    #[test]
    fn unmounted_list_never_requests() {
        let clock = Rc::new(ManualClock::new());
        let recorder = RecordingLoadMore::<ItemRef>::new();
        let mut list = feed(&clock, &["a/1"]).with_load_more(recorder.clone());
        let window = WindowEvents::new();
        let handle = list.mount(&window);

        list.unmount(handle, &window);
        window.dispatch(EventKind::Scroll);
        clock.advance(DEFAULT_DEBOUNCE);

        assert!(list.poll(&viewport(495.0)).is_none());
        assert_eq!(recorder.call_count(), 0);
    }

    #[test]
    fn projection_reruns_only_when_inputs_change() {
        let clock = Rc::new(ManualClock::new());
        let mut list = feed(&clock, &["a/1", "b/2", "c/3"]);
        let mut content = store(&["a/1", "c/3"]);
        let mut mutes = MuteSet::new();

        assert!(list.refresh(&content, &mutes));
        assert!(!list.refresh(&content, &mutes));
        assert_eq!(list.missing_count(), 1);
        assert_eq!(list.visible(&content), vec!["A/1", "C/3"]);

        content.insert(ItemRef::new("b/2"), "B/2".to_string());
        assert!(list.refresh(&content, &mutes));
        assert_eq!(list.visible(&content), vec!["A/1", "B/2", "C/3"]);

        mutes.insert("b");
        assert!(list.refresh(&content, &mutes));
        assert_eq!(list.visible(&content), vec!["A/1", "C/3"]);

        assert!(list.append_references(refs(&["d/4"])));
        content.insert(ItemRef::new("d/4"), "D/4".to_string());
        assert!(list.refresh(&content, &mutes));
        assert_eq!(list.visible(&content), vec!["A/1", "C/3", "D/4"]);
        assert_eq!(list.anchor(), Some(&ItemRef::new("d/4")));
    }

    #[test]
    fn untracked_store_always_reprojects() {
        let clock = Rc::new(ManualClock::new());
        let mut list = feed(&clock, &["a/1"]);
        let mut content: HashMap<ItemRef, String> = HashMap::new();
        content.insert(ItemRef::new("a/1"), "A/1".to_string());

        assert!(list.refresh(&content, &MuteSet::new()));
        assert!(list.refresh(&content, &MuteSet::new()));
    }

    #[test]
    fn switching_stores_at_the_same_revision_reprojects() {
        let clock = Rc::new(ManualClock::new());
        let mut list = feed(&clock, &["a/1", "b/2"]);
        let first = store(&["a/1"]);
        let second = store(&["b/2"]);
        assert_eq!(first.revision(), second.revision());

        assert!(list.refresh(&first, &MuteSet::new()));
        assert!(list.refresh(&second, &MuteSet::new()));

        assert_eq!(list.visible(&second), vec!["B/2"]);
        assert_eq!(list.missing_count(), 1);
    }

    #[test]
    fn entries_interleave_ads_and_loading() {
        let clock = Rc::new(ManualClock::new());
        let mut list = feed(&clock, &["a/1", "b/2", "c/3", "d/4", "e/5"]).with_viewer(ViewerSettings {
            nsfw_pref: NsfwPref::Warn,
            ads: AdPlacement {
                enabled: true,
                cadence: NonZeroUsize::new(2).unwrap(),
                ..AdPlacement::default()
            },
        });
        let content = store(&["a/1", "b/2", "c/3", "d/4", "e/5"]);
        list.refresh(&content, &MuteSet::new());
        list.set_loading(true);

        let keys: Vec<String> = list.entries(&content).iter().map(|e| e.key().to_string()).collect();

        assert_eq!(
            keys,
            ["item-0", "item-1", "item-2", "ad-2", "item-3", "item-4", "ad-4", "loading"]
        );
    }

    #[test]
    fn entries_follow_layout_mode() {
        let clock = Rc::new(ManualClock::new());
        let mut list = feed(&clock, &["a/1"]);
        let content = store(&["a/1"]);
        list.refresh(&content, &MuteSet::new());
        let mut vp = viewport(0.0);
        vp.inner_width = 600.0;
        list.evaluate_now(&vp);

        let entries = list.entries(&content);

        let Some(Entry::Summary(summary)) = entries.first() else {
            panic!("expected a summary: {entries:?}");
        };
        assert_eq!(summary.options.thumb_size, ThumbSize::Mobile);
        assert_eq!(entries[0].key(), EntryKey::Item(0));
    }

    #[test]
    fn sync_reads_viewer_mutes_and_settings() {
        let clock = Rc::new(ManualClock::new());
        let mut list = feed(&clock, &["a/1", "b/2"]);
        let mut state: FeedState<String> = FeedState::new();
        state.content = store(&["a/1", "b/2"]);
        state.current_user = Some("me".to_string());
        state.follow.insert("me".to_string(), ["b"].into_iter().collect());
        state.preferences.nsfw_pref = Some(NsfwPref::Hide);

        assert!(list.sync(&state));

        assert_eq!(list.visible(&state.content), vec!["A/1"]);
        assert_eq!(list.viewer().nsfw_pref, NsfwPref::Hide);
        assert!(!list.sync(&state));
    }
}
