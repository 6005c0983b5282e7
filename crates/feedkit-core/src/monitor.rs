//! Watches viewport geometry to decide when the feed is near its bottom and
//! which layout mode applies.
//!
//! # Lifecycle
//!
//! [`ViewportMonitor::mount`] registers passive scroll and resize listeners
//! on an [`EventTarget`] and schedules an initial evaluation, so a list that
//! is already fully visible asks for its continuation straight away. Every
//! event reschedules the same debounced evaluation. [`ViewportMonitor::unmount`]
//! takes the [`MountHandle`] back, removes exactly the listeners it
//! describes and cancels any evaluation still pending.
//!
//! # Evaluation
//!
//! When the debounce window has passed, the host calls
//! [`poll`](ViewportMonitor::poll) with the current [`Viewport`]. The
//! evaluation locates the list root, sums its offset up the layout tree and
//! compares the remaining distance to its bottom edge against the trigger
//! threshold. Independently it re-evaluates the breakpoint and updates the
//! [`LayoutMode`].

use crate::debounce::{Clock, Debouncer};
use crate::events::{EventKind, EventTarget, ListenerId, ListenerOptions};
use crate::layout::{document_offset_top, Breakpoint, LayoutMode, LayoutNode, DEFAULT_ROOT_FONT_PX};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Quiescence window between the last viewport event and an evaluation.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Distance from the list bottom, in pixels, that triggers loading more.
pub const DEFAULT_TRIGGER_THRESHOLD_PX: f64 = 10.0;

/// Identifier of the list root element.
pub const DEFAULT_ROOT_ID: &str = "posts_list";

/// Live viewport geometry as seen by the monitor.
pub trait Viewport {
    /// Node type of the underlying layout tree.
    type Node<'a>: LayoutNode
    where
        Self: 'a;

    /// Find an element by identifier. `None` while the list is not mounted.
    fn element_by_id(&self, id: &str) -> Option<Self::Node<'_>>;

    /// Current vertical scroll position of the document.
    fn scroll_top(&self) -> f64;

    /// Height of the visible area.
    fn inner_height(&self) -> f64;

    /// Width of the visible area.
    fn inner_width(&self) -> f64;
}

/// Tunables for [`ViewportMonitor`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub debounce: Duration,
    pub trigger_threshold_px: f64,
    pub breakpoint: Breakpoint,
    /// Font size the breakpoint's `em` resolves against.
    pub root_font_px: f64,
    pub root_id: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            trigger_threshold_px: DEFAULT_TRIGGER_THRESHOLD_PX,
            breakpoint: Breakpoint::default(),
            root_font_px: DEFAULT_ROOT_FONT_PX,
            root_id: DEFAULT_ROOT_ID.to_string(),
        }
    }
}

/// Result of one evaluation against live geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Pixels between the viewport bottom and the list bottom.
    pub remaining_px: f64,
    /// Whether `remaining_px` is under the trigger threshold.
    pub near_bottom: bool,
    pub layout_mode: LayoutMode,
}

/// Listener registrations made by one [`ViewportMonitor::mount`].
///
/// Hand it back to [`ViewportMonitor::unmount`]; dropping it leaves the
/// listeners attached.
#[must_use = "listeners stay attached until the handle is passed to unmount"]
#[derive(Debug, PartialEq, Eq)]
pub struct MountHandle {
    registrations: Vec<(EventKind, ListenerId)>,
}

impl MountHandle {
    /// The registrations this handle owns.
    pub fn registrations(&self) -> &[(EventKind, ListenerId)] {
        &self.registrations
    }
}

/// Debounced viewport observer for one feed instance.
pub struct ViewportMonitor {
    config: MonitorConfig,
    clock: Rc<dyn Clock>,
    debouncer: Rc<RefCell<Debouncer>>,
    layout_mode: LayoutMode,
}

impl ViewportMonitor {
    pub fn new(config: MonitorConfig, clock: Rc<dyn Clock>) -> Self {
        let debouncer = Rc::new(RefCell::new(Debouncer::new(config.debounce)));
        Self {
            config,
            clock,
            debouncer,
            layout_mode: LayoutMode::default(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Layout mode from the most recent evaluation.
    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    /// When the pending evaluation becomes due, if one is scheduled.
    pub fn deadline(&self) -> Option<std::time::Instant> {
        self.debouncer.borrow().deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.borrow().is_pending()
    }

    /// Note that the viewport scrolled or resized.
    ///
    /// Schedules an evaluation one debounce window from now, replacing any
    /// evaluation that was still waiting.
    pub fn on_viewport_change(&self) {
        self.debouncer.borrow_mut().schedule(self.clock.now());
    }

    /// Attach scroll and resize listeners and schedule the initial
    /// evaluation.
    pub fn mount(&self, target: &dyn EventTarget) -> MountHandle {
        let registrations = [EventKind::Scroll, EventKind::Resize]
            .into_iter()
            .map(|kind| {
                let id = target.add_listener(kind, ListenerOptions::PASSIVE, self.listener());
                (kind, id)
            })
            .collect();
        self.on_viewport_change();
        tracing::debug!(root_id = %self.config.root_id, "viewport monitor mounted");
        MountHandle { registrations }
    }

    /// Remove the listeners described by `handle` and cancel any pending
    /// evaluation. Returns how many registrations were removed.
    pub fn unmount(&self, handle: MountHandle, target: &dyn EventTarget) -> usize {
        let removed = handle
            .registrations
            .iter()
            .filter(|(kind, id)| target.remove_listener(*kind, *id))
            .count();
        self.debouncer.borrow_mut().cancel();
        tracing::debug!(removed, "viewport monitor unmounted");
        removed
    }

    /// Run the pending evaluation if its window has passed.
    ///
    /// Returns `None` when nothing was due or when the list root is absent.
    pub fn poll<V: Viewport>(&mut self, viewport: &V) -> Option<Evaluation> {
        let now = self.clock.now();
        self.debouncer.borrow_mut().poll(now)?;
        tracing::trace!("debounced viewport evaluation fired");
        self.evaluate(viewport)
    }

    /// Evaluate immediately, bypassing the debouncer.
    ///
    /// A missing list root makes this a no-op that leaves the layout mode
    /// untouched.
    pub fn evaluate<V: Viewport>(&mut self, viewport: &V) -> Option<Evaluation> {
        let root = viewport.element_by_id(&self.config.root_id)?;

        let bottom = document_offset_top(&root) + root.offset_height();
        let remaining_px = bottom - viewport.scroll_top() - viewport.inner_height();
        let near_bottom = remaining_px < self.config.trigger_threshold_px;

        let layout_mode = self
            .config
            .breakpoint
            .mode_for(viewport.inner_width(), self.config.root_font_px);
        if layout_mode != self.layout_mode {
            tracing::debug!(from = ?self.layout_mode, to = ?layout_mode, "layout mode changed");
            self.layout_mode = layout_mode;
        }

        Some(Evaluation {
            remaining_px,
            near_bottom,
            layout_mode,
        })
    }

    fn listener(&self) -> crate::events::Listener {
        let debouncer: Weak<RefCell<Debouncer>> = Rc::downgrade(&self.debouncer);
        let clock = self.clock.clone();
        Rc::new(move |_kind| {
            if let Some(debouncer) = debouncer.upgrade() {
                debouncer.borrow_mut().schedule(clock.now());
            }
        })
    }
}

impl std::fmt::Debug for ViewportMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportMonitor")
            .field("config", &self.config)
            .field("layout_mode", &self.layout_mode)
            .field("pending", &self.is_pending())
            .finish()
    }
}
