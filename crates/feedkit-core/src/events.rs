//! Window-level event registration.
//!
//! The viewport monitor never touches a global event source directly. It is
//! handed an [`EventTarget`] and gets back a [`ListenerId`] per registration,
//! which is the only thing that can remove that registration again. Several
//! feeds can share one target without ever detaching each other's
//! listeners.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Viewport events the feed reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
}

/// Registration options, mirroring DOM `addEventListener` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of bubbling.
    pub capture: bool,
    /// The listener promises never to block the default action (scrolling).
    pub passive: bool,
}

impl ListenerOptions {
    /// Bubbling, passive: never delays native scrolling.
    pub const PASSIVE: ListenerOptions = ListenerOptions {
        capture: false,
        passive: true,
    };
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self::PASSIVE
    }
}

/// Identity of one listener registration on an [`EventTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A callback invoked with the kind of event that occurred.
pub type Listener = Rc<dyn Fn(EventKind)>;

/// Something viewport listeners can be attached to.
pub trait EventTarget {
    /// Register `listener` for `kind` and return its registration id.
    fn add_listener(&self, kind: EventKind, options: ListenerOptions, listener: Listener)
        -> ListenerId;

    /// Remove exactly the registration `id` for `kind`.
    ///
    /// Returns `false` if no such registration exists.
    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool;
}

struct Registration {
    id: ListenerId,
    kind: EventKind,
    options: ListenerOptions,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    issued: u64,
    registrations: Vec<Registration>,
}

/// A shared, in-process event target standing in for the window.
///
/// Cloning yields another handle to the same registry, so every feed
/// mounted on a clone sees the same events.
#[derive(Clone, Default)]
pub struct WindowEvents {
    registry: Rc<RefCell<Registry>>,
}

impl WindowEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `kind` to every listener registered for it.
    ///
    /// Listeners run in registration order and may add or remove
    /// registrations while being dispatched to. Returns the number of
    /// listeners invoked.
    pub fn dispatch(&self, kind: EventKind) -> usize {
        let listeners: Vec<Listener> = self
            .registry
            .borrow()
            .registrations
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.listener.clone())
            .collect();
        for listener in &listeners {
            listener(kind);
        }
        listeners.len()
    }

    /// Number of listeners currently registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .registrations
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    /// Options a registration was made with, if it is still present.
    pub fn options(&self, id: ListenerId) -> Option<ListenerOptions> {
        self.registry
            .borrow()
            .registrations
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.options)
    }
}

impl EventTarget for WindowEvents {
    fn add_listener(
        &self,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener,
    ) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        registry.issued += 1;
        let id = ListenerId(registry.issued);
        registry.registrations.push(Registration {
            id,
            kind,
            options,
            listener,
        });
        id
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.registrations.len();
        registry
            .registrations
            .retain(|r| !(r.id == id && r.kind == kind));
        registry.registrations.len() != before
    }
}

impl fmt::Debug for WindowEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("WindowEvents")
            .field("registrations", &registry.registrations.len())
            .finish()
    }
}
