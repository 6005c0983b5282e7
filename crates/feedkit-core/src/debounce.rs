//! Schedule-with-replace debouncing driven by an injectable clock.
//!
//! The debouncer holds at most one pending task. Scheduling while a task is
//! pending discards it and starts a fresh quiescence window, so a burst of
//! requests collapses into a single run after the burst ends. Nothing here
//! sleeps: hosts ask for the [`deadline`](Debouncer::deadline) and call
//! [`poll`](Debouncer::poll) once it has passed.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A virtual clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Identity of one scheduled run; a newer ticket supersedes older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Collapses bursts of requests into one run per quiescence window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<(Ticket, Instant)>,
    issued: u64,
}

impl Debouncer {
    /// Create a debouncer with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            issued: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Request a run `window` after `now`, replacing any pending request.
    pub fn schedule(&mut self, now: Instant) -> Ticket {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.pending = Some((ticket, now + self.window));
        ticket
    }

    /// Drop the pending request, if any. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// When the pending request becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Fire the pending request if it is due at `now`.
    ///
    /// Returns the ticket that fired; a request fires at most once.
    pub fn poll(&mut self, now: Instant) -> Option<Ticket> {
        match self.pending {
            Some((ticket, at)) if now >= at => {
                self.pending = None;
                Some(ticket)
            }
            _ => None,
        }
    }
}
