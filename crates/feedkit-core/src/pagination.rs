//! Decides when to ask for the next page.

/// Capability to request the page following `anchor`.
///
/// Fire-and-forget: the feed never awaits the result and never deduplicates.
/// The same anchor may be requested several times before its page lands, so
/// implementations must tolerate repeats.
pub trait LoadMore<R: ?Sized> {
    fn load_more(&self, anchor: &R);
}

impl<R: ?Sized, F> LoadMore<R> for F
where
    F: Fn(&R),
{
    fn load_more(&self, anchor: &R) {
        self(anchor)
    }
}

/// Outcome of [`maybe_load_more`], mostly useful for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// The capability was invoked with the last item.
    Requested,
    /// The viewport did not ask for more.
    NotTriggered,
    /// The list has no load-more capability; it does not paginate.
    NoCapability,
    /// Nothing to anchor the next page on.
    Empty,
}

/// Invoke `load_more` with the last of `items` if the trigger fired.
///
/// A missing capability or an empty list makes this a no-op regardless of
/// the trigger.
pub fn maybe_load_more<R, L>(load_more: Option<&L>, items: &[&R], triggered: bool) -> PageRequest
where
    R: ?Sized,
    L: LoadMore<R> + ?Sized,
{
    let Some(load_more) = load_more else {
        return PageRequest::NoCapability;
    };
    let Some(last) = items.last() else {
        return PageRequest::Empty;
    };
    if !triggered {
        return PageRequest::NotTriggered;
    }
    load_more.load_more(last);
    PageRequest::Requested
}
