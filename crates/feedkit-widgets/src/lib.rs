//! Terminal rendering for the **feedkit** feed.
//!
//! These widgets draw the keyed sequence produced by
//! [`feedkit_core::FeedList::entries`] with [`ratatui`], and supply the
//! terminal-backed [`Viewport`](feedkit_core::Viewport) the list measures
//! itself against.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`summary`] | [`Summary`](summary::Summary) trait and content cards |
//! | [`ad`] | Ad placeholder rows |
//! | [`loading`] | Animated loading indicator |
//! | [`feed_view`] | Row layout, scroll position and the scrollable feed widget |
//! | [`terminal_viewport`] | Cell-to-pixel viewport geometry |
//! | [`text`] | Unicode-aware width and truncation helpers |

pub mod ad;
pub mod feed_view;
pub mod loading;
pub mod summary;
pub mod terminal_viewport;
pub mod text;

pub use feed_view::{FeedLines, FeedScroll, FeedView};
pub use loading::LoadingIndicator;
pub use summary::Summary;
pub use terminal_viewport::{CellMetrics, TerminalViewport};
