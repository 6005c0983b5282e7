//! **feedkit** -- an infinite-scroll content feed for the terminal.
//!
//! This is the umbrella crate that re-exports everything needed to run a
//! feed from a single dependency:
//!
//! ```toml
//! [dependencies]
//! feedkit = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`feedkit_core`] are available at the crate root
//!   ([`FeedList`], [`FeedProps`], [`FeedState`], [`ViewportMonitor`],
//!   [`load_config`], etc.).
//! * The [`widgets`] module re-exports everything from [`feedkit_widgets`]
//!   (cards, ad rows, the loading indicator and the scrollable feed view).
//! * [`program`] hosts a list in a real terminal; [`logging`] sends
//!   `tracing` output to a file.
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use feedkit::program::{FeedProgram, Page, ProgramOptions};
//! use feedkit::{load_config, ConfigOverrides, FeedProps, FeedState, ItemRef};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config(None, ConfigOverrides::default())?;
//!     feedkit::logging::init(&config.log_file_path)?;
//!
//!     let fetch = |after: Option<ItemRef>| async move {
//!         Ok::<_, String>(Page::new(my_api::page_after(after).await))
//!     };
//!     let program = FeedProgram::new(
//!         FeedProps::references(Vec::new()).with_category("photo"),
//!         FeedState::configured(&config),
//!         ProgramOptions::from_config(&config),
//!         fetch,
//!     );
//!     program.run().await?;
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod program;

pub use feedkit_core::*;
pub mod widgets {
    pub use feedkit_widgets::*;
}

pub use program::{FeedProgram, Page, PageFetcher, ProgramError, ProgramOptions};

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
