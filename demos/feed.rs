//! A synthetic paginated feed.
//!
//! ```sh
//! cargo run --example feed -- --help
//! tail -f ~/.local/state/feedkit/feedkit.log   # in another terminal
//! ```
//!
//! Posts by `@spammer` are muted, so some pages show fewer than
//! [`PAGE_SIZE`] items.

use clap::Parser;
use feedkit::program::{FeedProgram, Page, ProgramOptions};
use feedkit::widgets::Summary;
use feedkit::{load_config, ConfigOverrides, FeedProps, FeedState, ItemRef, MuteSet, NsfwPref};
use std::path::PathBuf;
use std::time::Duration;

const PAGE_SIZE: usize = 8;
const TOTAL: usize = 64;
const AUTHORS: [&str; 5] = ["@alice", "@bob", "@carol", "@spammer", "@dave"];
const CATEGORIES: [&str; 3] = ["photo", "travel", "food"];

#[derive(Parser, Debug)]
#[command(name = "feed")]
#[command(about = "Scroll a synthetic paginated feed")]
struct Args {
    /// Config file (defaults to $FEEDKIT_CONFIG, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show ad placeholders
    #[arg(long)]
    ads: bool,

    /// Show NSFW posts without a warning
    #[arg(long)]
    show_nsfw: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ads_enabled: self.ads.then_some(true),
            nsfw_pref: self.show_nsfw.then_some(NsfwPref::Show),
            ..ConfigOverrides::default()
        }
    }
}

#[derive(Debug, Clone)]
struct Post {
    title: String,
    author: &'static str,
    category: &'static str,
    excerpt: String,
    votes: i64,
    nsfw: bool,
}

impl Summary for Post {
    fn title(&self) -> &str {
        &self.title
    }
    fn author(&self) -> &str {
        self.author
    }
    fn category(&self) -> Option<&str> {
        Some(self.category)
    }
    fn excerpt(&self) -> &str {
        &self.excerpt
    }
    fn net_votes(&self) -> i64 {
        self.votes
    }
    fn is_nsfw(&self) -> bool {
        self.nsfw
    }
}

fn post(index: usize) -> (ItemRef, Post) {
    let author = AUTHORS[index % AUTHORS.len()];
    let category = CATEGORIES[index % CATEGORIES.len()];
    let post = Post {
        title: format!("Day {index}: notes from the road"),
        author,
        category,
        excerpt: format!("Entry {index} in the {category} series, written by {author}."),
        votes: if index % 11 == 7 { -3 } else { (index as i64 * 7) % 40 },
        nsfw: index % 13 == 12,
    };
    (ItemRef::from_parts(author, &format!("day-{index}")), post)
}

/// Index of the post after `anchor`.
fn next_index(anchor: Option<&ItemRef>) -> usize {
    anchor
        .and_then(|item| item.slug())
        .and_then(|slug| slug.strip_prefix("day-"))
        .and_then(|n| n.parse::<usize>().ok())
        .map_or(0, |n| n + 1)
}

async fn fetch_page(after: Option<ItemRef>) -> Result<Page<Post>, String> {
    tokio::time::sleep(Duration::from_millis(600)).await;
    let start = next_index(after.as_ref());
    let end = (start + PAGE_SIZE).min(TOTAL);
    let items = (start..end).map(post).collect();
    Ok(if end == TOTAL {
        Page::final_page(items)
    } else {
        Page::new(items)
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.clone(), args.overrides())?;
    feedkit::logging::init(&config.log_file_path)?;
    tracing::info!(log = %config.log_file_path.display(), "feed demo starting");

    let mut state = FeedState::configured(&config);
    state.current_user = Some("demo".to_string());
    state
        .follow
        .insert("demo".to_string(), MuteSet::from_iter(["@spammer"]));

    let props = FeedProps::references(Vec::new())
        .with_category("travel")
        .with_order("trending");
    let options = ProgramOptions {
        title: Some("feedkit demo".into()),
        ..ProgramOptions::from_config(&config)
    };

    let state = FeedProgram::new(props, state, options, fetch_page).run().await?;
    tracing::info!(loaded = state.content.len(), "feed demo finished");
    Ok(())
}
