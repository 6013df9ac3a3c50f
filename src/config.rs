//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sourcepane::Mode;

const DEFAULT_FEED: &str = "https://feeds.bbci.co.uk/news/rss.xml";

/// A feed reader side pane: subscribed sources with live counters.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Feed URLs to subscribe to.
    #[arg(value_name = "FEED_URL", default_values_t = [DEFAULT_FEED.to_string()])]
    pub feeds: Vec<String>,

    /// Which counters to show at start-up.
    #[arg(long, value_enum, default_value_t = Mode::Unread)]
    pub mode: Mode,

    /// Seconds between background syncs.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Write logs here. Nothing is logged without it.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
