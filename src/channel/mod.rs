//! Channel abstraction layer.
//!
//! A channel is whatever stands between the source pane and the real data:
//! a network service, a local database, or (as in [`rss`]) an in-memory list
//! of RSS feeds. The orchestration routines in [`crate::actions`] only talk
//! to the [`SourceChannel`] trait.
//!
//! ## Adding a new channel
//!
//! 1. Create a new file in this directory (e.g. `opml.rs`).
//! 2. Define a struct and implement [`SourceChannel`] for it with
//!    `#[async_trait]`.
//! 3. Add `pub mod opml;` below.
//! 4. Construct it in `main.rs` in place of (or next to) the RSS channel.

pub mod feed;
pub mod rss;

pub use feed::FeedSnapshot;
pub use self::rss::{FeedFetcher, HttpFetcher, RssChannel};

use async_trait::async_trait;
use thiserror::Error;

use crate::mode::CountType;
use crate::source::{SourceId, SourceRecord};

/// Everything a channel call can fail with.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no source with id {0}")]
    NotFound(SourceId),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse feed {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ::rss::Error,
    },

    #[error("sync failed for all {failed} feeds")]
    Sync { failed: usize },

    #[error("{0}")]
    Other(String),
}

/// Source listing, mutation and synchronisation against a backing store.
///
/// Calls are awaited one at a time by each orchestration routine, but
/// several routines may be in flight at once, so implementations must be
/// [`Send`] + [`Sync`].
#[async_trait]
pub trait SourceChannel: Send + Sync {
    /// Every known source, with `count` holding the requested counter.
    async fn get_source_list(&self, count_type: CountType)
        -> Result<Vec<SourceRecord>, ChannelError>;

    async fn remove_source_by_id(&self, id: SourceId) -> Result<(), ChannelError>;

    async fn update_source_name_by_id(&self, id: SourceId, name: &str)
        -> Result<(), ChannelError>;

    /// Mark every item of a source as read upstream.
    async fn mark_source_read(&self, id: SourceId) -> Result<(), ChannelError>;

    /// Pull fresh data for every source from upstream.
    async fn sync(&self) -> Result<(), ChannelError>;
}
