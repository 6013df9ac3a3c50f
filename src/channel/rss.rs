//! RSS-backed channel.
//!
//! [`RssChannel`] keeps its sources in memory: one entry per feed URL, with
//! the set of item ids it has seen and which of those are unread.
//! [`sync`](SourceChannel::sync) fetches every feed and marks items it has
//! never seen before as unread.
//!
//! There is no item-level surface here, so nothing is ever starred: starred
//! listings report zero for every source.
//!
//! Fetching goes through the [`FeedFetcher`] trait so tests can hand the
//! channel canned documents instead of going to the network.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{ChannelError, FeedSnapshot, SourceChannel};
use crate::mode::CountType;
use crate::source::{SourceId, SourceRecord};

/// Retrieves and parses one feed document.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<::rss::Channel, ChannelError>;
}

/// Fetches feeds over HTTP with [`reqwest`] and parses them with [`rss`](::rss).
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<::rss::Channel, ChannelError> {
        let fetch_err = |source: reqwest::Error| ChannelError::Fetch {
            url: url.to_string(),
            source,
        };

        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_err)?
            .bytes()
            .await
            .map_err(fetch_err)?;

        ::rss::Channel::read_from(body.as_ref()).map_err(|source| ChannelError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

#[derive(Debug)]
struct FeedEntry {
    id: SourceId,
    url: String,
    name: String,
    /// Set once the user renames the source; sync stops overwriting `name`.
    renamed: bool,
    icon: Option<String>,
    seen: HashSet<String>,
    unread: HashSet<String>,
}

impl FeedEntry {
    fn new(id: SourceId, url: String) -> Self {
        Self {
            id,
            name: url.clone(),
            url,
            renamed: false,
            icon: None,
            seen: HashSet::new(),
            unread: HashSet::new(),
        }
    }

    fn record(&self, count_type: CountType) -> SourceRecord {
        let count = match count_type {
            CountType::Unread => self.unread.len(),
            CountType::Starred => 0,
        };

        SourceRecord {
            id: self.id,
            name: self.name.clone(),
            link: self.url.clone(),
            count: count as i64,
            icon: self.icon.clone(),
        }
    }

    fn merge(&mut self, snapshot: FeedSnapshot) {
        if let Some(title) = snapshot.title.filter(|_| !self.renamed) {
            self.name = title;
        }
        self.icon = snapshot.icon;

        for item_id in snapshot.item_ids {
            if self.seen.insert(item_id.clone()) {
                self.unread.insert(item_id);
            }
        }
    }
}

/// An in-memory channel whose sources are RSS feeds.
#[derive(Debug)]
pub struct RssChannel<F> {
    fetcher: F,
    feeds: Mutex<Vec<FeedEntry>>,
}

impl<F: FeedFetcher> RssChannel<F> {
    /// Create a channel over `urls`. Ids are assigned 1, 2, 3… in order and
    /// each source is named after its URL until a sync learns its title.
    pub fn new<I, S>(fetcher: F, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let feeds = urls
            .into_iter()
            .zip(1..)
            .map(|(url, id)| FeedEntry::new(id, url.into()))
            .collect();

        Self {
            fetcher,
            feeds: Mutex::new(feeds),
        }
    }

    fn feeds(&self) -> MutexGuard<'_, Vec<FeedEntry>> {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_mut(feeds: &mut [FeedEntry], id: SourceId) -> Result<&mut FeedEntry, ChannelError> {
    feeds
        .iter_mut()
        .find(|entry| entry.id == id)
        .ok_or(ChannelError::NotFound(id))
}

#[async_trait]
impl<F: FeedFetcher> SourceChannel for RssChannel<F> {
    async fn get_source_list(
        &self,
        count_type: CountType,
    ) -> Result<Vec<SourceRecord>, ChannelError> {
        let feeds = self.feeds();
        Ok(feeds.iter().map(|entry| entry.record(count_type)).collect())
    }

    async fn remove_source_by_id(&self, id: SourceId) -> Result<(), ChannelError> {
        let mut feeds = self.feeds();
        let before = feeds.len();
        feeds.retain(|entry| entry.id != id);
        if feeds.len() == before {
            return Err(ChannelError::NotFound(id));
        }
        info!(id, "removed source");
        Ok(())
    }

    async fn update_source_name_by_id(
        &self,
        id: SourceId,
        name: &str,
    ) -> Result<(), ChannelError> {
        let mut feeds = self.feeds();
        let entry = find_mut(&mut feeds, id)?;
        entry.name = name.to_string();
        entry.renamed = true;
        Ok(())
    }

    async fn mark_source_read(&self, id: SourceId) -> Result<(), ChannelError> {
        let mut feeds = self.feeds();
        let entry = find_mut(&mut feeds, id)?;
        debug!(id, cleared = entry.unread.len(), "marked source read");
        entry.unread.clear();
        Ok(())
    }

    async fn sync(&self) -> Result<(), ChannelError> {
        // Never hold the lock across a fetch.
        let targets: Vec<(SourceId, String)> = self
            .feeds()
            .iter()
            .map(|entry| (entry.id, entry.url.clone()))
            .collect();

        let mut failed = 0;
        for (id, url) in &targets {
            match self.fetcher.fetch(url).await {
                Ok(channel) => {
                    let snapshot = FeedSnapshot::from_channel(&channel);
                    debug!(%url, items = snapshot.item_ids.len(), "fetched feed");
                    // The source may have been removed while we were fetching.
                    let mut feeds = self.feeds();
                    if let Ok(entry) = find_mut(&mut feeds, *id) {
                        entry.merge(snapshot);
                    }
                }
                Err(e) => {
                    warn!(%url, error = %e, "feed sync failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 && failed == targets.len() {
            return Err(ChannelError::Sync { failed });
        }

        info!(feeds = targets.len(), failed, "sync finished");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
