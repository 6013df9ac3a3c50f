//! Pure conversion of a parsed RSS document into what the channel tracks.
//!
//! Kept free of I/O so tests can exercise the parsing rules without hitting
//! the network.

/// The parts of one fetched feed that matter for source counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    /// Channel `<title>`, if non-empty.
    pub title: Option<String>,
    /// Channel `<image><url>`, used as the source icon.
    pub icon: Option<String>,
    /// Stable ids of every item in the document, in document order.
    pub item_ids: Vec<String>,
}

impl FeedSnapshot {
    pub fn from_channel(channel: &rss::Channel) -> Self {
        let title = Some(channel.title().trim())
            .filter(|t| !t.is_empty())
            .map(String::from);

        let icon = channel
            .image()
            .map(|image| image.url().trim())
            .filter(|url| !url.is_empty())
            .map(String::from);

        // Prefer <guid>, fall back to <link>; items with neither can't be
        // tracked across syncs and are skipped.
        let item_ids = channel
            .items()
            .iter()
            .filter_map(|item| {
                item.guid()
                    .map(|g| g.value().to_string())
                    .or_else(|| item.link().map(String::from))
            })
            .collect();

        Self {
            title,
            icon,
            item_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
