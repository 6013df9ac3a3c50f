//! The source entity and its raw channel representation.
//!
//! `Source` is one subscription in the side pane. Every channel converts its
//! native listing into [`SourceRecord`]s, and [`Source::from`] normalises a
//! record so the rest of the application never sees channel quirks.

use serde::{Deserialize, Serialize};

use super::SourceId;

/// A subscribed source as held in application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Identity assigned by the channel; never changes.
    pub id: SourceId,

    /// Display name. Mutable through renames.
    pub name: String,

    /// Feed URL.
    pub link: String,

    /// Unread or starred counter, depending on the mode the list was loaded
    /// in.
    ///
    /// Signed on purpose: decrements are not clamped, so a counter that is
    /// already zero goes negative.
    pub count: i64,

    /// Icon URL. `None` whenever the channel had no icon.
    pub icon: Option<String>,
}

/// A source exactly as a channel reports it.
///
/// The icon may be missing entirely or an explicit `null`; both deserialize
/// to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: SourceId,
    pub name: String,
    pub link: String,
    pub count: i64,
    #[serde(default)]
    pub icon: Option<String>,
}

impl From<SourceRecord> for Source {
    fn from(record: SourceRecord) -> Self {
        let SourceRecord {
            id,
            name,
            link,
            count,
            icon,
        } = record;

        Source {
            id,
            name,
            link,
            count,
            icon,
        }
    }
}
