//! Source entity model.
//!
//! This module defines the [`Source`] entity shown in the side pane, the raw
//! [`SourceRecord`] shape a channel hands back, and the [`Selection`] type
//! that says what the user currently has highlighted.
//!
//! ## For contributors
//!
//! Channels produce [`SourceRecord`]s; the rest of the crate only ever sees
//! [`Source`]s. If a channel reports something in a new shape, convert it to
//! a `SourceRecord` at the channel boundary instead of widening `Source`.

mod source_item;

pub use source_item::{Source, SourceRecord};

use serde::{Deserialize, Serialize};

/// Stable identity of a source, assigned by the channel.
pub type SourceId = i64;

/// Virtual selections that do not correspond to a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Every item of every source.
    AllItems,
    /// Unread items across all sources.
    Unread,
    /// Starred items across all sources.
    Starred,
}

/// What the side pane has selected: one source, or an aggregate preset.
///
/// "Nothing selected" is `Option::<Selection>::None` at the use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Source(SourceId),
    Preset(Preset),
}

impl Selection {
    /// The source id, if this selection points at a concrete source.
    pub fn source_id(&self) -> Option<SourceId> {
        match self {
            Selection::Source(id) => Some(*id),
            Selection::Preset(_) => None,
        }
    }
}

impl From<SourceId> for Selection {
    fn from(id: SourceId) -> Self {
        Selection::Source(id)
    }
}

impl From<Preset> for Selection {
    fn from(preset: Preset) -> Self {
        Selection::Preset(preset)
    }
}
