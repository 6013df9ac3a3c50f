//! Derived view of the source pane.
//!
//! [`select_source`] combines the stored [`SourceState`] with the current
//! [`Mode`]. It is recomputed on every read and holds nothing of its own.

use crate::mode::Mode;
use crate::source::{Selection, Source};
use crate::state::SourceState;

/// What the side pane renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceView<'a> {
    pub active_id: Option<Selection>,
    /// Sum of every counter in the unfiltered list.
    pub total_count: i64,
    pub mode: Mode,
    /// Sources visible in `mode`, in list order.
    pub list: Vec<&'a Source>,
}

/// Project `state` through `mode`.
///
/// Outside [`Mode::All`] a source is hidden when its counter is zero or
/// below, unless it is the active selection.
pub fn select_source(state: &SourceState, mode: Mode) -> SourceView<'_> {
    let total_count: i64 = state.list.iter().map(|source| source.count).sum();
    let active_id = state.active_id;

    let list = state
        .list
        .iter()
        .filter(|source| {
            mode == Mode::All
                || active_id == Some(Selection::Source(source.id))
                || source.count > 0
        })
        .collect();

    SourceView {
        active_id,
        total_count,
        mode,
        list,
    }
}
