//! Source list state: the snapshot, its transitions, and the store that
//! publishes it.
//!
//! ```text
//!   Transition ──► SourceState::apply ──► new SourceState ──► watch channel
//!                       (pure)                                  │
//!                                                  subscribe() ◄┘ snapshot()
//! ```
//!
//! Nothing outside this module mutates a [`SourceState`]. Callers submit a
//! [`Transition`] to [`SourceStore::dispatch`], which computes the next
//! snapshot and publishes it whole.
//!
//! `subscribe()` only guarantees the latest snapshot; routines dispatch
//! several transitions without yielding, so intermediate states coalesce.
//! Observers that need every step read the transition journal from
//! [`SourceStore::journal`] instead.

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::source::{Selection, Source, SourceId};

/// One complete snapshot of the source pane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceState {
    /// Sources in the order the channel (or `Create`) supplied them.
    pub list: Vec<Source>,
    /// Current selection, if any. May dangle after a bare `RemoveById`.
    pub active_id: Option<Selection>,
    /// True while a load or sync is in flight.
    pub refreshing: bool,
}

/// A named state change and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    LoadAll(Vec<Source>),
    Create(Source),
    SetActiveId(Option<Selection>),
    CountDownOne(SourceId),
    CountUpOne(SourceId),
    CountToZero(SourceId),
    SetRefreshing(bool),
    UpdateName { id: SourceId, name: String },
    RemoveById(SourceId),
}

impl Transition {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Transition::LoadAll(_) => "load_all",
            Transition::Create(_) => "create",
            Transition::SetActiveId(_) => "set_active_id",
            Transition::CountDownOne(_) => "count_down_one",
            Transition::CountUpOne(_) => "count_up_one",
            Transition::CountToZero(_) => "count_to_zero",
            Transition::SetRefreshing(_) => "set_refreshing",
            Transition::UpdateName { .. } => "update_name",
            Transition::RemoveById(_) => "remove_by_id",
        }
    }
}

impl SourceState {
    /// Produce the state that follows `self` after `transition`.
    ///
    /// Pure: `self` is left untouched. Transitions aimed at an unknown id
    /// return an equal state. When ids collide only the first match in list
    /// order is touched.
    pub fn apply(&self, transition: Transition) -> SourceState {
        let mut next = self.clone();

        match transition {
            Transition::LoadAll(list) => next.list = list,
            Transition::Create(source) => {
                next.active_id = Some(Selection::Source(source.id));
                next.list.push(source);
            }
            Transition::SetActiveId(active_id) => next.active_id = active_id,
            Transition::CountDownOne(id) => {
                if let Some(target) = next.find_mut(id) {
                    target.count = target.count.wrapping_sub(1);
                }
            }
            Transition::CountUpOne(id) => {
                if let Some(target) = next.find_mut(id) {
                    target.count = target.count.wrapping_add(1);
                }
            }
            Transition::CountToZero(id) => {
                if let Some(target) = next.find_mut(id) {
                    target.count = 0;
                }
            }
            Transition::SetRefreshing(refreshing) => next.refreshing = refreshing,
            Transition::UpdateName { id, name } => {
                if let Some(target) = next.find_mut(id) {
                    target.name = name;
                }
            }
            Transition::RemoveById(id) => next.list.retain(|source| source.id != id),
        }

        next
    }

    /// First source with this id.
    pub fn find(&self, id: SourceId) -> Option<&Source> {
        self.list.iter().find(|source| source.id == id)
    }

    fn find_mut(&mut self, id: SourceId) -> Option<&mut Source> {
        self.list.iter_mut().find(|source| source.id == id)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Transitions kept for journal readers that fall behind.
const JOURNAL_CAPACITY: usize = 256;

/// Holds the current [`SourceState`] and publishes every replacement.
///
/// Share it behind an `Arc`; dispatch only needs `&self`. There is no
/// ordering between concurrent dispatchers beyond the order in which they
/// reach [`dispatch`](SourceStore::dispatch).
#[derive(Debug)]
pub struct SourceStore {
    tx: watch::Sender<SourceState>,
    journal: broadcast::Sender<Transition>,
}

impl SourceStore {
    /// A store holding the initial state (empty, nothing selected, idle).
    pub fn new() -> Self {
        Self::with_state(SourceState::default())
    }

    pub fn with_state(state: SourceState) -> Self {
        let (tx, _rx) = watch::channel(state);
        let (journal, _) = broadcast::channel(JOURNAL_CAPACITY);
        Self { tx, journal }
    }

    /// Apply `transition` to the current snapshot and publish the result.
    pub fn dispatch(&self, transition: Transition) {
        debug!(transition = transition.name(), "dispatch");
        self.tx.send_modify(|state| {
            // Journal inside the write so its order matches the snapshots'.
            // No journal readers is fine.
            let _ = self.journal.send(transition.clone());
            *state = state.apply(transition);
        });
    }

    /// Every transition dispatched from now on, in dispatch order.
    pub fn journal(&self) -> broadcast::Receiver<Transition> {
        self.journal.subscribe()
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> SourceState {
        self.tx.borrow().clone()
    }

    /// Receiver that is notified on every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<SourceState> {
        self.tx.subscribe()
    }
}

impl Default for SourceStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
