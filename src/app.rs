//! UI-side application state and the key actions behind it.
//!
//! [`App`] owns nothing the library owns: the source list, its counters and
//! the selection live in the shared [`SourceStore`]. `App` keeps only what
//! the terminal needs on top (scroll position, status line, rename buffer)
//! and turns key presses into either a direct `dispatch` or a routine from
//! [`actions`] spawned on the runtime.
//!
//! ## For contributors
//!
//! A new key action that talks to the channel should go through
//! [`App::run`] so its outcome comes back as a [`TaskMsg`] and lands in the
//! status bar. Purely local changes dispatch a [`Transition`] directly.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Local};
use ratatui::widgets::ListState;
use sourcepane::{
    actions, select_source, ChannelError, Mode, Preset, Selection, SourceChannel, SourceState,
    SourceStore, Transition,
};
use tokio::sync::{mpsc, watch};

use crate::poll::{spawn_routine, TaskMsg};

pub struct App {
    pub store: Arc<SourceStore>,
    channel: Arc<dyn SourceChannel>,
    /// Current mode, shared with the periodic sync task.
    mode: watch::Sender<Mode>,
    tasks: mpsc::UnboundedSender<TaskMsg>,
    /// List selection state for scrolling. Derived from `active_id` on draw.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last routine status message.
    pub status: String,
    /// When the last sync finished.
    pub last_sync: Option<DateTime<Local>>,
    /// Rename buffer while the user is typing a new name.
    pub editing: Option<String>,
}

/// The aggregate row shown above the sources for `mode`.
pub fn preset_for(mode: Mode) -> Preset {
    match mode {
        Mode::All => Preset::AllItems,
        Mode::Unread => Preset::Unread,
        Mode::Starred => Preset::Starred,
    }
}

impl App {
    pub fn new(
        store: Arc<SourceStore>,
        channel: Arc<dyn SourceChannel>,
        mode: watch::Sender<Mode>,
        tasks: mpsc::UnboundedSender<TaskMsg>,
    ) -> Self {
        Self {
            store,
            channel,
            mode,
            tasks,
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            last_sync: None,
            editing: None,
        }
    }

    pub fn mode(&self) -> Mode {
        *self.mode.borrow()
    }

    /// Selectable rows: the preset row, then every visible source.
    pub fn rows(&self, state: &SourceState) -> Vec<Selection> {
        let view = select_source(state, self.mode());
        std::iter::once(Selection::Preset(preset_for(view.mode)))
            .chain(view.list.iter().map(|source| Selection::Source(source.id)))
            .collect()
    }

    /// Index of the active selection among [`rows`](App::rows), if visible.
    pub fn selected_row(&self, state: &SourceState) -> Option<usize> {
        let active = state.active_id?;
        self.rows(state).iter().position(|row| *row == active)
    }

    fn selected_source(&self) -> Option<i64> {
        self.store.snapshot().active_id.and_then(|s| s.source_id())
    }

    // -- background routines -------------------------------------------------

    fn run<F, Fut>(&self, label: &'static str, routine: F)
    where
        F: FnOnce(Arc<SourceStore>, Arc<dyn SourceChannel>) -> Fut,
        Fut: Future<Output = Result<(), ChannelError>> + Send + 'static,
    {
        let fut = routine(Arc::clone(&self.store), Arc::clone(&self.channel));
        spawn_routine(label, self.tasks.clone(), fut);
    }

    /// Load the list for the current mode.
    pub fn load(&mut self) {
        let mode = self.mode();
        self.status = format!("Loading {mode}…");
        self.run("load", move |store, channel| async move {
            actions::load_source(&store, channel.as_ref(), mode).await
        });
    }

    /// Sync upstream, then reload.
    pub fn refresh(&mut self) {
        let mode = self.mode.subscribe();
        self.status = "Syncing…".into();
        self.run("sync", move |store, channel| async move {
            actions::sync(&store, channel.as_ref(), &mode).await
        });
    }

    /// Switch to the next mode and reload counters for it.
    pub fn cycle_mode(&mut self) {
        let next = self.mode().next();
        self.mode.send_replace(next);
        self.load();
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.selected_source() else {
            self.status = "Select a source to remove".into();
            return;
        };
        self.status = format!("Removing source {id}…");
        self.run("remove", move |store, channel| async move {
            actions::remove_source(&store, channel.as_ref(), id).await
        });
    }

    /// Mark the selected source read upstream and zero its counter.
    pub fn mark_selected_read(&mut self) {
        let Some(id) = self.selected_source() else {
            self.status = "Select a source to mark read".into();
            return;
        };
        self.status = format!("Marking source {id} read…");
        self.run("mark_read", move |store, channel| async move {
            actions::mark_source_read(&store, channel.as_ref(), id).await
        });
    }

    // -- rename --------------------------------------------------------------

    pub fn start_rename(&mut self) {
        let state = self.store.snapshot();
        let current = self
            .selected_source()
            .and_then(|id| state.find(id))
            .map(|source| source.name.clone());

        match current {
            Some(name) => self.editing = Some(name),
            None => self.status = "Select a source to rename".into(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.pop();
        }
    }

    pub fn cancel_rename(&mut self) {
        self.editing = None;
    }

    pub fn commit_rename(&mut self) {
        let Some(name) = self.editing.take() else {
            return;
        };
        let name = name.trim().to_string();
        let Some(id) = self.selected_source().filter(|_| !name.is_empty()) else {
            return;
        };
        self.status = format!("Renaming to {name}…");
        self.run("rename", move |store, channel| async move {
            actions::rename_source(&store, channel.as_ref(), id, &name).await
        });
    }

    // -- navigation ----------------------------------------------------------

    fn select_row(&mut self, pick: impl FnOnce(Option<usize>, usize) -> usize) {
        let state = self.store.snapshot();
        let rows = self.rows(&state);
        let i = pick(self.selected_row(&state), rows.len()).min(rows.len() - 1);
        self.store.dispatch(Transition::SetActiveId(Some(rows[i])));
    }

    pub fn select_next(&mut self) {
        self.select_row(|current, _| current.map_or(0, |i| i + 1));
    }

    pub fn select_previous(&mut self) {
        self.select_row(|current, _| current.map_or(0, |i| i.saturating_sub(1)));
    }

    pub fn select_first(&mut self) {
        self.select_row(|_, _| 0);
    }

    pub fn select_last(&mut self) {
        self.select_row(|_, len| len - 1);
    }

    // -- task reports --------------------------------------------------------

    pub fn handle_task(&mut self, msg: TaskMsg) {
        match msg {
            TaskMsg::Done(label) => {
                if label == "sync" {
                    self.last_sync = Some(Local::now());
                }
                self.status = format!("{label} finished");
            }
            TaskMsg::Failed(label, e) => {
                self.status = format!("{label} failed: {e}");
            }
        }
    }
}
