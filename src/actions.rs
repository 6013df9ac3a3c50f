//! Orchestration routines.
//!
//! Each routine is one user-facing action: it calls the channel, then
//! dispatches transitions into the [`SourceStore`] in a fixed order. None of
//! them catch channel errors. A failure returns early and leaves the store
//! as it was at that point; in particular `refreshing` stays `true` if the
//! channel fails inside a refresh bracket.
//!
//! Routines do not exclude each other. Two overlapping loads both apply
//! `LoadAll` and whichever finishes last wins.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::channel::{ChannelError, SourceChannel};
use crate::mode::{CountType, Mode};
use crate::source::{Source, SourceId};
use crate::state::{SourceStore, Transition};

/// Fetch the source list with counters matching `mode` and load it.
pub async fn load_source<C>(
    store: &SourceStore,
    channel: &C,
    mode: Mode,
) -> Result<(), ChannelError>
where
    C: SourceChannel + ?Sized,
{
    let count_type = CountType::for_mode(mode);
    debug!(?mode, ?count_type, "load_source");

    store.dispatch(Transition::SetRefreshing(true));
    let records = channel
        .get_source_list(count_type)
        .await
        .inspect_err(|e| warn!(error = %e, "get_source_list failed"))?;

    let list: Vec<Source> = records.into_iter().map(Source::from).collect();

    store.dispatch(Transition::LoadAll(list));
    store.dispatch(Transition::SetRefreshing(false));
    Ok(())
}

/// Remove a source upstream, then drop the selection and the entry.
///
/// The selection is cleared before the entry goes away so no snapshot ever
/// selects a source that is no longer listed.
pub async fn remove_source<C>(
    store: &SourceStore,
    channel: &C,
    id: SourceId,
) -> Result<(), ChannelError>
where
    C: SourceChannel + ?Sized,
{
    debug!(id, "remove_source");

    channel
        .remove_source_by_id(id)
        .await
        .inspect_err(|e| warn!(id, error = %e, "remove_source_by_id failed"))?;

    store.dispatch(Transition::SetActiveId(None));
    store.dispatch(Transition::RemoveById(id));
    Ok(())
}

/// Rename a source upstream, then locally.
///
/// Clears the selection as well, whatever was selected.
pub async fn rename_source<C>(
    store: &SourceStore,
    channel: &C,
    id: SourceId,
    name: &str,
) -> Result<(), ChannelError>
where
    C: SourceChannel + ?Sized,
{
    debug!(id, name, "rename_source");

    channel
        .update_source_name_by_id(id, name)
        .await
        .inspect_err(|e| warn!(id, error = %e, "update_source_name_by_id failed"))?;

    store.dispatch(Transition::SetActiveId(None));
    store.dispatch(Transition::UpdateName {
        id,
        name: name.to_string(),
    });
    Ok(())
}

/// Mark every item of a source read upstream, then zero its counter.
pub async fn mark_source_read<C>(
    store: &SourceStore,
    channel: &C,
    id: SourceId,
) -> Result<(), ChannelError>
where
    C: SourceChannel + ?Sized,
{
    debug!(id, "mark_source_read");

    channel
        .mark_source_read(id)
        .await
        .inspect_err(|e| warn!(id, error = %e, "mark_source_read failed"))?;

    store.dispatch(Transition::CountToZero(id));
    Ok(())
}

/// Sync the channel upstream, then reload the list.
///
/// `mode` is read once the channel sync has finished, so the reload uses
/// whatever mode is current by then, not the one at the call.
///
/// The nested load brackets `refreshing` on its own, so observers see it go
/// true, true, false (inner), false (outer).
pub async fn sync<C>(
    store: &SourceStore,
    channel: &C,
    mode: &watch::Receiver<Mode>,
) -> Result<(), ChannelError>
where
    C: SourceChannel + ?Sized,
{
    debug!("sync");

    store.dispatch(Transition::SetRefreshing(true));
    channel
        .sync()
        .await
        .inspect_err(|e| warn!(error = %e, "channel sync failed"))?;

    let current = *mode.borrow();
    load_source(store, channel, current).await?;
    store.dispatch(Transition::SetRefreshing(false));
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::source::{Selection, SourceRecord};
    use crate::state::tests::make_source;
    use crate::state::SourceState;

    /// Records every call together with the `refreshing` flag at that moment.
    struct RecordingChannel {
        records: Vec<SourceRecord>,
        observer: watch::Receiver<SourceState>,
        calls: Mutex<Vec<(String, bool)>>,
        fail: Option<&'static str>,
    }

    impl RecordingChannel {
        fn new(store: &SourceStore, records: Vec<SourceRecord>) -> Self {
            Self {
                records,
                observer: store.subscribe(),
                calls: Mutex::new(Vec::new()),
                fail: None,
            }
        }

        fn failing(mut self, call: &'static str) -> Self {
            self.fail = Some(call);
            self
        }

        fn record(&self, call: String) -> Result<(), ChannelError> {
            let refreshing = self.observer.borrow().refreshing;
            let failed = self.fail.is_some_and(|f| call.starts_with(f));
            self.calls.lock().unwrap().push((call, refreshing));
            if failed {
                return Err(ChannelError::Other("boom".into()));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<(String, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SourceChannel for RecordingChannel {
        async fn get_source_list(
            &self,
            count_type: CountType,
        ) -> Result<Vec<SourceRecord>, ChannelError> {
            self.record(format!("get_source_list:{count_type:?}"))?;
            Ok(self.records.clone())
        }

        async fn remove_source_by_id(&self, id: SourceId) -> Result<(), ChannelError> {
            self.record(format!("remove_source_by_id:{id}"))
        }

        async fn update_source_name_by_id(
            &self,
            id: SourceId,
            name: &str,
        ) -> Result<(), ChannelError> {
            self.record(format!("update_source_name_by_id:{id}:{name}"))
        }

        async fn mark_source_read(&self, id: SourceId) -> Result<(), ChannelError> {
            self.record(format!("mark_source_read:{id}"))
        }

        async fn sync(&self) -> Result<(), ChannelError> {
            self.record("sync".to_string())
        }
    }

    /// Which call [`GatedChannel`] holds until `release` is notified.
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Gate {
        Sync,
        UnreadList,
    }

    /// Lists one source whose count depends on the count type: 7 unread,
    /// 1 starred. The gated call parks until the test releases it.
    struct GatedChannel {
        gate: Gate,
        entered: Notify,
        release: Notify,
    }

    impl GatedChannel {
        fn new(gate: Gate) -> Arc<Self> {
            Arc::new(Self {
                gate,
                entered: Notify::new(),
                release: Notify::new(),
            })
        }

        async fn hold(&self, gate: Gate) {
            if self.gate == gate {
                self.entered.notify_one();
                self.release.notified().await;
            }
        }
    }

    #[async_trait]
    impl SourceChannel for GatedChannel {
        async fn get_source_list(
            &self,
            count_type: CountType,
        ) -> Result<Vec<SourceRecord>, ChannelError> {
            let count = match count_type {
                CountType::Unread => {
                    self.hold(Gate::UnreadList).await;
                    7
                }
                CountType::Starred => 1,
            };
            Ok(vec![record(1, count, None)])
        }

        async fn remove_source_by_id(&self, _id: SourceId) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn update_source_name_by_id(
            &self,
            _id: SourceId,
            _name: &str,
        ) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn mark_source_read(&self, _id: SourceId) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn sync(&self) -> Result<(), ChannelError> {
            self.hold(Gate::Sync).await;
            Ok(())
        }
    }

    /// Drain the journal and replay it over `initial`, returning every
    /// intermediate snapshot.
    fn replay(
        initial: SourceState,
        journal: &mut tokio::sync::broadcast::Receiver<Transition>,
    ) -> (Vec<Transition>, Vec<SourceState>) {
        let mut transitions = Vec::new();
        let mut states = Vec::new();
        let mut state = initial;
        while let Ok(transition) = journal.try_recv() {
            state = state.apply(transition.clone());
            transitions.push(transition);
            states.push(state.clone());
        }
        (transitions, states)
    }

    fn record(id: SourceId, count: i64, icon: Option<&str>) -> SourceRecord {
        SourceRecord {
            id,
            name: format!("source-{id}"),
            link: format!("https://example.com/{id}/feed"),
            count,
            icon: icon.map(String::from),
        }
    }

    fn store_with(list: Vec<Source>, active_id: Option<Selection>) -> SourceStore {
        SourceStore::with_state(SourceState {
            list,
            active_id,
            refreshing: false,
        })
    }

    // -- load_source ---------------------------------------------------------

    #[tokio::test]
    async fn load_source_brackets_fetch_with_refreshing() {
        let store = SourceStore::new();
        let channel = RecordingChannel::new(
            &store,
            vec![record(1, 2, None), record(2, 0, Some("https://example.com/i.png"))],
        );

        load_source(&store, &channel, Mode::Unread).await.unwrap();

        assert_eq!(
            channel.calls(),
            vec![("get_source_list:Unread".to_string(), true)],
            "channel is called while refreshing"
        );
        let state = store.snapshot();
        assert!(!state.refreshing);
        assert_eq!(state.list.len(), 2);
        assert_eq!(state.list[0].icon, None);
        assert_eq!(state.list[1].icon.as_deref(), Some("https://example.com/i.png"));
    }

    #[tokio::test]
    async fn load_source_picks_count_type_from_mode() {
        for (mode, expected) in [
            (Mode::Starred, "get_source_list:Starred"),
            (Mode::Unread, "get_source_list:Unread"),
            (Mode::All, "get_source_list:Unread"),
        ] {
            let store = SourceStore::new();
            let channel = RecordingChannel::new(&store, vec![]);

            load_source(&store, &channel, mode).await.unwrap();

            assert_eq!(channel.calls()[0].0, expected, "{mode:?}");
        }
    }

    #[tokio::test]
    async fn load_source_failure_leaves_refreshing_set() {
        let store = store_with(vec![make_source(1, 1)], None);
        let channel = RecordingChannel::new(&store, vec![]).failing("get_source_list");

        let result = load_source(&store, &channel, Mode::Unread).await;

        assert!(result.is_err());
        let state = store.snapshot();
        assert!(state.refreshing);
        assert_eq!(state.list, vec![make_source(1, 1)]);
    }

    // -- remove_source -------------------------------------------------------

    #[tokio::test]
    async fn remove_source_clears_selection_then_removes() {
        let store = store_with(
            vec![make_source(4, 0), make_source(5, 2)],
            Some(Selection::Source(5)),
        );
        let channel = RecordingChannel::new(&store, vec![]);
        let mut rx = store.subscribe();

        remove_source(&store, &channel, 5).await.unwrap();

        let state = rx.borrow_and_update().clone();
        assert_eq!(state.active_id, None);
        assert!(state.find(5).is_none());
        assert!(state.find(4).is_some());
        assert_eq!(channel.calls()[0].0, "remove_source_by_id:5");
    }

    #[tokio::test]
    async fn remove_source_failure_changes_nothing() {
        let store = store_with(vec![make_source(5, 2)], Some(Selection::Source(5)));
        let channel = RecordingChannel::new(&store, vec![]).failing("remove_source_by_id");

        assert!(remove_source(&store, &channel, 5).await.is_err());

        let state = store.snapshot();
        assert_eq!(state.active_id, Some(Selection::Source(5)));
        assert!(state.find(5).is_some());
    }

    // -- rename_source -------------------------------------------------------

    #[tokio::test]
    async fn rename_source_renames_and_clears_selection() {
        let store = store_with(
            vec![make_source(1, 0), make_source(2, 0)],
            Some(Selection::Source(2)),
        );
        let channel = RecordingChannel::new(&store, vec![]);

        rename_source(&store, &channel, 1, "News").await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.find(1).unwrap().name, "News");
        assert_eq!(state.active_id, None, "rename clears an unrelated selection too");
        assert_eq!(channel.calls()[0].0, "update_source_name_by_id:1:News");
    }

    // -- mark_source_read ----------------------------------------------------

    #[tokio::test]
    async fn mark_source_read_calls_channel_then_zeroes_count() {
        let store = store_with(vec![make_source(1, 4), make_source(2, 3)], None);
        let channel = RecordingChannel::new(&store, vec![]);

        mark_source_read(&store, &channel, 1).await.unwrap();

        assert_eq!(channel.calls()[0].0, "mark_source_read:1");
        let state = store.snapshot();
        assert_eq!(state.find(1).unwrap().count, 0);
        assert_eq!(state.find(2).unwrap().count, 3);
    }

    #[tokio::test]
    async fn mark_source_read_failure_keeps_count() {
        let store = store_with(vec![make_source(1, 4)], None);
        let channel = RecordingChannel::new(&store, vec![]).failing("mark_source_read");

        assert!(mark_source_read(&store, &channel, 1).await.is_err());

        assert_eq!(store.snapshot().find(1).unwrap().count, 4);
    }

    // -- sync ----------------------------------------------------------------

    #[tokio::test]
    async fn sync_runs_channel_sync_then_nested_load() {
        let store = SourceStore::new();
        let channel = RecordingChannel::new(&store, vec![record(3, 7, None)]);

        let (_mode_tx, mode) = watch::channel(Mode::Starred);

        sync(&store, &channel, &mode).await.unwrap();

        assert_eq!(
            channel.calls(),
            vec![
                ("sync".to_string(), true),
                ("get_source_list:Starred".to_string(), true),
            ]
        );
        let state = store.snapshot();
        assert!(!state.refreshing);
        assert_eq!(state.list[0].count, 7);
    }

    #[tokio::test]
    async fn sync_failure_leaves_refreshing_set_and_list_unchanged() {
        let store = store_with(vec![make_source(1, 1)], None);
        let channel = RecordingChannel::new(&store, vec![record(2, 2, None)]).failing("sync");

        let (_mode_tx, mode) = watch::channel(Mode::Unread);

        assert!(sync(&store, &channel, &mode).await.is_err());

        let state = store.snapshot();
        assert!(state.refreshing);
        assert_eq!(state.list, vec![make_source(1, 1)]);
        assert_eq!(channel.calls().len(), 1, "no load after a failed sync");
    }

    #[tokio::test]
    async fn sync_reports_refreshing_for_both_brackets() {
        let store = SourceStore::new();
        let channel = RecordingChannel::new(&store, vec![record(1, 2, None)]);
        let (_mode_tx, mode) = watch::channel(Mode::Unread);
        let mut journal = store.journal();

        sync(&store, &channel, &mode).await.unwrap();

        let (transitions, _) = replay(SourceState::default(), &mut journal);
        let refreshing: Vec<bool> = transitions
            .iter()
            .filter_map(|t| match t {
                Transition::SetRefreshing(flag) => Some(*flag),
                _ => None,
            })
            .collect();
        assert_eq!(refreshing, vec![true, true, false, false]);
    }

    #[tokio::test]
    async fn sync_reloads_with_the_mode_current_after_channel_sync() {
        let store = Arc::new(SourceStore::new());
        let channel = GatedChannel::new(Gate::Sync);
        let (mode_tx, mode) = watch::channel(Mode::Unread);

        let task = {
            let store = Arc::clone(&store);
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { sync(&store, channel.as_ref(), &mode).await })
        };

        channel.entered.notified().await;
        mode_tx.send_replace(Mode::Starred);
        load_source(&store, channel.as_ref(), Mode::Starred).await.unwrap();
        channel.release.notify_one();
        task.await.unwrap().unwrap();

        let state = store.snapshot();
        assert_eq!(state.list[0].count, 1, "reload used the starred count");
        assert!(!state.refreshing);
    }

    #[tokio::test]
    async fn later_finishing_load_wins() {
        let store = Arc::new(SourceStore::new());
        let channel = GatedChannel::new(Gate::UnreadList);
        let mut journal = store.journal();

        let slow = {
            let store = Arc::clone(&store);
            let channel = Arc::clone(&channel);
            tokio::spawn(async move {
                load_source(&store, channel.as_ref(), Mode::Unread).await
            })
        };

        channel.entered.notified().await;
        load_source(&store, channel.as_ref(), Mode::Starred).await.unwrap();
        assert_eq!(store.snapshot().list[0].count, 1);

        channel.release.notify_one();
        slow.await.unwrap().unwrap();

        let state = store.snapshot();
        assert_eq!(state.list[0].count, 7, "the load that finished last wins");
        assert!(!state.refreshing);

        let (_, states) = replay(SourceState::default(), &mut journal);
        let counts: Vec<i64> = states
            .iter()
            .filter_map(|s| s.list.first().map(|src| src.count))
            .collect();
        assert_eq!(counts.first(), Some(&1));
        assert_eq!(counts.last(), Some(&7));
    }
}
