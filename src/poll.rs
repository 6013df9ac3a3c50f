//! Background work: routine completion reports and the periodic sync timer.
//!
//! Every orchestration routine the UI starts runs in its own tokio task and
//! reports back over an unbounded [`mpsc`] channel as a [`TaskMsg`]. The
//! main loop drains that channel each tick.
//!
//! ## For contributors
//!
//! The timer does not wait for a previous sync to finish before starting
//! the next one. Overlapping syncs both reload the list; the later one wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sourcepane::{actions, ChannelError, Mode, SourceChannel, SourceStore};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Messages sent from background tasks to the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMsg {
    /// The named routine completed.
    Done(&'static str),
    /// The named routine failed with this error description.
    Failed(&'static str, String),
}

/// Run `routine` on the runtime and report its outcome on `tx`.
pub fn spawn_routine<F>(
    label: &'static str,
    tx: mpsc::UnboundedSender<TaskMsg>,
    routine: F,
) -> JoinHandle<()>
where
    F: Future<Output = Result<(), ChannelError>> + Send + 'static,
{
    tokio::spawn(async move {
        let msg = match routine.await {
            Ok(()) => TaskMsg::Done(label),
            Err(e) => {
                warn!(routine = label, error = %e, "routine failed");
                TaskMsg::Failed(label, e.to_string())
            }
        };
        // If the receiver is gone the UI has exited.
        let _ = tx.send(msg);
    })
}

/// Spawn the periodic sync task.
///
/// Each sync reads `mode` after the upstream sync, so the reload uses
/// counters for the mode the user is looking at by then. The task stops when
/// the UI drops `tx`'s receiver.
pub fn spawn(
    store: Arc<SourceStore>,
    channel: Arc<dyn SourceChannel>,
    mode: watch::Receiver<Mode>,
    interval: Duration,
    tx: mpsc::UnboundedSender<TaskMsg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                return;
            }

            let current = *mode.borrow();
            info!(mode = %current, "periodic sync");

            let store = Arc::clone(&store);
            let channel = Arc::clone(&channel);
            let mode = mode.clone();
            spawn_routine("sync", tx.clone(), async move {
                actions::sync(&store, channel.as_ref(), &mode).await
            });
        }
    })
}
