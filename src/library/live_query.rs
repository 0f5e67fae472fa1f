//! Re-running queries on store invalidation.

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error};

use super::trait_def::LiveQuery;

/// Monotonic store version, bumped after every committed write.
pub(crate) struct InvalidationTracker {
    version: watch::Sender<u64>,
}

impl InvalidationTracker {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self { version }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn invalidate(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

/// Build a live query: run `query` once now and again after every
/// invalidation.
///
/// Each run happens on the blocking pool. A failing run is logged and skipped,
/// so subscribers keep their last good result. The stream ends when the store
/// is dropped.
pub(crate) fn live_query<T, F>(
    conn: Arc<Mutex<Connection>>,
    invalidations: watch::Receiver<u64>,
    label: &'static str,
    query: F,
) -> LiveQuery<T>
where
    T: Send + 'static,
    F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
{
    let query = Arc::new(query);

    stream::unfold((invalidations, true), move |(mut rx, mut first)| {
        let conn = Arc::clone(&conn);
        let query = Arc::clone(&query);
        async move {
            loop {
                if !first && rx.changed().await.is_err() {
                    debug!("Live query {} ended, store dropped", label);
                    return None;
                }
                first = false;
                // Writes landing while the query runs must trigger another run
                rx.borrow_and_update();

                let conn = Arc::clone(&conn);
                let query = Arc::clone(&query);
                let result = tokio::task::spawn_blocking(move || {
                    let conn = conn
                        .lock()
                        .map_err(|_| anyhow!("library db connection mutex poisoned"))?;
                    query(&conn)
                })
                .await;

                match result {
                    Ok(Ok(value)) => return Some((value, (rx, false))),
                    Ok(Err(e)) => error!("Live query {} failed: {:#}", label, e),
                    Err(e) => error!("Live query {} task failed: {}", label, e),
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_emits_now_and_after_each_invalidation() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let tracker = InvalidationTracker::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let mut live = live_query(conn, tracker.subscribe(), "test", move |_| {
            Ok(runs_clone.fetch_add(1, Ordering::SeqCst))
        });

        assert_eq!(live.next().await, Some(0));
        tracker.invalidate();
        assert_eq!(live.next().await, Some(1));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_run_is_skipped() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let tracker = InvalidationTracker::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let mut live = live_query(conn, tracker.subscribe(), "test", move |_| {
            let run = runs_clone.fetch_add(1, Ordering::SeqCst);
            if run == 1 {
                Err(anyhow!("boom"))
            } else {
                Ok(run)
            }
        });

        assert_eq!(live.next().await, Some(0));
        tracker.invalidate();
        // Second run fails, nothing is emitted until the next invalidation
        let pending = tokio::time::timeout(Duration::from_millis(100), live.next()).await;
        assert!(pending.is_err());
        tracker.invalidate();
        assert_eq!(live.next().await, Some(2));
    }

    #[tokio::test]
    async fn test_stream_ends_when_tracker_dropped() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let tracker = InvalidationTracker::new();
        let mut live = live_query(conn, tracker.subscribe(), "test", |_| Ok(()));

        assert_eq!(live.next().await, Some(()));
        drop(tracker);
        assert_eq!(live.next().await, None);
    }
}
