use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::report::{EntityKind, PassSummary, ReconcileError, ReconcileEvent, ReconcileOutcome};

/// Repairs one kind of cached entity from the remote metadata source.
#[async_trait]
pub trait StalenessReconciler: Send + Sync + 'static {
    type Entity: Send + Sync + 'static;

    fn kind(&self) -> EntityKind;

    fn entity_id<'a>(&self, entity: &'a Self::Entity) -> &'a str;

    /// Whether the cached entity should be refreshed.
    fn is_stale(&self, entity: &Self::Entity, now: DateTime<Utc>) -> bool;

    /// Fetch and write back a single entity.
    async fn reconcile(&self, entity_id: &str) -> Result<ReconcileOutcome, ReconcileError>;
}

/// Ids whose refresh is currently running. An id is released when the guard
/// returned by `try_claim` is dropped.
#[derive(Default)]
struct InFlight {
    ids: Mutex<HashSet<String>>,
}

struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    id: String,
}

impl InFlight {
    fn try_claim(&self, id: &str) -> Option<InFlightGuard<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        if !ids.insert(id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: self,
            id: id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut ids = self.in_flight.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.remove(&self.id);
    }
}

/// How long an id is left alone after a successful refresh, even when the
/// page it got still leaves it stale (no thumbnail, no songs).
pub const DEFAULT_REFRESH_COOLDOWN_MINUTES: i64 = 60;

/// Runs a reconciler over emitted lists and reports every attempt.
pub struct ReconcileRunner<R: StalenessReconciler> {
    reconciler: R,
    in_flight: InFlight,
    refreshed: Mutex<HashMap<String, DateTime<Utc>>>,
    cooldown: Duration,
    reports: broadcast::Sender<ReconcileEvent>,
}

impl<R: StalenessReconciler> ReconcileRunner<R> {
    pub fn new(reconciler: R, reports: broadcast::Sender<ReconcileEvent>) -> Self {
        Self {
            reconciler,
            in_flight: InFlight::default(),
            refreshed: Mutex::new(HashMap::new()),
            cooldown: Duration::minutes(DEFAULT_REFRESH_COOLDOWN_MINUTES),
            reports,
        }
    }

    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Refreshed after `now` (by a concurrent pass) or less than the
    /// cooldown before it.
    fn refreshed_recently(&self, id: &str, now: DateTime<Utc>) -> bool {
        let refreshed = self.refreshed.lock().unwrap_or_else(|e| e.into_inner());
        refreshed.get(id).is_some_and(|at| now - *at < self.cooldown)
    }

    fn mark_refreshed(&self, id: &str) {
        let now = Utc::now();
        let mut refreshed = self.refreshed.lock().unwrap_or_else(|e| e.into_inner());
        refreshed.retain(|_, at| now - *at < self.cooldown);
        refreshed.insert(id.to_string(), now);
    }

    pub fn reconciler(&self) -> &R {
        &self.reconciler
    }

    /// Refresh every stale entity of `entities`, one at a time.
    ///
    /// Entities already being refreshed by another pass are skipped.
    pub async fn run_pass(&self, entities: &[R::Entity]) -> PassSummary {
        let kind = self.reconciler.kind();
        let now = Utc::now();
        let mut summary = PassSummary {
            checked: entities.len(),
            ..Default::default()
        };

        for entity in entities {
            if !self.reconciler.is_stale(entity, now) {
                continue;
            }
            summary.stale += 1;

            let id = self.reconciler.entity_id(entity);
            let Some(_guard) = self.in_flight.try_claim(id) else {
                debug!("{} {} refresh already in flight, skipping", kind, id);
                summary.already_in_flight += 1;
                continue;
            };
            // Checked under the claim: a refresh is marked before its claim is released
            if self.refreshed_recently(id, now) {
                debug!("{} {} was refreshed recently, skipping", kind, id);
                summary.recently_refreshed += 1;
                continue;
            }

            let outcome = match self.reconciler.reconcile(id).await {
                Ok(outcome) => outcome,
                Err(e) => ReconcileOutcome::Failed(e),
            };
            match &outcome {
                ReconcileOutcome::Refreshed => {
                    debug!("Refreshed {} {}", kind, id);
                    self.mark_refreshed(id);
                }
                ReconcileOutcome::Deleted { reason } => {
                    info!("Deleted {} {} missing from remote: {}", kind, id, reason)
                }
                ReconcileOutcome::Failed(e) => warn!("Failed to refresh {} {}: {}", kind, id, e),
            }
            summary.record(&outcome);

            // No subscribers is fine
            let _ = self.reports.send(ReconcileEvent {
                kind,
                entity_id: id.to_string(),
                outcome,
            });
        }

        if summary.stale > 0 {
            info!(
                "{} reconcile pass: {} checked, {} stale, {} refreshed, {} deleted, {} failed, \
                 {} in flight, {} recently refreshed",
                kind,
                summary.checked,
                summary.stale,
                summary.refreshed,
                summary.deleted,
                summary.failed,
                summary.already_in_flight,
                summary.recently_refreshed
            );
        }
        summary
    }

    /// Observe a view and start a pass on each list it emits, current one
    /// included.
    ///
    /// Passes run in their own tasks so they never hold up the view, and they
    /// outlive it: when the view goes away the observer stops, but passes
    /// already started finish their work.
    pub fn attach(
        self: &Arc<Self>,
        mut view: watch::Receiver<Arc<Vec<R::Entity>>>,
    ) -> JoinHandle<()> {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let entities = Arc::clone(&view.borrow_and_update());
                if !entities.is_empty() {
                    let pass_runner = Arc::clone(&runner);
                    tokio::spawn(async move {
                        pass_runner.run_pass(&entities).await;
                    });
                }
                if view.changed().await.is_err() {
                    debug!("{} reconciler detached, view closed", runner.reconciler.kind());
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Entities are (id, stale) pairs; reconcile blocks until released.
    struct FakeReconciler {
        calls: AtomicUsize,
        release: Notify,
        block: bool,
    }

    impl FakeReconciler {
        fn new(block: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
                block,
            }
        }
    }

    #[async_trait]
    impl StalenessReconciler for FakeReconciler {
        type Entity = (String, bool);

        fn kind(&self) -> EntityKind {
            EntityKind::Artist
        }

        fn entity_id<'a>(&self, entity: &'a Self::Entity) -> &'a str {
            &entity.0
        }

        fn is_stale(&self, entity: &Self::Entity, _now: DateTime<Utc>) -> bool {
            entity.1
        }

        async fn reconcile(&self, entity_id: &str) -> Result<ReconcileOutcome, ReconcileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.block {
                self.release.notified().await;
            }
            if entity_id == "bad" {
                return Err(ReconcileError::Write("disk full".to_string()));
            }
            Ok(ReconcileOutcome::Refreshed)
        }
    }

    fn entity(id: &str, stale: bool) -> (String, bool) {
        (id.to_string(), stale)
    }

    #[tokio::test]
    async fn test_pass_refreshes_only_stale_entities() {
        let (reports, mut report_rx) = broadcast::channel(16);
        let runner = ReconcileRunner::new(FakeReconciler::new(false), reports);

        let summary = runner
            .run_pass(&[entity("a", true), entity("b", false), entity("bad", true)])
            .await;

        assert_eq!(summary.checked, 3);
        assert_eq!(summary.stale, 2);
        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(runner.reconciler().calls.load(Ordering::SeqCst), 2);

        let first = report_rx.recv().await.unwrap();
        assert_eq!(first.entity_id, "a");
        assert_eq!(first.outcome, ReconcileOutcome::Refreshed);
        let second = report_rx.recv().await.unwrap();
        assert_eq!(second.entity_id, "bad");
        assert!(second.outcome.is_failure());
    }

    #[tokio::test]
    async fn test_nothing_stale_means_no_calls() {
        let (reports, _) = broadcast::channel(16);
        let runner = ReconcileRunner::new(FakeReconciler::new(false), reports);
        let summary = runner.run_pass(&[entity("a", false), entity("b", false)]).await;
        assert_eq!(summary.stale, 0);
        assert_eq!(runner.reconciler().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_in_flight_refresh_is_not_duplicated() {
        let (reports, _) = broadcast::channel(16);
        let runner = Arc::new(
            ReconcileRunner::new(FakeReconciler::new(true), reports)
                .with_refresh_cooldown(chrono::Duration::zero()),
        );

        let first_pass = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run_pass(&[entity("a", true)]).await })
        };
        while runner.reconciler().calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let overlapping = runner.run_pass(&[entity("a", true)]).await;
        assert_eq!(overlapping.already_in_flight, 1);
        assert_eq!(runner.reconciler().calls.load(Ordering::SeqCst), 1);

        runner.reconciler().release.notify_one();
        let first = first_pass.await.unwrap();
        assert_eq!(first.refreshed, 1);

        // Released after completion, a later pass refreshes again
        runner.reconciler().release.notify_one();
        let later = runner.run_pass(&[entity("a", true)]).await;
        assert_eq!(later.refreshed, 1);
    }

    #[tokio::test]
    async fn test_refreshed_entity_still_stale_is_not_refetched() {
        let (reports, _) = broadcast::channel(16);
        let runner = Arc::new(ReconcileRunner::new(FakeReconciler::new(false), reports));

        // The write re-emits the list with the entity still stale
        let first = runner.run_pass(&[entity("a", true)]).await;
        assert_eq!(first.refreshed, 1);
        let second = runner.run_pass(&[entity("a", true), entity("b", true)]).await;
        assert_eq!(second.recently_refreshed, 1);
        assert_eq!(second.refreshed, 1);
        assert_eq!(runner.reconciler().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_retried_by_next_pass() {
        let (reports, _) = broadcast::channel(16);
        let runner = ReconcileRunner::new(FakeReconciler::new(false), reports);

        assert_eq!(runner.run_pass(&[entity("bad", true)]).await.failed, 1);
        let retry = runner.run_pass(&[entity("bad", true)]).await;
        assert_eq!(retry.recently_refreshed, 0);
        assert_eq!(retry.failed, 1);
        assert_eq!(runner.reconciler().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_attach_runs_on_current_and_new_lists() {
        let (reports, mut report_rx) = broadcast::channel(16);
        let runner = Arc::new(ReconcileRunner::new(FakeReconciler::new(false), reports));
        let (view_tx, view_rx) = watch::channel(Arc::new(vec![entity("a", true)]));

        let handle = runner.attach(view_rx);
        assert_eq!(report_rx.recv().await.unwrap().entity_id, "a");

        view_tx.send_replace(Arc::new(vec![entity("b", true), entity("c", false)]));
        assert_eq!(report_rx.recv().await.unwrap().entity_id, "b");

        drop(view_tx);
        handle.await.unwrap();
        assert_eq!(runner.reconciler().calls.load(Ordering::SeqCst), 2);
    }
}
