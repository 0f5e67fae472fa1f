//! Side-channel reporting of reconcile results.

use thiserror::Error;

use crate::metadata::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Artist,
    Album,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Artist => write!(f, "artist"),
            EntityKind::Album => write!(f, "album"),
        }
    }
}

/// Why a single refresh attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("remote fetch failed: {0}")]
    Fetch(#[from] RemoteError),
    #[error("store write failed: {0}")]
    Write(String),
    #[error("store write task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Cached metadata replaced with the fetched page.
    Refreshed,
    /// The remote no longer knows the entity and the local record was removed.
    Deleted { reason: RemoteError },
    Failed(ReconcileError),
}

impl ReconcileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReconcileOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileEvent {
    pub kind: EntityKind,
    pub entity_id: String,
    pub outcome: ReconcileOutcome,
}

/// Counters for one pass over an emitted list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub checked: usize,
    pub stale: usize,
    pub already_in_flight: usize,
    /// Still stale, but refreshed successfully within the cooldown.
    pub recently_refreshed: usize,
    pub refreshed: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn record(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Refreshed => self.refreshed += 1,
            ReconcileOutcome::Deleted { .. } => self.deleted += 1,
            ReconcileOutcome::Failed(_) => self.failed += 1,
        }
    }
}
