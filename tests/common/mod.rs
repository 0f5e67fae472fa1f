//! Common test infrastructure
//!
//! Tests build a [`TestLibrary`] backed by in-memory stores and, when they
//! need reconcilers, a [`FakeMetadataProvider`] that answers from a table.

mod fixtures;
mod provider;

pub use fixtures::*;
pub use provider::FakeMetadataProvider;

use std::time::Duration;
use tokio::sync::watch;

/// Upper bound for anything a test waits on.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait until the watched value satisfies `predicate`, panicking on timeout.
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for view")
        .expect("view closed")
        .clone()
}
