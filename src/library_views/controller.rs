//! Switch-latest controllers that hold the current value of a view.

use futures::stream::{self, BoxStream, StreamExt};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::library::LiveList;

/// Holds the latest value of a view, derived from a stream of keys.
///
/// Every new key replaces the current source stream with `route(key)`. The
/// previous source is dropped, which cancels its pending query, and anything
/// it produced late is discarded. Equal consecutive values are not
/// republished.
///
/// The background task stops when the controller is dropped or cancelled.
pub struct LiveController<V> {
    output: watch::Receiver<V>,
    cancel: CancellationToken,
}

/// Controller of an ordered entity list. Starts as an empty list.
pub type ListController<T> = LiveController<Arc<Vec<T>>>;

impl<V> LiveController<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn spawn<K, R>(
        label: &'static str,
        initial: V,
        keys: BoxStream<'static, K>,
        route: R,
    ) -> Self
    where
        K: Debug + Send + 'static,
        R: FnMut(K) -> BoxStream<'static, V> + Send + 'static,
    {
        let (tx, output) = watch::channel(initial);
        let cancel = CancellationToken::new();
        tokio::spawn(run_controller(label, keys, route, tx, cancel.clone()));
        Self { output, cancel }
    }

    /// Controller over a single source, with no switching.
    pub fn from_stream(label: &'static str, initial: V, source: BoxStream<'static, V>) -> Self {
        let mut source = Some(source);
        Self::spawn(label, initial, stream::once(async {}).boxed(), move |()| {
            source.take().unwrap_or_else(|| stream::empty().boxed())
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<V> {
        self.output.clone()
    }

    pub fn current(&self) -> V {
        self.output.borrow().clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<T> LiveController<Arc<Vec<T>>>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn list<K, R>(label: &'static str, keys: BoxStream<'static, K>, mut route: R) -> Self
    where
        K: Debug + Send + 'static,
        R: FnMut(K) -> LiveList<T> + Send + 'static,
    {
        Self::spawn(label, Arc::new(Vec::new()), keys, move |key| {
            route(key).map(Arc::new).boxed()
        })
    }

    pub fn list_from_stream(label: &'static str, source: LiveList<T>) -> Self {
        Self::from_stream(label, Arc::new(Vec::new()), source.map(Arc::new).boxed())
    }
}

impl<V> Drop for LiveController<V> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn next_tagged<V>(source: &mut Option<BoxStream<'static, (u64, V)>>) -> Option<(u64, V)> {
    match source {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}

async fn run_controller<K, V, R>(
    label: &'static str,
    mut keys: BoxStream<'static, K>,
    mut route: R,
    output: watch::Sender<V>,
    cancel: CancellationToken,
) where
    K: Debug + Send + 'static,
    V: PartialEq + Send + Sync + 'static,
    R: FnMut(K) -> BoxStream<'static, V> + Send + 'static,
{
    let mut generation: u64 = 0;
    let mut source: Option<BoxStream<'static, (u64, V)>> = None;
    let mut keys_done = false;

    loop {
        tokio::select! {
            // Cancellation first, then new keys, then results
            biased;
            _ = cancel.cancelled() => {
                debug!("{} controller cancelled", label);
                break;
            }
            key = keys.next(), if !keys_done => match key {
                Some(key) => {
                    generation += 1;
                    debug!("{} switching to {:?} (generation {})", label, key, generation);
                    let tag = generation;
                    // Replacing the source drops the previous subscription
                    source = Some(route(key).map(move |value| (tag, value)).boxed());
                }
                None => {
                    keys_done = true;
                    if source.is_none() {
                        break;
                    }
                }
            },
            item = next_tagged(&mut source) => match item {
                Some((tag, value)) if tag == generation => {
                    output.send_if_modified(|current| {
                        if *current == value {
                            false
                        } else {
                            *current = value;
                            true
                        }
                    });
                }
                Some((tag, _)) => {
                    debug!("{} discarded result of generation {}", label, tag);
                }
                None => {
                    source = None;
                    if keys_done {
                        break;
                    }
                }
            },
        }
    }
}
