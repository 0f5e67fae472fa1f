//! Live preference values and the typed tuples views derive from them.

use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use super::keys::ViewKeys;
use crate::library::PreferenceValue;

/// Immutable view of every stored preference at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSnapshot {
    values: Arc<HashMap<String, String>>,
}

impl PreferenceSnapshot {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Typed enum value, falling back to the type's default when the key is
    /// missing or holds an unknown value.
    pub fn get_enum<T: PreferenceValue + Default>(&self, key: &str) -> T {
        self.get(key).and_then(T::parse).unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some("true") => true,
            Some("false") => false,
            _ => default,
        }
    }

    /// Preference tuple for a view. Sort direction defaults to descending.
    pub fn tuple<F, S>(&self, keys: &ViewKeys) -> PreferenceTuple<F, S>
    where
        F: PreferenceValue + Default,
        S: PreferenceValue + Default,
    {
        PreferenceTuple {
            filter: keys.filter.map(|k| self.get_enum(k)).unwrap_or_default(),
            sort: self.get_enum(keys.sort),
            descending: self.get_bool(keys.descending, true),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Filter, sort key and direction selected for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PreferenceTuple<F, S> {
    pub filter: F,
    pub sort: S,
    pub descending: bool,
}

/// Filter type of views that have none.
impl PreferenceValue for () {
    fn as_str(&self) -> &'static str {
        ""
    }

    fn parse(_value: &str) -> Option<Self> {
        Some(())
    }
}

/// Stream of `select(snapshot)`, starting with the current snapshot and then
/// emitting only when the selected value differs from the previous one.
///
/// Ends when the preference store is dropped.
pub fn distinct_values<T, F>(
    snapshots: watch::Receiver<PreferenceSnapshot>,
    select: F,
) -> BoxStream<'static, T>
where
    T: PartialEq + Clone + Send + 'static,
    F: Fn(&PreferenceSnapshot) -> T + Send + Sync + 'static,
{
    stream::unfold(
        (snapshots, None::<T>, select),
        |(mut rx, last, select)| async move {
            let mut last = last;
            loop {
                if last.is_some() && rx.changed().await.is_err() {
                    return None;
                }
                let value = select(&rx.borrow_and_update());
                if last.as_ref() != Some(&value) {
                    last = Some(value.clone());
                    return Some((value, (rx, last, select)));
                }
            }
        },
    )
    .boxed()
}
