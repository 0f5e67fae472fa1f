//! User preferences that drive the filter and sort of each library view.

pub mod keys;
mod snapshot;
mod store;

pub use snapshot::{distinct_values, PreferenceSnapshot, PreferenceTuple};
pub use store::{PreferenceStore, SqlitePreferenceStore, PREFERENCES_VERSIONED_SCHEMAS};
