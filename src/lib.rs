//! Pezzottify Library
//!
//! Live, preference-driven views over the local music library, plus the
//! background reconcilers that keep cached artist and album metadata fresh.

pub mod config;
pub mod downloads;
pub mod library;
pub mod library_views;
pub mod metadata;
pub mod preferences;
pub mod reconciler;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use downloads::{DownloadStateSource, DownloadTracker};
pub use library::{LibraryStore, SqliteLibraryStore};
pub use library_views::{LibraryViews, ListController};
pub use metadata::{HttpMetadataClient, MetadataProvider};
pub use preferences::{PreferenceStore, SqlitePreferenceStore};
pub use reconciler::Reconcilers;
