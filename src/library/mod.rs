mod live_query;
mod models;
mod mutation;
mod schema;
mod sort;
mod store;
mod trait_def;

pub use models::*;
pub use mutation::LibraryMutation;
pub use schema::LIBRARY_VERSIONED_SCHEMAS;
pub use sort::{
    order_by_clause, AlbumFilter, AlbumSortType, ArtistFilter, ArtistSongSortType,
    ArtistSortType, PlaylistSortType, PreferenceValue, SongFilter, SongSortType,
};
pub use store::SqliteLibraryStore;
pub use trait_def::{LibraryStore, LiveList, LiveQuery};
