//! Remote metadata source for artist and album pages.

mod client;
mod error;
mod models;

#[cfg(test)]
pub use client::MockMetadataProvider;
pub use client::{HttpMetadataClient, MetadataProvider};
pub use error::{RemoteError, NOT_FOUND_MARKER};
pub use models::{AlbumPage, AlbumPageSong, ArtistPage};
