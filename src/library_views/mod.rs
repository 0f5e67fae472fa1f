//! Live, preference-driven views over the library.
//!
//! A view follows its preference tuple: each distinct tuple selects a source
//! through [`EntityQueryRouter`] and the [`ListController`] switches to it,
//! dropping the previous one. The downloaded-songs source joins the song list
//! with the download map in [`download_joiner`].

pub mod download_joiner;
mod controller;
mod router;
mod views;

pub use controller::{ListController, LiveController};
pub use download_joiner::join_downloaded;
pub use router::EntityQueryRouter;
pub use views::{ArtistDetailView, LibraryViews, MixView, PlaylistsView, TOP_SONGS_LIMIT};
