//! Keep a Spotify library organised.
//!
//! Two processors live here: [`PlaylistSorter`] mirrors liked songs into one
//! playlist per year saved, and [`ArtistTrackRemover`] prunes liked songs by
//! blocked artists. Both talk to Spotify through the narrow capability traits
//! in [`r#trait`], implemented over HTTP by [`SpotifyClient`].

pub mod artist_filter;
pub mod auth;
pub mod batcher;
pub mod cancel;
pub mod classifier;
pub mod client;
pub mod config;
pub mod cover;
pub mod error;
pub mod locator;
pub mod pager;
pub mod retry;
pub mod sorter;
pub mod token_persistence;
pub mod r#trait;
pub mod types;

pub use artist_filter::{ArtistTrackRemover, Blocklist, FailedPage, FilterReport};
pub use auth::{AccessToken, Authenticator};
pub use cancel::CancellationState;
pub use classifier::{SkippedTrack, YearBuckets};
pub use client::SpotifyClient;
pub use config::{AuthConfig, ClientConfig, FilterOptions, SortOptions, Stride};
pub use cover::WaveCoverGenerator;
pub use error::{SorterError, Stage};
pub use locator::find_playlist;
pub use pager::OffsetPager;
pub use retry::RetryConfig;
pub use sorter::{PlaylistSorter, SortReport, YearOutcome};
pub use token_persistence::TokenPersistence;
pub use r#trait::{
    CoverImageGenerator, LibraryClient, PlaylistClient, PlaylistImageClient, SpotifyApi,
    UserClient,
};
pub use types::{Page, Playlist, PlaylistEntry, Track, User};

#[cfg(feature = "mock")]
pub use r#trait::{
    MockCoverImageGenerator, MockLibraryClient, MockPlaylistClient, MockPlaylistImageClient,
    MockUserClient,
};

pub type Result<T> = std::result::Result<T, SorterError>;
