use crate::{Page, Playlist, PlaylistEntry, Result, Track, User};
use async_trait::async_trait;

/// Access to the user's saved-tracks library.
///
/// The capability traits in this module are deliberately narrow so that each
/// processor depends only on what it calls, and so that tests can substitute
/// an in-memory fake or a `mockall` mock for any one of them.
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockLibraryClient`,
/// `MockPlaylistClient`, `MockPlaylistImageClient` and `MockUserClient`.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait LibraryClient {
    /// Fetch one page of liked tracks, most recently saved first.
    async fn list_liked_tracks(&self, offset: u32, limit: u32) -> Result<Page<Track>>;

    /// Remove tracks from the library. At most 50 ids per call.
    async fn remove_from_library(&self, ids: &[String]) -> Result<()>;
}

/// Reading and mutating playlists.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait PlaylistClient {
    /// Fetch one page of the playlists in a user's collection.
    ///
    /// The collection includes playlists the user follows, so entries may be
    /// owned by other users.
    async fn list_user_playlists(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Playlist>>;

    /// Create a playlist owned by `user_id`.
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
        collaborative: bool,
    ) -> Result<Playlist>;

    /// Fetch one page of a playlist's entries.
    async fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<PlaylistEntry>>;

    /// Append tracks to a playlist. At most 100 ids per call.
    async fn add_to_playlist(&self, playlist_id: &str, ids: &[String]) -> Result<()>;

    /// Remove every occurrence of the given tracks. At most 100 ids per call.
    async fn remove_from_playlist(&self, playlist_id: &str, ids: &[String]) -> Result<()>;
}

/// Uploading playlist cover images.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait PlaylistImageClient {
    /// Replace a playlist's cover with the given JPEG bytes.
    async fn set_playlist_image(&self, playlist_id: &str, jpeg: &[u8]) -> Result<()>;
}

/// Profile of the authenticated user.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait UserClient {
    async fn current_user(&self) -> Result<User>;
}

/// Everything the playlist sorter needs from the remote side.
pub trait SpotifyApi: LibraryClient + PlaylistClient + PlaylistImageClient + UserClient {}

impl<T> SpotifyApi for T where
    T: LibraryClient + PlaylistClient + PlaylistImageClient + UserClient + ?Sized
{
}

/// Produces cover art for a playlist.
///
/// Implementations must be deterministic in `seed_name`: the same name yields
/// the same image on every run.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait CoverImageGenerator {
    /// Render a JPEG for the playlist named `seed_name`.
    fn generate(&self, seed_name: &str) -> Result<Vec<u8>>;
}

