#![allow(dead_code)]

use async_trait::async_trait;
use liked_sorter::{
    CoverImageGenerator, LibraryClient, Page, Playlist, PlaylistClient, PlaylistEntry,
    PlaylistImageClient, Result, SorterError, Track, User, UserClient,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub const USER_ID: &str = "me";

pub fn track(id: &str, artists: &[&str], added_at: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Song {id}"),
        artists: artists.iter().map(|a| a.to_string()).collect(),
        added_at: added_at.to_string(),
    }
}

pub fn entry(id: &str) -> PlaylistEntry {
    PlaylistEntry {
        track_id: Some(id.to_string()),
        name: Some(format!("Song {id}")),
    }
}

pub fn unavailable_entry() -> PlaylistEntry {
    PlaylistEntry {
        track_id: None,
        name: None,
    }
}

#[derive(Debug, Clone)]
pub struct FakePlaylist {
    pub playlist: Playlist,
    pub entries: Vec<PlaylistEntry>,
    pub image: Option<Vec<u8>>,
}

impl FakePlaylist {
    pub fn track_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| entry.track_id.clone())
            .collect()
    }
}

/// One recorded mutation or read against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListLiked { offset: u32, limit: u32 },
    RemoveFromLibrary(Vec<String>),
    ListPlaylists { offset: u32 },
    CreatePlaylist(String),
    ListPlaylistTracks { playlist_id: String, offset: u32 },
    AddToPlaylist { playlist_id: String, ids: Vec<String> },
    RemoveFromPlaylist { playlist_id: String, ids: Vec<String> },
    SetImage(String),
    CurrentUser,
}

impl Call {
    fn op(&self) -> &'static str {
        match self {
            Call::ListLiked { .. } => "list_liked_tracks",
            Call::RemoveFromLibrary(_) => "remove_from_library",
            Call::ListPlaylists { .. } => "list_user_playlists",
            Call::CreatePlaylist(_) => "create_playlist",
            Call::ListPlaylistTracks { .. } => "list_playlist_tracks",
            Call::AddToPlaylist { .. } => "add_to_playlist",
            Call::RemoveFromPlaylist { .. } => "remove_from_playlist",
            Call::SetImage(_) => "set_playlist_image",
            Call::CurrentUser => "current_user",
        }
    }
}

/// In-memory Spotify account implementing every client capability.
///
/// Failures are injected per operation name, either on the nth call
/// (1-based) or on every call.
pub struct FakeSpotify {
    pub user: User,
    pub liked: RefCell<Vec<Track>>,
    pub playlists: RefCell<Vec<FakePlaylist>>,
    pub calls: RefCell<Vec<Call>>,
    failures: RefCell<HashMap<&'static str, Option<usize>>>,
    counts: RefCell<HashMap<&'static str, usize>>,
    next_id: Cell<u32>,
}

impl FakeSpotify {
    pub fn new(liked: Vec<Track>) -> Self {
        Self {
            user: User {
                id: USER_ID.to_string(),
                display_name: Some("Test User".to_string()),
            },
            liked: RefCell::new(liked),
            playlists: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            failures: RefCell::new(HashMap::new()),
            counts: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn with_playlist(self, name: &str, owner_id: &str, entries: Vec<PlaylistEntry>) -> Self {
        let id = self.allocate_id();
        self.playlists.borrow_mut().push(FakePlaylist {
            playlist: Playlist {
                id,
                name: name.to_string(),
                owner_id: owner_id.to_string(),
            },
            entries,
            image: None,
        });
        self
    }

    /// Fail the `nth` call (1-based) of `op`.
    pub fn fail_nth(&self, op: &'static str, nth: usize) {
        self.failures.borrow_mut().insert(op, Some(nth));
    }

    /// Fail every call of `op`.
    pub fn fail_always(&self, op: &'static str) {
        self.failures.borrow_mut().insert(op, None);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.borrow().iter().filter(|call| call.op() == op).count()
    }

    pub fn playlist_named(&self, name: &str) -> Option<FakePlaylist> {
        self.playlists
            .borrow()
            .iter()
            .find(|p| p.playlist.name == name && p.playlist.owner_id == USER_ID)
            .cloned()
    }

    pub fn owned_playlists_named(&self, name: &str) -> usize {
        self.playlists
            .borrow()
            .iter()
            .filter(|p| p.playlist.name == name && p.playlist.owner_id == USER_ID)
            .count()
    }

    pub fn liked_ids(&self) -> Vec<String> {
        self.liked.borrow().iter().map(|t| t.id.clone()).collect()
    }

    fn allocate_id(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        format!("pl{id}")
    }

    fn record(&self, call: Call) -> Result<()> {
        let op = call.op();
        self.calls.borrow_mut().push(call);
        let mut counts = self.counts.borrow_mut();
        let count = counts.entry(op).or_insert(0);
        *count += 1;
        match self.failures.borrow().get(op) {
            Some(None) => Err(injected(op)),
            Some(Some(nth)) if *nth == *count => Err(injected(op)),
            _ => Ok(()),
        }
    }

    fn with_playlist_mut<T>(
        &self,
        playlist_id: &str,
        f: impl FnOnce(&mut FakePlaylist) -> T,
    ) -> Result<T> {
        let mut playlists = self.playlists.borrow_mut();
        let playlist = playlists
            .iter_mut()
            .find(|p| p.playlist.id == playlist_id)
            .ok_or_else(|| SorterError::Api {
                status: 404,
                message: "Not found.".to_string(),
            })?;
        Ok(f(playlist))
    }
}

fn injected(op: &str) -> SorterError {
    SorterError::Api {
        status: 500,
        message: format!("injected failure in {op}"),
    }
}

fn too_many(limit: usize) -> SorterError {
    SorterError::Api {
        status: 400,
        message: format!("Too many ids requested, maximum is {limit}"),
    }
}

fn page_of<T: Clone>(items: &[T], offset: u32, limit: u32) -> Page<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    Page::new(items[start..end].to_vec(), items.len() as u32)
}

#[async_trait(?Send)]
impl LibraryClient for FakeSpotify {
    async fn list_liked_tracks(&self, offset: u32, limit: u32) -> Result<Page<Track>> {
        self.record(Call::ListLiked { offset, limit })?;
        Ok(page_of(&self.liked.borrow(), offset, limit))
    }

    async fn remove_from_library(&self, ids: &[String]) -> Result<()> {
        self.record(Call::RemoveFromLibrary(ids.to_vec()))?;
        if ids.len() > 50 {
            return Err(too_many(50));
        }
        self.liked
            .borrow_mut()
            .retain(|track| !ids.contains(&track.id));
        Ok(())
    }
}

#[async_trait(?Send)]
impl PlaylistClient for FakeSpotify {
    async fn list_user_playlists(
        &self,
        _user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Playlist>> {
        self.record(Call::ListPlaylists { offset })?;
        let playlists: Vec<Playlist> = self
            .playlists
            .borrow()
            .iter()
            .map(|p| p.playlist.clone())
            .collect();
        Ok(page_of(&playlists, offset, limit))
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        _description: &str,
        _public: bool,
        _collaborative: bool,
    ) -> Result<Playlist> {
        self.record(Call::CreatePlaylist(name.to_string()))?;
        let playlist = Playlist {
            id: self.allocate_id(),
            name: name.to_string(),
            owner_id: user_id.to_string(),
        };
        self.playlists.borrow_mut().push(FakePlaylist {
            playlist: playlist.clone(),
            entries: Vec::new(),
            image: None,
        });
        Ok(playlist)
    }

    async fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<PlaylistEntry>> {
        self.record(Call::ListPlaylistTracks {
            playlist_id: playlist_id.to_string(),
            offset,
        })?;
        self.with_playlist_mut(playlist_id, |p| page_of(&p.entries, offset, limit))
    }

    async fn add_to_playlist(&self, playlist_id: &str, ids: &[String]) -> Result<()> {
        self.record(Call::AddToPlaylist {
            playlist_id: playlist_id.to_string(),
            ids: ids.to_vec(),
        })?;
        if ids.len() > 100 {
            return Err(too_many(100));
        }
        self.with_playlist_mut(playlist_id, |p| {
            p.entries.extend(ids.iter().map(|id| entry(id)));
        })
    }

    async fn remove_from_playlist(&self, playlist_id: &str, ids: &[String]) -> Result<()> {
        self.record(Call::RemoveFromPlaylist {
            playlist_id: playlist_id.to_string(),
            ids: ids.to_vec(),
        })?;
        if ids.len() > 100 {
            return Err(too_many(100));
        }
        self.with_playlist_mut(playlist_id, |p| {
            p.entries.retain(|entry| match &entry.track_id {
                Some(id) => !ids.contains(id),
                None => true,
            });
        })
    }
}

#[async_trait(?Send)]
impl PlaylistImageClient for FakeSpotify {
    async fn set_playlist_image(&self, playlist_id: &str, jpeg: &[u8]) -> Result<()> {
        self.record(Call::SetImage(playlist_id.to_string()))?;
        let jpeg = jpeg.to_vec();
        self.with_playlist_mut(playlist_id, |p| p.image = Some(jpeg))
    }
}

#[async_trait(?Send)]
impl UserClient for FakeSpotify {
    async fn current_user(&self) -> Result<User> {
        self.record(Call::CurrentUser)?;
        Ok(self.user.clone())
    }
}

/// Returns a fixed JPEG-looking payload tagged with the seed name.
pub struct StubCovers;

impl CoverImageGenerator for StubCovers {
    fn generate(&self, seed_name: &str) -> Result<Vec<u8>> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(seed_name.as_bytes());
        Ok(bytes)
    }
}

pub struct BrokenCovers;

impl CoverImageGenerator for BrokenCovers {
    fn generate(&self, _seed_name: &str) -> Result<Vec<u8>> {
        Err(SorterError::Image("renderer unavailable".to_string()))
    }
}
