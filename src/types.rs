use serde::{Deserialize, Serialize};
use std::fmt;

/// A saved ("liked") track from the user's library.
///
/// `added_at` is kept as the raw ISO-8601 string the API returned; parsing
/// happens during classification so that a malformed value skips one track
/// instead of failing the whole fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog identifier (the part after `spotify:track:`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Artist display names, in credit order
    pub artists: Vec<String>,
    /// When the track was saved to the library
    pub added_at: String,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artists.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} - {}", self.artists.join(", "), self.name)
        }
    }
}

/// A playlist as listed in a user's playlist collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

impl Playlist {
    /// Exact, case-sensitive name match owned by `owner_id`.
    pub fn matches(&self, name: &str, owner_id: &str) -> bool {
        self.name == name && self.owner_id == owner_id
    }
}

/// One entry of a playlist's contents.
///
/// `track_id` is `None` when the entry can't be addressed by id: local files,
/// tracks removed from the catalog, or region-restricted items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub track_id: Option<String>,
    pub name: Option<String>,
}

impl PlaylistEntry {
    /// The id usable in a removal call, if any.
    pub fn removable_id(&self) -> Option<&str> {
        self.track_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name.as_deref().unwrap_or(&self.id))
    }
}

/// A single page of an offset-paginated collection.
///
/// `total` is whatever the server reported for this request; it may be stale
/// while the collection is being modified, so pagination never trusts it alone.
///
/// `returned` counts the entries the server sent, including any the client
/// discarded while converting them (tracks without an id, for instance). The
/// pager advances by this count so offsets stay aligned with the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub returned: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u32) -> Self {
        let returned = items.len() as u32;
        Self {
            items,
            total,
            returned,
        }
    }

    /// A page where `returned` server entries were reduced to `items`.
    pub fn with_returned(items: Vec<T>, total: u32, returned: u32) -> Self {
        Self {
            items,
            total,
            returned,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}
