use crate::cancel::CancellationState;
use crate::config::ClientConfig;
use crate::r#trait::{LibraryClient, PlaylistClient, PlaylistImageClient, UserClient};
use crate::retry::retry_with_backoff;
use crate::{Page, Playlist, PlaylistEntry, Result, SorterError, Track, User};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use http_client::{HttpClient, Request, Response};
use http_types::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Largest cover upload the API accepts, measured on the base64 body.
pub const MAX_COVER_UPLOAD_BYTES: usize = 256 * 1024;

/// Client for the Spotify Web API.
///
/// Implements every capability trait the processors consume. Rate limited
/// requests (HTTP 429) are retried with backoff according to the
/// [`ClientConfig`]'s retry settings; waits stop early when the attached
/// [`CancellationState`] is cancelled.
///
/// # Examples
///
/// ```rust,no_run
/// use liked_sorter::{SpotifyClient, UserClient};
///
/// # tokio_test::block_on(async {
/// let http_client = http_client::native::NativeClient::new();
/// let client = SpotifyClient::new(Box::new(http_client), "access-token");
/// let me = client.current_user().await?;
/// println!("Logged in as {me}");
/// # Ok::<(), liked_sorter::SorterError>(())
/// # });
/// ```
#[derive(Clone)]
pub struct SpotifyClient {
    client: Arc<dyn HttpClient + Send + Sync>,
    access_token: String,
    config: ClientConfig,
    cancel: CancellationState,
}

enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Jpeg(String),
}

impl SpotifyClient {
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, access_token: impl Into<String>) -> Self {
        Self::with_config(client, access_token, ClientConfig::default())
    }

    pub fn with_config(
        client: Box<dyn HttpClient + Send + Sync>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Self {
        Self {
            client: Arc::from(client),
            access_token: access_token.into(),
            config,
            cancel: CancellationState::new(),
        }
    }

    /// Tie rate-limit waits to the given run's cancellation and deadline.
    pub fn with_cancellation(mut self, cancel: CancellationState) -> Self {
        self.cancel = cancel;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.request(Method::Get, path, RequestBody::Empty).await?;
        parse_json(&body)
    }

    async fn request(&self, method: Method, path: &str, body: RequestBody) -> Result<String> {
        let url = self.url(path);
        let url = url.as_str();
        let body = &body;
        let label = format!("{method} {path}");
        let outcome = retry_with_backoff(&self.config.retry_config, &self.cancel, &label, move || {
            self.send_once(method, url, body)
        })
        .await?;
        if outcome.attempts_made > 0 {
            log::debug!(
                "{label} succeeded after {} retries ({}s waiting)",
                outcome.attempts_made,
                outcome.total_retry_time
            );
        }
        Ok(outcome.result)
    }

    async fn send_once(&self, method: Method, url: &str, body: &RequestBody) -> Result<String> {
        let parsed = url
            .parse::<Url>()
            .map_err(|e| SorterError::Http(format!("Invalid URL '{url}': {e}")))?;
        let mut request = Request::new(method, parsed);
        request.insert_header("Authorization", &format!("Bearer {}", self.access_token));
        request.insert_header("Accept", "application/json");
        match body {
            RequestBody::Empty => {}
            RequestBody::Json(value) => {
                request.set_body(value.to_string());
                request.insert_header("Content-Type", "application/json");
            }
            RequestBody::Jpeg(encoded) => {
                request.set_body(encoded.clone());
                request.insert_header("Content-Type", "image/jpeg");
            }
        }

        log::debug!("{method} {url}");
        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| SorterError::Http(e.to_string()))?;
        let status: u16 = response.status().into();
        log::debug!("{method} {url} -> {status}");

        if status == 429 {
            return Err(SorterError::RateLimit {
                retry_after: retry_after_seconds(&response),
            });
        }

        let text = response
            .body_string()
            .await
            .map_err(|e| SorterError::Http(e.to_string()))?;

        if response.status().is_success() {
            return Ok(text);
        }

        let message = api_error_message(&text)
            .unwrap_or_else(|| response.status().canonical_reason().to_string());
        if status == 401 {
            return Err(SorterError::Auth(message));
        }
        Err(SorterError::Api { status, message })
    }
}

fn retry_after_seconds(response: &Response) -> u64 {
    response
        .header("Retry-After")
        .and_then(|values| values.last().as_str().trim().parse::<u64>().ok())
        .unwrap_or(1)
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| SorterError::Parse(e.to_string()))
}

fn api_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ApiErrorBody {
        error: ApiErrorDetail,
    }
    #[derive(Deserialize)]
    struct ApiErrorDetail {
        message: String,
    }
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

fn track_uri(id: &str) -> String {
    format!("spotify:track:{id}")
}

fn paging_query(offset: u32, limit: u32) -> String {
    format!("offset={offset}&limit={limit}")
}

#[derive(Deserialize)]
struct ApiPaging<T> {
    items: Vec<T>,
    total: u32,
}

#[derive(Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Deserialize)]
struct ApiTrack {
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

#[derive(Deserialize)]
struct ApiSavedTrack {
    added_at: String,
    track: ApiTrack,
}

#[derive(Deserialize)]
struct ApiOwner {
    id: String,
}

#[derive(Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
    owner: ApiOwner,
}

#[derive(Deserialize)]
struct ApiPlaylistItem {
    track: Option<ApiTrack>,
}

#[derive(Deserialize)]
struct ApiUser {
    id: String,
    display_name: Option<String>,
}

impl From<ApiPlaylist> for Playlist {
    fn from(playlist: ApiPlaylist) -> Self {
        Playlist {
            id: playlist.id,
            name: playlist.name,
            owner_id: playlist.owner.id,
        }
    }
}

fn saved_tracks_page(paging: ApiPaging<ApiSavedTrack>) -> Page<Track> {
    let returned = paging.items.len() as u32;
    let items = paging
        .items
        .into_iter()
        .filter_map(|saved| {
            let Some(id) = saved.track.id else {
                log::debug!("Liked track '{}' has no id, ignoring", saved.track.name);
                return None;
            };
            Some(Track {
                id,
                name: saved.track.name,
                artists: saved.track.artists.into_iter().map(|a| a.name).collect(),
                added_at: saved.added_at,
            })
        })
        .collect();
    Page::with_returned(items, paging.total, returned)
}

fn playlist_entries_page(paging: ApiPaging<ApiPlaylistItem>) -> Page<PlaylistEntry> {
    let items = paging
        .items
        .into_iter()
        .map(|item| match item.track {
            Some(track) => PlaylistEntry {
                track_id: track.id,
                name: Some(track.name),
            },
            None => PlaylistEntry {
                track_id: None,
                name: None,
            },
        })
        .collect();
    Page::new(items, paging.total)
}

#[async_trait(?Send)]
impl LibraryClient for SpotifyClient {
    async fn list_liked_tracks(&self, offset: u32, limit: u32) -> Result<Page<Track>> {
        let paging: ApiPaging<ApiSavedTrack> = self
            .get_json(&format!("/me/tracks?{}", paging_query(offset, limit)))
            .await?;
        Ok(saved_tracks_page(paging))
    }

    async fn remove_from_library(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.request(Method::Delete, "/me/tracks", RequestBody::Json(json!({ "ids": ids })))
            .await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl PlaylistClient for SpotifyClient {
    async fn list_user_playlists(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Playlist>> {
        let paging: ApiPaging<ApiPlaylist> = self
            .get_json(&format!(
                "/users/{}/playlists?{}",
                urlencoding::encode(user_id),
                paging_query(offset, limit)
            ))
            .await?;
        Ok(Page::new(
            paging.items.into_iter().map(Playlist::from).collect(),
            paging.total,
        ))
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
        collaborative: bool,
    ) -> Result<Playlist> {
        let body = json!({
            "name": name,
            "description": description,
            "public": public,
            "collaborative": collaborative,
        });
        let text = self
            .request(
                Method::Post,
                &format!("/users/{}/playlists", urlencoding::encode(user_id)),
                RequestBody::Json(body),
            )
            .await?;
        let playlist: ApiPlaylist = parse_json(&text)?;
        Ok(playlist.into())
    }

    async fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<PlaylistEntry>> {
        let paging: ApiPaging<ApiPlaylistItem> = self
            .get_json(&format!(
                "/playlists/{}/tracks?{}&fields=total,items(track(id,name))",
                urlencoding::encode(playlist_id),
                paging_query(offset, limit)
            ))
            .await?;
        Ok(playlist_entries_page(paging))
    }

    async fn add_to_playlist(&self, playlist_id: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let uris: Vec<String> = ids.iter().map(|id| track_uri(id)).collect();
        self.request(
            Method::Post,
            &format!("/playlists/{}/tracks", urlencoding::encode(playlist_id)),
            RequestBody::Json(json!({ "uris": uris })),
        )
        .await?;
        Ok(())
    }

    async fn remove_from_playlist(&self, playlist_id: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let tracks: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| json!({ "uri": track_uri(id) }))
            .collect();
        self.request(
            Method::Delete,
            &format!("/playlists/{}/tracks", urlencoding::encode(playlist_id)),
            RequestBody::Json(json!({ "tracks": tracks })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl PlaylistImageClient for SpotifyClient {
    async fn set_playlist_image(&self, playlist_id: &str, jpeg: &[u8]) -> Result<()> {
        let encoded = general_purpose::STANDARD.encode(jpeg);
        if encoded.len() > MAX_COVER_UPLOAD_BYTES {
            return Err(SorterError::Image(format!(
                "cover is {} bytes encoded, limit is {MAX_COVER_UPLOAD_BYTES}",
                encoded.len()
            )));
        }
        self.request(
            Method::Put,
            &format!("/playlists/{}/images", urlencoding::encode(playlist_id)),
            RequestBody::Jpeg(encoded),
        )
        .await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl UserClient for SpotifyClient {
    async fn current_user(&self) -> Result<User> {
        let user: ApiUser = self.get_json("/me").await?;
        Ok(User {
            id: user.id,
            display_name: user.display_name,
        })
    }
}
