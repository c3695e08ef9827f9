use crate::batcher::{LIBRARY_REMOVE_LIMIT, PLAYLIST_ADD_LIMIT, PLAYLIST_REMOVE_LIMIT};
use crate::locator::PLAYLIST_PAGE_SIZE;
use crate::retry::RetryConfig;
use crate::{Result, SorterError};
use std::time::Duration;

/// Scopes needed to read the library, prune it, and manage playlists and their covers.
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-library-read",
    "user-library-modify",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
    "ugc-image-upload",
];

pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/callback";
pub const DEFAULT_CALLBACK_PORT: u16 = 3000;

/// How long the user has to complete the browser consent flow.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Default budget for one processing run.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// OAuth application settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Local port the callback listener binds to; must match `redirect_url`.
    pub port: u16,
    pub scopes: Vec<String>,
    pub accounts_url: String,
}

impl AuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            port: DEFAULT_CALLBACK_PORT,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            accounts_url: "https://accounts.spotify.com".to_string(),
        }
    }

    pub fn with_redirect(mut self, redirect_url: impl Into<String>, port: u16) -> Self {
        self.redirect_url = redirect_url.into();
        self.port = port;
        self
    }

    /// Reject empty credentials before any network traffic happens.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(SorterError::Config(
                "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set".to_string(),
            ));
        }
        if !self.redirect_url.contains(&format!(":{}/", self.port)) {
            log::warn!(
                "Redirect URL '{}' doesn't mention callback port {}",
                self.redirect_url,
                self.port
            );
        }
        Ok(())
    }
}

/// Settings for the Web API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub retry_config: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com/v1".to_string(),
            retry_config: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }
}

/// Tunables for the year playlist sorter.
#[derive(Debug, Clone)]
pub struct SortOptions {
    pub liked_page_size: u32,
    pub playlist_page_size: u32,
    pub playlist_items_page_size: u32,
    pub remove_batch_size: usize,
    pub add_batch_size: usize,
    pub public: bool,
    pub collaborative: bool,
    /// Generate and upload a cover image for every year playlist.
    pub apply_covers: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            liked_page_size: 50,
            playlist_page_size: PLAYLIST_PAGE_SIZE,
            playlist_items_page_size: 100,
            remove_batch_size: PLAYLIST_REMOVE_LIMIT,
            add_batch_size: PLAYLIST_ADD_LIMIT,
            public: false,
            collaborative: false,
            apply_covers: true,
        }
    }
}

impl SortOptions {
    pub fn playlist_name(year: i32) -> String {
        format!("Liked Songs ({year})")
    }

    pub fn playlist_description(year: i32) -> String {
        format!("All songs I liked that were added in {year}.")
    }

    pub fn without_covers(mut self) -> Self {
        self.apply_covers = false;
        self
    }
}

/// How the artist filter moves through the library while removing from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stride {
    /// Step back by the number of tracks removed from each page, so tracks
    /// that shift forward into the gap are still visited.
    #[default]
    Compensated,
    /// Always advance by the page size and stop once past the first reported
    /// total. Tracks can be skipped when earlier pages shrink.
    Fixed,
}

/// Tunables for the artist filter.
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Tracks per page; capped at the library removal limit so each page
    /// needs a single removal call.
    pub page_size: u32,
    pub stride: Stride,
    /// Report what would be removed without removing anything.
    pub dry_run: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            page_size: LIBRARY_REMOVE_LIMIT as u32,
            stride: Stride::default(),
            dry_run: false,
        }
    }
}

impl FilterOptions {
    pub(crate) fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, LIBRARY_REMOVE_LIMIT as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        assert_eq!(SortOptions::playlist_name(2023), "Liked Songs (2023)");
        assert_eq!(
            SortOptions::playlist_description(2023),
            "All songs I liked that were added in 2023."
        );
    }

    #[test]
    fn test_auth_config_requires_credentials() {
        assert!(matches!(
            AuthConfig::new("", "secret").validate(),
            Err(SorterError::Config(_))
        ));
        assert!(AuthConfig::new("id", "secret").validate().is_ok());
    }

    #[test]
    fn test_filter_page_size_is_capped() {
        let options = FilterOptions {
            page_size: 500,
            ..FilterOptions::default()
        };
        assert_eq!(options.effective_page_size(), 50);
    }
}
