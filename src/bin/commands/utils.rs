use liked_sorter::config::{AUTH_TIMEOUT, DEFAULT_CALLBACK_PORT, DEFAULT_REDIRECT_URL};
use liked_sorter::{
    AccessToken, AuthConfig, Authenticator, CancellationState, FilterReport, SortReport,
    SpotifyClient, TokenPersistence,
};
use std::env;

/// Build the OAuth settings from environment variables.
pub fn get_credentials() -> Result<AuthConfig, Box<dyn std::error::Error>> {
    let client_id = env::var("SPOTIFY_CLIENT_ID")
        .map_err(|_| "SPOTIFY_CLIENT_ID environment variable not set")?;
    let client_secret = env::var("SPOTIFY_CLIENT_SECRET")
        .map_err(|_| "SPOTIFY_CLIENT_SECRET environment variable not set")?;
    let redirect_url =
        env::var("SPOTIFY_REDIRECT_URL").unwrap_or_else(|_| DEFAULT_REDIRECT_URL.to_string());
    let port = match env::var("SPOTIFY_CALLBACK_PORT") {
        Ok(port) => port
            .parse()
            .map_err(|e| format!("SPOTIFY_CALLBACK_PORT is not a port number: {e}"))?,
        Err(_) => DEFAULT_CALLBACK_PORT,
    };

    let config = AuthConfig::new(client_id, client_secret).with_redirect(redirect_url, port);
    config.validate()?;
    Ok(config)
}

pub fn print_credentials_help() {
    eprintln!("Please set the following environment variables (a .env file works too):");
    eprintln!("  SPOTIFY_CLIENT_ID=your_app_client_id");
    eprintln!("  SPOTIFY_CLIENT_SECRET=your_app_client_secret");
    eprintln!();
    eprintln!("Optionally, if your app uses a different redirect URI:");
    eprintln!("  SPOTIFY_REDIRECT_URL={DEFAULT_REDIRECT_URL}");
    eprintln!("  SPOTIFY_CALLBACK_PORT={DEFAULT_CALLBACK_PORT}");
}

fn new_authenticator(config: AuthConfig) -> Authenticator {
    Authenticator::new(config, Box::new(http_client::native::NativeClient::new()))
}

/// Run the browser consent flow and cache the resulting token.
pub async fn login_interactively(
    config: AuthConfig,
) -> Result<AccessToken, Box<dyn std::error::Error>> {
    let authenticator = new_authenticator(config);
    let url = authenticator.auth_url();

    println!("🌐 Opening your browser to log in to Spotify...");
    if let Err(e) = webbrowser::open(&url) {
        log::debug!("Could not open a browser: {e}");
    }
    println!("   If nothing opened, visit this URL:");
    println!("   {url}");
    println!(
        "⏳ Waiting up to {} minutes for the login to complete...",
        AUTH_TIMEOUT.as_secs() / 60
    );

    let token = authenticator.authorize(AUTH_TIMEOUT).await?;
    println!("✅ Login successful");
    save_token(&token);
    Ok(token)
}

fn save_token(token: &AccessToken) {
    println!("💾 Saving token for future use...");
    if let Err(e) = TokenPersistence::save_token(token) {
        println!("⚠️  Warning: Failed to save token: {e}");
        println!("   (You'll need to login again next time)");
    }
}

/// Load a cached token, refresh it if needed, or fall back to a fresh login.
///
/// 1. Try the token saved in the XDG data directory
/// 2. Refresh it if it has expired
/// 3. If there is no usable token, run the browser flow
/// 4. Save whatever token we end up with
pub async fn load_or_create_client(
    cancel: &CancellationState,
) -> Result<SpotifyClient, Box<dyn std::error::Error>> {
    let config = match get_credentials() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            eprintln!();
            print_credentials_help();
            return Err(e);
        }
    };

    let token = match restore_token(&config).await {
        Some(token) => token,
        None => {
            println!("🔐 No valid token found, starting login...");
            login_interactively(config).await?
        }
    };

    let http_client = http_client::native::NativeClient::new();
    Ok(SpotifyClient::new(Box::new(http_client), token.access_token)
        .with_cancellation(cancel.clone()))
}

async fn restore_token(config: &AuthConfig) -> Option<AccessToken> {
    if !TokenPersistence::token_exists() {
        return None;
    }

    let token = match TokenPersistence::load_token() {
        Ok(token) => token,
        Err(e) => {
            println!("❌ Failed to load saved token: {e}");
            let _ = TokenPersistence::remove_token();
            return None;
        }
    };

    if !token.is_expired() {
        log::debug!("Using cached token");
        return Some(token);
    }

    let refresh_token = token.refresh_token.as_deref()?;
    println!("🔄 Saved token expired, refreshing...");
    match new_authenticator(config.clone()).refresh(refresh_token).await {
        Ok(fresh) => {
            save_token(&fresh);
            Some(fresh)
        }
        Err(e) => {
            println!("❌ Token refresh failed: {e}");
            let _ = TokenPersistence::remove_token();
            None
        }
    }
}

pub fn print_sort_report(report: &SortReport) {
    println!();
    println!("📊 Sorted {} liked songs", report.total_tracks);
    for outcome in &report.years {
        let action = if outcome.created { "created" } else { "updated" };
        let cover = if outcome.cover_applied { "" } else { " (no cover)" };
        println!(
            "  {}: {action}, {} removed, {} added{cover}",
            outcome.year, outcome.removed, outcome.added
        );
    }
    if !report.skipped.is_empty() {
        println!("⚠️  Skipped {} tracks with unreadable dates:", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {} ({}): {}", skipped.name, skipped.added_at, skipped.reason);
        }
    }
}

pub fn print_filter_report(report: &FilterReport) {
    println!();
    println!(
        "📊 Scanned {} liked songs over {} pages",
        report.scanned, report.pages
    );
    if report.dry_run {
        println!("🔍 Dry run: {} tracks would be removed", report.marked);
    } else {
        println!("🗑️  Removed {} of {} matching tracks", report.removed, report.marked);
    }
    for failed in &report.failed_pages {
        println!(
            "  ❌ {} tracks at offset {} were not removed: {}",
            failed.ids.len(),
            failed.offset,
            failed.error
        );
    }
}
