use crate::auth::AccessToken;
use crate::{Result, SorterError};
use std::fs;
use std::path::{Path, PathBuf};

/// Token cache in the XDG data directory.
///
/// A single token is kept at `~/.local/share/liked-sorter/token.json`, so the
/// browser consent flow only runs again after `logout` or a failed refresh.
pub struct TokenPersistence;

impl TokenPersistence {
    /// Get the token file path using XDG directories.
    pub fn token_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SorterError::Config("Cannot determine XDG data directory".to_string()))?;

        Ok(data_dir.join("liked-sorter").join("token.json"))
    }

    pub fn save_token(token: &AccessToken) -> Result<()> {
        Self::save_token_to(&Self::token_path()?, token)
    }

    /// Save a token to an explicit path, creating parent directories as needed.
    pub fn save_token_to(path: &Path, token: &AccessToken) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SorterError::Config(format!("Failed to create token directory: {e}"))
            })?;
        }

        let token_json = token
            .to_json()
            .map_err(|e| SorterError::Parse(format!("Failed to serialize token: {e}")))?;

        fs::write(path, token_json)?;
        restrict_permissions(path)?;

        log::debug!("Token saved to: {}", path.display());
        Ok(())
    }

    pub fn load_token() -> Result<AccessToken> {
        Self::load_token_from(&Self::token_path()?)
    }

    pub fn load_token_from(path: &Path) -> Result<AccessToken> {
        if !path.exists() {
            return Err(SorterError::Auth(format!(
                "No saved token found at {}",
                path.display()
            )));
        }

        let token_json = fs::read_to_string(path)?;
        let token = AccessToken::from_json(&token_json)
            .map_err(|e| SorterError::Parse(format!("Failed to parse token JSON: {e}")))?;

        log::debug!("Token loaded from: {}", path.display());
        Ok(token)
    }

    /// Check if a cached token exists.
    pub fn token_exists() -> bool {
        match Self::token_path() {
            Ok(path) => path.exists(),
            Err(_) => false,
        }
    }

    pub fn remove_token() -> Result<()> {
        Self::remove_token_at(&Self::token_path()?)
    }

    /// Delete the token file. A missing file is not an error.
    pub fn remove_token_at(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)?;
            log::debug!("Token removed from: {}", path.display());
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
