use super::utils::{get_credentials, login_interactively, print_credentials_help};
use liked_sorter::TokenPersistence;

pub async fn handle_login() -> Result<(), Box<dyn std::error::Error>> {
    let config = match get_credentials() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            eprintln!();
            print_credentials_help();
            return Err(e);
        }
    };

    login_interactively(config).await?;
    Ok(())
}

pub fn handle_logout() -> Result<(), Box<dyn std::error::Error>> {
    if !TokenPersistence::token_exists() {
        println!("No saved token, nothing to do");
        return Ok(());
    }
    TokenPersistence::remove_token()?;
    println!("👋 Logged out, saved token removed");
    Ok(())
}
