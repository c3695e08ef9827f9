pub mod login;
pub mod remove_artists;
pub mod sort;
pub mod utils;

use clap::{arg, Subcommand};
use liked_sorter::CancellationState;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Sort liked songs into one playlist per year
    ///
    /// For every year present in your library this finds or creates the
    /// playlist "Liked Songs (<year>)", empties it, gives it a generated
    /// cover and fills it with the songs you liked that year.
    ///
    /// Usage examples:
    /// # Sort everything
    /// liked-sorter sort
    ///
    /// # Sort without touching cover images
    /// liked-sorter sort --no-covers
    Sort {
        /// Skip generating and uploading cover images
        #[arg(long)]
        no_covers: bool,
    },

    /// Remove liked songs by the given artists
    ///
    /// A track is removed when any of its credited artists matches a name
    /// exactly.
    ///
    /// Usage examples:
    /// # Preview what would be removed
    /// liked-sorter remove-artists "Some Band" --dry-run
    ///
    /// # Read the blocklist from a file, one artist per line
    /// liked-sorter remove-artists --from-file blocked.txt
    RemoveArtists {
        /// Artist names to remove
        artists: Vec<String>,

        /// File with one artist per line; blank lines and # comments are ignored
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Report matches without removing anything
        #[arg(long)]
        dry_run: bool,

        /// Advance by whole pages even after removals
        #[arg(long)]
        fixed_stride: bool,
    },

    /// Authenticate with Spotify and cache the token
    Login,

    /// Forget the cached token
    Logout,
}

pub async fn execute_command(
    command: Commands,
    cancel: &CancellationState,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Sort { no_covers } => sort::handle_sort(cancel, no_covers).await,
        Commands::RemoveArtists {
            artists,
            from_file,
            dry_run,
            fixed_stride,
        } => {
            remove_artists::handle_remove_artists(
                cancel,
                artists,
                from_file,
                dry_run,
                fixed_stride,
            )
            .await
        }
        Commands::Login => login::handle_login().await,
        Commands::Logout => login::handle_logout(),
    }
}
