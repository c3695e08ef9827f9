use super::utils::{load_or_create_client, print_filter_report};
use liked_sorter::{
    ArtistTrackRemover, Blocklist, CancellationState, FilterOptions, Stride, UserClient,
};
use std::path::PathBuf;

pub async fn handle_remove_artists(
    cancel: &CancellationState,
    artists: Vec<String>,
    from_file: Option<PathBuf>,
    dry_run: bool,
    fixed_stride: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut blocklist = Blocklist::new(artists);
    if let Some(path) = from_file {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        blocklist.extend(Blocklist::parse_lines(&text));
    }
    if blocklist.is_empty() {
        return Err("No artists given. Pass names or --from-file.".into());
    }
    println!("🚫 Removing liked songs by {} artists", blocklist.len());

    let client = load_or_create_client(cancel).await?;
    let user = client.current_user().await?;
    println!("👤 Logged in as {user}");

    let options = FilterOptions {
        stride: if fixed_stride {
            Stride::Fixed
        } else {
            Stride::Compensated
        },
        dry_run,
        ..FilterOptions::default()
    };
    let remover = ArtistTrackRemover::with_options(&client, blocklist, options);
    let report = remover.run(cancel).await?;
    print_filter_report(&report);
    Ok(())
}
