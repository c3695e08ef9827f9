use super::utils::{load_or_create_client, print_sort_report};
use liked_sorter::{
    CancellationState, PlaylistSorter, SortOptions, UserClient, WaveCoverGenerator,
};

pub async fn handle_sort(
    cancel: &CancellationState,
    no_covers: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = load_or_create_client(cancel).await?;

    let user = client.current_user().await?;
    println!("👤 Logged in as {user}");

    let mut options = SortOptions::default();
    if no_covers {
        options = options.without_covers();
    }

    let sorter = PlaylistSorter::with_options(&client, WaveCoverGenerator::new(), options);
    let report = sorter.run(cancel).await?;
    print_sort_report(&report);
    println!("✅ Liked songs sorting complete!");
    Ok(())
}
