use crate::cancel::CancellationState;
use crate::pager::OffsetPager;
use crate::r#trait::PlaylistClient;
use crate::{Playlist, Result};

/// Page size used when scanning a user's playlists.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Find the first playlist in `owner_id`'s collection named exactly `name`
/// and owned by `owner_id`.
///
/// Pages are scanned lazily and the search stops at the first match. Name
/// comparison is byte-for-byte: a playlist renamed by hand is a different
/// playlist. Returns `Ok(None)` when the collection holds no match.
pub async fn find_playlist<C>(
    client: &C,
    cancel: &CancellationState,
    owner_id: &str,
    name: &str,
    page_size: u32,
) -> Result<Option<Playlist>>
where
    C: PlaylistClient + ?Sized,
{
    log::info!("Searching for existing playlist named '{name}'...");

    let mut pager = OffsetPager::new(page_size, move |offset, limit| {
        client.list_user_playlists(owner_id, offset, limit)
    });

    while let Some(page) = pager.next_page(cancel).await? {
        if let Some(found) = page.into_iter().find(|p| p.matches(name, owner_id)) {
            log::info!("Found existing playlist: '{}' (ID: {})", found.name, found.id);
            return Ok(Some(found));
        }
    }

    log::info!("No existing playlist found.");
    Ok(None)
}
