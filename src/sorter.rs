use crate::batcher::{batch_count, batches};
use crate::cancel::CancellationState;
use crate::classifier::{SkippedTrack, YearBuckets};
use crate::config::SortOptions;
use crate::locator::find_playlist;
use crate::pager::OffsetPager;
use crate::r#trait::{
    CoverImageGenerator, LibraryClient, PlaylistClient, PlaylistImageClient, SpotifyApi, UserClient,
};
use crate::{Playlist, PlaylistEntry, Result, SorterError, Stage, User};
use std::collections::HashSet;

/// What happened to one year's playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOutcome {
    pub year: i32,
    pub playlist_id: String,
    /// True when the playlist didn't exist and was created this run.
    pub created: bool,
    /// Distinct tracks removed while clearing an existing playlist.
    pub removed: usize,
    /// Tracks added during the fill.
    pub added: usize,
    pub cover_applied: bool,
}

/// Summary of a full sorter run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortReport {
    pub total_tracks: usize,
    pub years: Vec<YearOutcome>,
    pub skipped: Vec<SkippedTrack>,
}

/// Sorts liked songs into one playlist per year saved.
///
/// For every year present in the library, in ascending order, the sorter
/// locates `"Liked Songs (<year>)"` owned by the current user (creating it if
/// missing), clears its contents, applies a cover image, and refills it with
/// exactly that year's tracks.
///
/// The run is fail-fast: any remote failure stops it with a
/// [`SorterError::Reconcile`] naming the year and stage, leaving later years
/// untouched. Re-running converges, since the located playlist is simply
/// cleared and refilled again. Cover failures are the exception; they are
/// logged and never stop a year.
pub struct PlaylistSorter<'a, C: ?Sized, G> {
    client: &'a C,
    covers: G,
    options: SortOptions,
}

impl<'a, C, G> PlaylistSorter<'a, C, G>
where
    C: SpotifyApi + ?Sized,
    G: CoverImageGenerator,
{
    pub fn new(client: &'a C, covers: G) -> Self {
        Self::with_options(client, covers, SortOptions::default())
    }

    pub fn with_options(client: &'a C, covers: G, options: SortOptions) -> Self {
        Self {
            client,
            covers,
            options,
        }
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    /// Fetch the library, group it by year and reconcile each year's playlist.
    pub async fn run(&self, cancel: &CancellationState) -> Result<SortReport> {
        log::info!("Starting liked songs sorter...");

        let client = self.client;
        let mut liked = OffsetPager::new(self.options.liked_page_size, move |offset, limit| {
            client.list_liked_tracks(offset, limit)
        });
        let tracks = liked
            .collect_all(cancel)
            .await
            .map_err(|e| SorterError::setup("fetching liked tracks", e))?;
        log::info!("Total liked songs fetched: {}", tracks.len());

        if tracks.is_empty() {
            log::info!("No liked tracks found. Nothing to do.");
            return Ok(SortReport::default());
        }

        let buckets = YearBuckets::classify(&tracks);
        let total_tracks = tracks.len();
        drop(tracks);

        let user = self
            .client
            .current_user()
            .await
            .map_err(|e| SorterError::setup("fetching current user", e))?;

        let years = buckets.years();
        log::info!("Found songs spanning {} years: {:?}", years.len(), years);

        let (grouped, skipped) = buckets.into_parts();
        let mut report = SortReport {
            total_tracks,
            years: Vec::with_capacity(grouped.len()),
            skipped,
        };

        for (year, track_ids) in grouped {
            log::info!("--- Processing year {year} ({} tracks) ---", track_ids.len());
            let outcome = self.reconcile_year(cancel, &user, year, &track_ids).await?;
            report.years.push(outcome);
        }

        Ok(report)
    }

    /// Converge the playlist for `year` to exactly `track_ids`.
    pub async fn reconcile_year(
        &self,
        cancel: &CancellationState,
        user: &User,
        year: i32,
        track_ids: &[String],
    ) -> Result<YearOutcome> {
        let name = SortOptions::playlist_name(year);

        let existing = find_playlist(
            self.client,
            cancel,
            &user.id,
            &name,
            self.options.playlist_page_size,
        )
        .await
        .map_err(|e| SorterError::reconcile(year, Stage::Locate, e))?;

        let (playlist, created, removed) = match existing {
            Some(playlist) => {
                log::info!("Found existing playlist: '{}'. Clearing it now.", playlist.name);
                let removed = self
                    .clear(cancel, &playlist)
                    .await
                    .map_err(|e| SorterError::reconcile(year, Stage::Clear, e))?;
                (playlist, false, removed)
            }
            None => {
                let playlist = self
                    .create(cancel, user, year, &name)
                    .await
                    .map_err(|e| SorterError::reconcile(year, Stage::Create, e))?;
                (playlist, true, 0)
            }
        };

        let cover_applied = self.apply_cover(&playlist).await;

        let added = self
            .fill(cancel, &playlist, track_ids)
            .await
            .map_err(|e| SorterError::reconcile(year, Stage::Fill, e))?;

        Ok(YearOutcome {
            year,
            playlist_id: playlist.id,
            created,
            removed,
            added,
            cover_applied,
        })
    }

    async fn create(
        &self,
        cancel: &CancellationState,
        user: &User,
        year: i32,
        name: &str,
    ) -> Result<Playlist> {
        cancel.check()?;
        let description = SortOptions::playlist_description(year);
        let playlist = self
            .client
            .create_playlist(
                &user.id,
                name,
                &description,
                self.options.public,
                self.options.collaborative,
            )
            .await?;
        log::info!("✅ Created new playlist: '{}'", playlist.name);
        Ok(playlist)
    }

    /// Remove every addressable entry from `playlist`. Returns how many distinct ids were removed.
    async fn clear(&self, cancel: &CancellationState, playlist: &Playlist) -> Result<usize> {
        let client = self.client;
        let playlist_id = playlist.id.as_str();
        let mut pager = OffsetPager::new(
            self.options.playlist_items_page_size,
            move |offset, limit| client.list_playlist_tracks(playlist_id, offset, limit),
        );
        let entries = pager.collect_all(cancel).await?;

        let unaddressable = entries
            .iter()
            .filter(|entry| entry.removable_id().is_none())
            .count();
        if unaddressable > 0 {
            log::warn!(
                "{unaddressable} unavailable entries in '{}' can't be removed by id",
                playlist.name
            );
        }

        // A removal call drops every occurrence, so each id is sent once.
        let mut seen = HashSet::new();
        let ids: Vec<String> = entries
            .iter()
            .filter_map(PlaylistEntry::removable_id)
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();

        if ids.is_empty() {
            log::info!("Playlist is already empty. No tracks to remove.");
            return Ok(0);
        }

        self.apply_in_batches(cancel, &ids, self.options.remove_batch_size, "Removing", move |batch| {
            client.remove_from_playlist(playlist_id, batch)
        })
        .await?;
        log::info!("✅ Finished removing all {} old tracks.", ids.len());
        Ok(ids.len())
    }

    async fn fill(
        &self,
        cancel: &CancellationState,
        playlist: &Playlist,
        track_ids: &[String],
    ) -> Result<usize> {
        let client = self.client;
        let playlist_id = playlist.id.as_str();
        self.apply_in_batches(cancel, track_ids, self.options.add_batch_size, "Adding", move |batch| {
            client.add_to_playlist(playlist_id, batch)
        })
        .await?;
        log::info!("✅ Finished adding all {} tracks.", track_ids.len());
        Ok(track_ids.len())
    }

    async fn apply_in_batches<'b, F, Fut>(
        &self,
        cancel: &CancellationState,
        ids: &'b [String],
        batch_size: usize,
        verb: &str,
        mut apply: F,
    ) -> Result<()>
    where
        F: FnMut(&'b [String]) -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let count = batch_count(ids.len(), batch_size);
        for (index, batch) in batches(ids, batch_size).enumerate() {
            cancel.check()?;
            log::info!(
                "  {verb} batch {}/{count} of {} tracks...",
                index + 1,
                batch.len()
            );
            apply(batch).await?;
        }
        Ok(())
    }

    /// Generate and upload the playlist's cover. Failures are logged, never returned.
    async fn apply_cover(&self, playlist: &Playlist) -> bool {
        if !self.options.apply_covers {
            return false;
        }

        log::info!("Generating custom cover image...");
        let jpeg = match self.covers.generate(&playlist.name) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                log::warn!(
                    "⚠️  Could not generate image for '{}' ({}): {e}",
                    playlist.name,
                    Stage::ImageApply
                );
                return false;
            }
        };

        match self.client.set_playlist_image(&playlist.id, &jpeg).await {
            Ok(()) => {
                log::info!("✅ Custom cover image uploaded.");
                true
            }
            Err(e) => {
                log::warn!(
                    "⚠️  Could not upload cover image for '{}' ({}): {e}",
                    playlist.name,
                    Stage::ImageApply
                );
                false
            }
        }
    }
}
