use crate::cancel::CancellationState;
use crate::config::{FilterOptions, Stride};
use crate::pager::OffsetPager;
use crate::r#trait::LibraryClient;
use crate::{Result, Track};
use std::collections::HashSet;

/// Artist names whose tracks should leave the library.
///
/// Matching is exact on the artist's display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    artists: HashSet<String>,
}

impl Blocklist {
    pub fn new<I, S>(artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            artists: artists.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one artist per line. Blank lines and `#` comments are ignored;
    /// surrounding whitespace is trimmed.
    pub fn parse_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn extend<I, S>(&mut self, artists: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists.extend(artists.into_iter().map(Into::into));
    }

    pub fn contains(&self, artist: &str) -> bool {
        self.artists.contains(artist)
    }

    /// The first of the track's artists that is blocked, if any.
    pub fn blocked_artist<'t>(&self, track: &'t Track) -> Option<&'t str> {
        track
            .artists
            .iter()
            .map(String::as_str)
            .find(|artist| self.contains(artist))
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }
}

impl IntoIterator for Blocklist {
    type Item = String;
    type IntoIter = std::collections::hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.artists.into_iter()
    }
}

/// A page whose removal call failed. The run carried on past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub offset: u32,
    pub ids: Vec<String>,
    pub error: String,
}

/// Summary of an artist filter run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub pages: u32,
    pub scanned: usize,
    pub marked: usize,
    pub removed: usize,
    pub failed_pages: Vec<FailedPage>,
    pub dry_run: bool,
}

/// Removes every liked track credited to a blocked artist.
///
/// The library is walked page by page and each page's matches are removed
/// with one call before the next page is read. Unlike the playlist sorter
/// this processor is fail-soft: a failed removal is logged, recorded in the
/// report, and the walk continues.
pub struct ArtistTrackRemover<'a, C: ?Sized> {
    client: &'a C,
    blocklist: Blocklist,
    options: FilterOptions,
}

impl<'a, C> ArtistTrackRemover<'a, C>
where
    C: LibraryClient + ?Sized,
{
    pub fn new(client: &'a C, blocklist: Blocklist) -> Self {
        Self::with_options(client, blocklist, FilterOptions::default())
    }

    pub fn with_options(client: &'a C, blocklist: Blocklist, options: FilterOptions) -> Self {
        Self {
            client,
            blocklist,
            options,
        }
    }

    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    /// Ids on `tracks` credited to a blocked artist, skipping ids in `already_removed`.
    pub fn find_tracks_to_remove(
        &self,
        tracks: &[Track],
        already_removed: &HashSet<String>,
    ) -> Vec<String> {
        tracks
            .iter()
            .filter(|track| !already_removed.contains(&track.id))
            .filter_map(|track| {
                let artist = self.blocklist.blocked_artist(track)?;
                log::info!("  [MARK] '{}' by {}", track.name, artist);
                Some(track.id.clone())
            })
            .collect()
    }

    pub async fn run(&self, cancel: &CancellationState) -> Result<FilterReport> {
        log::info!("Starting artist track removal process...");

        let mut report = FilterReport {
            dry_run: self.options.dry_run,
            ..FilterReport::default()
        };
        if self.blocklist.is_empty() {
            log::info!("Blocklist is empty. Nothing to do.");
            return Ok(report);
        }

        let client = self.client;
        let mut pager = OffsetPager::new(self.options.effective_page_size(), move |offset, limit| {
            client.list_liked_tracks(offset, limit)
        });
        let mut removed_ids: HashSet<String> = HashSet::new();

        loop {
            let offset = pager.offset();
            log::info!("Fetching liked songs page (offset: {offset})...");
            let Some(page) = pager.next_page(cancel).await? else {
                log::info!("No more liked songs found. Task complete.");
                break;
            };
            if report.pages == 0 {
                if let Some(total) = pager.first_total() {
                    log::info!("Found {total} total liked songs to process.");
                }
            }
            report.pages += 1;
            report.scanned += page.len();

            let to_remove = self.find_tracks_to_remove(&page, &removed_ids);
            report.marked += to_remove.len();

            let removed_now = if to_remove.is_empty() {
                log::info!("No tracks matching criteria on this page.");
                0
            } else if self.options.dry_run {
                log::info!("Dry run: would remove {} track(s) from this page.", to_remove.len());
                0
            } else {
                cancel.check()?;
                log::info!("Attempting to remove {} track(s) from this page.", to_remove.len());
                match self.client.remove_from_library(&to_remove).await {
                    Ok(()) => {
                        log::info!("✅ Batch removal successful.");
                        let count = to_remove.len();
                        removed_ids.extend(to_remove);
                        count
                    }
                    Err(e) => {
                        log::error!("❌ ERROR: Failed to remove a batch of tracks: {e}");
                        report.failed_pages.push(FailedPage {
                            offset,
                            ids: to_remove,
                            error: e.to_string(),
                        });
                        0
                    }
                }
            };
            report.removed += removed_now;

            match self.options.stride {
                Stride::Compensated => pager.rewind(removed_now as u32),
                Stride::Fixed => {
                    pager.align_to_stride();
                    if pager.first_total().is_some_and(|total| pager.offset() >= total) {
                        log::info!("All songs have been processed. Task complete.");
                        pager.finish();
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, artists: &[&str]) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Song {id}"),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            added_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_blocklist_parse_lines() {
        let blocklist = Blocklist::parse_lines("# skip these\nBadArtist\n\n  Other Band  \n");
        assert_eq!(blocklist.len(), 2);
        assert!(blocklist.contains("BadArtist"));
        assert!(blocklist.contains("Other Band"));
        assert!(!blocklist.contains("# skip these"));
    }

    #[test]
    fn test_blocklist_is_exact() {
        let blocklist = Blocklist::new(["BadArtist"]);
        assert!(!blocklist.contains("badartist"));
        assert!(!blocklist.contains("BadArtist "));
    }

    #[test]
    fn test_marks_any_matching_artist_once() {
        struct Unused;
        #[async_trait::async_trait(?Send)]
        impl LibraryClient for Unused {
            async fn list_liked_tracks(&self, _: u32, _: u32) -> Result<crate::Page<Track>> {
                unreachable!()
            }
            async fn remove_from_library(&self, _: &[String]) -> Result<()> {
                unreachable!()
            }
        }

        let client = Unused;
        let remover = ArtistTrackRemover::new(&client, Blocklist::new(["BadArtist", "Worse"]));
        let tracks = vec![
            track("feat", &["Good", "BadArtist"]),
            track("clean", &["Good"]),
            track("both", &["BadArtist", "Worse"]),
            track("gone", &["Worse"]),
        ];
        let already: HashSet<String> = ["gone".to_string()].into_iter().collect();

        assert_eq!(remover.find_tracks_to_remove(&tracks, &already), ["feat", "both"]);
    }
}
