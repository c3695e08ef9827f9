use crate::Track;
use chrono::{DateTime, Datelike};
use std::collections::BTreeMap;

/// A track left out of classification because its timestamp didn't parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTrack {
    pub id: String,
    pub name: String,
    pub added_at: String,
    pub reason: String,
}

/// Liked-track ids partitioned by the calendar year they were saved in.
///
/// Each track lands in exactly one bucket. Within a bucket ids keep the
/// order in which the tracks were fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearBuckets {
    buckets: BTreeMap<i32, Vec<String>>,
    skipped: Vec<SkippedTrack>,
}

impl YearBuckets {
    /// Group tracks by the year of their RFC 3339 `added_at` timestamp.
    ///
    /// The year is taken in the timestamp's own UTC offset. Tracks whose
    /// timestamp fails to parse are logged and recorded in [`skipped`](Self::skipped).
    pub fn classify<'a, I>(tracks: I) -> Self
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let mut grouped = Self::default();
        for track in tracks {
            match DateTime::parse_from_rfc3339(&track.added_at) {
                Ok(added) => grouped
                    .buckets
                    .entry(added.year())
                    .or_default()
                    .push(track.id.clone()),
                Err(e) => {
                    log::warn!(
                        "Skipping '{}': can't parse added date '{}': {e}",
                        track.name,
                        track.added_at
                    );
                    grouped.skipped.push(SkippedTrack {
                        id: track.id.clone(),
                        name: track.name.clone(),
                        added_at: track.added_at.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        grouped
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.buckets.keys().copied().collect()
    }

    /// Ids saved in `year`, in fetch order.
    pub fn tracks_for(&self, year: i32) -> &[String] {
        self.buckets.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buckets in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[String])> {
        self.buckets.iter().map(|(year, ids)| (*year, ids.as_slice()))
    }

    pub fn skipped(&self) -> &[SkippedTrack] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of classified tracks across all buckets.
    pub fn track_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<i32, Vec<String>>, Vec<SkippedTrack>) {
        (self.buckets, self.skipped)
    }
}
