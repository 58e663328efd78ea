//! Playlist mutation: resolve the target playlist, insert resolved tracks,
//! collapse duplicates, clear on demand.
//!
//! The service guards every mutation with a revision token, so a fresh
//! snapshot is fetched immediately before each mutating call.  A failed
//! insert marks that one track and the run moves on; there are no retries.

use std::collections::HashSet;

use crate::catalog::{Catalog, Playlist};
use crate::errors::SyncError;
use crate::progress::Progress;
use crate::track::Track;

/// Behavioral switches for the insert phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Also mark each track as liked.
    pub like: bool,
    /// Insert in input order instead of reversed.
    pub forward: bool,
    /// Skip the duplicate-removal pass.
    pub keep_duplicates: bool,
}

/// Outcome of one run, for the final report and the error file.
#[derive(Debug, Default)]
pub struct SyncResult {
    pub added: Vec<Track>,
    pub not_found: Vec<Track>,
    pub errors: Vec<Track>,
}

/// Find the playlist with exactly `name` as its title, creating it when
/// absent, and return a fresh snapshot.
pub fn ensure_playlist(catalog: &mut dyn Catalog, name: &str) -> Result<Playlist, SyncError> {
    let existing = catalog
        .list_playlists()?
        .into_iter()
        .find(|p| p.title == name);
    let kind = match existing {
        Some(meta) => meta.kind,
        None => catalog.create_playlist(name)?.kind,
    };
    catalog.fetch_playlist(kind)
}

/// Insert `tracks` into the playlist.  The service prepends at position 0,
/// so the default order is reversed to land the tracks in input order.
///
/// Each track fetches its own fresh revision; a rejected or failed insert
/// goes to the error set and the loop continues.  The like side effect runs
/// independently of the insert outcome.
pub fn insert_tracks(
    catalog: &mut dyn Catalog,
    kind: u64,
    tracks: &[Track],
    options: SyncOptions,
    result: &mut SyncResult,
) -> Result<(), SyncError> {
    let ordered: Vec<&Track> = if options.forward {
        tracks.iter().collect()
    } else {
        tracks.iter().rev().collect()
    };

    let mut progress = Progress::new("adding", ordered.len());
    for track in ordered {
        progress.step(&format!("{} - {}", track.artist, track.title));

        let Some(track_id) = track.catalog_id.clone() else {
            result.errors.push(track.clone());
            continue;
        };

        let inserted = catalog.fetch_playlist(kind).and_then(|playlist| {
            catalog.insert_track(kind, &track_id, track.album_id.as_deref(), playlist.revision)
        });
        match inserted {
            Ok(Some(_)) => result.added.push(track.clone()),
            // Rejection and transport failure both mark the track and move on
            Ok(None) | Err(_) => result.errors.push(track.clone()),
        }

        if options.like && !matches!(catalog.like_track(&track_id), Ok(true)) {
            result.errors.push(track.clone());
        }
    }
    progress.finish(&format!("done, {} added", result.added.len()));
    Ok(())
}

/// Delete repeated tracks until a pass finds none.  Each pass deletes the
/// first repeat it sees and re-fetches; a deletion that does not shrink the
/// playlist ends the loop rather than spinning.
///
/// Shrinkage is judged by `track_count`: mutation responses may carry only
/// a summary without the entries array, so `entries.len()` says nothing.
pub fn remove_duplicates(catalog: &mut dyn Catalog, kind: u64) -> Result<(), SyncError> {
    loop {
        let playlist = catalog.fetch_playlist(kind)?;
        let Some(index) = first_duplicate(&playlist) else {
            return Ok(());
        };
        let before = playlist.track_count;
        let after = match catalog.delete_range(kind, index, index + 1, playlist.revision)? {
            Some(updated) => updated.track_count,
            None => before,
        };
        if after >= before {
            return Ok(());
        }
    }
}

fn first_duplicate(playlist: &Playlist) -> Option<usize> {
    let mut seen = HashSet::new();
    playlist
        .entries
        .iter()
        .find(|entry| !seen.insert(entry.track_id.clone()))
        .map(|entry| entry.index)
}

/// Delete every entry in one call.  A rejected deletion is fatal here: a
/// half-cleared playlist would poison the diff that follows.
pub fn clear_playlist(catalog: &mut dyn Catalog, kind: u64) -> Result<(), SyncError> {
    let playlist = catalog.fetch_playlist(kind)?;
    if playlist.track_count == 0 {
        return Ok(());
    }
    match catalog.delete_range(kind, 0, playlist.track_count, playlist.revision)? {
        Some(_) => Ok(()),
        None => Err(SyncError::MutationRejected(format!(
            "clearing playlist {kind}"
        ))),
    }
}
