//! Source-against-playlist diff.
//!
//! A source track is already present when a single playlist entry matches
//! both its title and its artist, case-insensitively.  The artist matches if
//! any of the entry's credited artists equals the source artist; both facts
//! must hold for the *same* entry, so a title shared with one entry and an
//! artist shared with another never counts as present.

use crate::catalog::PlaylistEntry;
use crate::track::Track;

/// Tracks from `source` that have no matching entry in the playlist, in
/// source order.
pub fn missing_tracks(source: &[Track], entries: &[PlaylistEntry]) -> Vec<Track> {
    source
        .iter()
        .filter(|track| !entries.iter().any(|entry| entry_matches(entry, track)))
        .cloned()
        .collect()
}

fn entry_matches(entry: &PlaylistEntry, track: &Track) -> bool {
    let artist = track.artist.to_lowercase();
    entry.title.to_lowercase() == track.title.to_lowercase()
        && entry.artists.iter().any(|a| a.to_lowercase() == artist)
}
