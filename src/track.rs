//! Track identity and source-collection loading.

use std::collections::HashSet;
use std::path::Path;

use crate::csvfile;
use crate::errors::SyncError;

/// A track as the synchronizer sees it.  Identity is the case-insensitive
/// (artist, title) pair; the resolved catalog fields never participate in
/// identity comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub artist: String,
    pub title: String,
    /// Catalog track id, set once the track has been resolved.
    pub catalog_id: Option<String>,
    /// Album (container) id the catalog track belongs to.
    pub album_id: Option<String>,
}

impl Track {
    pub fn new(artist: &str, title: &str) -> Self {
        Track {
            artist: artist.to_string(),
            title: title.to_string(),
            catalog_id: None,
            album_id: None,
        }
    }

    pub fn resolved(artist: &str, title: &str, catalog_id: &str, album_id: Option<&str>) -> Self {
        Track {
            artist: artist.to_string(),
            title: title.to_string(),
            catalog_id: Some(catalog_id.to_string()),
            album_id: album_id.map(|s| s.to_string()),
        }
    }

    pub fn key(&self) -> TrackKey {
        TrackKey::new(&self.artist, &self.title)
    }
}

/// Normalized (artist, title) identity used for deduplication and cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey {
    artist: String,
    title: String,
}

impl TrackKey {
    pub fn new(artist: &str, title: &str) -> Self {
        TrackKey {
            artist: artist.to_lowercase(),
            title: title.to_lowercase(),
        }
    }
}

/// Load the source dump: an ordered, identity-deduplicated track list.
///
/// The dump must carry a header row.  When the header names `artist` and
/// `title` columns (any case) those are used; otherwise the columns are taken
/// positionally as `title,artist`, the layout of the original export (which
/// carries a trailing time column the synchronizer ignores).
pub fn load_source(path: &Path) -> Result<Vec<Track>, SyncError> {
    if !path.exists() {
        return Err(SyncError::Config(format!(
            "source file not found: {}",
            path.display()
        )));
    }
    let table = csvfile::read_table(path).map_err(|e| match e {
        SyncError::Io(e) => SyncError::Config(format!("cannot read {}: {e}", path.display())),
        other => other,
    })?;

    let lower: Vec<String> = table.header.iter().map(|h| h.to_lowercase()).collect();
    let artist_col = lower.iter().position(|h| h == "artist");
    let title_col = lower.iter().position(|h| h == "title");
    let (artist_col, title_col) = match (artist_col, title_col) {
        (Some(a), Some(t)) => (a, t),
        // Positional fallback: title first, artist second
        _ => (1, 0),
    };

    let mut seen: HashSet<TrackKey> = HashSet::new();
    let mut tracks = Vec::new();
    for row in &table.rows {
        let artist = row.get(artist_col).map(|s| s.trim()).unwrap_or("");
        let title = row.get(title_col).map(|s| s.trim()).unwrap_or("");
        if artist.is_empty() && title.is_empty() {
            continue;
        }
        let track = Track::new(artist, title);
        if seen.insert(track.key()) {
            tracks.push(track);
        }
    }
    Ok(tracks)
}
