//! Catalog capability trait and the remote types shared across the crate.
//!
//! The synchronizer only ever talks to the remote service through the
//! [`Catalog`] trait; the live implementation is [`crate::yandex::YandexCatalog`]
//! and tests use an in-memory mock.

use crate::errors::SyncError;

// ── Search ───────────────────────────────────────────────────────────────────

/// One track candidate returned by the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    /// Album (container) id, when the catalog reports one.
    pub album_id: Option<String>,
    pub title: String,
    pub artists: Vec<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// The engine's single best guess.  Present only when that guess is a
    /// track; best guesses of other kinds (album, artist) are dropped by the
    /// client.
    pub best: Option<Candidate>,
    /// Ranked track results.
    pub tracks: Vec<Candidate>,
}

// ── Playlists ────────────────────────────────────────────────────────────────

/// Lightweight playlist listing entry.
#[derive(Debug, Clone)]
pub struct PlaylistMeta {
    pub kind: u64,
    pub title: String,
}

/// One playlist entry with its position.
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    pub index: usize,
    pub track_id: String,
    pub album_id: Option<String>,
    pub title: String,
    pub artists: Vec<String>,
}

/// A playlist snapshot.  `revision` is the optimistic-concurrency token the
/// service demands on every mutating call; it changes on every successful
/// mutation, so a snapshot must be re-fetched immediately before mutating.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub kind: u64,
    pub title: String,
    pub revision: u64,
    pub track_count: usize,
    pub entries: Vec<PlaylistEntry>,
}

// ── Trait ────────────────────────────────────────────────────────────────────

/// The capability set the synchronizer requires of the remote service.
///
/// Mutating calls return `Ok(None)` when the service acknowledged the request
/// but rejected the mutation (stale revision, unknown track).  Transport
/// failures surface as [`SyncError::Remote`]; callers convert both into
/// per-item failures.
pub trait Catalog {
    fn search(&mut self, text: &str) -> Result<SearchPage, SyncError>;
    fn list_playlists(&mut self) -> Result<Vec<PlaylistMeta>, SyncError>;
    fn fetch_playlist(&mut self, kind: u64) -> Result<Playlist, SyncError>;
    fn create_playlist(&mut self, name: &str) -> Result<Playlist, SyncError>;
    fn insert_track(
        &mut self,
        kind: u64,
        track_id: &str,
        album_id: Option<&str>,
        revision: u64,
    ) -> Result<Option<Playlist>, SyncError>;
    fn delete_range(
        &mut self,
        kind: u64,
        from: usize,
        to: usize,
        revision: u64,
    ) -> Result<Option<Playlist>, SyncError>;
    fn like_track(&mut self, track_id: &str) -> Result<bool, SyncError>;
}

// ── Test double ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};

    /// In-memory catalog used by resolver, synchronizer and driver tests.
    /// Inserts prepend, every successful mutation bumps the revision, and a
    /// mismatched revision makes the mutation report rejection.
    #[derive(Default)]
    pub(crate) struct MockCatalog {
        pub searches: HashMap<String, SearchPage>,
        pub search_log: Vec<String>,
        pub playlists: Vec<Playlist>,
        /// Track metadata used to fill in entries on insert: id → (title, artists).
        pub known_tracks: HashMap<String, (String, Vec<String>)>,
        pub fail_inserts: HashSet<String>,
        /// Deletions are acknowledged but leave the playlist unchanged.
        pub sticky_deletes: bool,
        pub fail_likes: HashSet<String>,
        pub liked: Vec<String>,
        next_kind: u64,
    }

    impl MockCatalog {
        pub fn new() -> Self {
            MockCatalog {
                next_kind: 1000,
                ..Default::default()
            }
        }

        /// Create a server-side playlist and return its kind.
        pub fn add_playlist(&mut self, title: &str) -> u64 {
            self.next_kind += 1;
            let kind = self.next_kind;
            self.playlists.push(Playlist {
                kind,
                title: title.to_string(),
                revision: 1,
                track_count: 0,
                entries: Vec::new(),
            });
            kind
        }

        /// Append an entry to a playlist (test setup, not the insert path).
        pub fn push_entry(&mut self, kind: u64, track_id: &str, title: &str, artist: &str) {
            let playlist = self
                .playlists
                .iter_mut()
                .find(|p| p.kind == kind)
                .expect("unknown playlist");
            playlist.entries.push(PlaylistEntry {
                index: 0,
                track_id: track_id.to_string(),
                album_id: None,
                title: title.to_string(),
                artists: vec![artist.to_string()],
            });
            Self::reindex(playlist);
        }

        pub fn add_search(&mut self, query: &str, page: SearchPage) {
            self.searches.insert(query.to_string(), page);
        }

        pub fn add_known_track(&mut self, id: &str, title: &str, artists: &[&str]) {
            self.known_tracks.insert(
                id.to_string(),
                (
                    title.to_string(),
                    artists.iter().map(|s| s.to_string()).collect(),
                ),
            );
        }

        pub fn entries(&self, kind: u64) -> &[PlaylistEntry] {
            &self
                .playlists
                .iter()
                .find(|p| p.kind == kind)
                .expect("unknown playlist")
                .entries
        }

        fn playlist_mut(&mut self, kind: u64) -> Result<&mut Playlist, SyncError> {
            self.playlists
                .iter_mut()
                .find(|p| p.kind == kind)
                .ok_or_else(|| SyncError::Remote(format!("no playlist {kind}")))
        }

        fn reindex(playlist: &mut Playlist) {
            for (i, entry) in playlist.entries.iter_mut().enumerate() {
                entry.index = i;
            }
            playlist.track_count = playlist.entries.len();
        }
    }

    impl Catalog for MockCatalog {
        fn search(&mut self, text: &str) -> Result<SearchPage, SyncError> {
            self.search_log.push(text.to_string());
            Ok(self.searches.get(text).cloned().unwrap_or_default())
        }

        fn list_playlists(&mut self) -> Result<Vec<PlaylistMeta>, SyncError> {
            Ok(self
                .playlists
                .iter()
                .map(|p| PlaylistMeta {
                    kind: p.kind,
                    title: p.title.clone(),
                })
                .collect())
        }

        fn fetch_playlist(&mut self, kind: u64) -> Result<Playlist, SyncError> {
            Ok(self.playlist_mut(kind)?.clone())
        }

        fn create_playlist(&mut self, name: &str) -> Result<Playlist, SyncError> {
            let kind = self.add_playlist(name);
            self.fetch_playlist(kind)
        }

        fn insert_track(
            &mut self,
            kind: u64,
            track_id: &str,
            album_id: Option<&str>,
            revision: u64,
        ) -> Result<Option<Playlist>, SyncError> {
            if self.fail_inserts.contains(track_id) {
                return Ok(None);
            }
            let (title, artists) = self
                .known_tracks
                .get(track_id)
                .cloned()
                .unwrap_or((String::new(), Vec::new()));
            let playlist = self.playlist_mut(kind)?;
            if playlist.revision != revision {
                return Ok(None);
            }
            playlist.entries.insert(
                0,
                PlaylistEntry {
                    index: 0,
                    track_id: track_id.to_string(),
                    album_id: album_id.map(|s| s.to_string()),
                    title,
                    artists,
                },
            );
            playlist.revision += 1;
            Self::reindex(playlist);
            Ok(Some(playlist.clone()))
        }

        fn delete_range(
            &mut self,
            kind: u64,
            from: usize,
            to: usize,
            revision: u64,
        ) -> Result<Option<Playlist>, SyncError> {
            let sticky = self.sticky_deletes;
            let playlist = self.playlist_mut(kind)?;
            if playlist.revision != revision {
                return Ok(None);
            }
            playlist.revision += 1;
            if !sticky {
                let to = to.min(playlist.entries.len());
                if from < to {
                    playlist.entries.drain(from..to);
                }
                Self::reindex(playlist);
            }
            Ok(Some(playlist.clone()))
        }

        fn like_track(&mut self, track_id: &str) -> Result<bool, SyncError> {
            if self.fail_likes.contains(track_id) {
                return Ok(false);
            }
            self.liked.push(track_id.to_string());
            Ok(true)
        }
    }
}
