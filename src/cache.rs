//! Durable lookup cache for catalog search results.
//!
//! Two append-only CSV tables keyed by the normalized (artist, title)
//! identity: `resolved.csv` maps to a catalog track, `not_found.csv` marks
//! searches that came up empty.  Both are loaded into memory when the cache
//! opens; each append is flushed and fsynced before the caller moves on, so
//! an interrupted run loses at most the in-flight item and a rerun picks up
//! where it left off.
//!
//! Entries are trusted without re-verification: a hit short-circuits the
//! resolver even if the remote catalog has drifted since.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::csvfile::{self, CsvAppender};
use crate::errors::SyncError;
use crate::track::{Track, TrackKey};

pub const RESOLVED_FILE: &str = "resolved.csv";
pub const NOT_FOUND_FILE: &str = "not_found.csv";

const RESOLVED_HEADER: [&str; 4] = ["artist", "title", "catalogId", "containerId"];
const NOT_FOUND_HEADER: [&str; 2] = ["artist", "title"];

pub struct LookupCache {
    resolved: HashMap<TrackKey, Track>,
    not_found: HashSet<TrackKey>,
    resolved_log: CsvAppender,
    not_found_log: CsvAppender,
}

impl LookupCache {
    /// Open (creating if needed) the cache tables under `dir` and load both
    /// into memory.
    pub fn open(dir: &Path) -> Result<Self, SyncError> {
        let resolved_path = dir.join(RESOLVED_FILE);
        let not_found_path = dir.join(NOT_FOUND_FILE);

        let mut resolved = HashMap::new();
        if resolved_path.exists() {
            let table = csvfile::read_table(&resolved_path)?;
            if table.header != RESOLVED_HEADER {
                return Err(SyncError::Parse(format!(
                    "{}: unexpected header {:?}",
                    resolved_path.display(),
                    table.header
                )));
            }
            for row in &table.rows {
                let track = track_from_resolved_row(row, &resolved_path)?;
                // First record wins; later duplicates are ignored
                resolved.entry(track.key()).or_insert(track);
            }
        }

        let mut not_found = HashSet::new();
        if not_found_path.exists() {
            let table = csvfile::read_table(&not_found_path)?;
            if table.header != NOT_FOUND_HEADER {
                return Err(SyncError::Parse(format!(
                    "{}: unexpected header {:?}",
                    not_found_path.display(),
                    table.header
                )));
            }
            for row in &table.rows {
                let artist = row.first().map(|s| s.as_str()).unwrap_or("");
                let title = row.get(1).map(|s| s.as_str()).unwrap_or("");
                not_found.insert(TrackKey::new(artist, title));
            }
        }

        Ok(LookupCache {
            resolved,
            not_found,
            resolved_log: CsvAppender::open(&resolved_path, &RESOLVED_HEADER)?,
            not_found_log: CsvAppender::open(&not_found_path, &NOT_FOUND_HEADER)?,
        })
    }

    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }

    pub fn not_found_len(&self) -> usize {
        self.not_found.len()
    }

    /// Pure in-memory lookup against the resolved table.
    pub fn lookup_resolved(&self, artist: &str, title: &str) -> Option<&Track> {
        self.resolved.get(&TrackKey::new(artist, title))
    }

    /// Only meaningful in resume mode; callers decide whether to consult it.
    pub fn lookup_not_found(&self, artist: &str, title: &str) -> bool {
        self.not_found.contains(&TrackKey::new(artist, title))
    }

    /// Durably record a resolved track.  A key that is already present is
    /// left untouched — entries are never overwritten within a run.
    pub fn record_resolved(&mut self, track: &Track) -> Result<(), SyncError> {
        let key = track.key();
        if self.resolved.contains_key(&key) {
            return Ok(());
        }
        self.resolved_log.append(&[
            &track.artist,
            &track.title,
            track.catalog_id.as_deref().unwrap_or(""),
            track.album_id.as_deref().unwrap_or(""),
        ])?;
        self.resolved.insert(key, track.clone());
        Ok(())
    }

    /// Durably record a failed lookup.
    pub fn record_not_found(&mut self, track: &Track) -> Result<(), SyncError> {
        let key = track.key();
        if self.not_found.contains(&key) {
            return Ok(());
        }
        self.not_found_log.append(&[&track.artist, &track.title])?;
        self.not_found.insert(key);
        Ok(())
    }
}

fn track_from_resolved_row(row: &[String], path: &Path) -> Result<Track, SyncError> {
    if row.len() < 4 {
        return Err(SyncError::Parse(format!(
            "{}: short row {row:?}",
            path.display()
        )));
    }
    let album = if row[3].is_empty() {
        None
    } else {
        Some(row[3].as_str())
    };
    Ok(Track::resolved(&row[0], &row[1], &row[2], album))
}
