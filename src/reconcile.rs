//! The end-to-end run: load the source list, diff it against the target
//! playlist, resolve what is missing through the cache and the search
//! engine, then push the resolved tracks.
//!
//! The run is restartable at every stage.  Lookups land in the durable cache
//! the moment they are known, inserts are idempotent thanks to the diff, and
//! the error file is rewritten from scratch on each run.

use std::path::Path;

use crate::cache::LookupCache;
use crate::catalog::Catalog;
use crate::config::RunOptions;
use crate::csvfile;
use crate::diff;
use crate::errors::SyncError;
use crate::progress::Progress;
use crate::resolver;
use crate::sync::{self, SyncResult};
use crate::track::{self, Track};

pub const ERRORS_FILE: &str = "errors.csv";

/// Run one reconciliation pass and return what happened.
pub fn run(catalog: &mut dyn Catalog, options: &RunOptions) -> Result<SyncResult, SyncError> {
    let source = track::load_source(&options.source)?;
    let mut cache = LookupCache::open(&options.cache_dir)?;

    let mut playlist = sync::ensure_playlist(catalog, &options.playlist)?;
    if options.clear {
        sync::clear_playlist(catalog, playlist.kind)?;
        playlist = catalog.fetch_playlist(playlist.kind)?;
    }

    let missing = diff::missing_tracks(&source, &playlist.entries);

    let mut result = SyncResult::default();
    let mut resolved: Vec<Track> = Vec::new();

    let mut progress = Progress::new("resolving", missing.len());
    for track in &missing {
        progress.step(&format!("{} - {}", track.artist, track.title));

        if let Some(hit) = cache.lookup_resolved(&track.artist, &track.title) {
            resolved.push(hit.clone());
            continue;
        }
        // Negative cache entries only count when explicitly resuming
        if options.resume && cache.lookup_not_found(&track.artist, &track.title) {
            result.not_found.push(track.clone());
            continue;
        }

        match resolver::resolve(catalog, &track.artist, &track.title, options.interactive) {
            Ok(Some(found)) => {
                cache.record_resolved(&found)?;
                resolved.push(found);
            }
            Ok(None) => {
                cache.record_not_found(track)?;
                result.not_found.push(track.clone());
            }
            // A failed search says nothing about the track itself, so it
            // must not poison the not-found cache
            Err(SyncError::Remote(message)) | Err(SyncError::Parse(message)) => {
                println!("\n{} - {}: {message}", track.artist, track.title);
                result.errors.push(track.clone());
            }
            Err(e) => return Err(e),
        }
    }
    progress.finish(&format!(
        "done, {} resolved, {} not found",
        resolved.len(),
        result.not_found.len()
    ));

    sync::insert_tracks(
        catalog,
        playlist.kind,
        &resolved,
        options.sync_options(),
        &mut result,
    )?;
    if !options.keep_duplicates {
        sync::remove_duplicates(catalog, playlist.kind)?;
    }

    write_error_report(&options.cache_dir, &result.errors)?;
    Ok(result)
}

/// Rewrite `errors.csv` from this run's error set.  Rows carry catalog ids
/// only when every errored track has one; a mixed set falls back to the
/// bare identity columns.
fn write_error_report(dir: &Path, errors: &[Track]) -> Result<(), SyncError> {
    let all_resolved = errors.iter().all(|t| t.catalog_id.is_some());
    let (header, rows): (&[&str], Vec<Vec<String>>) = if all_resolved {
        (
            &["artist", "title", "catalogId", "containerId"],
            errors
                .iter()
                .map(|t| {
                    vec![
                        t.artist.clone(),
                        t.title.clone(),
                        t.catalog_id.clone().unwrap_or_default(),
                        t.album_id.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        )
    } else {
        (
            &["artist", "title"],
            errors
                .iter()
                .map(|t| vec![t.artist.clone(), t.title.clone()])
                .collect(),
        )
    };
    csvfile::write_table(&dir.join(ERRORS_FILE), header, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mock::MockCatalog;
    use crate::catalog::{Candidate, SearchPage};
    use std::fs;
    use std::path::PathBuf;

    fn options(dir: &Path, source: &Path) -> RunOptions {
        RunOptions {
            source: source.to_path_buf(),
            playlist: "VK2YA".to_string(),
            cache_dir: dir.to_path_buf(),
            token: None,
            like: false,
            clear: false,
            forward: false,
            keep_duplicates: false,
            interactive: false,
            resume: false,
        }
    }

    fn write_source(dir: &Path, rows: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("tracks.csv");
        let mut text = String::from("\"artist\",\"title\"\n");
        for (artist, title) in rows {
            text.push_str(&format!("\"{artist}\",\"{title}\"\n"));
        }
        fs::write(&path, text).unwrap();
        path
    }

    fn page_with(id: &str, artist: &str, title: &str) -> SearchPage {
        SearchPage {
            best: Some(Candidate {
                id: id.to_string(),
                album_id: None,
                title: title.to_string(),
                artists: vec![artist.to_string()],
            }),
            tracks: Vec::new(),
        }
    }

    #[test]
    fn test_full_run_adds_resolved_and_caches_misses() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[("ABBA", "S.O.S."), ("Nobody", "No Song")]);

        let mut catalog = MockCatalog::new();
        catalog.add_search("S.O.S.", page_with("1", "ABBA", "S.O.S."));
        catalog.add_known_track("1", "S.O.S.", &["ABBA"]);

        let result = run(&mut catalog, &options(dir.path(), &source)).unwrap();

        assert_eq!(result.added.len(), 1);
        assert_eq!(result.not_found, vec![Track::new("Nobody", "No Song")]);
        assert!(result.errors.is_empty());

        // The playlist was created and holds the resolved track
        let kind = catalog.playlists[0].kind;
        assert_eq!(catalog.entries(kind)[0].track_id, "1");

        // Both outcomes hit the durable cache
        let cache = LookupCache::open(dir.path()).unwrap();
        assert!(cache.lookup_resolved("ABBA", "S.O.S.").is_some());
        assert!(cache.lookup_not_found("Nobody", "No Song"));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[("ABBA", "S.O.S.")]);

        let mut catalog = MockCatalog::new();
        catalog.add_search("S.O.S.", page_with("1", "ABBA", "S.O.S."));
        catalog.add_known_track("1", "S.O.S.", &["ABBA"]);

        run(&mut catalog, &options(dir.path(), &source)).unwrap();
        catalog.search_log.clear();

        let result = run(&mut catalog, &options(dir.path(), &source)).unwrap();

        // Diff filtered the present track: nothing searched, nothing added
        assert!(catalog.search_log.is_empty());
        assert!(result.added.is_empty());
        assert!(result.errors.is_empty());
        let kind = catalog.playlists[0].kind;
        assert_eq!(catalog.entries(kind).len(), 1);
    }

    #[test]
    fn test_resume_skips_cached_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[("Nobody", "No Song")]);

        let mut cache = LookupCache::open(dir.path()).unwrap();
        cache
            .record_not_found(&Track::new("Nobody", "No Song"))
            .unwrap();
        drop(cache);

        let mut catalog = MockCatalog::new();
        let mut opts = options(dir.path(), &source);
        opts.resume = true;

        let result = run(&mut catalog, &opts).unwrap();

        assert!(catalog.search_log.is_empty());
        assert_eq!(result.not_found, vec![Track::new("Nobody", "No Song")]);
    }

    #[test]
    fn test_not_found_is_searched_again_without_resume() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[("Nobody", "No Song")]);

        let mut cache = LookupCache::open(dir.path()).unwrap();
        cache
            .record_not_found(&Track::new("Nobody", "No Song"))
            .unwrap();
        drop(cache);

        let mut catalog = MockCatalog::new();
        run(&mut catalog, &options(dir.path(), &source)).unwrap();

        assert_eq!(catalog.search_log, vec!["No Song", "Nobody No Song"]);
    }

    #[test]
    fn test_clear_rebuilds_the_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[("ABBA", "S.O.S.")]);

        let mut catalog = MockCatalog::new();
        let kind = catalog.add_playlist("VK2YA");
        catalog.push_entry(kind, "stale", "Old Song", "Old Artist");
        catalog.add_search("S.O.S.", page_with("1", "ABBA", "S.O.S."));
        catalog.add_known_track("1", "S.O.S.", &["ABBA"]);

        let mut opts = options(dir.path(), &source);
        opts.clear = true;
        run(&mut catalog, &opts).unwrap();

        assert_eq!(catalog.entries(kind).len(), 1);
        assert_eq!(catalog.entries(kind)[0].track_id, "1");
    }

    #[test]
    fn test_error_report_is_rewritten_each_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[("ABBA", "S.O.S.")]);

        let mut catalog = MockCatalog::new();
        catalog.add_search("S.O.S.", page_with("1", "ABBA", "S.O.S."));
        catalog.add_known_track("1", "S.O.S.", &["ABBA"]);
        catalog.fail_inserts.insert("1".to_string());

        run(&mut catalog, &options(dir.path(), &source)).unwrap();
        let table = csvfile::read_table(&dir.path().join(ERRORS_FILE)).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][2], "1");

        // A clean rerun leaves an empty report
        catalog.fail_inserts.clear();
        run(&mut catalog, &options(dir.path(), &source)).unwrap();
        let table = csvfile::read_table(&dir.path().join(ERRORS_FILE)).unwrap();
        assert!(table.rows.is_empty());
    }
}
