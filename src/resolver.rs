//! Two-pass match resolution against the catalog search engine.
//!
//! Pass 1 searches the title alone, pass 2 the "artist title" pair.  Matching
//! is exact case-insensitive string comparison — precision over recall, so a
//! track never gets mapped onto a similarly named stranger.  When both passes
//! miss, the candidates gathered along the way can be offered to a human.

use std::io::{self, BufRead, Write};

use crate::catalog::{Candidate, Catalog, SearchPage};
use crate::errors::SyncError;
use crate::track::Track;

/// Ranked candidates examined per pass before falling through.
const SCAN_LIMIT: usize = 5;

/// Resolve an (artist, title) pair to a catalog track, prompting on stdin
/// when no exact match exists and `allow_prompt` is set.
pub fn resolve(
    catalog: &mut dyn Catalog,
    artist: &str,
    title: &str,
    allow_prompt: bool,
) -> Result<Option<Track>, SyncError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    resolve_with_input(catalog, artist, title, allow_prompt, &mut input, &mut out)
}

/// Same as [`resolve`] with an explicit prompt channel.
pub fn resolve_with_input<R: BufRead, W: Write>(
    catalog: &mut dyn Catalog,
    artist: &str,
    title: &str,
    allow_prompt: bool,
    input: &mut R,
    out: &mut W,
) -> Result<Option<Track>, SyncError> {
    let mut pool: Vec<Candidate> = Vec::new();

    for query in [title.to_string(), format!("{artist} {title}")] {
        let page = catalog.search(&query)?;
        if let Some(found) = match_in_page(&page, artist, title) {
            return Ok(Some(candidate_to_track(artist, title, found)));
        }
        // Keep everything for the prompt, duplicates and all
        pool.extend(page.best);
        pool.extend(page.tracks);
    }

    if allow_prompt && !pool.is_empty() {
        if let Some(choice) = prompt_selection(artist, title, &pool, input, out)? {
            return Ok(Some(candidate_to_track(artist, title, &pool[choice])));
        }
    }

    Ok(None)
}

/// Exact-match test within one search page: the best guess short-circuits,
/// otherwise the first hit among the top ranked track results wins.
fn match_in_page<'a>(page: &'a SearchPage, artist: &str, title: &str) -> Option<&'a Candidate> {
    if let Some(best) = &page.best {
        if candidate_matches(best, artist, title) {
            return Some(best);
        }
    }
    page.tracks
        .iter()
        .take(SCAN_LIMIT)
        .find(|c| candidate_matches(c, artist, title))
}

/// Title must match exactly (case-insensitive) and at least one of the
/// candidate's artists must match the target artist.
pub fn candidate_matches(candidate: &Candidate, artist: &str, title: &str) -> bool {
    let artist = artist.to_lowercase();
    candidate.title.to_lowercase() == title.to_lowercase()
        && candidate
            .artists
            .iter()
            .any(|a| a.to_lowercase() == artist)
}

fn candidate_to_track(artist: &str, title: &str, candidate: &Candidate) -> Track {
    Track {
        artist: artist.to_string(),
        title: title.to_string(),
        catalog_id: Some(candidate.id.clone()),
        album_id: candidate.album_id.clone(),
    }
}

/// Offer the pooled candidates for manual disambiguation.  Selection is a
/// zero-based index; empty or non-numeric input declines the match.
fn prompt_selection<R: BufRead, W: Write>(
    artist: &str,
    title: &str,
    pool: &[Candidate],
    input: &mut R,
    out: &mut W,
) -> Result<Option<usize>, SyncError> {
    writeln!(out)?;
    writeln!(out, "No exact match for {artist} - {title}. Candidates:")?;
    for (i, candidate) in pool.iter().enumerate() {
        writeln!(
            out,
            "  {}. {} - {}",
            i,
            candidate.artists.join(", "),
            candidate.title
        )?;
    }
    write!(out, "Pick a number (empty to skip): ")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    match line.trim().parse::<usize>() {
        Ok(i) if i < pool.len() => Ok(Some(i)),
        _ => Ok(None),
    }
}
