//! Diagnostic binary for the search and match pipeline.
//!
//! Runs both resolution passes for a single artist/title pair and prints
//! everything the search engine returned, then the final verdict.
//!
//! Usage:
//!   search_probe <ARTIST> <TITLE> [--interactive] [--token <TOKEN>]

use std::env;
use std::process;

use tracksync::catalog::{Catalog, SearchPage};
use tracksync::{resolver, YandexCatalog};

fn main() {
    let args: Vec<String> = env::args().collect();
    let interactive = args.iter().any(|a| a == "--interactive" || a == "-i");
    let token = args
        .iter()
        .position(|a| a == "--token")
        .and_then(|i| args.get(i + 1))
        .cloned();

    let mut positional: Vec<String> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--interactive" | "-i" => {}
            "--token" => i += 1, // skip the value
            other if !other.starts_with('-') => positional.push(other.to_string()),
            _ => {}
        }
        i += 1;
    }
    let [artist, title] = &positional[..] else {
        eprintln!("Usage: search_probe <ARTIST> <TITLE> [--interactive] [--token <TOKEN>]");
        process::exit(1);
    };

    let mut catalog = match YandexCatalog::connect(token.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    for query in [title.to_string(), format!("{artist} {title}")] {
        println!("=== Search: \"{query}\" ===");
        match catalog.search(&query) {
            Ok(page) => print_page(&page, artist, title),
            Err(e) => println!("  search failed: {e}"),
        }
        println!();
    }

    match resolver::resolve(&mut catalog, artist, title, interactive) {
        Ok(Some(track)) => {
            println!(
                "Resolved: {} - {} => track {} (album {})",
                track.artist,
                track.title,
                track.catalog_id.as_deref().unwrap_or("?"),
                track.album_id.as_deref().unwrap_or("?")
            );
        }
        Ok(None) => println!("No match"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn print_page(page: &SearchPage, artist: &str, title: &str) {
    match &page.best {
        Some(best) => println!(
            "  best: {} - {} (id={}) match={}",
            best.artists.join(", "),
            best.title,
            best.id,
            resolver::candidate_matches(best, artist, title)
        ),
        None => println!("  best: none"),
    }
    println!("  tracks: {}", page.tracks.len());
    for (i, candidate) in page.tracks.iter().enumerate() {
        println!(
            "    {}. {} - {} (id={}) match={}",
            i,
            candidate.artists.join(", "),
            candidate.title,
            candidate.id,
            resolver::candidate_matches(candidate, artist, title)
        );
    }
}
