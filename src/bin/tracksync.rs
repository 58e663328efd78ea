use std::env;
use std::process;

use tracksync::{reconcile, Config, RunOptions, YandexCatalog};

fn print_usage() {
    println!("Sync a CSV track list into a remote catalog playlist");
    println!();
    println!("Usage: tracksync --file <CSV> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --file, -f <CSV>      Source track list (columns: artist, title)");
    println!("  --playlist, -p <NAME> Target playlist name (default: VK2YA)");
    println!("  --cache-dir <DIR>     Directory for lookup caches and the error");
    println!("                        report (default: current directory)");
    println!("  --token <TOKEN>       OAuth token (overrides the token file)");
    println!("  --like                Also mark each added track as liked");
    println!("  --clear               Empty the playlist before syncing");
    println!("  --forward             Insert in input order (playlist ends up reversed)");
    println!("  --keep-duplicates     Skip the duplicate-removal pass");
    println!("  --interactive, -i     Prompt to pick from candidates when no");
    println!("                        exact match is found");
    println!("  --resume              Trust cached not-found entries instead of");
    println!("                        searching them again");
    println!("  --save-defaults       Save the given options as defaults and exit");
    println!("  --help                Show this help message");
    println!();
    println!("Configuration:");
    println!("  Defaults can be stored in ~/.config/tracksync/defaults.toml;");
    println!("  command-line options override them.");
    println!();
    println!("Examples:");
    println!("  tracksync --file tracks.csv");
    println!("  tracksync -f tracks.csv -p \"Road Trip\" --like --resume");
}

fn parse_args(args: &[String]) -> Result<(Config, bool), String> {
    let mut config = Config::new();
    let mut save_defaults = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--file" | "-f" => {
                i += 1;
                config.file = Some(take_value(args, i, "--file")?);
            }
            "--playlist" | "-p" => {
                i += 1;
                config.playlist = Some(take_value(args, i, "--playlist")?);
            }
            "--cache-dir" => {
                i += 1;
                config.cache_dir = Some(take_value(args, i, "--cache-dir")?);
            }
            "--token" => {
                i += 1;
                config.token = Some(take_value(args, i, "--token")?);
            }
            "--like" => config.like = Some(true),
            "--clear" => config.clear = Some(true),
            "--forward" => config.forward = Some(true),
            "--keep-duplicates" => config.keep_duplicates = Some(true),
            "--interactive" | "-i" => config.interactive = Some(true),
            "--resume" => config.resume = Some(true),
            "--save-defaults" => save_defaults = true,
            other => return Err(format!("unknown option: {other}")),
        }
        i += 1;
    }
    Ok((config, save_defaults))
}

fn take_value(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let (cmdline_config, save_defaults) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("Error: {message}");
            println!();
            print_usage();
            process::exit(1);
        }
    };

    // Saved defaults first, command line on top
    let mut effective_config = Config::load().unwrap_or_else(|_| Config::new());
    effective_config.merge(&cmdline_config);

    if save_defaults {
        match effective_config.save() {
            Ok(()) => {
                println!("Defaults saved");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }

    let options = match RunOptions::from_config(&effective_config) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            println!();
            print_usage();
            process::exit(1);
        }
    };

    let mut catalog = match YandexCatalog::connect(options.token.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    match reconcile::run(&mut catalog, &options) {
        Ok(result) => {
            println!();
            println!(
                "Added {} tracks to \"{}\"",
                result.added.len(),
                options.playlist
            );
            if !result.not_found.is_empty() {
                println!("Not found ({}):", result.not_found.len());
                for track in &result.not_found {
                    println!("  {} - {}", track.artist, track.title);
                }
            }
            if !result.errors.is_empty() {
                println!("Errors ({}), see errors.csv:", result.errors.len());
                for track in &result.errors {
                    println!("  {} - {}", track.artist, track.title);
                }
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
