use std::env;
use std::process::ExitCode;

use songshelf::browse::{self, SearchQuery};
use songshelf::config;
use songshelf::library::{LibraryIndex, Song};
use songshelf::logging;

const USAGE: &str = "usage: songshelf [list [--json] | search <query> | artists | albums | stats | config]";

fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("songshelf: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the tool from running.
            eprintln!("songshelf: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}

fn print_songs(songs: &[Song]) {
    for song in songs {
        println!(
            "{}  {:>8}  {} - {} ({})",
            song.id, song.duration_formatted, song.artist, song.title, song.album
        );
    }
}

fn run(args: &[String], settings: &config::Settings) -> Result<(), Box<dyn std::error::Error>> {
    let command = args.first().map(String::as_str).unwrap_or("list");

    if command == "config" {
        print!("{}", toml::to_string_pretty(settings)?);
        return Ok(());
    }

    let index = LibraryIndex::new(&settings.library);
    match command {
        "list" => {
            let songs = index.catalog()?;
            if args.iter().any(|a| a == "--json") {
                println!("{}", serde_json::to_string_pretty(&songs)?);
            } else {
                print_songs(&songs);
            }
        }
        "search" => {
            let text = args[1..].join(" ");
            if text.trim().is_empty() {
                return Err(USAGE.into());
            }
            let songs = index.catalog()?;
            let results = browse::search(&songs, &SearchQuery::new(text));
            print_songs(&results.songs);
            println!("{} of {} matches", results.songs.len(), results.total);
        }
        "artists" => {
            for artist in browse::artists(&index.catalog()?) {
                println!("{:>5}  {}", artist.song_count, artist.name);
            }
        }
        "albums" => {
            for album in browse::albums(&index.catalog()?) {
                let year = if album.year > 0 {
                    format!(" [{}]", album.year)
                } else {
                    String::new()
                };
                println!("{:>5}  {} - {}{year}", album.song_count, album.artist, album.name);
            }
        }
        "stats" => {
            let stats = browse::stats(&index.catalog()?);
            println!("songs:    {}", stats.songs);
            println!("artists:  {}", stats.artists);
            println!("albums:   {}", stats.albums);
            println!(
                "duration: {}",
                songshelf::library::format_duration(stats.total_duration_secs as i64)
            );
            println!("size:     {} bytes", stats.total_bytes);
            for (format, count) in &stats.formats {
                println!("  {format}: {count}");
            }
        }
        _ => return Err(USAGE.into()),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let settings = load_settings();

    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("songshelf: failed to initialize logging: {e}");
    }

    match run(&args, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("songshelf: {e}");
            ExitCode::FAILURE
        }
    }
}
