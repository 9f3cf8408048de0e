/*
    promptlist-rs | Generate Spotify playlists from music preferences with an LLM.
    Copyright (C) 2026  The promptlist authors

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use promptlist_core::models::MatchConfidence;
use promptlist_core::{
    get_spotify_client, AnthropicModel, BatchConfig, Pipeline, PlaylistPublisher, RawCriteria,
    SpotifyPublisher, SpotifySearcher,
};
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "promptlist")]
#[command(about = "Generate Spotify playlists from your music preferences with an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the Spotify authorization flow once and caches the token
    Login,
    /// Generates a playlist from the given criteria
    Generate {
        /// Genre to draw from (repeat for several; at least one required)
        #[arg(long = "genre", required = true)]
        genres: Vec<String>,

        /// Subgenre to lean into (repeatable)
        #[arg(long = "subgenre")]
        subgenres: Vec<String>,

        /// Region the songs should come from (repeatable)
        #[arg(long = "region")]
        regions: Vec<String>,

        /// Language the lyrics should be in (repeatable)
        #[arg(long = "language")]
        languages: Vec<String>,

        /// Mood of the playlist (repeatable)
        #[arg(long = "mood")]
        moods: Vec<String>,

        /// Era the songs should be from (repeatable)
        #[arg(long = "era")]
        eras: Vec<String>,

        /// Number of songs to generate
        #[arg(long, short = 'n', default_value_t = 20)]
        count: i64,

        /// Obscurity bias from 1 (mainstream) to 10 (hidden gems)
        #[arg(long, short = 'u', default_value_t = 5)]
        uniqueness: i64,

        /// Free-text instruction appended to the generated criteria
        #[arg(long)]
        prompt: Option<String>,

        /// Create the playlist on your Spotify account under this name
        #[arg(long, value_name = "NAME")]
        publish: Option<String>,

        /// Output the full outcome report to a JSON file
        #[arg(long)]
        json: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Login => handle_login().await,
        Commands::Generate {
            genres,
            subgenres,
            regions,
            languages,
            moods,
            eras,
            count,
            uniqueness,
            prompt,
            publish,
            json,
        } => {
            let raw = RawCriteria {
                genres: Some(genres),
                subgenres: Some(subgenres),
                regions: Some(regions),
                languages: Some(languages),
                moods: Some(moods),
                eras: Some(eras),
                song_count: Some(count),
                uniqueness: Some(uniqueness),
                user_prompt: prompt,
            };
            handle_generate(raw, publish.as_deref(), json.as_deref()).await;
        }
    }
}

async fn handle_login() {
    match get_spotify_client().await {
        Ok(_) => println!("[OK] Spotify authorization complete. Token cached."),
        Err(e) => {
            eprintln!("Spotify authorization failed: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_generate(raw: RawCriteria, publish_name: Option<&str>, json_path: Option<&str>) {
    let api_key = match std::env::var("ANTHROPIC_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Missing ANTHROPIC_API_KEY in the environment.");
            process::exit(1);
        }
    };

    let model = match AnthropicModel::new(api_key) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            eprintln!("Error initializing model client: {}", e);
            process::exit(1);
        }
    };

    let spotify = match get_spotify_client().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing Spotify client: {}", e);
            process::exit(1);
        }
    };
    let publisher = SpotifyPublisher::new(spotify.clone());
    let searcher = Arc::new(SpotifySearcher::new(spotify));

    let description = describe(&raw);
    let pipeline = Pipeline::new(model, searcher, BatchConfig::default());

    println!("Asking the model for candidates and matching them on Spotify...");
    let outcome = match pipeline.run(raw).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!();
            eprintln!("Generation failed: {}", e);
            process::exit(1);
        }
    };

    println!();
    println!("---------------------------------------------------");
    println!("GENERATION REPORT");
    println!("---------------------------------------------------");
    println!("Candidates proposed:  {}", outcome.total);
    println!("Matched on Spotify:   {}", outcome.found);
    println!("Not matched:          {}", outcome.not_found);
    if outcome.partial {
        println!("NOTE: run was cancelled; results are partial.");
    }
    println!("---------------------------------------------------");

    for (i, track) in outcome.resolved.iter().enumerate() {
        println!(
            "{:>3}. {} - {} [{}]",
            i + 1,
            track.source.artist,
            track.source.title,
            match track.confidence {
                MatchConfidence::Exact => "exact",
                MatchConfidence::Fallback => "fallback",
            }
        );
    }

    if !outcome.failed.is_empty() {
        println!();
        println!("Could not match:");
        for failed in &outcome.failed {
            println!("   - {}", failed);
        }
    }

    if outcome.is_barren() {
        println!();
        println!("None of the proposed tracks could be matched on Spotify.");
        println!("Try different criteria or a lower uniqueness.");
    }

    if let Some(path) = json_path {
        match File::create(path) {
            Ok(mut file) => {
                let json_content = serde_json::to_string_pretty(&outcome).unwrap_or_default();
                if let Err(e) = file.write_all(json_content.as_bytes()) {
                    eprintln!();
                    eprintln!("[ERROR] Failed to write report to file: {}", e);
                } else {
                    println!();
                    println!("[SAVED] Report saved to: {}", path);
                }
            }
            Err(e) => eprintln!("[ERROR] Failed to create file '{}': {}", path, e),
        }
    }

    if let Some(name) = publish_name {
        if outcome.resolved.is_empty() {
            println!();
            println!("Nothing to publish; skipping playlist creation.");
            return;
        }

        let uris: Vec<String> = outcome.resolved.iter().map(|t| t.uri.clone()).collect();
        match publisher.publish(name, &description, &uris).await {
            Ok(playlist) => {
                println!();
                println!("[OK] Created playlist '{}' with {} tracks.", playlist.name, uris.len());
                if !playlist.url.is_empty() {
                    println!("     {}", playlist.url);
                }
            }
            Err(e) => {
                eprintln!();
                eprintln!("[ERROR] Publishing failed: {}", e);
                process::exit(1);
            }
        }
    }
}

fn describe(raw: &RawCriteria) -> String {
    let genres = raw
        .genres
        .as_deref()
        .unwrap_or_default()
        .join(", ");
    format!("Generated playlist ({})", genres)
}
