use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use playlist_vibe_check::analysis::{AnalysisSettings, analyze_playlist};
use playlist_vibe_check::config::load_config;
use playlist_vibe_check::ingest::{InputFormat, load_from_path};
use playlist_vibe_check::models::AudioFeature;

#[derive(Parser)]
#[command(name = "playlist-vibe-check")]
#[command(about = "Playlist statistics and strategic track sampling for vibe-check reports")]
#[command(version)]
struct Args {
    /// Playlist export to analyze (CSV, JSON track array or saved Spotify response)
    input: PathBuf,

    /// Input format; inferred from the file when omitted
    #[arg(short = 'f', long = "format", value_enum)]
    format: Option<InputFormat>,

    /// Playlist name used in the payload
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Maximum number of sampled tracks
    #[arg(short = 'm', long = "max-sample")]
    max_sample: Option<usize>,

    /// Seed for the sampler's random draws
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// JSON file with analysis settings
    #[arg(long = "settings")]
    settings_file: Option<String>,

    /// Write the payload JSON here instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Quiet mode - reduce output verbosity
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.quiet {
        "playlist_vibe_check=warn"
    } else {
        "playlist_vibe_check=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if !args.input.exists() {
        eprintln!("Error: Input file '{}' not found.", args.input.display());
        return Err(anyhow::anyhow!(
            "Input file '{}' not found",
            args.input.display()
        ));
    }

    // Environment first, then the settings file, then command-line flags
    let config = load_config()?;
    let mut settings = match &args.settings_file {
        Some(path) => AnalysisSettings::load_over(&config, path)
            .map_err(|e| anyhow::anyhow!("Failed to load analysis settings '{}': {}", path, e))?,
        None => AnalysisSettings::from(&config),
    };
    if let Some(max_sample) = args.max_sample {
        settings.max_sample_size = max_sample;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    info!(?settings, "analysis settings");

    let playlist = load_from_path(&args.input, args.format)
        .with_context(|| format!("Failed to load '{}'", args.input.display()))?;

    let playlist_name = args
        .name
        .or(playlist.name)
        .or_else(|| {
            args.input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "Untitled Playlist".to_string());

    let payload = analyze_playlist(&playlist.tracks, &playlist_name, &settings);

    if !args.quiet {
        let basic = &payload.basic_analysis;
        eprintln!("\n{}", payload.playlist_name);
        eprintln!("{}", "=".repeat(payload.playlist_name.len()));
        eprintln!(
            "   Tracks: {} | Sampled: {}",
            payload.total_tracks, payload.analyzed_tracks
        );
        eprintln!(
            "   Unique Artists: {} | Unique Albums: {} | Duration: {:.1} min",
            basic.artists_count, basic.albums_count, basic.duration_minutes
        );
        eprintln!("   Avg Popularity: {:.1}/100", basic.avg_popularity);
        if let Some(ratio) = basic.explicit_ratio {
            eprintln!("   Explicit: {:.1}%", ratio * 100.0);
        }
        for feature in AudioFeature::ALL {
            let stats = basic.feature(feature);
            eprintln!(
                "   {}: {:.2} (sd {:.2})",
                feature.key(),
                stats.mean,
                stats.std
            );
        }
        if !basic.top_artists.is_empty() {
            let top_3: Vec<String> = basic
                .top_artists
                .iter()
                .take(3)
                .map(|(artist, count)| format!("{artist} ({count})"))
                .collect();
            eprintln!("   Top Artists: {}", top_3.join(", "));
        }
        for (i, track) in payload.track_samples.iter().take(5).enumerate() {
            eprintln!(
                "     {}. \"{}\" by {} (Popularity: {}/100)",
                i + 1,
                track.name,
                track.artist,
                track.popularity
            );
        }
    }

    let json = serde_json::to_string_pretty(&payload)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "wrote analysis payload");
        }
        None => println!("{json}"),
    }

    Ok(())
}
