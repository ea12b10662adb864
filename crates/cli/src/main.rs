use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use renamarr_core::{EpisodeKey, ReconciledEpisode, Selection};
use renamarr_providers::{CatalogProvider, SonarrClient, StatusProvider, TvdbClient};

#[derive(Parser)]
#[command(name = "renamarr", version, about = "Reconcile TV episodes with their files and rename them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalog and the library for a series
    Search { query: String },

    /// Show the reconciled season view with multi-episode candidates
    Episodes {
        /// TVDB series id
        #[arg(long)]
        series: String,
        #[arg(long)]
        season: u32,
        /// Sonarr series id; omit to show catalog data only
        #[arg(long)]
        sonarr_series: Option<String>,
    },

    /// Rename a file to the canonical name for the selected episodes
    Rename {
        /// The video file to rename
        #[arg(long)]
        file: PathBuf,
        /// TVDB series id
        #[arg(long)]
        series: String,
        #[arg(long)]
        season: u32,
        /// Sonarr series id; omit to reconcile against the catalog only
        #[arg(long)]
        sonarr_series: Option<String>,
        /// Episode numbers confirmed to be in the file, e.g. --episodes 1,2
        #[arg(long, value_delimiter = ',', required = true)]
        episodes: Vec<u32>,
        /// Perform the rename; default is a preview
        #[arg(long)]
        yes: bool,
        /// Ask Sonarr to rescan the series after a successful rename
        #[arg(long)]
        rescan: bool,
    },

    /// Ask Sonarr to rescan a series
    Rescan {
        /// Sonarr series id
        #[arg(long)]
        series: String,
    },

    /// Extract one frame as PNG for visual episode confirmation
    Frame {
        #[arg(long)]
        file: PathBuf,
        /// Timestamp in seconds
        #[arg(long, default_value_t = 60.0)]
        at: f64,
        /// Output path; defaults to frame_<seconds>.png next to the video
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Search { query } => search(&query).await,
        Command::Episodes {
            series,
            season,
            sonarr_series,
        } => episodes(&series, season, sonarr_series.as_deref()).await,
        Command::Rename {
            file,
            series,
            season,
            sonarr_series,
            episodes,
            yes,
            rescan,
        } => {
            rename(
                &file,
                &series,
                season,
                sonarr_series.as_deref(),
                &episodes,
                yes,
                rescan,
            )
            .await
        }
        Command::Rescan { series } => {
            let sonarr = sonarr_from_env()?;
            sonarr
                .trigger_rescan(&series)
                .await
                .context("rescan command failed")?;
            println!("Rescan triggered for Sonarr series {series}");
            Ok(())
        }
        Command::Frame { file, at, out } => frame(&file, at, out).await,
    }
}

async fn search(query: &str) -> anyhow::Result<()> {
    let tvdb = tvdb_from_env()?;
    let results = tvdb
        .search_series(query)
        .await
        .context("catalog search failed")?;

    println!("Catalog (TVDB):");
    for r in &results {
        let year = r.year.map(|y| format!(" ({y})")).unwrap_or_default();
        println!("  {}  {}{}", r.provider_id, r.title, year);
    }

    if let Ok(sonarr) = sonarr_from_env() {
        let results = sonarr
            .search_series(query)
            .await
            .context("library search failed")?;
        println!("Library (Sonarr):");
        for r in &results {
            let year = r.year.map(|y| format!(" ({y})")).unwrap_or_default();
            println!("  {}  {}{}", r.provider_id, r.title, year);
        }
    }

    Ok(())
}

async fn episodes(
    series: &str,
    season: u32,
    sonarr_series: Option<&str>,
) -> anyhow::Result<()> {
    let merged = reconciled_season(series, season, sonarr_series).await?;

    for ep in &merged {
        let aired = ep
            .air_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unaired".into());
        let file = if ep.has_file {
            ep.quality_tag.clone().unwrap_or_else(|| "file".into())
        } else {
            "missing".into()
        };
        let flag = if ep.is_multi_episode_candidate {
            "  << multi-episode?"
        } else {
            ""
        };
        println!("{}  {}  {}  {}{}", ep.key(), aired, file, ep.title, flag);
    }

    Ok(())
}

async fn rename(
    file: &Path,
    series: &str,
    season: u32,
    sonarr_series: Option<&str>,
    episodes: &[u32],
    yes: bool,
    rescan: bool,
) -> anyhow::Result<()> {
    let merged = reconciled_season(series, season, sonarr_series).await?;

    let keys: Vec<EpisodeKey> = episodes
        .iter()
        .map(|&e| EpisodeKey::new(season, e))
        .collect();
    let selection = Selection::new(keys).context("invalid episode selection")?;

    let plan = renamarr_engine::plan_rename(file, &selection, &merged)
        .context("could not build rename plan")?;

    println!("  from: {}", plan.source_path.display());
    println!("    to: {}", plan.target_path.display());

    if !yes {
        println!("Preview only. Re-run with --yes to rename.");
        return Ok(());
    }

    let outcome = renamarr_engine::execute(&plan).context("rename failed")?;
    if outcome.changed {
        println!("Renamed.");
    } else {
        println!("Already named correctly; nothing to do.");
    }

    if rescan && outcome.changed {
        match sonarr_series {
            Some(id) => {
                let sonarr = sonarr_from_env()?;
                sonarr
                    .trigger_rescan(id)
                    .await
                    .context("rescan command failed")?;
                println!("Rescan triggered for Sonarr series {id}");
            }
            None => bail!("--rescan needs --sonarr-series"),
        }
    }

    Ok(())
}

async fn frame(file: &Path, at: f64, out: Option<PathBuf>) -> anyhow::Result<()> {
    let ffmpeg = PathBuf::from(env_or("RENAMARR_FFMPEG", "ffmpeg"));
    let ffprobe = PathBuf::from(env_or("RENAMARR_FFPROBE", "ffprobe"));

    let duration = renamarr_frames::probe_duration(&ffprobe, file)
        .await
        .context("could not probe video duration")?;
    if at > duration {
        bail!("timestamp {at}s is past the end of the video ({duration:.0}s)");
    }

    let png = renamarr_frames::extract_frame(&ffmpeg, file, at)
        .await
        .context("frame extraction failed")?;

    let out = out.unwrap_or_else(|| {
        file.with_file_name(format!("frame_{}.png", at.round() as u64))
    });
    std::fs::write(&out, &png)
        .with_context(|| format!("could not write {}", out.display()))?;

    info!(out = %out.display(), bytes = png.len(), "frame written");
    println!("Wrote {} ({}s of {:.0}s)", out.display(), at, duration);
    Ok(())
}

/// Fetch catalog episodes and, when a Sonarr series id is given, overlay
/// library statuses. Reconciliation itself is pure; all network I/O
/// happens here.
async fn reconciled_season(
    series: &str,
    season: u32,
    sonarr_series: Option<&str>,
) -> anyhow::Result<Vec<ReconciledEpisode>> {
    let tvdb = tvdb_from_env()?;
    let catalog = tvdb
        .season_episodes(series, season)
        .await
        .context("could not list catalog episodes")?;
    if catalog.is_empty() {
        bail!("catalog has no episodes for series {series} season {season}");
    }

    let statuses = match sonarr_series {
        Some(id) => {
            let sonarr = sonarr_from_env()?;
            sonarr
                .season_statuses(id, season)
                .await
                .context("could not list library statuses")?
        }
        None => Vec::new(),
    };

    Ok(renamarr_engine::reconcile(&catalog, &statuses)?)
}

fn tvdb_from_env() -> anyhow::Result<TvdbClient> {
    let api_key = std::env::var("TVDB_API_KEY").context("TVDB_API_KEY is not set")?;
    Ok(TvdbClient::new(api_key))
}

fn sonarr_from_env() -> anyhow::Result<SonarrClient> {
    let url = std::env::var("SONARR_URL").context("SONARR_URL is not set")?;
    let api_key = std::env::var("SONARR_API_KEY").context("SONARR_API_KEY is not set")?;
    Ok(SonarrClient::new(url, api_key))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
