use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songmap_engine::catalog::Track;
use songmap_engine::engine::{AnnotatedTrack, ClusterCountPolicy, EngineSettings};
use songmap_engine::task::ComputationTask;

fn parse_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if !path.exists() {
        return Err(format!("File does not exist: {}", s));
    }
    if !path.is_file() {
        return Err(format!("Path is not a file: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a JSON array of track records (already parsed, no CSV here).
    #[clap(value_parser = parse_file)]
    pub catalog: PathBuf,

    /// Where to write the annotated catalog as JSON. Stdout when omitted.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Neighbors to keep per track.
    #[clap(short, long, default_value_t = 10)]
    pub neighbors: usize,

    /// Fixed cluster count. Defaults to floor(sqrt(track count)).
    #[clap(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Maximum k-means iterations.
    #[clap(long, default_value_t = 100)]
    pub max_iterations: usize,
}

#[derive(Serialize)]
struct RunSummary {
    computed_at: String,
    duration_ms: u64,
    track_count: usize,
    neighbors_per_track: usize,
    tracks: Vec<AnnotatedTrack>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let raw = std::fs::read_to_string(&cli_args.catalog)
        .with_context(|| format!("Failed to read catalog file {:?}", cli_args.catalog))?;
    let tracks: Vec<Track> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse catalog file {:?}", cli_args.catalog))?;
    info!("Loaded {} tracks from {:?}", tracks.len(), cli_args.catalog);

    let settings = EngineSettings {
        cluster_count: match cli_args.clusters {
            Some(k) => ClusterCountPolicy::Fixed(k),
            None => ClusterCountPolicy::SqrtOfCatalog,
        },
        neighbors_per_track: cli_args.neighbors,
        max_iterations: cli_args.max_iterations,
        ..EngineSettings::default()
    };

    let track_count = tracks.len();
    let started = Instant::now();

    let task = ComputationTask::new(settings);
    let (tx, mut rx) = mpsc::unbounded_channel();
    task.on_result(move |outcome| {
        let _ = tx.send(outcome);
    });
    task.submit(tracks);

    let annotated = rx
        .recv()
        .await
        .context("Computation task dropped without delivering a result")??;

    let summary = RunSummary {
        computed_at: Utc::now().to_rfc3339(),
        duration_ms: started.elapsed().as_millis() as u64,
        track_count,
        neighbors_per_track: cli_args.neighbors,
        tracks: annotated,
    };

    info!(
        "Annotated {} tracks in {} ms",
        summary.track_count, summary.duration_ms
    );

    let json = serde_json::to_string_pretty(&summary)?;
    match &cli_args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write output to {:?}", path))?;
            info!("Wrote annotated catalog to {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
