//! PlaceSnap - capture Chinese signage as geotagged, translated snaps
//!
//! Command line front end for the capture pipeline and the snap store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use place_snap::capture::{
    CaptureImage, CaptureOrchestrator, CaptureOutcome, PipelineError, SnapSummary,
};
use place_snap::config::{self, AppConfig};
use place_snap::services::{FixedLocator, LibreTranslateClient, NominatimGeocoder, PaddleOcrClient};
use place_snap::storage::{self, SnapStore, SqliteSnapStore};

/// PlaceSnap - photograph a sign, keep the place
#[derive(Parser, Debug)]
#[command(name = "place-snap", version)]
#[command(about = "Recognize, locate and translate Chinese place names from photos")]
struct Args {
    /// Config file (defaults to config.toml in the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the place name in an image and save it
    Capture {
        /// Image file
        image: PathBuf,
    },
    /// Save a chosen or corrected name for an image
    Confirm {
        /// Image file
        image: PathBuf,
        /// Name to save
        text: String,
    },
    /// List saved snaps, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Number of saved snaps
    Count,
    /// Delete a snap by id
    Delete {
        id: String,
    },
    /// Delete all snaps
    Clear,
    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => storage::get_config_dir()?.join("config.toml"),
    };

    let config = load_or_create_config(&config_path);

    match args.command {
        Command::Config { init } => run_config(&config, &config_path, init)?,
        Command::Capture { image } => {
            let orchestrator = build_orchestrator(&config, open_store(&config)?)?;
            let image = open_image(&image)?;
            let cancel = cancel_on_ctrl_c();

            match orchestrator.process_with_cancel(&image, &cancel).await {
                Ok(CaptureOutcome::Saved(summary)) => print_summary(&summary),
                Ok(CaptureOutcome::NeedsSelection(candidates)) => {
                    println!("Several possible names were found:");
                    for (i, candidate) in candidates.iter().enumerate() {
                        println!("  [{}] {}", i + 1, candidate);
                    }
                    println!();
                    println!("Save one with: place-snap confirm {} <NAME>", image.path.display());
                }
                Err(err) => handle_pipeline_error(&orchestrator, &image, err)?,
            }
        }
        Command::Confirm { image, text } => {
            let orchestrator = build_orchestrator(&config, open_store(&config)?)?;
            let image = open_image(&image)?;
            let cancel = cancel_on_ctrl_c();

            match orchestrator.confirm_with_cancel(&text, &image, &cancel).await {
                Ok(summary) => print_summary(&summary),
                Err(err) => handle_pipeline_error(&orchestrator, &image, err)?,
            }
        }
        Command::List { json } => {
            let snaps = open_store(&config)?.list_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snaps)?);
            } else if snaps.is_empty() {
                println!("No snaps saved yet");
            } else {
                for snap in &snaps {
                    println!(
                        "{}  {}  {}  {}",
                        snap.created_at.format("%Y-%m-%d %H:%M"),
                        snap.id,
                        snap.recognized_text,
                        snap.translation
                    );
                }
            }
        }
        Command::Count => println!("{}", open_store(&config)?.count()?),
        Command::Delete { id } => {
            if open_store(&config)?.delete(&id)? {
                println!("Deleted {}", id);
            } else {
                println!("No snap with id {}", id);
            }
        }
        Command::Clear => {
            let removed = open_store(&config)?.clear()?;
            println!("Deleted {} snaps", removed);
        }
    }

    Ok(())
}

/// Load configuration from file or create default
fn load_or_create_config(config_path: &Path) -> AppConfig {
    if config_path.exists() {
        match config::load_config(config_path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                return config;
            }
            Err(e) => warn!("Ignoring unreadable configuration: {:#}", e),
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

fn open_store(config: &AppConfig) -> Result<Arc<SqliteSnapStore>> {
    let db_path = config.storage.resolve_database_path()?;
    let store = SqliteSnapStore::open(&db_path)
        .with_context(|| format!("Failed to open snap database {}", db_path.display()))?;
    Ok(Arc::new(store))
}

fn run_config(config: &AppConfig, config_path: &Path, init: bool) -> Result<()> {
    if init {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config::save_config(&AppConfig::default(), config_path)?;
        println!("Wrote default configuration to {}", config_path.display());
        return Ok(());
    }

    println!("# {}", config_path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn build_orchestrator(config: &AppConfig, store: Arc<SqliteSnapStore>) -> Result<CaptureOrchestrator> {
    let recognizer = PaddleOcrClient::new(&config.recognition).context("Failed to set up text recognition")?;
    let geocoder = NominatimGeocoder::new(&config.geocoding).context("Failed to set up reverse geocoding")?;
    let translator = LibreTranslateClient::new(&config.translation).context("Failed to set up translation")?;

    let mut orchestrator = CaptureOrchestrator::new(
        config.pipeline_config(),
        Arc::new(recognizer),
        Arc::new(geocoder),
        Arc::new(translator),
        store,
    );

    if config.location.live_fallback {
        match config.location.fallback_coordinates() {
            Some(coordinates) => {
                orchestrator = orchestrator.with_device_locator(Arc::new(FixedLocator::new(coordinates)));
            }
            None => warn!("Live location enabled but no valid fallback coordinates configured"),
        }
    }

    Ok(orchestrator)
}

fn open_image(path: &Path) -> Result<CaptureImage> {
    CaptureImage::open(path).with_context(|| format!("Failed to read image {}", path.display()))
}

/// Token that fires on Ctrl+C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

fn handle_pipeline_error(
    orchestrator: &CaptureOrchestrator,
    image: &CaptureImage,
    err: PipelineError,
) -> Result<()> {
    match err {
        PipelineError::PoorQuality { text } => {
            println!("The recognized text '{}' looks unreliable.", text);
            println!("Save it anyway with: place-snap confirm {} '{}'", image.path.display(), text);
            Ok(())
        }
        PipelineError::NoTextDetected => {
            println!("No text detected in {}", image.path.display());
            Ok(())
        }
        PipelineError::PersistenceFailed { source, pending } => {
            eprintln!("Failed to save snap: {}", source);
            if !ask("Retry saving?")? {
                anyhow::bail!("Snap was not saved");
            }
            let summary = orchestrator.retry_persist(*pending)?;
            print_summary(&summary);
            Ok(())
        }
        other => Err(other.into()),
    }
}

fn ask(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_summary(summary: &SnapSummary) {
    println!("Saved {}", summary.id);
    println!("  Name:        {}", summary.text);
    println!("  Pinyin:      {}", summary.pinyin);
    println!("  Translation: {}", summary.translation);
    println!("  Address:     {}", summary.address);
    if let Some(link) = &summary.maps_link {
        println!("  Map:         {}", link);
    }
    for degradation in &summary.degradations {
        println!("  Note:        {}", degradation);
    }
    println!("  Total snaps: {}", summary.total_count);
}
