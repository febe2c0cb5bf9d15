use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use luga::{
    normalize_many, parse_prediction_line, ArtifactConfig, BatchOptions, BatchOutput,
    ModelManager, DEFAULT_THRESHOLD,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the cached model artifact
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Seconds allowed for establishing the connection
    #[arg(long, global = true)]
    connect_timeout: Option<u64>,

    /// Seconds allowed for the whole transfer (0 disables the limit)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the model artifact unless it is already cached
    Fetch {
        /// Download again even if a cached copy exists
        #[arg(short, long)]
        force: bool,
        /// Fetch from this URL instead of the configured one
        #[arg(long)]
        url: Option<String>,
    },
    /// Delete the cached model artifact
    Evict,
    /// Show where the artifact lives and whether it verifies
    Status,
    /// Normalize fastText `predict-prob` lines read from stdin
    Normalize {
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
        /// Print language codes only
        #[arg(long)]
        only_language: bool,
        /// Print a JSON array instead of one result per line
        #[arg(long)]
        json: bool,
    },
}

fn artifact_config(args: &Args) -> ArtifactConfig {
    let mut config = ArtifactConfig::from_env();
    if let Some(cache_dir) = &args.cache_dir {
        config.cache_dir = cache_dir.clone();
    }
    if let Some(secs) = args.connect_timeout {
        config.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.timeout {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config
}

fn main() -> Result<()> {
    luga::init_logger();
    let args = Args::parse();
    let config = artifact_config(&args);

    match args.command {
        Command::Fetch { force, url } => fetch(config, force, url),
        Command::Evict => {
            let manager = ModelManager::new(config)?;
            if manager.evict()? {
                println!("Removed {}", manager.artifact_path().display());
            } else {
                println!("Nothing cached at {}", manager.artifact_path().display());
            }
            Ok(())
        }
        Command::Status => {
            let manager = ModelManager::new(config)?;
            println!("Source:   {}", manager.config().source_url);
            println!("Artifact: {}", manager.artifact_path().display());
            println!("Present:  {}", manager.is_present());
            if manager.config().sha256.is_some() {
                println!("Verified: {}", manager.verify()?);
            }
            Ok(())
        }
        Command::Normalize {
            threshold,
            only_language,
            json,
        } => normalize(threshold, only_language, json),
    }
}

fn fetch(config: ArtifactConfig, force: bool, url: Option<String>) -> Result<()> {
    let manager = ModelManager::new(config)?;
    let url = url.unwrap_or_else(|| manager.config().source_url.clone());

    let start_time = Instant::now();
    manager
        .ensure_present(&url, force)
        .with_context(|| format!("Failed to fetch model artifact from {}", url))?;
    info!("Artifact ready (took {:.2?})", start_time.elapsed());

    println!("{}", manager.artifact_path().display());
    Ok(())
}

fn normalize(threshold: f64, only_language: bool, json: bool) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        bail!("Threshold must be between 0.0 and 1.0, got {}", threshold);
    }

    let mut labels = Vec::new();
    let mut scores = Vec::new();
    for (number, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            // no prediction for this input; NaN never clears the threshold
            labels.push(String::new());
            scores.push(f64::NAN);
            continue;
        }
        let (label, score) =
            parse_prediction_line(&line).with_context(|| format!("Line {}", number + 1))?;
        labels.push(label);
        scores.push(score);
    }

    let options = BatchOptions::new()
        .with_threshold(threshold)
        .with_only_language(only_language);
    let output = normalize_many(&labels, &scores, options)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match output {
        BatchOutput::Languages(languages) if json => {
            writeln!(out, "{}", serde_json::to_string(&languages)?)?;
        }
        BatchOutput::Languages(languages) => {
            for language in languages {
                writeln!(out, "{}\t{}", language.name(), language.score())?;
            }
        }
        other if json => {
            writeln!(out, "{}", serde_json::to_string(&other.into_names())?)?;
        }
        other => {
            for name in other.into_names() {
                writeln!(out, "{}", name)?;
            }
        }
    }
    Ok(())
}
