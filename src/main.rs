//! Replay recorded keypoint frames through a movement analysis session.
//!
//! Frames are read as newline-delimited JSON (one frame per line) from a file
//! or standard input. Periodic snapshots and the terminal summary are printed
//! as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use movement_analysis::{
    config::{Config, EXAMPLE_CONFIG},
    ExerciseSession, ExerciseType, Frame,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Newline-delimited JSON frames (standard input when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Exercise to analyse (defaults to the configured exercise)
    #[arg(short, long)]
    exercise: Option<ExerciseType>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Print a snapshot every N frames (0 prints only the summary)
    #[arg(long, default_value = "0")]
    every: usize,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Load configuration if provided
    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    let exercise = args.exercise.unwrap_or(config.exercise_type);
    let mut session = ExerciseSession::start(exercise, config).context("Failed to start session")?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut accepted = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Frame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping line {}: {e}", index + 1);
                continue;
            }
        };

        let result = match session.process_frame(&frame) {
            Ok(result) => result,
            Err(e) => {
                warn!("Skipping line {}: {e}", index + 1);
                continue;
            }
        };

        accepted += 1;
        if args.every > 0 && accepted % args.every == 0 {
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    let summary = session.stop();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
