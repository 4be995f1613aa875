//! Command-line betoneira detection.
//!
//! With API credentials the remote model is tried first; without them
//! the run is local-only.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use betoneira_core::init_with_level;
use betoneira_detect::{
    DetectionOrchestrator, DetectionResult, HttpInferenceClient, OfflineInferenceClient,
    OrchestratorParams,
};

#[derive(Parser, Debug)]
#[command(name = "betoneira-detect", version, about = "Detect betoneiras in an image")]
struct Cli {
    /// Input image (any format the image crate decodes).
    image: PathBuf,

    /// Expected betoneira count for the quantity check.
    #[arg(long, default_value_t = 1)]
    expected: u32,

    /// Base URL of the hosted inference API.
    #[arg(long, env = "BETONEIRA_API_URL")]
    api_url: Option<String>,

    /// API key for the hosted inference API.
    #[arg(long, env = "BETONEIRA_API_KEY")]
    api_key: Option<String>,

    /// Model identifier, `<project>/<version>`.
    #[arg(long, default_value = "betoneira-detector/1")]
    model: String,

    /// Lower the remote confidence floor to 0.1.
    #[arg(long)]
    aggressive: bool,

    /// Write the annotated image here.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the full result as JSON instead of the summary.
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    init_with_level(level)?;

    let params = if cli.aggressive {
        OrchestratorParams::aggressive()
    } else {
        OrchestratorParams::conservative()
    };

    let result = match (&cli.api_url, &cli.api_key) {
        (Some(url), Some(key)) => {
            let client = HttpInferenceClient::new(url.clone(), key.clone(), cli.model.clone());
            DetectionOrchestrator::with_params(client, params)
                .detect_path(&cli.image, cli.expected)?
        }
        _ => {
            log::warn!("no API credentials given; running local-only");
            DetectionOrchestrator::with_params(OfflineInferenceClient, params)
                .detect_path(&cli.image, cli.expected)?
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report(&result);
    }

    if let Some(out) = &cli.out {
        result.annotated.save(out)?;
        log::info!("annotated image written to {}", out.display());
    }

    Ok(())
}

fn report(result: &DetectionResult) {
    println!(
        "detected {} betoneira(s) ({} remote, {} local), expected {} [{}]",
        result.total_detected,
        result.remote_count,
        result.local_count,
        result.expected_count,
        match result.quantity_status {
            betoneira_detect::QuantityStatus::Match => "match",
            betoneira_detect::QuantityStatus::Mismatch => "mismatch",
        }
    );
    for d in &result.detections {
        println!(
            "  {}  {:<12} conf {:.2}  color {:<7} box ({}, {})-({}, {})",
            d.id,
            d.class_name,
            d.confidence,
            d.color.as_str(),
            d.bbox.x1,
            d.bbox.y1,
            d.bbox.x2,
            d.bbox.y2
        );
    }
}
