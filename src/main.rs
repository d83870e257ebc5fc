use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use dupescan::logging::init_logging;
use dupescan::scanner::scan_images;
use dupescan::{DetectionResult, Detector, DetectorConfig, ImageInput, Method};

#[derive(Parser)]
#[command(name = "dupescan")]
#[command(about = "Find near-duplicate images in a directory")]
struct Cli {
    /// Directory to scan for images
    dir: PathBuf,

    /// Fingerprinting method: phash, dhash, ahash, or grid
    #[arg(long, default_value = "phash")]
    method: String,

    /// Similarity threshold in (0, 1]; higher requires closer matches
    #[arg(long, default_value_t = 0.9)]
    threshold: f64,

    /// Use the indexed matcher where applicable
    #[arg(long)]
    accelerate: bool,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging - guard must be held for logs to flush
    let _guard = init_logging().ok();
    let verbose = std::env::var("DUPESCAN_LOG").is_ok();
    let start = Instant::now();

    let cli = Cli::parse();

    let result = run_scan(cli);

    if verbose {
        let elapsed = start.elapsed();
        eprintln!("Completed in {:.2?}", elapsed);
    }

    result
}

fn run_scan(cli: Cli) -> Result<()> {
    if !cli.dir.is_dir() {
        anyhow::bail!("Not a directory: {}", cli.dir.display());
    }

    let method: Method = cli
        .method
        .parse()
        .with_context(|| format!("Invalid --method '{}'", cli.method))?;

    let mut config = DetectorConfig::new(method, cli.threshold);
    config.use_accelerator = cli.accelerate;
    let detector = Detector::new(config).context("Invalid configuration")?;

    let paths = scan_images(&cli.dir);
    let inputs: Vec<ImageInput> = paths.iter().map(ImageInput::from_path).collect();

    let spinner = (!cli.json).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Comparing {} images...", inputs.len()));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    });

    let result = detector.detect(&inputs)?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_human(&result);
    }

    Ok(())
}

fn print_human(result: &DetectionResult) {
    if let Some(message) = &result.message {
        println!("{} ({} of {} files usable)", message, result.statistics.valid_files, result.statistics.total_files);
        return;
    }

    if result.duplicates.is_empty() {
        println!("No duplicates found.");
    } else {
        println!("Visually similar groups ({}):", result.method);
        for (i, (key, duplicates)) in result.duplicates.iter().enumerate() {
            println!("  Group {} ({} files):", i + 1, duplicates.len() + 1);
            println!("    {}", key);
            for dup in duplicates {
                println!("    {}", dup);
            }
        }
        println!();
    }

    let stats = &result.statistics;
    println!(
        "Summary: {} group(s), {} duplicate(s), {} of {} files valid{}",
        stats.duplicate_groups,
        stats.total_duplicates,
        stats.valid_files,
        stats.total_files,
        if result.accelerated { " (indexed)" } else { "" }
    );
}
