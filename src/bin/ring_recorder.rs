// ring_recorder - record a doorbell baseline profile
//
// Captures loudness from the default microphone for a fixed number of
// samples, filters recording artifacts, and writes the three baseline
// artifacts the detector can load: the raw trace, the smoothed trace
// and the summary-statistics record.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use ringwatch::audio::CaptureStream;
use ringwatch::baseline::store::{SMOOTH_TRACE_FILE, STATS_FILE, TRACE_FILE};
use ringwatch::baseline::{record_baseline, store, BaselineBuilder};
use ringwatch::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "ring_recorder",
    about = "Record a doorbell-ring baseline profile from the microphone"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "ringwatch.json")]
    config: PathBuf,
    /// Directory the baseline artifacts are written to
    #[arg(long, default_value = "baseline")]
    output_dir: PathBuf,
    /// Number of loudness samples to record (defaults to the configured
    /// window size)
    #[arg(long)]
    samples: Option<usize>,
    /// Skip the outlier filter
    #[arg(long)]
    keep_outliers: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let sample_count = cli.samples.unwrap_or(config.detection.window_size);
    let poll_interval = Duration::from_millis(config.audio.poll_interval_ms);

    let mut stream = CaptureStream::open(&config.audio).context("opening capture stream")?;
    log::info!("Recording {} loudness samples", sample_count);
    let recording = record_baseline(&mut stream, sample_count, poll_interval)
        .context("recording baseline")?;
    drop(stream);

    let builder = BaselineBuilder::new(
        config.detection.window_size,
        config.detection.smoothing_window,
    )
    .with_outlier_filter(!cli.keep_outliers);

    let raw = builder.raw_trace(&recording)?;
    let smoothed = builder.smoothed_trace(&recording)?;
    let stats = builder.stats(&recording)?;

    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;
    store::save_trace(cli.output_dir.join(TRACE_FILE), &raw)?;
    store::save_trace(cli.output_dir.join(SMOOTH_TRACE_FILE), &smoothed)?;
    store::save_stats(cli.output_dir.join(STATS_FILE), &stats)?;

    log::info!(
        "Baseline written to {} ({} samples, mean volume {:.2})",
        cli.output_dir.display(),
        raw.len(),
        stats.mean
    );
    Ok(())
}
