// ring_detector - live doorbell ring detection
//
// Loads the configuration and the recorded baseline, opens the default
// microphone, and runs the detection loop until the stream fails.
// Every ring transition is logged and printed to stdout as a JSON
// line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;

use ringwatch::audio::{CaptureStream, SampleSource};
use ringwatch::baseline::store::{self, SMOOTH_TRACE_FILE, STATS_FILE};
use ringwatch::baseline::BaselineProfile;
use ringwatch::config::{AppConfig, Strategy};
use ringwatch::detect::{run_loop, RingDetector, RingEvent};

#[derive(Parser, Debug)]
#[command(
    name = "ring_detector",
    about = "Detect doorbell rings against a recorded baseline profile"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "ringwatch.json")]
    config: PathBuf,
    /// Directory holding the baseline artifacts written by ring_recorder
    #[arg(long, default_value = "baseline")]
    baseline_dir: PathBuf,
    /// Fill the window with the first reading instead of waiting out
    /// the cold-start grace period
    #[arg(long)]
    warm_start: bool,
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

    let baseline = load_baseline(&cli.baseline_dir, config.detection.strategy)?;
    baseline.require_min_len(config.detection.window_size)?;
    log::info!(
        "Loaded baseline ({} samples, strategy {:?})",
        baseline.window_len(),
        config.detection.strategy
    );

    let mut detector = RingDetector::from_config(&config.detection, &baseline)?;

    let (events_tx, events_rx) = broadcast::channel::<RingEvent>(64);
    let printer = spawn_event_printer(events_rx);

    let mut stream = CaptureStream::open(&config.audio).context("opening capture stream")?;
    if cli.warm_start {
        let first = stream.read_frame().context("reading warm-start frame")?;
        detector.prefill(ringwatch::audio::extract_volume(&first));
    }

    let result = run_loop(
        &mut stream,
        &mut detector,
        &events_tx,
        Duration::from_millis(config.audio.poll_interval_ms),
    );

    // Closing the sender lets the printer drain and exit
    drop(events_tx);
    printer.join().ok();

    result.context("detection loop failed")
}

/// The detector always loads the smoothed trace (it defines the window
/// length for every strategy); the moment/trend strategy loads the
/// statistics record instead.
fn load_baseline(dir: &PathBuf, strategy: Strategy) -> Result<BaselineProfile> {
    let profile = match strategy {
        Strategy::MomentTrendMatch => {
            let path = dir.join(STATS_FILE);
            BaselineProfile::Stats(
                store::load_stats(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
            )
        }
        _ => {
            let path = dir.join(SMOOTH_TRACE_FILE);
            BaselineProfile::Trace(
                store::load_trace(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
            )
        }
    };
    Ok(profile)
}

/// Drain ring events to stdout as JSON lines on a separate thread so
/// the detection loop never blocks on output.
fn spawn_event_printer(
    mut events: broadcast::Receiver<RingEvent>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || loop {
        match events.try_recv() {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => println!("{json}"),
                Err(err) => log::error!("failed to serialize event: {}", err),
            },
            Err(broadcast::error::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                log::warn!("event printer lagged, {} event(s) missed", missed);
            }
            Err(broadcast::error::TryRecvError::Closed) => break,
        }
    })
}
