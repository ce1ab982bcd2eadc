// Baseline persistence
//
// Two on-disk formats: trace profiles are CSV with a `counter,volume`
// header row, statistics profiles are a JSON record. The detection
// core only ever sees the typed, already-parsed BaselineProfile value.

use std::fs;
use std::path::Path;

use crate::detect::stats::SeriesStats;
use crate::error::BaselineError;

/// Raw trace artifact written by the recorder.
pub const TRACE_FILE: &str = "baseline.csv";
/// Smoothed trace artifact, the one the detector loads.
pub const SMOOTH_TRACE_FILE: &str = "baseline_smooth.csv";
/// Summary statistics artifact.
pub const STATS_FILE: &str = "baseline_stats.json";

fn io_err(path: &Path, err: impl std::fmt::Display) -> BaselineError {
    BaselineError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Write a trace as `counter,volume` CSV rows.
pub fn save_trace<P: AsRef<Path>>(path: P, trace: &[f64]) -> Result<(), BaselineError> {
    let path = path.as_ref();
    let mut out = String::with_capacity(trace.len() * 16 + 16);
    out.push_str("counter,volume\n");
    for (counter, volume) in trace.iter().enumerate() {
        out.push_str(&format!("{},{}\n", counter, volume));
    }
    fs::write(path, out).map_err(|e| io_err(path, e))?;
    log::info!("[Baseline] wrote {} rows to {}", trace.len(), path.display());
    Ok(())
}

/// Read a `counter,volume` CSV trace, preserving row order.
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, BaselineError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;

    let mut lines = contents.lines();
    match lines.next() {
        Some(header) if header.trim() == "counter,volume" => {}
        other => {
            return Err(BaselineError::Malformed {
                path: path.display().to_string(),
                reason: format!("expected 'counter,volume' header, got {:?}", other),
            })
        }
    }

    let mut trace = Vec::new();
    for (row, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let volume = line
            .split(',')
            .nth(1)
            .and_then(|field| field.trim().parse::<f64>().ok())
            .ok_or_else(|| BaselineError::Malformed {
                path: path.display().to_string(),
                reason: format!("unparseable volume on row {}: {:?}", row + 2, line),
            })?;
        trace.push(volume);
    }
    Ok(trace)
}

/// Write the summary-statistics record as JSON.
pub fn save_stats<P: AsRef<Path>>(path: P, stats: &SeriesStats) -> Result<(), BaselineError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(stats).map_err(|e| io_err(path, e))?;
    fs::write(path, json).map_err(|e| io_err(path, e))?;
    log::info!("[Baseline] wrote stats record to {}", path.display());
    Ok(())
}

/// Read a summary-statistics JSON record.
pub fn load_stats<P: AsRef<Path>>(path: P) -> Result<SeriesStats, BaselineError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|e| BaselineError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
