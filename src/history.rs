//! Hook event history.
//!
//! One JSONL record per hook invocation at `<dir>/{date}.jsonl`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
pub struct HookRecord {
    pub timestamp: String,
    pub event: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub personalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<serde_json::Value>,
    pub duration_ms: u64,
}

pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

fn history_file(dir: &Path, timestamp: &str) -> PathBuf {
    // First 10 chars: YYYY-MM-DD
    let date = timestamp.get(..10).unwrap_or("unknown");
    dir.join(format!("{date}.jsonl"))
}

pub fn save_record(dir: &Path, record: &HookRecord) {
    if let Err(e) = fs::create_dir_all(dir) {
        warn!("Failed to create history dir {}: {e}", dir.display());
        return;
    }

    let path = history_file(dir, &record.timestamp);
    let mut file = match fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to open history file {}: {e}", path.display());
            return;
        }
    };

    match serde_json::to_string(record) {
        Ok(line) => {
            if let Err(e) = writeln!(file, "{line}") {
                warn!("Failed to write history record: {e}");
            }
        }
        Err(e) => warn!("Failed to serialize history record: {e}"),
    }
}

/// Convert a transcript JSONL file into a pretty JSON array at `out`.
/// Unparseable lines are skipped.
pub fn export_transcript(transcript: &Path, out: &Path) -> std::io::Result<usize> {
    let contents = fs::read_to_string(transcript)?;
    let entries: Vec<serde_json::Value> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect();

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(out, json)?;
    Ok(entries.len())
}
