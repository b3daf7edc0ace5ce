//! Error taxonomy shared by the cache, synthesizers and playback.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TtsError {
    /// Cache miss. Consumed by the cache-aware synthesizer, never surfaced.
    #[error("cache entry not found: {0}")]
    NotFound(String),

    #[error("cache I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote vendor error, quota, unsupported input, missing credentials or timeout.
    #[error("synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("no local voice engine available: {0}")]
    NoVoiceAvailable(String),

    #[error("playback failed: {0}")]
    Playback(String),
}

impl TtsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
