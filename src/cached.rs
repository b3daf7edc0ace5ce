//! Cache-aware synthesis: serve from the store, populate on miss.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{derive_key, CacheKey, CacheStore};
use crate::error::TtsError;
use crate::synth::AudioSynthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    /// Served from an existing entry; no synthesis happened.
    Cache,
    /// Synthesized and written to the store.
    Populated,
    /// Synthesized but the store write failed.
    Uncached,
}

#[derive(Debug, Clone)]
pub struct CachedAudio {
    pub key: CacheKey,
    pub bytes: Vec<u8>,
    pub source: AudioSource,
}

impl CachedAudio {
    pub fn is_hit(&self) -> bool {
        self.source == AudioSource::Cache
    }
}

pub struct CacheAwareSynthesizer {
    store: CacheStore,
    synthesizer: Option<Arc<dyn AudioSynthesizer>>,
}

impl CacheAwareSynthesizer {
    /// `synthesizer` is `None` when no vendor credentials are configured;
    /// hits are still served, misses report `SynthesisUnavailable`.
    pub fn new(store: CacheStore, synthesizer: Option<Arc<dyn AudioSynthesizer>>) -> Self {
        Self { store, synthesizer }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn can_populate(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn synthesizer_name(&self) -> Option<&str> {
        self.synthesizer.as_deref().map(|s| s.name())
    }

    pub async fn get_audio(&self, voice: &str, text: &str) -> Result<CachedAudio, TtsError> {
        let key = derive_key(voice, text);

        if self.store.exists(&key) {
            match self.store.read(&key) {
                Ok(bytes) if !bytes.is_empty() => {
                    debug!("Cache hit {key} ({} bytes)", bytes.len());
                    return Ok(CachedAudio {
                        key,
                        bytes,
                        source: AudioSource::Cache,
                    });
                }
                Ok(_) => warn!("Cache entry {key} is empty, repopulating"),
                // Deleted between the check and the read.
                Err(TtsError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let Some(synthesizer) = &self.synthesizer else {
            return Err(TtsError::SynthesisUnavailable(
                "cache miss and no synthesizer configured".into(),
            ));
        };

        let t0 = Instant::now();
        let bytes = synthesizer.synthesize(voice, text).await?;
        if bytes.is_empty() {
            return Err(TtsError::SynthesisUnavailable(format!(
                "{} returned no audio",
                synthesizer.name()
            )));
        }

        let source = match self.store.write(&key, &bytes) {
            Ok(()) => {
                info!(
                    "Cache populated {key} via {} ({}ms)",
                    synthesizer.name(),
                    t0.elapsed().as_millis()
                );
                AudioSource::Populated
            }
            Err(e) => {
                warn!("Failed to cache {key}: {e}");
                AudioSource::Uncached
            }
        };

        Ok(CachedAudio { key, bytes, source })
    }
}
