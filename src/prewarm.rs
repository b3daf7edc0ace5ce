//! Offline cache population and inventory for the phrase catalog.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::derive_key;
use crate::cached::{AudioSource, CacheAwareSynthesizer};
use crate::messages::{Category, MessageCatalog};

#[derive(Debug, Clone, Serialize)]
pub struct WarmFailure {
    pub category: Category,
    pub text: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmReport {
    /// Already cached, no synthesis.
    pub hits: usize,
    /// Synthesized and stored.
    pub populated: usize,
    /// Synthesized but could not be stored.
    pub uncached: usize,
    pub failed: Vec<WarmFailure>,
}

impl WarmReport {
    pub fn total(&self) -> usize {
        self.hits + self.populated + self.uncached + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.uncached == 0 && self.failed.is_empty()
    }
}

/// One `get_audio` per catalog entry. Never stops early.
pub async fn warm_all(
    cached: &CacheAwareSynthesizer,
    catalog: &MessageCatalog,
    voice: &str,
) -> WarmReport {
    let mut report = WarmReport::default();
    let total = catalog.len();

    for (i, entry) in catalog.entries().iter().enumerate() {
        match cached.get_audio(voice, &entry.text).await {
            Ok(audio) => match audio.source {
                AudioSource::Cache => {
                    info!("[{}/{total}] cached: {}", i + 1, entry.text);
                    report.hits += 1;
                }
                AudioSource::Populated => {
                    info!(
                        "[{}/{total}] generated ({:.1} KB): {}",
                        i + 1,
                        audio.bytes.len() as f64 / 1024.0,
                        entry.text
                    );
                    report.populated += 1;
                }
                AudioSource::Uncached => {
                    warn!("[{}/{total}] generated but not cached: {}", i + 1, entry.text);
                    report.uncached += 1;
                }
            },
            Err(e) => {
                warn!("[{}/{total}] failed: {} ({e})", i + 1, entry.text);
                report.failed.push(WarmFailure {
                    category: entry.category,
                    text: entry.text.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Warm complete: {} cached, {} generated, {} uncached, {} failed",
        report.hits,
        report.populated,
        report.uncached,
        report.failed.len()
    );
    report
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub category: Category,
    pub text: String,
    pub key: String,
    pub path: PathBuf,
    /// Size in bytes when cached.
    pub size: Option<u64>,
}

impl CacheStatus {
    pub fn is_cached(&self) -> bool {
        self.size.is_some()
    }
}

/// Cache state of every catalog entry. Local only, no synthesis.
pub fn check(cached: &CacheAwareSynthesizer, catalog: &MessageCatalog, voice: &str) -> Vec<CacheStatus> {
    let store = cached.store();
    catalog
        .entries()
        .iter()
        .map(|entry| {
            let key = derive_key(voice, &entry.text);
            CacheStatus {
                category: entry.category,
                text: entry.text.clone(),
                path: store.entry_path(&key),
                size: store.size(&key),
                key: key.to_string(),
            }
        })
        .collect()
}
