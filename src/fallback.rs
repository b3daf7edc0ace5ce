//! Degrade-gracefully speech: cached → remote → local voice → silence.
//!
//! Each tier is fail-soft. Errors, timeouts and playback failures move the
//! chain forward; nothing is raised past `speak`. Network tiers are each
//! bounded by the caller's budget, so the worst-case network wait is
//! `budget * 2`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::cached::CacheAwareSynthesizer;
use crate::config::Config;
use crate::playback::{self, AudioPlayer};
use crate::synth::{
    AudioSynthesizer, ElevenLabsSynthesizer, LocalVoice, OpenAiSynthesizer, SystemVoice,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Cache,
    Remote,
    LocalVoice,
    Silent,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Cache => "cache",
            Tier::Remote => "remote",
            Tier::LocalVoice => "local_voice",
            Tier::Silent => "silent",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TierFailure {
    pub tier: Tier,
    pub reason: String,
}

/// How a `speak` call ended.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackOutcome {
    pub tier: Tier,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TierFailure>,
    pub duration_ms: u64,
}

impl PlaybackOutcome {
    pub fn is_silent(&self) -> bool {
        self.tier == Tier::Silent
    }
}

pub struct FallbackChain {
    cached: CacheAwareSynthesizer,
    degraded: Option<Arc<dyn AudioSynthesizer>>,
    local: Option<Arc<dyn LocalVoice>>,
    player: Arc<dyn AudioPlayer>,
}

impl FallbackChain {
    pub fn new(
        cached: CacheAwareSynthesizer,
        degraded: Option<Arc<dyn AudioSynthesizer>>,
        local: Option<Arc<dyn LocalVoice>>,
        player: Arc<dyn AudioPlayer>,
    ) -> Self {
        Self {
            cached,
            degraded,
            local,
            player,
        }
    }

    /// Wire the production tiers from config. Tiers without credentials
    /// are left out and skipped at runtime.
    pub fn from_config(config: &Config) -> Self {
        let budget = config.fallback.budget();
        let store = CacheStore::new(config.cache.resolved_dir());

        let primary = ElevenLabsSynthesizer::from_config(&config.elevenlabs, budget)
            .map(|s| Arc::new(s) as Arc<dyn AudioSynthesizer>);
        let degraded = OpenAiSynthesizer::from_config(&config.openai, budget)
            .map(|s| Arc::new(s) as Arc<dyn AudioSynthesizer>);
        let local = config
            .system_voice
            .enabled
            .then(|| Arc::new(SystemVoice::new(&config.system_voice)) as Arc<dyn LocalVoice>);

        Self::new(
            CacheAwareSynthesizer::new(store, primary),
            degraded,
            local,
            Arc::from(playback::from_config(&config.playback)),
        )
    }

    pub fn cached(&self) -> &CacheAwareSynthesizer {
        &self.cached
    }

    pub fn player(&self) -> &dyn AudioPlayer {
        self.player.as_ref()
    }

    pub async fn speak(&self, text: &str, voice: &str, budget: Duration) -> PlaybackOutcome {
        let t0 = Instant::now();
        let mut failures = Vec::new();

        let finish = |tier: Tier,
                      cache_hit: bool,
                      backend: Option<String>,
                      voice_id: Option<String>,
                      failures: Vec<TierFailure>| {
            let outcome = PlaybackOutcome {
                tier,
                cache_hit,
                backend,
                voice_id,
                fallback_used: tier != Tier::Cache,
                failures,
                duration_ms: u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX),
            };
            info!(
                "Speak finished via {} in {}ms ({} failed tiers)",
                outcome.tier,
                outcome.duration_ms,
                outcome.failures.len()
            );
            outcome
        };

        if text.trim().is_empty() {
            failures.push(TierFailure {
                tier: Tier::Silent,
                reason: "empty text".into(),
            });
            return finish(Tier::Silent, false, None, None, failures);
        }

        // 1. Cached primary vendor
        match tokio::time::timeout(budget, self.cached.get_audio(voice, text)).await {
            Ok(Ok(audio)) => {
                let backend = if audio.is_hit() {
                    "cache".to_string()
                } else {
                    self.cached.synthesizer_name().unwrap_or("unknown").to_string()
                };
                match self.player.play(&audio.bytes).await {
                    Ok(()) => {
                        return finish(
                            Tier::Cache,
                            audio.is_hit(),
                            Some(backend),
                            Some(voice.to_string()),
                            failures,
                        );
                    }
                    Err(e) => {
                        if audio.is_hit() {
                            warn!(
                                "Cached clip {} failed to play; every call will fall back until `agent-voice-rs clear`",
                                audio.key
                            );
                        }
                        record(&mut failures, Tier::Cache, e.to_string())
                    }
                }
            }
            Ok(Err(e)) => record(&mut failures, Tier::Cache, e.to_string()),
            Err(_) => record(
                &mut failures,
                Tier::Cache,
                format!("timed out after {}ms", budget.as_millis()),
            ),
        }

        // 2. Degraded remote vendor, never cached
        if let Some(degraded) = &self.degraded {
            match tokio::time::timeout(budget, degraded.synthesize(voice, text)).await {
                Ok(Ok(bytes)) => match self.player.play(&bytes).await {
                    Ok(()) => {
                        return finish(
                            Tier::Remote,
                            false,
                            Some(degraded.name().to_string()),
                            None,
                            failures,
                        );
                    }
                    Err(e) => record(&mut failures, Tier::Remote, e.to_string()),
                },
                Ok(Err(e)) => record(&mut failures, Tier::Remote, e.to_string()),
                Err(_) => record(
                    &mut failures,
                    Tier::Remote,
                    format!("timed out after {}ms", budget.as_millis()),
                ),
            }
        } else {
            record(&mut failures, Tier::Remote, "not configured".into());
        }

        // 3. Local voice engine
        if let Some(local) = &self.local {
            match local.speak(text).await {
                Ok(()) => {
                    return finish(
                        Tier::LocalVoice,
                        false,
                        Some(local.name().to_string()),
                        None,
                        failures,
                    );
                }
                Err(e) => record(&mut failures, Tier::LocalVoice, e.to_string()),
            }
        } else {
            record(&mut failures, Tier::LocalVoice, "disabled".into());
        }

        // 4. Silence
        warn!("All speech tiers failed, staying silent");
        finish(Tier::Silent, false, None, None, failures)
    }
}

fn record(failures: &mut Vec<TierFailure>, tier: Tier, reason: String) {
    debug!("Tier {tier} failed: {reason}");
    failures.push(TierFailure { tier, reason });
}
