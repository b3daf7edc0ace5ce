//! Fake speech backends with call counters.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_voice::cache::CacheStore;
use agent_voice::cached::CacheAwareSynthesizer;
use agent_voice::playback::AudioPlayer;
use agent_voice::synth::{AudioSynthesizer, LocalVoice};
use agent_voice::TtsError;
use async_trait::async_trait;
use tempfile::TempDir;

pub enum Behavior {
    /// Returns `fake-mp3:<voice>:<text>`.
    Succeed,
    Fail,
    /// Sleeps, then succeeds.
    Slow(Duration),
}

pub struct FakeSynthesizer {
    name: &'static str,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn fake_audio(voice: &str, text: &str) -> Vec<u8> {
    format!("fake-mp3:{voice}:{text}").into_bytes()
}

#[async_trait]
impl AudioSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, voice: &str, text: &str) -> Result<Vec<u8>, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed => Ok(fake_audio(voice, text)),
            Behavior::Fail => Err(TtsError::SynthesisUnavailable("quota exceeded".into())),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(fake_audio(voice, text))
            }
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}

pub struct FakeVoice {
    works: bool,
    spoken: Mutex<Vec<String>>,
}

impl FakeVoice {
    pub fn new(works: bool) -> Arc<Self> {
        Arc::new(Self {
            works,
            spoken: Mutex::new(Vec::new()),
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalVoice for FakeVoice {
    async fn speak(&self, text: &str) -> Result<(), TtsError> {
        if !self.works {
            return Err(TtsError::NoVoiceAvailable("no engine installed".into()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "fake_voice"
    }
}

pub struct FakePlayer {
    works: bool,
    played: Mutex<Vec<Vec<u8>>>,
}

impl FakePlayer {
    pub fn new(works: bool) -> Arc<Self> {
        Arc::new(Self {
            works,
            played: Mutex::new(Vec::new()),
        })
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn play(&self, audio: &[u8]) -> Result<(), TtsError> {
        if !self.works {
            return Err(TtsError::Playback("no output device".into()));
        }
        self.played.lock().unwrap().push(audio.to_vec());
        Ok(())
    }
}

pub fn create_temp_cache() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

pub fn cached_with(dir: &TempDir, synth: Option<Arc<FakeSynthesizer>>) -> CacheAwareSynthesizer {
    CacheAwareSynthesizer::new(
        CacheStore::new(dir.path()),
        synth.map(|s| s as Arc<dyn AudioSynthesizer>),
    )
}
