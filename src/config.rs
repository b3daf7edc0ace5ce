//! Configuration management for agent-voice-rs.
//!
//! Loads config from YAML files in standard locations, then applies
//! environment overrides (API keys, voice id, engineer name, volume).
//! The resulting `Config` is passed into constructors; nothing reads the
//! environment after `load`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Rachel, the ElevenLabs default voice.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root; empty means `<user cache dir>/agent-voice/tts`.
    pub dir: String,
}

impl CacheConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        if !self.dir.is_empty() {
            return PathBuf::from(&self.dir);
        }
        dirs::cache_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agent-voice")
            .join("tts")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub base_url: String,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: DEFAULT_VOICE_ID.into(),
            model_id: "eleven_turbo_v2_5".into(),
            stability: 0.5,
            similarity_boost: 0.5,
            base_url: "https://api.elevenlabs.io".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub voice: String,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini-tts".into(),
            voice: "nova".into(),
            base_url: "https://api.openai.com".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemVoiceConfig {
    pub enabled: bool,
    /// -100..=100, 0 is the engine default.
    pub volume: i32,
    pub timeout_secs: u64,
}

impl Default for SystemVoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackBackend {
    Auto,
    Rodio,
    Command,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub backend: PlaybackBackend,
    pub timeout_secs: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            backend: PlaybackBackend::Auto,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Time bound for each network-dependent tier.
    pub budget_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { budget_ms: 10_000 }
    }
}

impl FallbackConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub engineer_name: String,
    pub personalize_probability: f64,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            engineer_name: String::new(),
            personalize_probability: 0.3,
        }
    }
}

impl MessagesConfig {
    pub fn engineer_name(&self) -> Option<&str> {
        let name = self.engineer_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Empty means `~/.agent-voice-history`.
    pub dir: String,
}

impl HistoryConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        if !self.dir.is_empty() {
            return PathBuf::from(&self.dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".agent-voice-history")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub openai: OpenAiConfig,
    pub system_voice: SystemVoiceConfig,
    pub playback: PlaybackConfig,
    pub fallback: FallbackConfig,
    pub messages: MessagesConfig,
    pub history: HistoryConfig,
}

impl Config {
    /// Load configuration from YAML and the process environment.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./agent-voice.yaml
    /// 2. ~/.config/agent-voice/config.yaml
    /// 3. /etc/agent-voice/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::load_file(path);
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    fn load_file(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("agent-voice.yaml")),
                dirs::home_dir().map(|h| h.join(".config/agent-voice/config.yaml")),
                Some(PathBuf::from("/etc/agent-voice/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_yaml(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    /// Overlay environment variables. `lookup` is injected so tests can
    /// supply a fixed environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("ELEVENLABS_API_KEY") {
            self.elevenlabs.api_key = key;
        }
        if let Some(voice) = non_empty("ELEVENLABS_VOICE_ID") {
            self.elevenlabs.voice_id = voice;
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }
        if self.messages.engineer_name().is_none() {
            if let Some(name) = non_empty("ENGINEER_NAME").or_else(|| non_empty("USER")) {
                self.messages.engineer_name = name;
            }
        }
        if let Some(volume) = non_empty("TTS_VOLUME") {
            // Invalid values fall back to the engine default.
            self.system_voice.volume = volume.parse().unwrap_or(0);
        }
        self.system_voice.volume = self.system_voice.volume.clamp(-100, 100);
    }

    /// Voice identity that partitions the cache.
    pub fn voice_id(&self) -> &str {
        &self.elevenlabs.voice_id
    }
}
