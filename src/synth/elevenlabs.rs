//! ElevenLabs text-to-speech client. Backs the cached tier.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::{audio_body, http_client, AudioSynthesizer};
use crate::config::ElevenLabsConfig;
use crate::error::TtsError;

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabsSynthesizer {
    config: ElevenLabsConfig,
    client: reqwest::Client,
}

impl ElevenLabsSynthesizer {
    /// Returns `None` without an API key: the tier is then cache-only.
    pub fn from_config(config: &ElevenLabsConfig, timeout: Duration) -> Option<Self> {
        if config.api_key.is_empty() {
            debug!("ElevenLabs API key not set, cache misses cannot be populated");
            return None;
        }
        Some(Self {
            config: config.clone(),
            client: http_client(timeout),
        })
    }

    fn endpoint(&self, voice: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{voice}",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl AudioSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, voice: &str, text: &str) -> Result<Vec<u8>, TtsError> {
        let t0 = Instant::now();
        let body = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let resp = self
            .client
            .post(self.endpoint(voice))
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::SynthesisUnavailable(format!("ElevenLabs request failed: {e}")))?;

        let audio = audio_body("ElevenLabs", resp).await?;
        info!(
            "ElevenLabs synthesized {} chars → {} bytes ({}ms)",
            text.len(),
            audio.len(),
            t0.elapsed().as_millis()
        );
        Ok(audio)
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_key_no_synthesizer() {
        let config = ElevenLabsConfig::default();
        assert!(ElevenLabsSynthesizer::from_config(&config, Duration::from_secs(1)).is_none());
    }

    #[test]
    fn endpoint_includes_voice() {
        let config = ElevenLabsConfig {
            api_key: "k".into(),
            base_url: "https://api.elevenlabs.io/".into(),
            ..Default::default()
        };
        let synth = ElevenLabsSynthesizer::from_config(&config, Duration::from_secs(1)).unwrap();
        assert_eq!(
            synth.endpoint("abc"),
            "https://api.elevenlabs.io/v1/text-to-speech/abc"
        );
    }

    #[test]
    fn request_body_shape() {
        let body = SpeechRequest {
            text: "All done!",
            model_id: "eleven_turbo_v2_5",
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["text"], "All done!");
        assert_eq!(json["model_id"], "eleven_turbo_v2_5");
        assert_eq!(json["voice_settings"]["stability"], 0.5);
    }
}
