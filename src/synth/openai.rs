//! OpenAI speech client. Degraded tier: different vendor, never cached.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::{audio_body, http_client, AudioSynthesizer};
use crate::config::OpenAiConfig;
use crate::error::TtsError;

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

pub struct OpenAiSynthesizer {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiSynthesizer {
    pub fn from_config(config: &OpenAiConfig, timeout: Duration) -> Option<Self> {
        if config.api_key.is_empty() {
            return None;
        }
        Some(Self {
            config: config.clone(),
            client: http_client(timeout),
        })
    }
}

#[async_trait]
impl AudioSynthesizer for OpenAiSynthesizer {
    /// The cache voice identity belongs to ElevenLabs; OpenAI always uses
    /// its configured voice.
    async fn synthesize(&self, _voice: &str, text: &str) -> Result<Vec<u8>, TtsError> {
        let t0 = Instant::now();
        let url = format!("{}/v1/audio/speech", self.config.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&SpeechRequest {
                model: &self.config.model,
                voice: &self.config.voice,
                input: text,
                response_format: "mp3",
            })
            .send()
            .await
            .map_err(|e| TtsError::SynthesisUnavailable(format!("OpenAI request failed: {e}")))?;

        let audio = audio_body("OpenAI", resp).await?;
        info!("OpenAI synthesized {} bytes ({}ms)", audio.len(), t0.elapsed().as_millis());
        Ok(audio)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
