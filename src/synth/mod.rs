//! Speech producers.
//!
//! - `AudioSynthesizer`: remote text → MP3 bytes (ElevenLabs, OpenAI)
//! - `LocalVoice`: host voice engine that speaks directly (say/spd-say/espeak)

pub mod elevenlabs;
pub mod openai;
pub mod system;

use async_trait::async_trait;

use crate::error::TtsError;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use openai::OpenAiSynthesizer;
pub use system::SystemVoice;

/// Network-backed synthesis. Any failure is `SynthesisUnavailable`.
#[async_trait]
pub trait AudioSynthesizer: Send + Sync {
    async fn synthesize(&self, voice: &str, text: &str) -> Result<Vec<u8>, TtsError>;

    fn name(&self) -> &str;
}

/// Best-effort speech through whatever engine the host provides.
#[async_trait]
pub trait LocalVoice: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), TtsError>;

    fn name(&self) -> &str;
}

/// Read a vendor response into audio bytes, rejecting HTTP errors and
/// empty bodies.
pub(crate) async fn audio_body(
    vendor: &str,
    resp: reqwest::Response,
) -> Result<Vec<u8>, TtsError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        return Err(TtsError::SynthesisUnavailable(format!(
            "{vendor} returned {status}: {snippet}"
        )));
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| TtsError::SynthesisUnavailable(format!("{vendor} body read failed: {e}")))?;

    if bytes.is_empty() {
        return Err(TtsError::SynthesisUnavailable(format!(
            "{vendor} returned an empty body"
        )));
    }
    Ok(bytes.to_vec())
}

pub(crate) fn http_client(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(3).min(timeout))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
