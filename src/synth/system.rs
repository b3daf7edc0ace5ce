//! Local system voice: macOS `say`, speech-dispatcher, espeak.
//!
//! No network. Engines are tried in order; the first that exits cleanly
//! wins.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::LocalVoice;
use crate::config::SystemVoiceConfig;
use crate::error::TtsError;

pub struct SystemVoice {
    volume: i32,
    timeout: Duration,
}

impl SystemVoice {
    pub fn new(config: &SystemVoiceConfig) -> Self {
        Self {
            volume: config.volume.clamp(-100, 100),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Engine invocations in preference order.
///
/// Text always follows `--` so a message starting with `-` is spoken
/// rather than parsed as an option.
fn engine_commands(text: &str, volume: i32) -> Vec<(&'static str, Vec<String>)> {
    // espeak amplitude runs 0..=200 with 100 as default.
    let espeak_amplitude = (volume + 100).clamp(0, 200);
    vec![
        ("say", vec!["--".into(), text.to_string()]),
        (
            "spd-say",
            vec![
                "--wait".into(),
                "--volume".into(),
                volume.to_string(),
                "--".into(),
                text.to_string(),
            ],
        ),
        (
            "espeak",
            vec!["-a".into(), espeak_amplitude.to_string(), "--".into(), text.to_string()],
        ),
    ]
}

#[async_trait]
impl LocalVoice for SystemVoice {
    async fn speak(&self, text: &str) -> Result<(), TtsError> {
        let mut tried = Vec::new();

        for (program, args) in engine_commands(text, self.volume) {
            let child = Command::new(program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status();

            match tokio::time::timeout(self.timeout, child).await {
                Ok(Ok(status)) if status.success() => {
                    debug!("Spoke via {program}");
                    return Ok(());
                }
                Ok(Ok(status)) => tried.push(format!("{program} exited with {status}")),
                Ok(Err(e)) => tried.push(format!("{program}: {e}")),
                Err(_) => tried.push(format!("{program} timed out")),
            }
        }

        Err(TtsError::NoVoiceAvailable(tried.join("; ")))
    }

    fn name(&self) -> &str {
        "system_voice"
    }
}
