//! Audio playback for finished MP3 clips.
//!
//! `RodioPlayer` decodes in-process on the default output device.
//! `CommandPlayer` shells out to afplay / mpg123 / ffplay.
//! `AutoPlayer` tries rodio first, then the command chain.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{PlaybackBackend, PlaybackConfig};
use crate::error::TtsError;

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, audio: &[u8]) -> Result<(), TtsError>;
}

pub fn from_config(config: &PlaybackConfig) -> Box<dyn AudioPlayer> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.backend {
        PlaybackBackend::Rodio => Box::new(RodioPlayer::new(timeout)),
        PlaybackBackend::Command => Box::new(CommandPlayer::new(timeout)),
        PlaybackBackend::Auto => Box::new(AutoPlayer {
            rodio: RodioPlayer::new(timeout),
            command: CommandPlayer::new(timeout),
        }),
    }
}

pub struct RodioPlayer {
    timeout: Duration,
}

impl RodioPlayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, audio: &[u8]) -> Result<(), TtsError> {
        let bytes = audio.to_vec();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || play_blocking(bytes, timeout))
            .await
            .map_err(|e| TtsError::Playback(format!("playback task failed: {e}")))?
    }
}

/// Decode and play, polling until the sink drains or the deadline passes.
fn play_blocking(bytes: Vec<u8>, timeout: Duration) -> Result<(), TtsError> {
    let mut stream = OutputStreamBuilder::open_default_stream()
        .map_err(|e| TtsError::Playback(format!("failed to open audio output: {e}")))?;
    stream.log_on_drop(false);

    let source = Decoder::new(Cursor::new(bytes))
        .map_err(|e| TtsError::Playback(format!("failed to decode audio: {e}")))?;

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);

    let deadline = Instant::now() + timeout;
    while !sink.empty() {
        if Instant::now() >= deadline {
            sink.stop();
            return Err(TtsError::Playback("playback timed out".into()));
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Ok(())
}

pub struct CommandPlayer {
    timeout: Duration,
}

impl CommandPlayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Player invocations in preference order.
fn player_commands(path: &str) -> Vec<(&'static str, Vec<String>)> {
    vec![
        ("afplay", vec![path.to_string()]),
        ("mpg123", vec!["-q".into(), path.to_string()]),
        (
            "ffplay",
            vec![
                "-nodisp".into(),
                "-autoexit".into(),
                "-loglevel".into(),
                "quiet".into(),
                path.to_string(),
            ],
        ),
    ]
}

fn temp_clip_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("agent-voice-{}-{nanos}.mp3", std::process::id()))
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, audio: &[u8]) -> Result<(), TtsError> {
        let path = temp_clip_path();
        tokio::fs::write(&path, audio)
            .await
            .map_err(|e| TtsError::io(&path, e))?;

        let path_str = path.to_string_lossy().to_string();
        let mut tried = Vec::new();
        let mut played = false;

        for (program, args) in player_commands(&path_str) {
            let status = Command::new(program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status();

            match tokio::time::timeout(self.timeout, status).await {
                Ok(Ok(s)) if s.success() => {
                    debug!("Played via {program}");
                    played = true;
                    break;
                }
                Ok(Ok(s)) => tried.push(format!("{program} exited with {s}")),
                Ok(Err(e)) => tried.push(format!("{program}: {e}")),
                Err(_) => tried.push(format!("{program} timed out")),
            }
        }

        let _ = tokio::fs::remove_file(&path).await;

        if played {
            Ok(())
        } else {
            Err(TtsError::Playback(format!("no audio player worked: {}", tried.join("; "))))
        }
    }
}

pub struct AutoPlayer {
    rodio: RodioPlayer,
    command: CommandPlayer,
}

#[async_trait]
impl AudioPlayer for AutoPlayer {
    async fn play(&self, audio: &[u8]) -> Result<(), TtsError> {
        match self.rodio.play(audio).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("rodio playback failed ({e}), trying command-line players");
                self.command.play(audio).await
            }
        }
    }
}
