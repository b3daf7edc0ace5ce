//! agent-voice-rs: cached text-to-speech notifications for coding-assistant hooks.
//!
//! Components:
//! - `cache`: content-addressed clip store keyed by (voice, text)
//! - `cached`: cache-aware synthesis (hit → replay, miss → synthesize + store)
//! - `fallback`: cached → remote → local voice → silence
//! - `prewarm`: batch population and inventory of the phrase catalog
//! - `synth`: ElevenLabs, OpenAI and system voice backends
//! - `playback`: rodio and command-line players
//! - `messages`: phrase catalog and RNG-injected selection
//! - `history`: JSONL hook history

pub mod cache;
pub mod cached;
pub mod config;
pub mod error;
pub mod fallback;
pub mod history;
pub mod messages;
pub mod playback;
pub mod prewarm;
pub mod synth;

pub use error::TtsError;
