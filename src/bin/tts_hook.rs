//! tts-hook: coding-assistant hook binary for spoken notifications.
//!
//! Reads event JSON from stdin, picks a phrase, speaks it through the
//! cached fallback chain. Logs every event to
//! ~/.agent-voice-history/YYYY-MM-DD.jsonl. Always exits 0.

use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use agent_voice::config::Config;
use agent_voice::fallback::FallbackChain;
use agent_voice::history::{export_transcript, now_timestamp, save_record, HookRecord};
use agent_voice::messages::PhraseSelector;
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Generic idle reminder from the assistant; not worth speaking.
const GENERIC_WAITING_MESSAGE: &str = "Claude is waiting for your input";

/// History event name when the input carries none.
const UNKNOWN_EVENT: &str = "unknown";

#[derive(Parser, Debug)]
#[command(name = "tts-hook", about = "Speak hook notifications")]
struct Args {
    /// Speak notifications (otherwise only log)
    #[arg(long)]
    notify: bool,

    /// Export the session transcript to chat.json in the history dir
    #[arg(long)]
    chat: bool,

    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

// --- Event JSON from the assistant ---

#[derive(Deserialize, Default)]
struct HookEvent {
    hook_event_name: Option<String>,
    message: Option<String>,
    transcript_path: Option<String>,
}

struct Handled {
    action: String,
    detail: Option<String>,
    message: Option<String>,
    personalized: bool,
    tts: Option<serde_json::Value>,
}

impl Handled {
    fn skipped(detail: &str) -> Self {
        Self::not_spoken("skipped", detail)
    }

    fn ignored(detail: &str) -> Self {
        Self::not_spoken("ignored", detail)
    }

    fn not_spoken(action: &str, detail: &str) -> Self {
        Self {
            action: action.into(),
            detail: Some(detail.into()),
            message: None,
            personalized: false,
            tts: None,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Route {
    Notification,
    Stop,
    Ignored(&'static str),
}

/// History name and handler for an event; `None` is input that did not parse.
fn route(event: Option<&HookEvent>) -> (String, Route) {
    let Some(event) = event else {
        return (UNKNOWN_EVENT.into(), Route::Ignored("invalid event JSON"));
    };
    let Some(name) = event.hook_event_name.as_deref() else {
        return (UNKNOWN_EVENT.into(), Route::Ignored("missing hook_event_name"));
    };
    let route = match name {
        "Notification" => Route::Notification,
        "Stop" => Route::Stop,
        _ => Route::Ignored("unknown event"),
    };
    (name.to_string(), route)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let t0 = Instant::now();

    // Stdout belongs to the assistant; log warnings to stderr only.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Ok(args) = Args::try_parse() else {
        return;
    };

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        return;
    }

    let event = match serde_json::from_str::<HookEvent>(&input) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Unparseable hook event: {e}");
            None
        }
    };

    let config = Config::load(args.config.as_deref());
    let history_dir = config.history.resolved_dir();

    let (event_name, handler) = route(event.as_ref());
    let event = event.unwrap_or_default();
    let handled = match handler {
        Route::Notification => handle_notification(&config, &args, &event).await,
        Route::Stop => handle_stop(&config, &args).await,
        Route::Ignored(reason) => Handled::ignored(reason),
    };

    if args.chat {
        if let Some(path) = event.transcript_path.as_deref().filter(|p| !p.is_empty()) {
            if let Err(e) = export_transcript(path.as_ref(), &history_dir.join("chat.json")) {
                tracing::warn!("Failed to export transcript {path}: {e}");
            }
        }
    }

    save_record(
        &history_dir,
        &HookRecord {
            timestamp: now_timestamp(),
            event: event_name,
            action: handled.action,
            detail: handled.detail,
            message: handled.message,
            personalized: handled.personalized,
            tts: handled.tts,
            duration_ms: u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX),
        },
    );
}

async fn handle_notification(config: &Config, args: &Args, event: &HookEvent) -> Handled {
    if !args.notify {
        return Handled::skipped("notify disabled");
    }
    if event.message.as_deref() == Some(GENERIC_WAITING_MESSAGE) {
        return Handled::skipped("generic waiting message");
    }

    let selector = selector(config);
    let (text, personalized) = selector.notification(&mut rand::thread_rng());
    Handled {
        personalized,
        ..speak(config, text).await
    }
}

async fn handle_stop(config: &Config, args: &Args) -> Handled {
    if !args.notify {
        return Handled::skipped("notify disabled");
    }

    let text = selector(config).completion(&mut rand::thread_rng());
    speak(config, text).await
}

fn selector(config: &Config) -> PhraseSelector {
    PhraseSelector::new(
        config.messages.engineer_name(),
        config.messages.personalize_probability,
    )
}

async fn speak(config: &Config, text: String) -> Handled {
    let chain = FallbackChain::from_config(config);
    let outcome = chain
        .speak(&text, config.voice_id(), config.fallback.budget())
        .await;

    Handled {
        action: if outcome.is_silent() { "silent" } else { "spoke" }.into(),
        detail: Some(outcome.tier.to_string()),
        message: Some(text),
        personalized: false,
        tts: serde_json::to_value(&outcome).ok(),
    }
}
