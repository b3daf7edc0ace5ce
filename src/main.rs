//! agent-voice-rs: operator CLI for the cached TTS notifier.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use agent_voice::cache::derive_key;
use agent_voice::config::Config;
use agent_voice::fallback::FallbackChain;
use agent_voice::messages::MessageCatalog;
use agent_voice::prewarm;
use agent_voice::synth::{AudioSynthesizer, ElevenLabsSynthesizer};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agent-voice-rs", about = "Cached text-to-speech notifications")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Speak a message through the fallback chain
    Speak {
        /// Message text
        #[arg(required = true)]
        text: Vec<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pre-generate cached audio for every catalog phrase
    Warm,
    /// Show which catalog phrases are cached
    Check {
        /// Play every cached phrase
        #[arg(long)]
        play: bool,
    },
    /// Delete the configured voice's cache
    Clear,
    /// Compare cached reads against fresh synthesis
    Benchmark {
        #[arg(long, default_value_t = 5)]
        runs: usize,

        #[arg(long, default_value = "Work complete!")]
        text: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (suppress noisy HTTP/audio internals)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info,symphonia=warn")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn,symphonia=warn,rodio=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load(args.config.as_deref());
    let chain = FallbackChain::from_config(&config);
    let voice = config.voice_id().to_string();
    let catalog = MessageCatalog::default_catalog(config.messages.engineer_name());

    match args.command {
        Command::Speak { text, json } => {
            let text = text.join(" ");
            let outcome = chain.speak(&text, &voice, config.fallback.budget()).await;
            if json {
                println!("{}", serde_json::to_string(&outcome)?);
            }
            return Ok(if outcome.is_silent() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
        Command::Warm => {
            if !chain.cached().can_populate() {
                tracing::warn!("ELEVENLABS_API_KEY is not set, only existing entries can be reported");
            }
            let report = prewarm::warm_all(chain.cached(), &catalog, &voice).await;

            println!("Summary:");
            println!("   Generated: {}", report.populated);
            println!("   Skipped (already cached): {}", report.hits);
            println!("   Generated but not cached: {}", report.uncached);
            println!("   Failed: {}", report.failed.len());
            println!("   Cache location: {}", chain.cached().store().voice_dir(&voice).display());
            for failure in &report.failed {
                println!("   - {}: {}", failure.text, failure.error);
            }
            if !report.is_complete() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Check { play } => {
            let statuses = prewarm::check(chain.cached(), &catalog, &voice);
            let total = statuses.len();
            for (i, status) in statuses.iter().enumerate() {
                let Some(size) = status.size else {
                    println!("[{}/{total}] NOT CACHED: {}", i + 1, status.text);
                    continue;
                };
                println!(
                    "[{}/{total}] CACHED: {} ({}.mp3, {:.1} KB)",
                    i + 1,
                    status.text,
                    status.key,
                    size as f64 / 1024.0
                );
                if play {
                    match std::fs::read(&status.path) {
                        Ok(bytes) => {
                            if let Err(e) = chain.player().play(&bytes).await {
                                println!("         playback failed: {e}");
                            }
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                        Err(e) => println!("         read failed: {e}"),
                    }
                }
            }
            let cached = statuses.iter().filter(|s| s.is_cached()).count();
            println!("{cached}/{total} phrases cached");
        }
        Command::Clear => {
            let removed = chain.cached().store().clear_voice(&voice)?;
            println!("Removed {removed} cached clips for voice {voice}");
        }
        Command::Benchmark { runs, text } => {
            run_benchmark(&config, &chain, &voice, &text, runs).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_benchmark(config: &Config, chain: &FallbackChain, voice: &str, text: &str, runs: usize) {
    info!("Benchmarking {runs} runs of {text:?}");
    let store = chain.cached().store();
    let key = derive_key(voice, text);

    let mut cached_ms = Vec::new();
    if store.exists(&key) {
        for _ in 0..runs {
            let t0 = Instant::now();
            if store.read(&key).is_ok() {
                cached_ms.push(t0.elapsed().as_secs_f64() * 1000.0);
            }
        }
    } else {
        println!("Not cached; run `agent-voice-rs warm` first for cached timings");
    }

    let mut api_ms = Vec::new();
    match ElevenLabsSynthesizer::from_config(&config.elevenlabs, config.fallback.budget()) {
        Some(synth) => {
            for _ in 0..runs {
                let t0 = Instant::now();
                match synth.synthesize(voice, text).await {
                    Ok(_) => api_ms.push(t0.elapsed().as_secs_f64() * 1000.0),
                    Err(e) => println!("API call failed: {e}"),
                }
            }
        }
        None => println!("No ElevenLabs API key; skipping API timings"),
    }

    let avg = |v: &[f64]| (!v.is_empty()).then(|| v.iter().sum::<f64>() / v.len() as f64);
    match avg(&cached_ms) {
        Some(ms) => println!("Cached read: {ms:.2}ms avg over {} runs", cached_ms.len()),
        None => println!("Cached read: n/a"),
    }
    match avg(&api_ms) {
        Some(ms) => println!("API synthesis: {ms:.0}ms avg over {} runs", api_ms.len()),
        None => println!("API synthesis: n/a"),
    }
    if let (Some(c), Some(a)) = (avg(&cached_ms), avg(&api_ms)) {
        if c > 0.0 {
            println!("Speedup: {:.0}x ({:.0}ms saved per notification)", a / c, a - c);
        }
    }
}
