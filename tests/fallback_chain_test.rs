//! Fallback ordering, timeouts and total failure.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_voice::cache::{derive_key, CacheStore};
use agent_voice::fallback::{FallbackChain, Tier};
use agent_voice::playback::AudioPlayer;
use agent_voice::synth::{AudioSynthesizer, LocalVoice};
use common::{
    cached_with, create_temp_cache, fake_audio, Behavior, FakePlayer, FakeSynthesizer, FakeVoice,
};

const VOICE: &str = "rachel";
const BUDGET: Duration = Duration::from_millis(200);

fn chain(
    dir: &tempfile::TempDir,
    primary: Option<Arc<FakeSynthesizer>>,
    degraded: Option<Arc<FakeSynthesizer>>,
    local: Option<Arc<FakeVoice>>,
    player: Arc<FakePlayer>,
) -> FallbackChain {
    FallbackChain::new(
        cached_with(dir, primary),
        degraded.map(|d| d as Arc<dyn AudioSynthesizer>),
        local.map(|l| l as Arc<dyn LocalVoice>),
        player as Arc<dyn AudioPlayer>,
    )
}

#[tokio::test]
async fn test_cache_hit_plays_from_first_tier() {
    let dir = create_temp_cache();
    CacheStore::new(dir.path())
        .write(&derive_key(VOICE, "All done!"), b"cached-clip")
        .unwrap();
    let degraded = FakeSynthesizer::new("degraded", Behavior::Succeed);
    let player = FakePlayer::new(true);
    let chain = chain(&dir, None, Some(degraded.clone()), None, player.clone());

    let outcome = chain.speak("All done!", VOICE, BUDGET).await;

    assert_eq!(outcome.tier, Tier::Cache);
    assert!(outcome.cache_hit);
    assert!(!outcome.fallback_used);
    assert_eq!(outcome.backend.as_deref(), Some("cache"));
    assert_eq!(player.played(), vec![b"cached-clip".to_vec()]);
    assert_eq!(degraded.calls(), 0);
}

#[tokio::test]
async fn test_miss_populates_and_plays() {
    let dir = create_temp_cache();
    let primary = FakeSynthesizer::new("elevenlabs", Behavior::Succeed);
    let player = FakePlayer::new(true);
    let chain = chain(&dir, Some(primary.clone()), None, None, player.clone());

    let outcome = chain.speak("All set!", VOICE, BUDGET).await;
    assert_eq!(outcome.tier, Tier::Cache);
    assert!(!outcome.cache_hit);
    assert_eq!(outcome.backend.as_deref(), Some("elevenlabs"));

    let again = chain.speak("All set!", VOICE, BUDGET).await;
    assert!(again.cache_hit);
    assert_eq!(primary.calls(), 1);
    assert_eq!(player.played().len(), 2);
}

#[tokio::test]
async fn test_primary_failure_falls_to_degraded() {
    let dir = create_temp_cache();
    let primary = FakeSynthesizer::new("elevenlabs", Behavior::Fail);
    let degraded = FakeSynthesizer::new("openai", Behavior::Succeed);
    let voice = FakeVoice::new(true);
    let player = FakePlayer::new(true);
    let chain = chain(
        &dir,
        Some(primary.clone()),
        Some(degraded.clone()),
        Some(voice.clone()),
        player.clone(),
    );

    let outcome = chain.speak("Task complete!", VOICE, BUDGET).await;

    assert_eq!(outcome.tier, Tier::Remote);
    assert!(outcome.fallback_used);
    assert_eq!(outcome.backend.as_deref(), Some("openai"));
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].tier, Tier::Cache);
    assert_eq!(player.played(), vec![fake_audio(VOICE, "Task complete!")]);
    assert!(voice.spoken().is_empty());
    // Degraded output is never cached.
    assert!(!chain.cached().store().exists(&derive_key(VOICE, "Task complete!")));
}

#[tokio::test]
async fn test_slow_primary_times_out_within_budget() {
    let dir = create_temp_cache();
    let primary = FakeSynthesizer::new("elevenlabs", Behavior::Slow(Duration::from_secs(5)));
    let degraded = FakeSynthesizer::new("openai", Behavior::Succeed);
    let player = FakePlayer::new(true);
    let chain = chain(&dir, Some(primary), Some(degraded), None, player);

    let t0 = Instant::now();
    let outcome = chain.speak("All finished!", VOICE, BUDGET).await;
    let elapsed = t0.elapsed();

    assert_eq!(outcome.tier, Tier::Remote);
    assert!(outcome.failures[0].reason.contains("timed out"));
    assert!(elapsed < BUDGET + Duration::from_millis(800), "took {elapsed:?}");
}

#[tokio::test]
async fn test_both_remotes_slow_bounded_by_two_budgets() {
    let dir = create_temp_cache();
    let primary = FakeSynthesizer::new("elevenlabs", Behavior::Slow(Duration::from_secs(5)));
    let degraded = FakeSynthesizer::new("openai", Behavior::Slow(Duration::from_secs(5)));
    let voice = FakeVoice::new(true);
    let chain = chain(&dir, Some(primary), Some(degraded), Some(voice.clone()), FakePlayer::new(true));

    let t0 = Instant::now();
    let outcome = chain.speak("All finished!", VOICE, BUDGET).await;

    assert_eq!(outcome.tier, Tier::LocalVoice);
    assert!(t0.elapsed() < BUDGET * 2 + Duration::from_millis(800));
    assert_eq!(voice.spoken(), vec!["All finished!".to_string()]);
}

#[tokio::test]
async fn test_unconfigured_remotes_fall_to_local_voice() {
    let dir = create_temp_cache();
    let voice = FakeVoice::new(true);
    let chain = chain(&dir, None, None, Some(voice.clone()), FakePlayer::new(true));

    let outcome = chain.speak("Good to go!", VOICE, BUDGET).await;

    assert_eq!(outcome.tier, Tier::LocalVoice);
    assert_eq!(outcome.backend.as_deref(), Some("fake_voice"));
    let failed: Vec<Tier> = outcome.failures.iter().map(|f| f.tier).collect();
    assert_eq!(failed, vec![Tier::Cache, Tier::Remote]);
}

#[tokio::test]
async fn test_playback_failure_advances_chain() {
    let dir = create_temp_cache();
    CacheStore::new(dir.path())
        .write(&derive_key(VOICE, "All done!"), b"cached-clip")
        .unwrap();
    let degraded = FakeSynthesizer::new("openai", Behavior::Succeed);
    let voice = FakeVoice::new(true);
    let chain = chain(&dir, None, Some(degraded.clone()), Some(voice.clone()), FakePlayer::new(false));

    let outcome = chain.speak("All done!", VOICE, BUDGET).await;

    assert_eq!(outcome.tier, Tier::LocalVoice);
    assert_eq!(degraded.calls(), 1);
    assert_eq!(outcome.failures.len(), 2);
    // Cached entries are immutable; a clip that fails to play stays put.
    let store = CacheStore::new(dir.path());
    assert_eq!(store.read(&derive_key(VOICE, "All done!")).unwrap(), b"cached-clip");
}

#[tokio::test]
async fn test_unwritable_cache_still_plays_first_tier() {
    let dir = create_temp_cache();
    fs::write(dir.path().join(VOICE), b"not a directory").unwrap();
    let primary = FakeSynthesizer::new("elevenlabs", Behavior::Succeed);
    let player = FakePlayer::new(true);
    let chain = chain(&dir, Some(primary.clone()), None, None, player.clone());

    let outcome = chain.speak("Task finished!", VOICE, BUDGET).await;

    assert_eq!(outcome.tier, Tier::Cache);
    assert!(!outcome.cache_hit);
    assert_eq!(outcome.backend.as_deref(), Some("elevenlabs"));
    assert_eq!(player.played(), vec![fake_audio(VOICE, "Task finished!")]);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_cache_read_error_falls_to_degraded() {
    let dir = create_temp_cache();
    let store = CacheStore::new(dir.path());
    fs::create_dir_all(store.entry_path(&derive_key(VOICE, "All done!"))).unwrap();
    let primary = FakeSynthesizer::new("elevenlabs", Behavior::Succeed);
    let degraded = FakeSynthesizer::new("openai", Behavior::Succeed);
    let player = FakePlayer::new(true);
    let chain = chain(&dir, Some(primary.clone()), Some(degraded.clone()), None, player.clone());

    let outcome = chain.speak("All done!", VOICE, BUDGET).await;

    assert_eq!(outcome.tier, Tier::Remote);
    assert!(outcome.fallback_used);
    assert_eq!(primary.calls(), 0);
    assert_eq!(degraded.calls(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].tier, Tier::Cache);
}

#[tokio::test]
async fn test_total_failure_is_silent() {
    let dir = create_temp_cache();
    let chain = chain(
        &dir,
        Some(FakeSynthesizer::new("elevenlabs", Behavior::Fail)),
        Some(FakeSynthesizer::new("openai", Behavior::Fail)),
        Some(FakeVoice::new(false)),
        FakePlayer::new(true),
    );

    let outcome = chain.speak("All done!", VOICE, BUDGET).await;

    assert!(outcome.is_silent());
    let failed: Vec<Tier> = outcome.failures.iter().map(|f| f.tier).collect();
    assert_eq!(failed, vec![Tier::Cache, Tier::Remote, Tier::LocalVoice]);
}

#[tokio::test]
async fn test_empty_text_is_silent_without_attempts() {
    let dir = create_temp_cache();
    let primary = FakeSynthesizer::new("elevenlabs", Behavior::Succeed);
    let chain = chain(&dir, Some(primary.clone()), None, None, FakePlayer::new(true));

    let outcome = chain.speak("   ", VOICE, BUDGET).await;

    assert!(outcome.is_silent());
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn test_outcome_serializes_for_history() {
    let dir = create_temp_cache();
    let chain = chain(&dir, None, None, None, FakePlayer::new(true));

    let outcome = chain.speak("All done!", VOICE, BUDGET).await;
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["tier"], "silent");
    assert_eq!(json["cache_hit"], false);
    assert_eq!(json["fallback_used"], true);
    assert_eq!(json["failures"][2]["tier"], "local_voice");
}
