//! Tests for the playback/verification state machine driver
//!
//! These run on tokio's paused clock so the 6-second simulated
//! verification completes in virtual time.

use adquest::playback::{AdPlayer, PlayerEvent, PlayerMode};
use adquest::types::{AdOffer, AdProvider, AdType};
use std::time::Duration;
use tokio::sync::mpsc;

fn survey_offer() -> AdOffer {
    AdOffer {
        id: "off_pollfish_1".into(),
        provider: "Pollfish".into(),
        provider_id: AdProvider::Pollfish,
        title: "Global Tech Census 2025".into(),
        description: "High-yield 2-minute market research.".into(),
        reward_coins: 750,
        cpm: 85.0,
        ad_type: AdType::Survey,
        duration_seconds: None,
        icon: "📊".into(),
        fill_rate: 0.75,
        video_url: None,
    }
}

fn video_offer() -> AdOffer {
    AdOffer {
        id: "off_admob_1".into(),
        provider: "AdMob (Google)".into(),
        provider_id: AdProvider::Admob,
        title: "Clash Royale: Hero Quest".into(),
        description: "Experience the new arena.".into(),
        reward_coins: 150,
        cpm: 28.5,
        ad_type: AdType::Video,
        duration_seconds: Some(15),
        icon: "🏰".into(),
        fill_rate: 0.98,
        video_url: Some("https://cdn.example.com/hero-quest.mp4".into()),
    }
}

/// Drain everything currently queued without waiting.
fn drain(events: &mut mpsc::UnboundedReceiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn completions(events: &[PlayerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, PlayerEvent::Completed(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn simulated_run_completes_exactly_once_at_full_progress() {
    let (mut player, mut events) = AdPlayer::new(survey_offer());
    assert_eq!(player.mode(), PlayerMode::Simulated);
    player.start();

    let mut last_progress = 0;
    let mut completed = 0;
    loop {
        match events.recv().await.expect("player dropped its channel") {
            PlayerEvent::Progress { progress, .. } => last_progress = progress,
            PlayerEvent::Log(_) => {}
            PlayerEvent::Completed(offer) => {
                completed += 1;
                assert_eq!(offer.id, "off_pollfish_1");
                break;
            }
        }
    }
    assert_eq!(last_progress, 100);
    assert_eq!(completed, 1);

    // Nothing fires after completion, no matter how long we wait.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(completions(&drain(&mut events)), 0);
    player.teardown();
}

#[tokio::test(start_paused = true)]
async fn torn_down_player_never_completes() {
    let (mut player, mut events) = AdPlayer::new(survey_offer());
    player.start();

    // Let the run get partway in, then discard it.
    tokio::time::sleep(Duration::from_secs(1)).await;
    player.teardown();

    tokio::time::sleep(Duration::from_secs(30)).await;
    let seen = drain(&mut events);
    assert_eq!(completions(&seen), 0);
    for event in &seen {
        if let PlayerEvent::Progress { progress, .. } = event {
            assert!(*progress < 100);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn restarting_the_simulation_yields_a_single_completion() {
    let (mut player, mut events) = AdPlayer::new(survey_offer());
    player.start();
    tokio::time::sleep(Duration::from_millis(500)).await;
    // Restart replaces the pending timer instead of doubling it up.
    player.start();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(completions(&drain(&mut events)), 1);
}

#[tokio::test(start_paused = true)]
async fn live_mode_completes_only_on_natural_end() {
    let (mut player, mut events) = AdPlayer::new(video_offer());
    assert_eq!(player.mode(), PlayerMode::Live);
    player.start();

    player.report_position(3.0, 15.0);
    player.report_position(12.5, 15.0);
    assert_eq!(completions(&drain(&mut events)), 0);

    player.asset_ended();
    // A stray duplicate end signal must not double-settle.
    player.asset_ended();
    assert_eq!(completions(&drain(&mut events)), 1);
}

#[tokio::test(start_paused = true)]
async fn interrupted_live_stream_grants_nothing() {
    let (mut player, mut events) = AdPlayer::new(video_offer());
    player.start();
    player.report_position(14.9, 15.0);
    // Viewer bails just before the end; the player is discarded.
    player.teardown();
    drop(player);

    assert_eq!(completions(&drain(&mut events)), 0);
}

#[tokio::test(start_paused = true)]
async fn failover_restarts_from_zero_and_completes_once() {
    let (mut player, mut events) = AdPlayer::new(video_offer());
    player.start();
    player.report_position(2.0, 15.0);

    player.fail_over();
    assert_eq!(player.mode(), PlayerMode::Simulated);
    // A second failover request is a no-op.
    player.fail_over();

    let seen = drain(&mut events);
    let failover_logs = seen
        .iter()
        .filter(|e| matches!(e, PlayerEvent::Log(line) if line.contains("[Failover]")))
        .count();
    assert_eq!(failover_logs, 1);
    // Progress restarted at zero when the simulation took over.
    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Progress { progress: 0, .. })));

    // Live callbacks arriving after failover are ignored.
    player.report_position(9.0, 15.0);
    player.asset_ended();
    assert_eq!(completions(&drain(&mut events)), 0);

    // The simulated run now drives the single completion.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(completions(&drain(&mut events)), 1);
}
