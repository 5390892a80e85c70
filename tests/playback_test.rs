//! Integration tests for watch progress: resume on mount and periodic saves.

mod common;

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use streamflix::playback::{
    progress_key, Autoplay, AutoplayEvent, PlaybackSession, PlayerPreferences, ProgressStore,
    ZoomMode, DEFAULT_AUTOPLAY_THRESHOLD, DEFAULT_SAVE_INTERVAL,
};
use streamflix::storage::FileStorage;

use common::{memory_storage, FakePlayer};

// ---------------------------------------------------------------------------
// Resume
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resumes_recent_progress() {
    let store = ProgressStore::new(memory_storage());
    store
        .save("frieren-18542", 3, 42.0, Some(1420.0), Utc::now())
        .unwrap();

    let player = FakePlayer::new();
    let session = PlaybackSession::mount(store, "frieren-18542", 3, player.clone(), DEFAULT_SAVE_INTERVAL);

    assert_eq!(session.resumed_from(), Some(42.0));
    assert_eq!(player.seeks(), vec![42.0]);
}

#[tokio::test]
async fn stale_progress_is_ignored() {
    let store = ProgressStore::new(memory_storage());
    store
        .save("frieren-18542", 3, 600.0, Some(1420.0), Utc::now() - ChronoDuration::days(40))
        .unwrap();

    let player = FakePlayer::new();
    let session = PlaybackSession::mount(store, "frieren-18542", 3, player.clone(), DEFAULT_SAVE_INTERVAL);

    assert_eq!(session.resumed_from(), None);
    assert!(player.seeks().is_empty());
}

#[tokio::test]
async fn first_seconds_are_not_resumed() {
    let store = ProgressStore::new(memory_storage());
    store.save("one-piece-100", 1, 8.0, None, Utc::now()).unwrap();
    assert_eq!(store.resume_position("one-piece-100", 1), None);

    store.save("one-piece-100", 1, 10.5, None, Utc::now()).unwrap();
    assert_eq!(store.resume_position("one-piece-100", 1), Some(10.5));
}

#[tokio::test]
async fn legacy_records_are_migrated() {
    let storage = memory_storage();
    let legacy = json!({
        "time": 125.5,
        "duration": 1400.0,
        "timestamp": Utc::now().timestamp_millis()
    });
    storage
        .set(&progress_key("naruto-677", 12), legacy.to_string())
        .unwrap();

    let store = ProgressStore::new(storage);
    let record = store.load("naruto-677", 12).unwrap();
    assert_eq!(record.position_seconds, 125.5);
    assert_eq!(record.duration_seconds, Some(1400.0));
    assert_eq!(store.resume_position("naruto-677", 12), Some(125.5));
}

#[tokio::test]
async fn corrupt_record_reads_as_absent() {
    let storage = memory_storage();
    storage
        .set(&progress_key("naruto-677", 1), "{not json".to_string())
        .unwrap();

    let store = ProgressStore::new(storage);
    assert!(store.load("naruto-677", 1).is_none());
    assert_eq!(store.resume_position("naruto-677", 1), None);
}

// ---------------------------------------------------------------------------
// Periodic save
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn saves_only_while_playing_with_metadata() {
    let store = ProgressStore::new(memory_storage());
    let player = FakePlayer::new();
    let _session = PlaybackSession::mount(
        store.clone(),
        "frieren-18542",
        4,
        player.clone(),
        DEFAULT_SAVE_INTERVAL,
    );

    // Playing, but metadata has not loaded.
    player.play();
    player.set_time(12.0);
    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert!(store.load("frieren-18542", 4).is_none());

    player.load_metadata(1440.0);
    player.set_time(30.0);
    tokio::time::sleep(Duration::from_secs(5)).await;
    let record = store.load("frieren-18542", 4).unwrap();
    assert_eq!(record.position_seconds, 30.0);
    assert_eq!(record.duration_seconds, Some(1440.0));

    player.pause();
    player.set_time(55.0);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(store.load("frieren-18542", 4).unwrap().position_seconds, 30.0);
}

#[tokio::test(start_paused = true)]
async fn dropping_session_stops_saving() {
    let store = ProgressStore::new(memory_storage());
    let player = FakePlayer::new();
    player.load_metadata(1440.0);
    player.play();
    player.set_time(20.0);

    let session = PlaybackSession::mount(
        store.clone(),
        "frieren-18542",
        5,
        player.clone(),
        DEFAULT_SAVE_INTERVAL,
    );
    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert_eq!(store.load("frieren-18542", 5).unwrap().position_seconds, 20.0);

    drop(session);
    player.set_time(90.0);
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(store.load("frieren-18542", 5).unwrap().position_seconds, 20.0);
}

// ---------------------------------------------------------------------------
// Preferences & autoplay
// ---------------------------------------------------------------------------

#[test]
fn preferences_survive_reopening_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let prefs = PlayerPreferences {
        volume: 0.4,
        playback_rate: 1.5,
        quality: "720p".to_string(),
        brightness: 1.2,
        zoom_mode: ZoomMode::Fill,
    };
    prefs.save(&FileStorage::open(&path)).unwrap();

    let reopened = FileStorage::open(&path);
    assert_eq!(PlayerPreferences::load(&reopened), prefs);
}

#[test]
fn countdown_then_advance() {
    let mut autoplay = Autoplay::new(DEFAULT_AUTOPLAY_THRESHOLD);
    assert_eq!(autoplay.check(1440.0, 1000.0), AutoplayEvent::Idle);
    assert_eq!(autoplay.check(1440.0, 1430.2), AutoplayEvent::Countdown(10));
    assert_eq!(autoplay.check(1440.0, 1440.0), AutoplayEvent::Advance);
    assert_eq!(autoplay.check(1440.0, 1440.0), AutoplayEvent::Idle);
}
