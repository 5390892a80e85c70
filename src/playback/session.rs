//! Player-bound watch progress: resume on mount, periodic save while playing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ProgressStore;

/// Default period between progress saves.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(5);

/// The media element a session drives.
///
/// Positions are in seconds.
pub trait MediaElement: Send + Sync {
    fn current_time(&self) -> f64;

    /// `None` until metadata has loaded.
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    fn seek(&self, position: f64);
}

/// Progress tracking for one (content, episode) pair on one player.
///
/// Dropping the session stops the periodic saver.
pub struct PlaybackSession {
    content_id: String,
    episode: u32,
    resumed_from: Option<f64>,
    saver: JoinHandle<()>,
}

impl PlaybackSession {
    /// Resume from saved progress, if any qualifies, then start saving every
    /// `interval`.
    pub fn mount(
        store: ProgressStore,
        content_id: impl Into<String>,
        episode: u32,
        player: Arc<dyn MediaElement>,
        interval: Duration,
    ) -> Self {
        let content_id = content_id.into();

        let resumed_from = store.resume_position(&content_id, episode);
        if let Some(position) = resumed_from {
            info!(content_id = %content_id, episode, position, "Resuming playback");
            player.seek(position);
        }

        let saver = tokio::spawn(save_loop(
            store,
            content_id.clone(),
            episode,
            player,
            interval,
        ));

        Self {
            content_id,
            episode,
            resumed_from,
            saver,
        }
    }

    /// Position the player was sought to on mount.
    pub fn resumed_from(&self) -> Option<f64> {
        self.resumed_from
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.saver.abort();
    }
}

/// Persist the current position if the player is playing with metadata loaded.
///
/// Returns whether anything was written.
pub fn save_progress(
    store: &ProgressStore,
    content_id: &str,
    episode: u32,
    player: &dyn MediaElement,
) -> bool {
    let Some(duration) = player.duration() else {
        return false;
    };
    if player.is_paused() {
        return false;
    }
    let position = player.current_time();
    if position <= 0.0 {
        return false;
    }

    match store.save(content_id, episode, position, Some(duration), Utc::now()) {
        Ok(()) => {
            debug!(content_id, episode, position, "Saved watch progress");
            true
        }
        Err(e) => {
            warn!(content_id, episode, error = %e, "Failed to save watch progress");
            false
        }
    }
}

async fn save_loop(
    store: ProgressStore,
    content_id: String,
    episode: u32,
    player: Arc<dyn MediaElement>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        save_progress(&store, &content_id, episode, player.as_ref());
    }
}
