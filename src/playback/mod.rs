//! Playback state that outlives a player: watch progress, preferences and
//! the next-episode countdown.
//!
//! A [`PlaybackSession`] binds a [`ProgressStore`] to one player for one
//! episode. On mount it seeks to the saved position when the record is
//! younger than 30 days and past the first 10 seconds. While mounted it saves
//! the position every 5 seconds, but only while the player is playing and
//! after metadata has loaded.

mod autoplay;
mod preferences;
mod progress;
mod session;

pub use autoplay::{next_episode_countdown, Autoplay, AutoplayEvent, DEFAULT_AUTOPLAY_THRESHOLD};
pub use preferences::{PlayerPreferences, ZoomMode};
pub use progress::{progress_key, ProgressRecord, ProgressStore, ResumePolicy};
pub use session::{save_progress, MediaElement, PlaybackSession, DEFAULT_SAVE_INTERVAL};
