//! Next-episode countdown near the end of an episode.

use std::time::Duration;

/// Default window before the end in which the countdown shows.
pub const DEFAULT_AUTOPLAY_THRESHOLD: Duration = Duration::from_secs(15);

/// Seconds left, rounded up, when playback is inside the countdown window.
pub fn next_episode_countdown(duration: f64, position: f64, threshold: Duration) -> Option<u32> {
    let remaining = duration - position;
    if remaining > 0.0 && remaining < threshold.as_secs_f64() {
        Some(remaining.ceil() as u32)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayEvent {
    /// Nothing to show or do.
    Idle,
    /// Show the countdown with this many seconds left.
    Countdown(u32),
    /// The episode ended during a countdown; move to the next one.
    Advance,
}

/// Tracks whether a countdown is running across periodic position checks.
#[derive(Debug, Clone)]
pub struct Autoplay {
    threshold: Duration,
    counting: bool,
}

impl Autoplay {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            counting: false,
        }
    }

    /// Feed the latest position; call roughly once per second.
    pub fn check(&mut self, duration: f64, position: f64) -> AutoplayEvent {
        if duration <= 0.0 {
            return AutoplayEvent::Idle;
        }
        if let Some(left) = next_episode_countdown(duration, position, self.threshold) {
            self.counting = true;
            return AutoplayEvent::Countdown(left);
        }
        if self.counting && duration - position <= 0.0 {
            self.counting = false;
            return AutoplayEvent::Advance;
        }
        self.counting = false;
        AutoplayEvent::Idle
    }

    /// Abandon a running countdown (the user seeked back or dismissed it).
    pub fn cancel(&mut self) {
        self.counting = false;
    }
}

impl Default for Autoplay {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOPLAY_THRESHOLD)
    }
}
