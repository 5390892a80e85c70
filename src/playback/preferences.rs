//! Player preferences persisted across sessions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use streamflix_common::{Error, Result};

use crate::storage::Storage;

const VOLUME_KEY: &str = "player-volume";
const RATE_KEY: &str = "player-playback-rate";
const QUALITY_KEY: &str = "player-quality";
const BRIGHTNESS_KEY: &str = "player-brightness";
const ZOOM_KEY: &str = "player-zoom-mode";

/// How the picture is fitted to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomMode {
    #[default]
    Fit,
    Fill,
    Stretch,
    Zoom,
}

impl ZoomMode {
    /// The mode a "cycle zoom" control switches to.
    pub fn next(self) -> Self {
        match self {
            Self::Fit => Self::Fill,
            Self::Fill => Self::Stretch,
            Self::Stretch | Self::Zoom => Self::Fit,
        }
    }
}

impl fmt::Display for ZoomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fit => write!(f, "fit"),
            Self::Fill => write!(f, "fill"),
            Self::Stretch => write!(f, "stretch"),
            Self::Zoom => write!(f, "zoom"),
        }
    }
}

impl FromStr for ZoomMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fit" => Ok(Self::Fit),
            "fill" => Ok(Self::Fill),
            "stretch" => Ok(Self::Stretch),
            "zoom" => Ok(Self::Zoom),
            other => Err(Error::invalid_input(format!("unknown zoom mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPreferences {
    /// 0.0 to 1.0.
    pub volume: f64,
    pub playback_rate: f64,
    /// `"auto"` or a rendition label such as `"1080p"`.
    pub quality: String,
    /// CSS brightness multiplier; 1.0 is unchanged.
    pub brightness: f64,
    pub zoom_mode: ZoomMode,
}

impl Default for PlayerPreferences {
    fn default() -> Self {
        Self {
            volume: 1.0,
            playback_rate: 1.0,
            quality: "auto".to_string(),
            brightness: 1.0,
            zoom_mode: ZoomMode::Fit,
        }
    }
}

impl PlayerPreferences {
    /// Load saved preferences; missing or unreadable values keep their default.
    pub fn load(storage: &dyn Storage) -> Self {
        let defaults = Self::default();
        Self {
            volume: read_parsed(storage, VOLUME_KEY)
                .map(|v: f64| v.clamp(0.0, 1.0))
                .unwrap_or(defaults.volume),
            playback_rate: read_parsed(storage, RATE_KEY)
                .filter(|r: &f64| *r > 0.0)
                .unwrap_or(defaults.playback_rate),
            quality: storage
                .get(QUALITY_KEY)
                .filter(|q| !q.is_empty())
                .unwrap_or(defaults.quality),
            brightness: read_parsed(storage, BRIGHTNESS_KEY).unwrap_or(defaults.brightness),
            zoom_mode: read_parsed(storage, ZOOM_KEY).unwrap_or(defaults.zoom_mode),
        }
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        storage.set(VOLUME_KEY, self.volume.to_string())?;
        storage.set(RATE_KEY, self.playback_rate.to_string())?;
        storage.set(QUALITY_KEY, self.quality.clone())?;
        storage.set(BRIGHTNESS_KEY, self.brightness.to_string())?;
        storage.set(ZOOM_KEY, self.zoom_mode.to_string())?;
        Ok(())
    }
}

fn read_parsed<T>(storage: &dyn Storage, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = storage.get(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, "Ignoring unreadable preference: {}", e);
            None
        }
    }
}
