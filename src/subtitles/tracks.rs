use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use streamflix_common::{Error, Result};
use streamflix_subtitle::{is_webvtt, parse};
use tracing::{debug, info, warn};

use super::fetch::SubtitleFetcher;

/// Language given to tracks the user loads from disk.
pub const USER_TRACK_LANGUAGE: &str = "en";

/// A subtitle track offered by the stream provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSource {
    pub url: String,
    pub label: String,
    pub language: Option<String>,
}

impl TrackSource {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOrigin {
    Cloud { url: String },
    User { name: String },
}

/// A subtitle track ready for the player, always in WebVTT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub label: String,
    pub language: Option<String>,
    pub origin: TrackOrigin,
    pub webvtt: Arc<str>,
}

impl SubtitleTrack {
    pub fn is_user(&self) -> bool {
        matches!(self.origin, TrackOrigin::User { .. })
    }
}

/// Which track is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackSelection {
    #[default]
    None,
    Cloud(usize),
    User(usize),
}

/// Provider tracks plus tracks the user loaded, with one optional selection.
///
/// The default selection is the first user track, else the first provider
/// track, else nothing.
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    cloud: Vec<SubtitleTrack>,
    user: Vec<SubtitleTrack>,
    selection: TrackSelection,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and convert every source concurrently, keeping the ones that
    /// yield at least one cue.
    pub async fn load(fetcher: &SubtitleFetcher, sources: &[TrackSource]) -> Self {
        let mut set = Self::new();
        set.replace(fetcher, sources).await;
        set
    }

    /// Replace the provider tracks, e.g. after switching episode or server.
    pub async fn replace(&mut self, fetcher: &SubtitleFetcher, sources: &[TrackSource]) {
        let fetched = join_all(sources.iter().map(|source| async move {
            let document = fetcher.fetch_and_convert(&source.url).await?;
            if document.is_empty() {
                return None;
            }
            Some(SubtitleTrack {
                label: source.label.clone(),
                language: source.language.clone(),
                origin: TrackOrigin::Cloud {
                    url: source.url.clone(),
                },
                webvtt: Arc::from(document.to_webvtt()),
            })
        }))
        .await;

        self.cloud = fetched.into_iter().flatten().collect();
        let failed = sources.len() - self.cloud.len();
        if failed > 0 {
            warn!(failed, loaded = self.cloud.len(), "Some subtitle tracks could not be loaded");
        } else {
            debug!(loaded = self.cloud.len(), "Subtitle tracks loaded");
        }

        if let TrackSelection::Cloud(_) = self.selection {
            self.selection = TrackSelection::None;
        }
        if self.selection == TrackSelection::None {
            self.selection = self.default_selection();
        }
    }

    /// Read a subtitle file from disk and select it.
    pub async fn add_local(&mut self, path: &Path) -> Result<&SubtitleTrack> {
        let text = tokio::fs::read_to_string(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.add_user_text(&name, &text)
    }

    /// Add subtitle text supplied by the user and select it.
    ///
    /// `.srt` files and anything without a WebVTT signature are converted.
    pub fn add_user_text(&mut self, name: &str, text: &str) -> Result<&SubtitleTrack> {
        let needs_conversion = name.to_ascii_lowercase().ends_with(".srt") || !is_webvtt(text);
        let webvtt = if needs_conversion {
            let document = parse(text);
            if document.is_empty() {
                return Err(Error::invalid_input(format!("{name} contains no subtitle cues")));
            }
            document.to_webvtt()
        } else {
            text.to_string()
        };

        info!(name, converted = needs_conversion, "Loaded user subtitle track");
        self.user.push(SubtitleTrack {
            label: name.to_string(),
            language: Some(USER_TRACK_LANGUAGE.to_string()),
            origin: TrackOrigin::User {
                name: name.to_string(),
            },
            webvtt: Arc::from(webvtt),
        });
        let index = self.user.len() - 1;
        self.selection = TrackSelection::User(index);
        Ok(&self.user[index])
    }

    /// Remove a user track. The selection follows the remaining tracks.
    pub fn remove_user(&mut self, index: usize) -> Option<SubtitleTrack> {
        if index >= self.user.len() {
            return None;
        }
        let removed = self.user.remove(index);
        self.selection = match self.selection {
            TrackSelection::User(i) if i == index => self.default_selection(),
            TrackSelection::User(i) if i > index => TrackSelection::User(i - 1),
            other => other,
        };
        Some(removed)
    }

    /// Select a track. Out-of-range indices are rejected.
    pub fn select(&mut self, selection: TrackSelection) -> Result<()> {
        let valid = match selection {
            TrackSelection::None => true,
            TrackSelection::Cloud(i) => i < self.cloud.len(),
            TrackSelection::User(i) => i < self.user.len(),
        };
        if !valid {
            return Err(Error::invalid_input(format!("no subtitle track {selection:?}")));
        }
        self.selection = selection;
        Ok(())
    }

    pub fn selection(&self) -> TrackSelection {
        self.selection
    }

    pub fn selected(&self) -> Option<&SubtitleTrack> {
        match self.selection {
            TrackSelection::None => None,
            TrackSelection::Cloud(i) => self.cloud.get(i),
            TrackSelection::User(i) => self.user.get(i),
        }
    }

    /// Provider tracks first, then user tracks.
    pub fn tracks(&self) -> impl Iterator<Item = &SubtitleTrack> {
        self.cloud.iter().chain(self.user.iter())
    }

    pub fn cloud_tracks(&self) -> &[SubtitleTrack] {
        &self.cloud
    }

    pub fn user_tracks(&self) -> &[SubtitleTrack] {
        &self.user
    }

    pub fn len(&self) -> usize {
        self.cloud.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.cloud.clear();
        self.user.clear();
        self.selection = TrackSelection::None;
    }

    fn default_selection(&self) -> TrackSelection {
        if !self.user.is_empty() {
            TrackSelection::User(0)
        } else if !self.cloud.is_empty() {
            TrackSelection::Cloud(0)
        } else {
            TrackSelection::None
        }
    }
}
