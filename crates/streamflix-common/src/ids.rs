//! Composite identifiers used by the anime catalog.
//!
//! Episodes are addressed by the show id plus an episode number, encoded in a
//! single string as `"{anime}::ep={number}"`. Identifiers without the episode
//! marker refer to the show itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EPISODE_MARKER: &str = "::ep=";

/// Reference to a show, optionally narrowed to one of its episodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct EpisodeRef {
    anime_id: String,
    episode: Option<u32>,
}

impl EpisodeRef {
    /// Reference a specific episode of a show.
    #[must_use]
    pub fn new(anime_id: impl Into<String>, episode: u32) -> Self {
        Self {
            anime_id: anime_id.into(),
            episode: Some(episode),
        }
    }

    /// Reference a show without selecting an episode.
    #[must_use]
    pub fn show(anime_id: impl Into<String>) -> Self {
        Self {
            anime_id: anime_id.into(),
            episode: None,
        }
    }

    /// Split an identifier into show id and episode number.
    ///
    /// The episode part is read up to the first non-digit; a marker followed by
    /// no digits yields no episode number.
    pub fn parse(id: &str) -> Self {
        match id.split_once(EPISODE_MARKER) {
            Some((anime, rest)) => {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                Self {
                    anime_id: anime.to_string(),
                    episode: digits.parse().ok(),
                }
            }
            None => Self::show(id),
        }
    }

    /// The show identifier.
    pub fn anime_id(&self) -> &str {
        &self.anime_id
    }

    /// The episode number, if one was selected.
    pub fn episode(&self) -> Option<u32> {
        self.episode
    }
}

impl fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.episode {
            Some(n) => write!(f, "{}{}{}", self.anime_id, EPISODE_MARKER, n),
            None => write!(f, "{}", self.anime_id),
        }
    }
}

impl FromStr for EpisodeRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for EpisodeRef {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<EpisodeRef> for String {
    fn from(id: EpisodeRef) -> Self {
        id.to_string()
    }
}
