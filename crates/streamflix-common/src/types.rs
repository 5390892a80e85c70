//! Core type definitions for catalog browsing.
//!
//! This module defines the enums used to address the catalog: what kind of
//! content an item is, which curated list to browse, which genre or index
//! letter to filter by, and which audio track a stream should carry. All enums
//! serialize to the lowercase slugs the catalog APIs expect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Kind of catalog content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A feature film.
    Movie,
    /// A TV series.
    Tv,
    /// An anime series or film.
    Anime,
}

impl MediaType {
    /// Path segment used by the movie/TV metadata API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Anime => "anime",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "tv" | "series" | "show" => Ok(Self::Tv),
            "anime" => Ok(Self::Anime),
            other => Err(Error::invalid_input(format!("unknown media type: {other}"))),
        }
    }
}

/// Curated anime listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowseCategory {
    TopAiring,
    MostPopular,
    MostFavorite,
    Completed,
    RecentlyAdded,
    RecentlyUpdated,
    TopUpcoming,
    SubbedAnime,
    DubbedAnime,
    Movie,
    Tv,
    Ova,
    Ona,
    Special,
}

impl BrowseCategory {
    /// Every listing, in display order.
    pub const ALL: [BrowseCategory; 14] = [
        Self::TopAiring,
        Self::MostPopular,
        Self::MostFavorite,
        Self::Completed,
        Self::RecentlyAdded,
        Self::RecentlyUpdated,
        Self::TopUpcoming,
        Self::SubbedAnime,
        Self::DubbedAnime,
        Self::Movie,
        Self::Tv,
        Self::Ova,
        Self::Ona,
        Self::Special,
    ];

    /// Endpoint slug for this listing.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopAiring => "top-airing",
            Self::MostPopular => "most-popular",
            Self::MostFavorite => "most-favorite",
            Self::Completed => "completed",
            Self::RecentlyAdded => "recently-added",
            Self::RecentlyUpdated => "recently-updated",
            Self::TopUpcoming => "top-upcoming",
            Self::SubbedAnime => "subbed-anime",
            Self::DubbedAnime => "dubbed-anime",
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Ova => "ova",
            Self::Ona => "ona",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for BrowseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowseCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::invalid_input(format!("Invalid query: {s}")))
    }
}

const GENRES: [&str; 41] = [
    "action",
    "adventure",
    "cars",
    "comedy",
    "dementia",
    "demons",
    "drama",
    "ecchi",
    "fantasy",
    "game",
    "harem",
    "historical",
    "horror",
    "isekai",
    "josei",
    "kids",
    "magic",
    "martial-arts",
    "mecha",
    "military",
    "music",
    "mystery",
    "parody",
    "police",
    "psychological",
    "romance",
    "samurai",
    "school",
    "sci-fi",
    "seinen",
    "shoujo",
    "shoujo-ai",
    "shounen",
    "shounen-ai",
    "slice-of-life",
    "space",
    "sports",
    "super-power",
    "supernatural",
    "thriller",
    "vampire",
];

/// A validated anime genre slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AnimeGenre(&'static str);

impl AnimeGenre {
    /// Normalize a display name (`"Slice of Life"`) to its slug and validate it.
    pub fn parse(name: &str) -> crate::Result<Self> {
        let slug = name
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        GENRES
            .iter()
            .find(|g| **g == slug)
            .map(|g| Self(*g))
            .ok_or_else(|| Error::invalid_input(format!("Invalid genre: {name}")))
    }

    /// All known genres.
    pub fn all() -> impl Iterator<Item = AnimeGenre> {
        GENRES.iter().map(|g| Self(*g))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for AnimeGenre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Entry of the A-Z index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AzLetter {
    /// Every title.
    All,
    /// Titles starting with a symbol.
    Other,
    /// Titles starting with a digit.
    Digits,
    /// Titles starting with the given lowercase ASCII letter.
    Letter(char),
}

impl AzLetter {
    pub fn parse(s: &str) -> crate::Result<Self> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "all" => Ok(Self::All),
            "other" => Ok(Self::Other),
            "0-9" => Ok(Self::Digits),
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_lowercase() => Ok(Self::Letter(c)),
                    _ => Err(Error::invalid_input(format!("Invalid letter: {s}"))),
                }
            }
        }
    }
}

impl fmt::Display for AzLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Other => write!(f, "other"),
            Self::Digits => write!(f, "0-9"),
            Self::Letter(c) => write!(f, "{c}"),
        }
    }
}

/// Audio variant of an anime stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioType {
    /// Original audio with subtitles.
    #[default]
    Sub,
    /// Dubbed audio.
    Dub,
    /// Original audio without subtitles.
    Raw,
}

impl fmt::Display for AudioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sub => write!(f, "sub"),
            Self::Dub => write!(f, "dub"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

impl FromStr for AudioType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sub" => Ok(Self::Sub),
            "dub" => Ok(Self::Dub),
            "raw" => Ok(Self::Raw),
            other => Err(Error::invalid_input(format!("unknown audio type: {other}"))),
        }
    }
}

/// Window for trending listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
        }
    }
}
