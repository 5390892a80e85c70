//! Subtitle delivery for the player.
//!
//! Provider subtitle files are fetched directly and, when the host refuses,
//! again through the relay. Every track handed to the player is WebVTT: SRT
//! text is converted with [`streamflix_subtitle`].

mod fetch;
mod proxy;
mod tracks;

pub use fetch::{FetchSource, FetchedText, SubtitleFetcher, SUBTITLE_TIMEOUT};
pub use proxy::{proxied_stream_url, proxied_subtitle_url};
pub use tracks::{
    SubtitleTrack, TrackOrigin, TrackSelection, TrackSet, TrackSource, USER_TRACK_LANGUAGE,
};
