//! TMDB (The Movie Database) client for movies and TV shows.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Retry with backoff through [`crate::http::fetch_with_retry`].
//! - Responses cached and deduplicated through [`crate::cache::RequestCache`].
//! - Image URL helpers for posters and backdrops.

mod client;
mod images;
mod media;

pub use client::TmdbClient;
pub use images::{
    image_url, BACKDROP_SIZES, DEFAULT_BACKDROP_SIZE, DEFAULT_POSTER_SIZE, PLACEHOLDER_IMAGE,
    POSTER_SIZES, PROFILE_SIZES,
};
pub use media::{pick_trailer, WatchOptions, WATCH_REGION};
