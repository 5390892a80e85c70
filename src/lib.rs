//! Streamflix - movie, TV and anime catalog client
//!
//! This library crate exposes the catalog clients, the request cache and the
//! playback state used by the `streamflix` binary.

pub mod anime;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod http;
pub mod playback;
pub mod storage;
pub mod subtitles;
pub mod tmdb;
pub mod watchlist;
