//! Anime catalog client.
//!
//! [`AnimeClient`] covers the catalog service's endpoints: home and discovery
//! feeds, search, details, episodes, streaming servers and links, curated
//! browse listings, the schedule and character pages. Responses are plain
//! JSON; list-shaped responses go through [`extract_list`] and episode lists
//! through [`normalize_episodes`].

mod client;
mod extract;
mod filter;

pub use client::AnimeClient;
pub use extract::{
    extract_list, normalize_details, normalize_episodes, Episode, ListStrategy, LIST_STRATEGIES,
};
pub use filter::FilterParams;
