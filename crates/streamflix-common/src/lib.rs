//! Streamflix-Common: Shared types, identifiers, and errors.
//!
//! This crate provides common functionality used across streamflix:
//!
//! - **Episode references**: The `"{anime}::ep={n}"` composite identifier
//! - **Catalog Types**: Enums for media types, browse categories, genres and letters
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use streamflix_common::{AnimeGenre, BrowseCategory, EpisodeRef, Error, Result};
//!
//! // Compose and split episode ids
//! let ep = EpisodeRef::new("one-piece-100", 12);
//! assert_eq!(ep.to_string(), "one-piece-100::ep=12");
//!
//! // Validate catalog inputs
//! let category: BrowseCategory = "top-airing".parse().unwrap();
//! let genre = AnimeGenre::parse("Slice of Life").unwrap();
//! assert_eq!(genre.as_str(), "slice-of-life");
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("anime"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
