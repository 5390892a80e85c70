//! TMDB image URL construction.

/// Shown when a record has no artwork.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/500x750?text=No+Image";

pub const POSTER_SIZES: [&str; 4] = ["w200", "w300", "w500", "original"];
pub const BACKDROP_SIZES: [&str; 4] = ["w300", "w780", "w1280", "original"];
pub const PROFILE_SIZES: [&str; 4] = ["w45", "w185", "w342", "original"];

pub const DEFAULT_POSTER_SIZE: &str = "w500";
pub const DEFAULT_BACKDROP_SIZE: &str = "w780";

/// Full URL of an image path fragment such as `/abc123.jpg`.
///
/// A missing or empty path yields [`PLACEHOLDER_IMAGE`]; absolute URLs are
/// returned as they are.
pub fn image_url(base_url: &str, path: Option<&str>, size: &str) -> String {
    match path.filter(|p| !p.is_empty()) {
        None => PLACEHOLDER_IMAGE.to_string(),
        Some(p) if p.starts_with("http://") || p.starts_with("https://") => p.to_string(),
        Some(p) if p.starts_with('/') => format!("{}/{size}{p}", base_url.trim_end_matches('/')),
        Some(p) => format!("{}/{size}/{p}", base_url.trim_end_matches('/')),
    }
}
