//! Helpers over TMDB detail sub-resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Region whose watch providers are reported.
pub const WATCH_REGION: &str = "US";

/// Best trailer from a `/videos` response: a YouTube trailer, else a YouTube
/// teaser.
pub fn pick_trailer(videos: &Value) -> Option<Value> {
    let results = videos.get("results")?.as_array()?;
    let find = |kind: &str| {
        results.iter().find(|v| {
            v.get("type").and_then(Value::as_str) == Some(kind)
                && v.get("site").and_then(Value::as_str) == Some("YouTube")
        })
    };
    find("Trailer").or_else(|| find("Teaser")).cloned()
}

/// Where a title can be watched in [`WATCH_REGION`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchOptions {
    pub free: Option<Value>,
    pub flatrate: Option<Value>,
    pub rent: Option<Value>,
    pub buy: Option<Value>,
    pub link: Option<String>,
}

impl WatchOptions {
    /// Summarize a `/watch/providers` response.
    pub fn from_response(response: &Value) -> Self {
        let Some(region) = response.get("results").and_then(|r| r.get(WATCH_REGION)) else {
            return Self::default();
        };
        let list = |name: &str| region.get(name).filter(|v| !v.is_null()).cloned();
        Self {
            free: list("free"),
            flatrate: list("flatrate"),
            rent: list("rent"),
            buy: list("buy"),
            link: region
                .get("link")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_none() && self.flatrate.is_none() && self.rent.is_none() && self.buy.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trailer_preferred_over_teaser() {
        let videos = json!({ "results": [
            { "key": "t1", "type": "Teaser", "site": "YouTube" },
            { "key": "v1", "type": "Trailer", "site": "Vimeo" },
            { "key": "y1", "type": "Trailer", "site": "YouTube" }
        ]});
        assert_eq!(pick_trailer(&videos).unwrap()["key"], "y1");
    }

    #[test]
    fn teaser_when_no_trailer() {
        let videos = json!({ "results": [{ "key": "t1", "type": "Teaser", "site": "YouTube" }] });
        assert_eq!(pick_trailer(&videos).unwrap()["key"], "t1");
        assert!(pick_trailer(&json!({ "results": [] })).is_none());
    }

    #[test]
    fn watch_options_for_region() {
        let response = json!({ "id": 1, "results": { "US": {
            "link": "https://www.themoviedb.org/movie/1/watch",
            "flatrate": [{ "provider_name": "Netflix" }]
        }}});
        let options = WatchOptions::from_response(&response);
        assert_eq!(options.flatrate.unwrap()[0]["provider_name"], "Netflix");
        assert!(options.rent.is_none());
        assert_eq!(
            options.link.as_deref(),
            Some("https://www.themoviedb.org/movie/1/watch")
        );

        assert!(WatchOptions::from_response(&json!({ "results": { "GB": {} } })).is_empty());
    }
}
