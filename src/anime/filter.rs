use serde::{Deserialize, Serialize};

/// Advanced search parameters.
///
/// Text fields use `"all"` (or `"default"` for `sort`) to mean "no
/// constraint"; only constrained fields are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub keyword: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub rated: String,
    pub score: String,
    pub season: String,
    pub language: String,
    pub sort: String,
    /// Comma-separated genre slugs.
    pub genres: String,
    pub page: u32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            kind: "all".into(),
            status: "all".into(),
            rated: "all".into(),
            score: "all".into(),
            season: "all".into(),
            language: "all".into(),
            sort: "default".into(),
            genres: String::new(),
            page: 1,
        }
    }
}

impl FilterParams {
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Query pairs for the request, `page` first.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string())];
        if !self.keyword.is_empty() {
            pairs.push(("keyword", self.keyword.clone()));
        }
        for (name, value) in [
            ("type", &self.kind),
            ("status", &self.status),
            ("rated", &self.rated),
            ("score", &self.score),
            ("season", &self.season),
            ("language", &self.language),
        ] {
            if value != "all" {
                pairs.push((name, value.clone()));
            }
        }
        if self.sort != "default" {
            pairs.push(("sort", self.sort.clone()));
        }
        if !self.genres.is_empty() {
            pairs.push(("genres", self.genres.clone()));
        }
        pairs
    }
}
