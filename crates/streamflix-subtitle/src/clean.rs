//! Dialogue line cleaning.
//!
//! Sprite-preview metadata leaks into the dialogue of some sources. The
//! patterns below are applied in order, and the whole pass repeats until the
//! line stops changing: removing one artifact can expose another (for example
//! two stacked `key=` prefixes), and a single pass would leave text that a
//! second conversion still modifies.

use regex::Regex;
use std::sync::LazyLock;

/// `xywh=0,0,100,100` sprite rectangles.
static SPRITE_RECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)xywh=\d+,\d+,\d+,\d+").expect("valid regex"));

/// Encoded `key=` / `key==` prefixes at the start of a line.
static KEY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^a-zA-Z0-9]*[a-z0-9_\-]{2,20}={1,3}").expect("valid regex")
});

/// ASS override blocks such as `{\an8}` or `{\i1}`.
static STYLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\\.*?\}").expect("valid regex"));

/// `sprite-3.jpg` references.
static SPRITE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sprite-\d+\.[a-z]+").expect("valid regex"));

/// Bare `x,y,w,h` rectangles.
static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3,4},\d{3,4},\d{3,4},\d{3,4}\b").expect("valid regex")
});

/// Leftover `==` padding.
static PADDING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"={2,}").expect("valid regex"));

fn clean_once(line: &str) -> String {
    let line = SPRITE_RECT.replace_all(line, "");
    let line = KEY_PREFIX.replace(&line, "");
    let line = STYLE_TAG.replace_all(&line, "");
    let line = SPRITE_FILE.replace_all(&line, "");
    let line = COORDINATES.replace_all(&line, "");
    let line = PADDING.replace_all(&line, "");
    line.trim().to_string()
}

/// Strip sprite metadata and style markup from one dialogue line.
///
/// Returns an empty string when nothing but artifacts was present.
pub fn clean_line(line: &str) -> String {
    let mut current = line.trim().to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}
