//! # streamflix-subtitle
//!
//! Normalizer for the SRT-like subtitle dumps served by anime streaming
//! sources.
//!
//! Those files follow the SRT block layout (optional index line, a time range,
//! dialogue) but use comma decimals in timestamps and frequently carry
//! thumbnail-sprite metadata (`xywh=` rectangles, `sprite-N.jpg` references,
//! encoded key prefixes) and ASS style overrides inline with the dialogue. This
//! crate turns them into clean WebVTT text suitable for a native text track.
//!
//! ## Quick Start
//!
//! ```
//! use streamflix_subtitle::convert;
//!
//! let srt = "1\n00:00:01,000 --> 00:00:02,500\nxywh=0,0,100,100 Hello\n";
//! let vtt = convert(srt);
//!
//! assert_eq!(vtt, "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello\n\n");
//! ```
//!
//! ## Working with cues
//!
//! ```
//! use streamflix_subtitle::parse;
//!
//! let doc = parse("00:00:01,000 --> 00:00:02,000\n{\\an8}Top line\n");
//! assert_eq!(doc.len(), 1);
//! assert_eq!(doc.cues()[0].lines(), ["Top line"]);
//! ```

mod clean;
pub mod model;
mod parser;

pub use clean::clean_line;
pub use model::{Cue, SubtitleDocument, WEBVTT_HEADER};

/// Parse SRT-like text into a cue document.
///
/// Blocks without a time range, and blocks whose dialogue is empty after
/// cleaning, are dropped.
pub fn parse(input: &str) -> SubtitleDocument {
    parser::parse_blocks(input)
}

/// Convert SRT-like text to WebVTT.
///
/// Applying `convert` to its own output returns the same text.
///
/// # Examples
///
/// ```
/// use streamflix_subtitle::convert;
///
/// let once = convert("00:00:05,000 --> 00:00:06,000\nHi there\n");
/// assert_eq!(convert(&once), once);
/// ```
pub fn convert(input: &str) -> String {
    parse(input).to_string()
}

/// Whether the text starts with the WebVTT signature.
pub fn is_webvtt(text: &str) -> bool {
    text.trim_start_matches('\u{feff}').starts_with("WEBVTT")
}

/// Whether a fetched body is an HTML page rather than subtitle text.
///
/// Subtitle hosts that block a request usually answer with an error page and
/// a success status, so the body has to be sniffed.
pub fn looks_like_html(text: &str) -> bool {
    let head = text.trim_start();
    if head.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("<html")) {
        return true;
    }
    text.to_ascii_lowercase().contains("<!doctype")
}
