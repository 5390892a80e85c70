//! Cue document model.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signature every WebVTT file starts with.
pub const WEBVTT_HEADER: &str = "WEBVTT";

/// A single caption: its time range and the dialogue lines shown during it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cue {
    timing: String,
    lines: Vec<String>,
}

impl Cue {
    /// Build a cue from a time range line and its dialogue.
    ///
    /// The timing line is stored as given; comma decimals are the parser's
    /// concern.
    pub fn new(timing: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            timing: timing.into(),
            lines,
        }
    }

    /// The `start --> end` line.
    pub fn timing(&self) -> &str {
        &self.timing
    }

    /// Start timestamp, as written.
    pub fn start(&self) -> &str {
        self.timing
            .split("-->")
            .next()
            .map(str::trim)
            .unwrap_or_default()
    }

    /// End timestamp, without any trailing cue settings.
    pub fn end(&self) -> Option<&str> {
        let (_, rest) = self.timing.split_once("-->")?;
        rest.split_whitespace().next()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Dialogue joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// An ordered list of cues, rendered as WebVTT by [`fmt::Display`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubtitleDocument {
    cues: Vec<Cue>,
}

impl SubtitleDocument {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Render the document as WebVTT text.
    pub fn to_webvtt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{WEBVTT_HEADER}\n\n")?;
        for cue in &self.cues {
            writeln!(f, "{}", cue.timing)?;
            for line in &cue.lines {
                writeln!(f, "{line}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromIterator<Cue> for SubtitleDocument {
    fn from_iter<I: IntoIterator<Item = Cue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_and_blank_line_separated_cues() {
        let doc = SubtitleDocument::new(vec![
            Cue::new("00:00:01.000 --> 00:00:02.000", vec!["One".into()]),
            Cue::new(
                "00:00:03.000 --> 00:00:04.000",
                vec!["Two".into(), "lines".into()],
            ),
        ]);

        assert_eq!(
            doc.to_webvtt(),
            "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nOne\n\n00:00:03.000 --> 00:00:04.000\nTwo\nlines\n\n"
        );
    }

    #[test]
    fn cue_timestamps() {
        let cue = Cue::new("00:00:01.000 --> 00:00:02.500 line:90%", vec![]);
        assert_eq!(cue.start(), "00:00:01.000");
        assert_eq!(cue.end(), Some("00:00:02.500"));
    }

    #[test]
    fn empty_document() {
        let doc = SubtitleDocument::default();
        assert!(doc.is_empty());
        assert_eq!(doc.to_string(), "WEBVTT\n\n");
    }
}
