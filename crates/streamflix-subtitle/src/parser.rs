use regex::Regex;
use std::sync::LazyLock;

use crate::clean::clean_line;
use crate::model::{Cue, SubtitleDocument};

/// Blank line, possibly holding stray whitespace.
static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

const TIME_RANGE: &str = "-->";

pub(crate) fn parse_blocks(input: &str) -> SubtitleDocument {
    let normalized = input.replace('\r', "");
    BLOCK_SEPARATOR
        .split(&normalized)
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<Cue> {
    let lines: Vec<&str> = block
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 2 {
        return None;
    }

    let timing_index = usize::from(is_index_line(lines[0]));
    let timing = lines.get(timing_index)?;
    if !timing.contains(TIME_RANGE) {
        return None;
    }

    let dialogue: Vec<String> = lines[timing_index + 1..]
        .iter()
        .map(|l| clean_line(l))
        .filter(|l| !l.is_empty())
        .collect();
    if dialogue.is_empty() {
        return None;
    }

    Some(Cue::new(timing.replace(',', "."), dialogue))
}

fn is_index_line(line: &str) -> bool {
    line.bytes().all(|b| b.is_ascii_digit())
}
