use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CaptionError;

// @module: WebVTT cue parsing and cleanup

/// Header token every WebVTT document starts with
pub const OPENING_MARKER: &str = "WEBVTT";

/// Number of leading characters inspected by the format sniff
pub const SNIFF_WINDOW_CHARS: usize = 100;

/// Token that marks a cue timing line
pub const TIMING_SEPARATOR: &str = "-->";

// Splitting uses the padded form so a bare "-->" leaves timing untouched
const TIMING_SPLIT: &str = " --> ";

// @const: Inline markup such as <c>, <i>, <00:00:01.000>
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

// @const: Line breaks left inside a cue payload
static LINE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());

// @const: Runs of whitespace
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// @struct: One cleaned cue before merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicCue {
    // @field: Markup-free, whitespace-normalized text
    pub text: String,

    // @field: Start offset from document start in ms
    #[serde(rename = "offset")]
    pub offset_ms: u64,

    // @field: Clamped cue length in ms
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl AtomicCue {
    /// Creates a new cue
    pub fn new(text: impl Into<String>, offset_ms: u64, duration_ms: u64) -> Self {
        AtomicCue {
            text: text.into(),
            offset_ms,
            duration_ms,
        }
    }

    /// End of the cue (offset + duration)
    pub fn end_ms(&self) -> u64 {
        self.offset_ms.saturating_add(self.duration_ms)
    }
}

impl fmt::Display for AtomicCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}+{}] {}", self.offset_ms, self.duration_ms, self.text)
    }
}

/// Fast format check: the opening marker must appear in the first 100 characters
pub fn looks_like_vtt(raw: &str) -> bool {
    let window_end = raw
        .char_indices()
        .nth(SNIFF_WINDOW_CHARS)
        .map_or(raw.len(), |(idx, _)| idx);

    raw[..window_end].contains(OPENING_MARKER)
}

/// Parse a WebVTT document into atomic cues.
///
/// Returns `CaptionError::FormatMismatch` when the document fails the format
/// sniff. A recognized document without usable text yields an empty vector.
/// Bad timestamps and broken timing lines never abort the scan.
pub fn parse_vtt(raw: &str) -> Result<Vec<AtomicCue>, CaptionError> {
    if !looks_like_vtt(raw) {
        return Err(CaptionError::FormatMismatch);
    }

    let mut cues: Vec<AtomicCue> = Vec::new();
    let mut current_start_ms: u64 = 0;
    let mut current_end_ms: u64 = 0;
    let mut dropped_lines = 0usize;

    for line in raw.split('\n') {
        let line = line.trim();

        if line.contains(TIMING_SEPARATOR) {
            if let Some((start_ms, end_ms)) = parse_timing_line(line) {
                current_start_ms = start_ms;
                current_end_ms = end_ms;
            }
            continue;
        }

        if line.is_empty() || is_sequence_number(line) || line == OPENING_MARKER {
            continue;
        }

        let text = clean_text(line);
        if text.is_empty() || is_boilerplate(&text) {
            dropped_lines += 1;
            continue;
        }

        // Auto-generated tracks repeat the previous line in rolling cues
        if cues.last().is_some_and(|last| last.text == text) {
            continue;
        }

        cues.push(AtomicCue {
            text,
            offset_ms: current_start_ms,
            duration_ms: current_end_ms.saturating_sub(current_start_ms),
        });
    }

    debug!(
        "Parsed {} cues from caption document ({} boilerplate lines dropped)",
        cues.len(),
        dropped_lines
    );

    Ok(cues)
}

/// Parse a "start --> end [settings]" line.
///
/// Returns `None` when the padded separator is missing, which leaves the
/// caller's timing state unchanged.
fn parse_timing_line(line: &str) -> Option<(u64, u64)> {
    let mut parts = line.split(TIMING_SPLIT);
    let start = parts.next()?;
    let end = parts.next()?;

    // Positioning settings ("align:start position:0%") follow the end time
    let end = end.trim().split(' ').next().unwrap_or_default();

    Some((parse_timestamp(start.trim()), parse_timestamp(end)))
}

/// Convert `hh:mm:ss.mmm` or `mm:ss.mmm` to milliseconds; malformed input yields 0
pub fn parse_timestamp(timestamp: &str) -> u64 {
    try_parse_timestamp(timestamp).unwrap_or(0)
}

fn try_parse_timestamp(timestamp: &str) -> Option<u64> {
    let (hms, millis) = match timestamp.split_once('.') {
        Some((hms, fraction)) => (hms, fraction.parse::<u64>().ok()?),
        None => (timestamp, 0),
    };

    let parts: Vec<&str> = hms.split(':').collect();
    let (hours, minutes, seconds): (u64, u64, u64) = match parts.as_slice() {
        [h, m, s] => (h.parse().ok()?, m.parse().ok()?, s.parse().ok()?),
        [m, s] => (0, m.parse().ok()?, s.parse().ok()?),
        _ => (0, 0, 0),
    };

    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

fn is_sequence_number(line: &str) -> bool {
    !line.is_empty() && line.chars().all(char::is_numeric)
}

/// Strip inline tags and normalize whitespace
pub fn clean_text(text: &str) -> String {
    let text = TAG_REGEX.replace_all(text, "");
    let text = LINE_BREAK_REGEX.replace_all(&text, " ");
    let text = WHITESPACE_REGEX.replace_all(&text, " ");
    text.trim().to_string()
}

/// Lines that are track metadata or page artifacts rather than spoken text
pub fn is_boilerplate(text: &str) -> bool {
    text.starts_with("#EXT")
        || text.starts_with("http")
        || text.contains(TIMING_SEPARATOR)
        || (text.contains('{') && text.contains('}'))
        || text.contains("window.")
        || text.contains("function(")
        || text.starts_with("Kind:")
        || text.starts_with("Language:")
        || text.to_lowercase().contains("captions language")
}
