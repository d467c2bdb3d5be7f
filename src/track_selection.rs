/*!
 * Caption track selection.
 *
 * A video usually exposes several caption tracks: uploader-provided ones and
 * machine-generated ones, in several languages and formats. Selection is an
 * ordered list of strategies evaluated in priority order; the first strategy
 * that accepts any track decides the result.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::language_utils;

/// Format the parser understands
pub const PREFERRED_FORMAT: &str = "vtt";

/// Origin of a caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// Uploaded by the video owner
    Manual,
    /// Generated by speech recognition
    Automatic,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Manual => write!(f, "manual"),
            TrackKind::Automatic => write!(f, "automatic"),
        }
    }
}

/// One caption track offered for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language tag as reported by the platform
    pub language: String,
    /// Manual or automatic
    pub kind: TrackKind,
    /// Available formats (file extensions)
    pub formats: Vec<String>,
}

impl CaptionTrack {
    /// Create a new track entry
    pub fn new(language: impl Into<String>, kind: TrackKind, formats: Vec<String>) -> Self {
        Self {
            language: language.into(),
            kind,
            formats,
        }
    }

    /// Whether the track is offered in the given format
    pub fn has_format(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f.eq_ignore_ascii_case(format))
    }
}

/// Accept tracks of one kind whose language matches one of the patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStrategy {
    /// Track kind this strategy considers
    pub kind: TrackKind,
    /// Language patterns in priority order
    pub patterns: Vec<String>,
}

impl SelectionStrategy {
    pub fn new(kind: TrackKind, patterns: Vec<String>) -> Self {
        Self { kind, patterns }
    }

    /// Pick a track: earlier patterns win, then the preferred format, then
    /// listing order.
    pub fn pick<'a>(&self, tracks: &'a [CaptionTrack]) -> Option<&'a CaptionTrack> {
        for pattern in &self.patterns {
            let mut candidates = tracks
                .iter()
                .filter(|t| t.kind == self.kind && language_utils::matches_pattern(&t.language, pattern));

            let Some(first) = candidates.next() else {
                continue;
            };
            if first.has_format(PREFERRED_FORMAT) {
                return Some(first);
            }
            return Some(
                candidates
                    .find(|t| t.has_format(PREFERRED_FORMAT))
                    .unwrap_or(first),
            );
        }
        None
    }
}

/// Ordered chain of selection strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSelector {
    strategies: Vec<SelectionStrategy>,
}

impl TrackSelector {
    /// Create a selector from explicit strategies
    pub fn new(strategies: Vec<SelectionStrategy>) -> Self {
        Self { strategies }
    }

    /// Manual tracks first, machine-generated ones as fallback
    pub fn manual_then_automatic<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        Self::new(vec![
            SelectionStrategy::new(TrackKind::Manual, patterns.clone()),
            SelectionStrategy::new(TrackKind::Automatic, patterns),
        ])
    }

    /// Strategies in evaluation order
    pub fn strategies(&self) -> &[SelectionStrategy] {
        &self.strategies
    }

    /// Every pattern across all strategies, deduplicated, in first-seen order
    pub fn all_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = Vec::new();
        for pattern in self.strategies.iter().flat_map(|s| s.patterns.iter()) {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        patterns
    }

    /// Select the best track, or `None` if no strategy accepts any
    pub fn select<'a>(&self, tracks: &'a [CaptionTrack]) -> Option<&'a CaptionTrack> {
        for (priority, strategy) in self.strategies.iter().enumerate() {
            if let Some(track) = strategy.pick(tracks) {
                debug!(
                    "Selected {} track '{}' (strategy {} of {})",
                    track.kind,
                    track.language,
                    priority + 1,
                    self.strategies.len()
                );
                return Some(track);
            }
        }
        None
    }
}
