/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sentence_merger::MergedBlock;

/// Where a video's study subject came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectSource {
    /// Curated learning roadmap; takes precedence
    Roadmap,
    /// General video library
    Library,
}

impl SubjectSource {
    /// Higher wins when two sources disagree
    pub fn precedence(&self) -> u8 {
        match self {
            SubjectSource::Roadmap => 2,
            SubjectSource::Library => 1,
        }
    }
}

impl fmt::Display for SubjectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectSource::Roadmap => write!(f, "roadmap"),
            SubjectSource::Library => write!(f, "library"),
        }
    }
}

impl std::str::FromStr for SubjectSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roadmap" => Ok(SubjectSource::Roadmap),
            "library" => Ok(SubjectSource::Library),
            _ => Err(anyhow::anyhow!("Invalid subject source: {}", s)),
        }
    }
}

/// What an upsert did to the stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed for the video
    Inserted,
    /// The row existed with different content or language
    Updated,
    /// The row already held identical content and language
    Unchanged,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Inserted => write!(f, "inserted"),
            UpsertOutcome::Updated => write!(f, "updated"),
            UpsertOutcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Stored transcript record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    /// Video identifier (primary key)
    pub video_id: String,
    /// Merged blocks decoded from the JSON content column
    pub blocks: Vec<MergedBlock>,
    /// Language code the captions were served in
    pub language: Option<String>,
    /// SHA-256 of the JSON content
    pub content_hash: String,
    /// Last write timestamp (RFC 3339)
    pub updated_at: String,
}

impl TranscriptRecord {
    /// Total duration across blocks in ms
    pub fn total_duration_ms(&self) -> u64 {
        self.blocks.iter().map(|b| b.duration_ms).sum()
    }
}

/// Video id with the stored language, used by the reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRecord {
    pub video_id: String,
    pub language: Option<String>,
}
