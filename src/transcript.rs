use log::debug;
use std::fmt;

use crate::caption_parser::{self, AtomicCue};
use crate::errors::CaptionError;
use crate::sentence_merger::{self, MergedBlock};

// @module: Document-to-blocks pipeline

/// Result of turning one raw caption document into stored blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    /// The document is not a timed-text track at all
    FormatMismatch,
    /// The document is a caption track but carries no usable text
    Empty,
    /// Merged blocks, never empty
    Blocks(Vec<MergedBlock>),
}

impl TranscriptOutcome {
    /// Parse and merge a raw WebVTT document
    pub fn from_vtt(raw: &str) -> Self {
        match caption_parser::parse_vtt(raw) {
            Err(CaptionError::FormatMismatch) => {
                debug!("Caption document rejected by format check");
                TranscriptOutcome::FormatMismatch
            }
            Ok(cues) => Self::from_cues(&cues),
        }
    }

    /// Merge already-parsed cues
    pub fn from_cues(cues: &[AtomicCue]) -> Self {
        if cues.is_empty() {
            return TranscriptOutcome::Empty;
        }
        TranscriptOutcome::Blocks(sentence_merger::merge_cues(cues))
    }

    /// Borrow the blocks if any were produced
    pub fn blocks(&self) -> Option<&[MergedBlock]> {
        match self {
            TranscriptOutcome::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }

    /// Take the blocks if any were produced
    pub fn into_blocks(self) -> Option<Vec<MergedBlock>> {
        match self {
            TranscriptOutcome::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }
}

impl fmt::Display for TranscriptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptOutcome::FormatMismatch => write!(f, "not a WebVTT document"),
            TranscriptOutcome::Empty => write!(f, "no usable captions"),
            TranscriptOutcome::Blocks(blocks) => write!(f, "{} blocks", blocks.len()),
        }
    }
}
