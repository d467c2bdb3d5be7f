/*!
 * Sentence merging for parsed caption cues.
 *
 * Auto-generated caption tracks are split into sub-sentence fragments. This
 * module joins consecutive cues into display-sized blocks, flushing a block
 * when a sentence ends, when it grows past a length limit, or when a long
 * pause separates it from the next cue.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::caption_parser::AtomicCue;

/// Characters that close a sentence (ASCII and full-width)
pub const TERMINAL_PUNCTUATION: [char; 6] = ['.', '?', '!', '。', '！', '？'];

/// A block longer than this many characters is flushed even mid-sentence
pub const MAX_BLOCK_CHARS: usize = 80;

/// Silence between two cues, in ms, above which they are never joined
pub const MAX_GAP_MS: u64 = 1000;

/// One or more cues joined into a single display unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedBlock {
    /// Space-joined cue texts
    pub text: String,

    /// Offset of the first contributing cue
    #[serde(rename = "offset")]
    pub offset_ms: u64,

    /// Sum of the contributing cue durations
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl MergedBlock {
    /// Creates a new block
    pub fn new(text: impl Into<String>, offset_ms: u64, duration_ms: u64) -> Self {
        MergedBlock {
            text: text.into(),
            offset_ms,
            duration_ms,
        }
    }

    /// Whether the block text closes a sentence
    pub fn ends_sentence(&self) -> bool {
        ends_with_terminal(&self.text)
    }
}

impl fmt::Display for MergedBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}+{}] {}", self.offset_ms, self.duration_ms, self.text)
    }
}

/// Why a block was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The block text ends in terminal punctuation
    SentenceEnd,
    /// The block exceeded `MAX_BLOCK_CHARS` without a sentence end
    LengthOverflow,
    /// The next cue starts more than `MAX_GAP_MS` after this one ends
    TimingGap,
    /// Input ran out with text still buffered
    EndOfStream,
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushReason::SentenceEnd => write!(f, "sentence_end"),
            FlushReason::LengthOverflow => write!(f, "length_overflow"),
            FlushReason::TimingGap => write!(f, "timing_gap"),
            FlushReason::EndOfStream => write!(f, "end_of_stream"),
        }
    }
}

/// Accumulates cues until a flush trigger fires
#[derive(Debug, Default)]
struct BlockBuffer {
    text: String,
    start_ms: u64,
    duration_ms: u64,
}

impl BlockBuffer {
    fn push(&mut self, cue: &AtomicCue) {
        if self.text.is_empty() {
            self.start_ms = cue.offset_ms;
        } else {
            self.text.push(' ');
        }
        self.text.push_str(&cue.text);
        self.duration_ms = self.duration_ms.saturating_add(cue.duration_ms);
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn take(&mut self) -> MergedBlock {
        let block = MergedBlock {
            text: std::mem::take(&mut self.text),
            offset_ms: self.start_ms,
            duration_ms: self.duration_ms,
        };
        self.duration_ms = 0;
        block
    }
}

fn ends_with_terminal(text: &str) -> bool {
    text.chars()
        .next_back()
        .is_some_and(|c| TERMINAL_PUNCTUATION.contains(&c))
}

/// Decide whether the buffer must be flushed after appending `cue`
fn flush_trigger(buffer: &BlockBuffer, cue: &AtomicCue, next: Option<&AtomicCue>) -> Option<FlushReason> {
    if ends_with_terminal(&buffer.text) {
        return Some(FlushReason::SentenceEnd);
    }

    if buffer.text.chars().count() > MAX_BLOCK_CHARS {
        return Some(FlushReason::LengthOverflow);
    }

    // Overlapping cues produce a negative gap, which never triggers
    let gap = next.map_or(0, |next| next.offset_ms.saturating_sub(cue.end_ms()));
    if gap > MAX_GAP_MS {
        return Some(FlushReason::TimingGap);
    }

    None
}

/// Merge cues into blocks, reporting the trigger behind every flush
pub fn merge_with_reasons(cues: &[AtomicCue]) -> Vec<(MergedBlock, FlushReason)> {
    let mut merged = Vec::new();
    let mut buffer = BlockBuffer::default();

    for (i, cue) in cues.iter().enumerate() {
        buffer.push(cue);

        if let Some(reason) = flush_trigger(&buffer, cue, cues.get(i + 1)) {
            merged.push((buffer.take(), reason));
        }
    }

    if !buffer.is_empty() {
        merged.push((buffer.take(), FlushReason::EndOfStream));
    }

    debug!("Merged {} cues into {} blocks", cues.len(), merged.len());

    merged
}

/// Merge cues into sentence-sized blocks
pub fn merge_cues(cues: &[AtomicCue]) -> Vec<MergedBlock> {
    merge_with_reasons(cues)
        .into_iter()
        .map(|(block, _)| block)
        .collect()
}
