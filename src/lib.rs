/*!
 * # vttmerge - WebVTT caption parsing and sentence merging
 *
 * A Rust library that turns raw WebVTT caption tracks into clean,
 * sentence-sized transcript blocks and keeps them in a local store.
 *
 * ## Features
 *
 * - Parse WebVTT documents into timed cues, dropping markup, player
 *   boilerplate and rolling-caption repeats
 * - Merge cue fragments into blocks at sentence ends, length limits and pauses
 * - Pick caption tracks by language pattern, manual tracks before automatic
 * - Retrieve tracks with yt-dlp or from a folder of caption files
 * - Store merged blocks in SQLite and verify their language against a
 *   video's study subject
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `caption_parser`: WebVTT document to atomic cues
 * - `sentence_merger`: Atomic cues to merged blocks
 * - `transcript`: Parse and merge in one step
 * - `track_selection`: Ordered track selection strategies
 * - `caption_source`: Caption retrieval (yt-dlp, local folder)
 * - `database`: SQLite persistence
 * - `app_config`: Configuration management
 * - `app_controller`: Batch run and language reconciliation
 * - `language_utils`: Language pattern and ISO code utilities
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod caption_parser;
pub mod caption_source;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod sentence_merger;
pub mod track_selection;
pub mod transcript;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchSummary, Controller, ReconcileSummary};
pub use caption_parser::{parse_vtt, AtomicCue};
pub use caption_source::{CaptionSource, DirectorySource, FetchedCaption, YtDlpSource};
pub use errors::{AppError, CaptionError, FetchError};
pub use sentence_merger::{merge_cues, MergedBlock};
pub use track_selection::{CaptionTrack, TrackKind, TrackSelector};
pub use transcript::TranscriptOutcome;
