/*!
 * Database module for persistent storage of merged transcripts.
 *
 * This module provides SQLite-based persistence for:
 * - Merged caption blocks keyed by video id, with their language
 * - Study subjects used to verify stored languages
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use models::{LanguageRecord, SubjectSource, TranscriptRecord, UpsertOutcome};
pub use repository::Repository;
