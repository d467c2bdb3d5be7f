/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::connection::{DatabaseConnection, DatabaseStats};
use super::models::{LanguageRecord, SubjectSource, TranscriptRecord, UpsertOutcome};
use crate::sentence_merger::MergedBlock;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    // =========================================================================
    // Transcript Operations
    // =========================================================================

    /// Insert or replace the merged blocks stored for a video
    pub async fn upsert_transcript(
        &self,
        video_id: &str,
        blocks: &[MergedBlock],
        language: Option<&str>,
    ) -> Result<UpsertOutcome> {
        let video_id = video_id.to_string();
        let language = language.map(str::to_string);
        let content = serde_json::to_string(blocks).context("Failed to serialize merged blocks")?;
        let content_hash = Self::hash_text(&content);
        let block_count = blocks.len() as i64;

        self.db
            .transaction_async(move |tx| {
                let existing: Option<(String, Option<String>)> = tx
                    .query_row(
                        "SELECT content_hash, language FROM optimized_transcripts WHERE video_id = ?1",
                        [&video_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                let outcome = match existing {
                    None => UpsertOutcome::Inserted,
                    Some((hash, lang)) if hash == content_hash && lang == language => {
                        UpsertOutcome::Unchanged
                    }
                    Some(_) => UpsertOutcome::Updated,
                };

                if outcome == UpsertOutcome::Unchanged {
                    debug!("Transcript for {} unchanged, skipping write", video_id);
                    return Ok(outcome);
                }

                tx.execute(
                    r#"
                    INSERT INTO optimized_transcripts (
                        video_id, content, language, block_count, content_hash, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(video_id) DO UPDATE SET
                        content = excluded.content,
                        language = excluded.language,
                        block_count = excluded.block_count,
                        content_hash = excluded.content_hash,
                        updated_at = excluded.updated_at
                    "#,
                    params![
                        video_id,
                        content,
                        language,
                        block_count,
                        content_hash,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;

                debug!("Transcript for {} {} ({} blocks)", video_id, outcome, block_count);
                Ok(outcome)
            })
            .await
    }

    /// Get the stored transcript of a video
    pub async fn get_transcript(&self, video_id: &str) -> Result<Option<TranscriptRecord>> {
        let video_id = video_id.to_string();

        self.db
            .execute_async(move |conn| Self::get_transcript_sync(conn, &video_id))
            .await
    }

    fn get_transcript_sync(conn: &Connection, video_id: &str) -> Result<Option<TranscriptRecord>> {
        let row = conn
            .query_row(
                r#"
                SELECT video_id, content, language, content_hash, updated_at
                FROM optimized_transcripts WHERE video_id = ?1
                "#,
                [video_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((video_id, content, language, content_hash, updated_at)) = row else {
            return Ok(None);
        };

        let blocks: Vec<MergedBlock> = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt transcript content for {}", video_id))?;

        Ok(Some(TranscriptRecord {
            video_id,
            blocks,
            language,
            content_hash,
            updated_at,
        }))
    }

    /// Whether a transcript with a known language is already stored
    pub async fn has_transcript_with_language(&self, video_id: &str) -> Result<bool> {
        let video_id = video_id.to_string();

        self.db
            .execute_async(move |conn| {
                let count: i64 = conn.query_row(
                    r#"
                    SELECT COUNT(*) FROM optimized_transcripts
                    WHERE video_id = ?1 AND language IS NOT NULL AND language != ''
                    "#,
                    [&video_id],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await
    }

    /// List every stored video with its language, ordered by id
    pub async fn list_transcript_languages(&self) -> Result<Vec<LanguageRecord>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT video_id, language FROM optimized_transcripts ORDER BY video_id",
                )?;

                let records = stmt
                    .query_map([], |row| {
                        Ok(LanguageRecord {
                            video_id: row.get(0)?,
                            language: row.get(1)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(records)
            })
            .await
    }

    /// Replace the blocks and language of an already stored transcript.
    ///
    /// Fails when the video has no stored transcript.
    pub async fn update_language(
        &self,
        video_id: &str,
        blocks: &[MergedBlock],
        language: &str,
    ) -> Result<UpsertOutcome> {
        let video_id = video_id.to_string();
        let language = language.to_string();
        let content = serde_json::to_string(blocks).context("Failed to serialize merged blocks")?;
        let content_hash = Self::hash_text(&content);
        let block_count = blocks.len() as i64;

        self.db
            .transaction_async(move |tx| {
                let existing: Option<(String, Option<String>)> = tx
                    .query_row(
                        "SELECT content_hash, language FROM optimized_transcripts WHERE video_id = ?1",
                        [&video_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                let Some((hash, previous)) = existing else {
                    anyhow::bail!("No stored transcript for {}", video_id);
                };

                if hash == content_hash && previous.as_deref() == Some(language.as_str()) {
                    return Ok(UpsertOutcome::Unchanged);
                }

                tx.execute(
                    r#"
                    UPDATE optimized_transcripts
                    SET content = ?2, language = ?3, block_count = ?4, content_hash = ?5, updated_at = ?6
                    WHERE video_id = ?1
                    "#,
                    params![
                        video_id,
                        content,
                        language,
                        block_count,
                        content_hash,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;

                debug!(
                    "Language of {} changed from {} to {}",
                    video_id,
                    previous.as_deref().unwrap_or("none"),
                    language
                );
                Ok(UpsertOutcome::Updated)
            })
            .await
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    // =========================================================================
    // Subject Operations
    // =========================================================================

    /// Record a video's study subject.
    ///
    /// Returns false when an existing subject from a higher-precedence source
    /// was kept instead.
    pub async fn set_subject(
        &self,
        video_id: &str,
        subject: &str,
        source: SubjectSource,
    ) -> Result<bool> {
        let video_id = video_id.to_string();
        let subject = subject.to_string();

        self.db
            .transaction_async(move |tx| {
                let existing: Option<String> = tx
                    .query_row(
                        "SELECT source FROM video_subjects WHERE video_id = ?1",
                        [&video_id],
                        |row| row.get(0),
                    )
                    .optional()?;

                if let Some(existing) = existing {
                    let existing: SubjectSource = existing.parse()?;
                    if existing.precedence() > source.precedence() {
                        debug!(
                            "Keeping {} subject for {}, ignoring {} subject '{}'",
                            existing, video_id, source, subject
                        );
                        return Ok(false);
                    }
                }

                tx.execute(
                    r#"
                    INSERT INTO video_subjects (video_id, subject, source, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(video_id) DO UPDATE SET
                        subject = excluded.subject,
                        source = excluded.source,
                        updated_at = excluded.updated_at
                    "#,
                    params![
                        video_id,
                        subject,
                        source.to_string(),
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok(true)
            })
            .await
    }

    /// All known subjects keyed by video id
    pub async fn subjects(&self) -> Result<HashMap<String, String>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare("SELECT video_id, subject FROM video_subjects")?;

                let subjects = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<HashMap<String, String>, _>>()?;

                Ok(subjects)
            })
            .await
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Get database statistics
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || db.stats())
            .await
            .context("Database stats task panicked")?
    }
}
