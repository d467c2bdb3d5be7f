use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::app_config::{Config, PacingConfig, SourceKind};
use crate::caption_source::{CaptionSource, DirectorySource, FetchedCaption, YtDlpSource};
use crate::database::{DatabaseConnection, Repository, SubjectSource, UpsertOutcome};
use crate::errors::{AppError, FetchError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::track_selection::TrackSelector;
use crate::transcript::TranscriptOutcome;

// @module: Application controller for caption retrieval and storage

/// What happened to a single video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Blocks were written (or found identical) in the store
    Stored {
        outcome: UpsertOutcome,
        blocks: usize,
        language: Option<String>,
    },
    /// The source has no track matching the requested languages
    NoCaptions,
    /// The retrieved document is not a WebVTT track
    Unrecognized,
    /// The track held no usable text
    Empty,
}

impl fmt::Display for VideoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoOutcome::Stored { outcome, blocks, language } => write!(
                f,
                "{} blocks {} ({})",
                blocks,
                outcome,
                language.as_deref().unwrap_or("unknown language")
            ),
            VideoOutcome::NoCaptions => write!(f, "no matching captions"),
            VideoOutcome::Unrecognized => write!(f, "not a WebVTT document"),
            VideoOutcome::Empty => write!(f, "captions contain no text"),
        }
    }
}

/// Counts reported at the end of a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} stored, {} skipped, {} failed",
            self.processed, self.succeeded, self.skipped, self.failed
        )
    }
}

/// Counts reported at the end of a language reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Stored transcripts whose video has a subject
    pub checked: usize,
    /// Transcripts whose language did not fit the subject
    pub mismatched: usize,
    /// Mismatches replaced with a transcript in the right language
    pub fixed: usize,
    /// Videos whose subject has no language mapping
    pub unknown_subject: usize,
    /// Mismatches whose stored code still has the subject's base language
    pub same_base: usize,
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked, {} mismatched ({} same base language), {} fixed, {} unknown subjects",
            self.checked, self.mismatched, self.same_base, self.fixed, self.unknown_subject
        )
    }
}

/// Subject assignments to import, as `{"roadmap": {id: subject}, "library": {...}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectsFile {
    #[serde(default)]
    pub roadmap: HashMap<String, String>,
    #[serde(default)]
    pub library: HashMap<String, String>,
}

impl SubjectsFile {
    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse subjects file: {:?}", path.as_ref()))
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Transcript store
    repository: Repository,
    // @field: Where caption documents come from
    source: Box<dyn CaptionSource>,
}

impl Controller {
    /// Build the store and caption source described by the configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let db = match &config.database_path {
            Some(path) => DatabaseConnection::new(path)?,
            None => DatabaseConnection::new_default()?,
        };
        let repository = Repository::new(db);

        let source: Box<dyn CaptionSource> = match config.source {
            SourceKind::YtDlp => Box::new(YtDlpSource::new(config.ytdlp.clone())),
            SourceKind::Directory => {
                let dir = config
                    .caption_dir
                    .as_ref()
                    .context("caption_dir is required for the directory source")?;
                Box::new(DirectorySource::new(dir))
            }
        };

        Ok(Self::with_parts(config, repository, source))
    }

    // @method: Create a controller from already-built parts
    pub fn with_parts(config: Config, repository: Repository, source: Box<dyn CaptionSource>) -> Self {
        Self {
            config,
            repository,
            source,
        }
    }

    /// The transcript store
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn pacing(&self) -> &PacingConfig {
        &self.config.pacing
    }

    async fn pause(&self) {
        let delay = self.pacing().next_delay();
        if !delay.is_zero() {
            debug!("Sleeping {} ms before the next retrieval", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }

    /// Fetch, parse, merge and store the captions of one video
    pub async fn process_video(
        &self,
        video_id: &str,
        selector: &TrackSelector,
    ) -> Result<VideoOutcome, AppError> {
        let Some(fetched) = self.source.fetch(video_id, selector).await? else {
            return Ok(VideoOutcome::NoCaptions);
        };

        self.store_fetched(fetched, None).await
    }

    async fn store_fetched(
        &self,
        fetched: FetchedCaption,
        fallback_language: Option<&str>,
    ) -> Result<VideoOutcome, AppError> {
        let blocks = match TranscriptOutcome::from_vtt(&fetched.raw) {
            TranscriptOutcome::FormatMismatch => return Ok(VideoOutcome::Unrecognized),
            TranscriptOutcome::Empty => return Ok(VideoOutcome::Empty),
            TranscriptOutcome::Blocks(blocks) => blocks,
        };

        let language = fetched
            .language
            .or_else(|| fallback_language.map(str::to_string));

        let outcome = self
            .repository
            .upsert_transcript(&fetched.video_id, &blocks, language.as_deref())
            .await
            .map_err(AppError::store)?;

        Ok(VideoOutcome::Stored {
            outcome,
            blocks: blocks.len(),
            language,
        })
    }

    /// Retrieve and store captions for every id, in order.
    ///
    /// Videos already stored with a language are skipped unless `force` is
    /// set. A missing retrieval tool aborts the run; every other per-video
    /// problem is logged and counted.
    pub async fn run_batch(&self, video_ids: &[String], force: bool) -> Result<BatchSummary> {
        let start_time = std::time::Instant::now();
        let selector = TrackSelector::manual_then_automatic(&self.config.language_patterns);
        let mut summary = BatchSummary::default();

        info!(
            "Processing {} videos with the {} source, languages: {}",
            video_ids.len(),
            self.source.name(),
            self.config.language_patterns.join(", ")
        );

        let progress_bar = ProgressBar::new(video_ids.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} videos ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let mut fetched_before = false;

        for video_id in video_ids {
            progress_bar.set_message(video_id.clone());
            summary.processed += 1;

            if !force {
                match self.repository.has_transcript_with_language(video_id).await {
                    Ok(true) => {
                        debug!("Skipping {}: already stored with a language", video_id);
                        summary.skipped += 1;
                        progress_bar.inc(1);
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        error!("Store lookup failed for {}: {:#}", video_id, e);
                        summary.failed += 1;
                        progress_bar.inc(1);
                        continue;
                    }
                }
            }

            if fetched_before {
                self.pause().await;
            }
            fetched_before = true;

            match self.process_video(video_id, &selector).await {
                Ok(outcome @ VideoOutcome::Stored { .. }) => {
                    info!("{}: {}", video_id, outcome);
                    summary.succeeded += 1;
                }
                Ok(outcome) => {
                    warn!("Skipping {}: {}", video_id, outcome);
                    summary.skipped += 1;
                }
                Err(AppError::Fetch(FetchError::ToolNotFound(tool))) => {
                    progress_bar.abandon_with_message("Caption tool missing");
                    return Err(anyhow::anyhow!(
                        "Caption tool '{}' not found, install it or use the directory source",
                        tool
                    ));
                }
                Err(e @ AppError::Fetch(_)) => {
                    warn!("Skipping {}: {}", video_id, e);
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!("Error processing video {}: {}", video_id, e);
                    summary.failed += 1;
                }
            }

            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("Batch complete");
        info!(
            "Batch completed in {:.1}s: {}",
            start_time.elapsed().as_secs_f64(),
            summary
        );

        Ok(summary)
    }

    /// Record the subjects of a subjects file, roadmap entries first
    pub async fn import_subjects(&self, subjects: &SubjectsFile) -> Result<usize> {
        let mut written = 0;

        for (source, entries) in [
            (SubjectSource::Roadmap, &subjects.roadmap),
            (SubjectSource::Library, &subjects.library),
        ] {
            for (video_id, subject) in entries {
                if video_id.trim().is_empty() || subject.trim().is_empty() {
                    continue;
                }
                if self.repository.set_subject(video_id, subject, source).await? {
                    written += 1;
                }
            }
        }

        info!("Imported {} video subjects", written);
        Ok(written)
    }

    /// Refetch every stored transcript whose language does not fit its video's subject
    pub async fn reconcile_languages(&self) -> Result<ReconcileSummary> {
        let subjects = self.repository.subjects().await?;
        let records = self.repository.list_transcript_languages().await?;
        let mut summary = ReconcileSummary::default();

        info!(
            "Checking {} stored transcripts against {} known subjects",
            records.len(),
            subjects.len()
        );

        let mut fetched_before = false;

        for record in records {
            let Some(subject) = subjects.get(&record.video_id) else {
                continue;
            };
            summary.checked += 1;

            let Some(codes) = language_utils::subject_language_codes(subject) else {
                warn!("Skipping {}: unknown subject '{}'", record.video_id, subject);
                summary.unknown_subject += 1;
                continue;
            };

            if language_utils::language_matches_subject(record.language.as_deref(), subject) {
                continue;
            }

            summary.mismatched += 1;
            let current = record.language.as_deref().unwrap_or("none");
            if language_utils::language_codes_match(current, codes[0]) {
                summary.same_base += 1;
            }
            info!(
                "Mismatch for {}: stored '{}', expected {} ({})",
                record.video_id,
                current,
                subject,
                codes.join(", ")
            );

            if fetched_before {
                self.pause().await;
            }
            fetched_before = true;

            let selector = TrackSelector::manual_then_automatic(codes);
            let fetched = match self.source.fetch(&record.video_id, &selector).await {
                Ok(Some(fetched)) => fetched,
                Ok(None) => {
                    warn!("{}: no {} captions available", record.video_id, subject);
                    continue;
                }
                Err(FetchError::ToolNotFound(tool)) => {
                    return Err(anyhow::anyhow!("Caption tool '{}' not found", tool));
                }
                Err(e) => {
                    warn!("{}: failed to fetch {} captions: {}", record.video_id, subject, e);
                    continue;
                }
            };

            let blocks = match TranscriptOutcome::from_vtt(&fetched.raw) {
                TranscriptOutcome::Blocks(blocks) => blocks,
                outcome => {
                    warn!("{}: {}", record.video_id, outcome);
                    continue;
                }
            };

            let language = fetched.language.unwrap_or_else(|| codes[0].to_string());
            match self.repository.update_language(&record.video_id, &blocks, &language).await {
                Ok(_) => {
                    let name = language_utils::get_language_name(&language)
                        .unwrap_or_else(|_| language.clone());
                    info!("{}: saved as '{}' ({})", record.video_id, language, name);
                    summary.fixed += 1;
                }
                Err(e) => error!("{}: {}", record.video_id, AppError::store(e)),
            }
        }

        info!("Reconciliation complete: {}", summary);
        Ok(summary)
    }
}
