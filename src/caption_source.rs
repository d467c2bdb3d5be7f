/*!
 * Caption retrieval collaborators.
 *
 * A caption source turns a video identifier into at most one raw caption
 * document plus the language code it was served in. The core parser never
 * talks to a source directly; the controller hands it the document.
 *
 * - `YtDlpSource`: lists and downloads tracks with the external `yt-dlp` tool
 * - `DirectorySource`: serves `<video_id>.<lang>.vtt` files from a folder
 */

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::YtDlpConfig;
use crate::errors::FetchError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::track_selection::{CaptionTrack, PREFERRED_FORMAT, TrackKind, TrackSelector};

/// A raw caption document retrieved for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedCaption {
    /// Video the document belongs to
    pub video_id: String,
    /// Language code the document was served in, if known
    pub language: Option<String>,
    /// Raw WebVTT text
    pub raw: String,
}

/// Common trait for all caption sources
#[async_trait]
pub trait CaptionSource: Send + Sync + Debug {
    /// Retrieve the track chosen by `selector` for a video.
    ///
    /// Returns `Ok(None)` when the video has no acceptable track.
    async fn fetch(&self, video_id: &str, selector: &TrackSelector) -> Result<Option<FetchedCaption>, FetchError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Build the track listing from yt-dlp's `--dump-json` output
pub fn parse_track_listing(info: &Value) -> Vec<CaptionTrack> {
    let mut tracks = Vec::new();

    for (key, kind) in [("subtitles", TrackKind::Manual), ("automatic_captions", TrackKind::Automatic)] {
        let Some(by_language) = info.get(key).and_then(|v| v.as_object()) else {
            continue;
        };

        for (language, entries) in by_language {
            let formats: Vec<String> = entries
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("ext").and_then(|e| e.as_str()))
                        .map(|ext| ext.to_string())
                        .collect()
                })
                .unwrap_or_default();

            if formats.is_empty() {
                continue;
            }
            tracks.push(CaptionTrack::new(language.clone(), kind, formats));
        }
    }

    tracks
}

/// Keep the lines of yt-dlp stderr that explain a failure
fn summarize_stderr(stderr: &str) -> String {
    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if !meaningful.is_empty() {
        return meaningful.join("\n");
    }

    let tail: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    match tail.last() {
        Some(line) => line.to_string(),
        None => "unknown yt-dlp error (stderr was empty)".to_string(),
    }
}

/// Caption source backed by the yt-dlp command line tool
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    config: YtDlpConfig,
}

impl YtDlpSource {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Run yt-dlp with a timeout, returning its stdout
    async fn run(&self, args: &[String]) -> Result<Vec<u8>, FetchError> {
        debug!("Running {} {}", self.config.binary, args.join(" "));

        let child = Command::new(&self.config.binary)
            .args(args)
            .kill_on_drop(true)
            .output();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let output = tokio::select! {
            result = child => {
                result.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => FetchError::ToolNotFound(self.config.binary.clone()),
                    _ => FetchError::Io(e),
                })?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(FetchError::Timeout(self.config.timeout_secs));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::ProcessFailed {
                status: output.status.to_string(),
                stderr: summarize_stderr(&stderr),
            });
        }

        Ok(output.stdout)
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "--user-agent".to_string(),
            self.config.user_agent.clone(),
        ]
    }

    /// List the caption tracks a video offers
    pub async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, FetchError> {
        let mut args = self.common_args();
        args.push("--dump-json".to_string());
        args.push("--".to_string());
        args.push(video_id.to_string());

        let stdout = self.run(&args).await?;
        let stdout = String::from_utf8_lossy(&stdout);

        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }

        let info: Value = serde_json::from_str(stdout.trim())
            .map_err(|e| FetchError::ParseError(e.to_string()))?;

        Ok(parse_track_listing(&info))
    }

    /// Download one track into `work_dir`, returning the written file
    async fn download_track(&self, video_id: &str, track: &CaptionTrack, work_dir: &Path) -> Result<Option<PathBuf>, FetchError> {
        let file_stem = format!("temp_{}", video_id);
        let kind_flag = match track.kind {
            TrackKind::Manual => "--write-subs",
            TrackKind::Automatic => "--write-auto-subs",
        };

        let mut args = self.common_args();
        args.extend([
            "--quiet".to_string(),
            kind_flag.to_string(),
            "--sub-format".to_string(),
            PREFERRED_FORMAT.to_string(),
            "--sub-langs".to_string(),
            track.language.clone(),
            "-o".to_string(),
            work_dir.join(&file_stem).to_string_lossy().to_string(),
            "--".to_string(),
            video_id.to_string(),
        ]);

        self.run(&args).await?;

        let mut written: Vec<PathBuf> = FileManager::find_files(work_dir, PREFERRED_FORMAT)
            .map_err(|e| FetchError::Io(std::io::Error::other(e.to_string())))?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&file_stem))
            })
            .collect();
        written.sort();

        Ok(written.into_iter().next())
    }
}

#[async_trait]
impl CaptionSource for YtDlpSource {
    async fn fetch(&self, video_id: &str, selector: &TrackSelector) -> Result<Option<FetchedCaption>, FetchError> {
        let tracks = self.list_tracks(video_id).await?;
        debug!("Video {} offers {} caption tracks", video_id, tracks.len());

        let Some(track) = selector.select(&tracks) else {
            return Ok(None);
        };

        // Removed together with everything yt-dlp wrote into it
        let work_dir = tempfile::Builder::new().prefix("vttmerge-").tempdir()?;

        let Some(path) = self.download_track(video_id, track, work_dir.path()).await? else {
            warn!("yt-dlp wrote no {} file for {} ({})", PREFERRED_FORMAT, video_id, track.language);
            return Ok(None);
        };

        let raw = tokio::fs::read_to_string(&path).await?;
        let language = language_utils::language_from_caption_filename(&path)
            .or_else(|| Some(track.language.clone()));

        Ok(Some(FetchedCaption {
            video_id: video_id.to_string(),
            language,
            raw,
        }))
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

/// Caption source serving pre-downloaded files named `<video_id>.<lang>.vtt`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Files available for a video, paired with their track description
    pub fn list_tracks(&self, video_id: &str) -> Result<Vec<(CaptionTrack, PathBuf)>, FetchError> {
        if !FileManager::dir_exists(&self.root) {
            return Err(FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Caption directory not found: {}", self.root.display()),
            )));
        }

        let prefix = format!("{}.", video_id);
        let mut files: Vec<PathBuf> = FileManager::find_files(&self.root, PREFERRED_FORMAT)
            .map_err(|e| FetchError::Io(std::io::Error::other(e.to_string())))?
            .into_iter()
            .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy().starts_with(&prefix)))
            .collect();
        files.sort();

        Ok(files
            .into_iter()
            .filter_map(|path| {
                let language = language_utils::language_from_caption_filename(&path)?;
                let track = CaptionTrack::new(language, TrackKind::Manual, vec![PREFERRED_FORMAT.to_string()]);
                Some((track, path))
            })
            .collect())
    }
}

#[async_trait]
impl CaptionSource for DirectorySource {
    async fn fetch(&self, video_id: &str, selector: &TrackSelector) -> Result<Option<FetchedCaption>, FetchError> {
        let listing = self.list_tracks(video_id)?;
        let tracks: Vec<CaptionTrack> = listing.iter().map(|(track, _)| track.clone()).collect();

        let Some(selected) = selector.select(&tracks) else {
            return Ok(None);
        };

        let Some((_, path)) = listing.iter().find(|(track, _)| track == selected) else {
            return Ok(None);
        };

        let raw = tokio::fs::read_to_string(path).await?;

        Ok(Some(FetchedCaption {
            video_id: video_id.to_string(),
            language: Some(selected.language.clone()),
            raw,
        }))
    }

    fn name(&self) -> &str {
        "directory"
    }
}
