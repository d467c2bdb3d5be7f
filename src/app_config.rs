use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language patterns to request, in priority order (`ja`, `en.*`)
    #[serde(default = "default_language_patterns")]
    pub language_patterns: Vec<String>,

    /// File listing the video ids of a batch run
    #[serde(default = "default_id_list_file")]
    pub id_list_file: PathBuf,

    /// SQLite database path; the platform data directory when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Where caption documents come from
    #[serde(default)]
    pub source: SourceKind,

    /// Folder of `<video_id>.<lang>.vtt` files for the directory source
    #[serde(default)]
    pub caption_dir: Option<PathBuf>,

    /// yt-dlp settings
    #[serde(default)]
    pub ytdlp: YtDlpConfig,

    /// Delay between consecutive retrievals
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Caption source type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    // @source: External yt-dlp tool
    #[default]
    #[serde(rename = "yt-dlp", alias = "ytdlp")]
    YtDlp,
    // @source: Local folder of caption files
    Directory,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YtDlp => write!(f, "yt-dlp"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yt-dlp" | "ytdlp" => Ok(Self::YtDlp),
            "directory" | "dir" => Ok(Self::Directory),
            _ => Err(anyhow!("Invalid caption source: {}", s)),
        }
    }
}

/// yt-dlp invocation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct YtDlpConfig {
    /// Executable name or path
    #[serde(default = "default_ytdlp_binary")]
    pub binary: String,

    /// Per-invocation timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent by yt-dlp
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: default_ytdlp_binary(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Randomized pause between retrievals
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// Lower bound in milliseconds
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound in milliseconds (inclusive)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl PacingConfig {
    /// No pause at all
    pub fn none() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Draw the next pause uniformly from the configured range
    pub fn next_delay(&self) -> Duration {
        use rand::Rng;

        if self.max_delay_ms <= self.min_delay_ms {
            return Duration::from_millis(self.min_delay_ms);
        }
        let ms = rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_language_patterns() -> Vec<String> {
    ["ja", "en.*", "es.*", "fr.*", "zh.*", "ko.*", "pt.*", "ar.*", "ru.*", "de.*", "it.*"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_id_list_file() -> PathBuf {
    PathBuf::from("video_ids.txt")
}

fn default_ytdlp_binary() -> String {
    "yt-dlp".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_min_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    4000
}

impl Config {
    /// Load configuration from a JSON file, writing the defaults there if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.language_patterns.is_empty() {
            return Err(anyhow!("At least one language pattern is required"));
        }
        for pattern in &self.language_patterns {
            language_utils::validate_pattern(pattern)?;
        }

        if self.pacing.min_delay_ms > self.pacing.max_delay_ms {
            return Err(anyhow!(
                "Pacing min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.pacing.min_delay_ms,
                self.pacing.max_delay_ms
            ));
        }

        match self.source {
            SourceKind::YtDlp => {
                if self.ytdlp.binary.trim().is_empty() {
                    return Err(anyhow!("yt-dlp binary must not be empty"));
                }
                if self.ytdlp.timeout_secs == 0 {
                    return Err(anyhow!("yt-dlp timeout must be greater than zero"));
                }
            }
            SourceKind::Directory => {
                if self.caption_dir.is_none() {
                    return Err(anyhow!("caption_dir is required for the directory source"));
                }
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language_patterns: default_language_patterns(),
            id_list_file: default_id_list_file(),
            database_path: None,
            source: SourceKind::default(),
            caption_dir: None,
            ytdlp: YtDlpConfig::default(),
            pacing: PacingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
