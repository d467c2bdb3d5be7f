// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;

use vttmerge::app_config::{self, Config, SourceKind};
use vttmerge::app_controller::{Controller, SubjectsFile};
use vttmerge::caption_parser;
use vttmerge::database::Repository;
use vttmerge::file_utils::{self, FileManager};
use vttmerge::transcript::TranscriptOutcome;

/// CLI Wrapper for SourceKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSource {
    #[value(name = "yt-dlp", alias = "ytdlp")]
    YtDlp,
    #[value(name = "dir", alias = "directory")]
    Directory,
}

impl From<CliSource> for SourceKind {
    fn from(cli_source: CliSource) -> Self {
        match cli_source {
            CliSource::YtDlp => SourceKind::YtDlp,
            CliSource::Directory => SourceKind::Directory,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every command that touches the store
#[derive(Parser, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// SQLite database path (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Retrieve, merge and store captions for a list of videos
    Fetch {
        /// Video ids to process (defaults to the id list file)
        #[arg(value_name = "VIDEO_ID")]
        ids: Vec<String>,

        /// File with video ids separated by whitespace or commas
        #[arg(long)]
        id_file: Option<PathBuf>,

        /// Refetch videos already stored with a language
        #[arg(short, long)]
        force: bool,

        /// Caption source to use
        #[arg(short, long, value_enum)]
        source: Option<CliSource>,

        /// Folder of <video_id>.<lang>.vtt files for the dir source
        #[arg(long)]
        caption_dir: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Parse a local WebVTT file and print the result as JSON
    Parse {
        /// WebVTT file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the atomic cues instead of merged blocks
        #[arg(long)]
        raw: bool,

        /// Write `<name>.blocks.json` into this directory instead of stdout
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Set logging level
        #[arg(short, long, value_enum)]
        log_level: Option<CliLogLevel>,
    },

    /// Refetch stored transcripts whose language does not fit the video's subject
    Reconcile {
        /// JSON file of subjects: {"roadmap": {id: subject}, "library": {id: subject}}
        #[arg(long)]
        subjects: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show database statistics
    Stats {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for vttmerge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// vttmerge - WebVTT caption parser and sentence merger
///
/// Turns caption tracks into sentence-sized transcript blocks and stores them
/// in a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "vttmerge")]
#[command(version)]
#[command(about = "WebVTT caption parser and sentence merger")]
#[command(long_about = "vttmerge retrieves caption tracks, merges their cues into sentence-sized blocks and stores them.

EXAMPLES:
    vttmerge fetch dQw4w9WgXcQ                   # Fetch one video with yt-dlp
    vttmerge fetch --id-file ids.txt -f          # Refetch a whole list
    vttmerge fetch -s dir --caption-dir subs/ a1 # Use pre-downloaded caption files
    vttmerge parse talk.en.vtt                   # Print merged blocks as JSON
    vttmerge parse --raw talk.en.vtt             # Print the atomic cues
    vttmerge reconcile --subjects subjects.json  # Fix transcripts in the wrong language
    vttmerge stats                               # Show database statistics
    vttmerge completions bash > vttmerge.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI color for a log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn apply_cli_log_level(level: &Option<CliLogLevel>) {
    if let Some(level) = level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }
}

/// Load the config file, apply CLI overrides and validate the result
fn load_config(common: &CommonArgs) -> Result<Config> {
    apply_cli_log_level(&common.log_level);

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(db) = &common.db {
        config.database_path = Some(db.clone());
    }
    match &common.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config or CLI says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Fetch {
            ids,
            id_file,
            force,
            source,
            caption_dir,
            common,
        } => {
            let mut config = load_config(&common)?;
            if let Some(source) = source {
                config.source = source.into();
            }
            if caption_dir.is_some() {
                config.caption_dir = caption_dir;
            }
            config.validate().context("Configuration validation failed")?;

            let ids = if !ids.is_empty() {
                ids
            } else {
                let path = id_file.unwrap_or_else(|| config.id_list_file.clone());
                FileManager::read_video_ids(&path)
                    .with_context(|| format!("Failed to read video ids from {:?}", path))?
            };
            if ids.is_empty() {
                return Err(anyhow!("No video ids to process"));
            }

            let controller = Controller::from_config(config)?;
            let summary = controller.run_batch(&ids, force).await?;
            println!("{}", summary);
        }
        Commands::Parse {
            file,
            raw,
            output_dir,
            log_level,
        } => {
            apply_cli_log_level(&log_level);
            run_parse(file, raw, output_dir)?;
        }
        Commands::Reconcile { subjects, common } => {
            let config = load_config(&common)?;
            config.validate().context("Configuration validation failed")?;
            let controller = Controller::from_config(config)?;

            if let Some(path) = subjects {
                let subjects = SubjectsFile::load(&path)?;
                controller.import_subjects(&subjects).await?;
            }

            let summary = controller.reconcile_languages().await?;
            println!("{}", summary);
        }
        Commands::Stats { common } => {
            let config = load_config(&common)?;
            let repository = match &config.database_path {
                Some(path) => Repository::new(vttmerge::database::DatabaseConnection::new(path)?),
                None => Repository::new_default()?,
            };
            println!("{}", repository.stats().await?);
        }
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "vttmerge", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn run_parse(file: PathBuf, raw: bool, output_dir: Option<PathBuf>) -> Result<()> {
    if !FileManager::file_exists(&file) {
        return Err(anyhow!("Input file does not exist: {:?}", file));
    }
    let content = FileManager::read_to_string(&file)?;

    let json = if raw {
        let cues = caption_parser::parse_vtt(&content)
            .map_err(|e| anyhow!("{}: {}", file.display(), e))?;
        info!("{} cues", cues.len());
        serde_json::to_string_pretty(&cues)?
    } else {
        match TranscriptOutcome::from_vtt(&content) {
            TranscriptOutcome::FormatMismatch => {
                return Err(anyhow!("{}: not a WebVTT document", file.display()));
            }
            TranscriptOutcome::Empty => {
                warn!("{}: no caption text found", file.display());
                "[]".to_string()
            }
            TranscriptOutcome::Blocks(blocks) => {
                info!("{} merged blocks", blocks.len());
                serde_json::to_string_pretty(&blocks)?
            }
        }
    };

    match output_dir {
        Some(dir) => {
            let output_path = file_utils::FileManager::generate_output_path(&file, &dir, "json");
            FileManager::write_to_file(&output_path, &json)?;
            info!("Success: {}", output_path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
