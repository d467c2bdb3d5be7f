/*!
 * Common test utilities for the vttmerge test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use vttmerge::app_config::{Config, PacingConfig, SourceKind};
use vttmerge::caption_source::DirectorySource;
use vttmerge::database::Repository;
use vttmerge::Controller;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Auto-generated style track: rolling repeats, tags and a header block
pub const SAMPLE_VTT: &str = "WEBVTT\nKind: captions\nLanguage: en\n\n\
00:00:00.000 --> 00:00:01.500 align:start position:0%\nso today we are\n\n\
00:00:01.500 --> 00:00:03.000 align:start position:0%\nso today we are\n<c>going to cook</c> pasta.\n\n\
00:00:03.000 --> 00:00:04.000\nFirst, boil water.\n\n\
00:00:06.000 --> 00:00:07.000\nthen salt it\n";

/// A minimal track whose single cue says `text`
pub fn single_cue_vtt(text: &str) -> String {
    format!("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n{}\n", text)
}

/// Creates a caption file named `<video_id>.<lang>.vtt`
pub fn create_caption_file(dir: &Path, video_id: &str, lang: &str, content: &str) -> Result<PathBuf> {
    create_test_file(dir, &format!("{}.{}.vtt", video_id, lang), content)
}

/// Config for offline runs: directory source, no pacing delay
pub fn offline_config(caption_dir: &Path) -> Config {
    Config {
        source: SourceKind::Directory,
        caption_dir: Some(caption_dir.to_path_buf()),
        pacing: PacingConfig::none(),
        ..Config::default()
    }
}

/// Controller reading captions from `caption_dir` into an in-memory store
pub fn offline_controller(caption_dir: &Path) -> Result<Controller> {
    let config = offline_config(caption_dir);
    let source = DirectorySource::new(caption_dir);
    Ok(Controller::with_parts(config, Repository::new_in_memory()?, Box::new(source)))
}

/// Install a test logger once; later calls are ignored
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
